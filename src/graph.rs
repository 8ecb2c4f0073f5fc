//! Workflow graph: named steps, their outgoing rules, and the entry step.
//!
//! Every step has exactly one outgoing rule: an unconditional edge, or a router whose label
//! is looked up in a route table. Both kinds may target [Target::End].

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::instrument;

use crate::error::GraphError;
use crate::steps::Step;
use crate::types::{DesignState, Target};

/// Pure function from post-merge state to a route label.
pub type Router = Arc<dyn Fn(&DesignState) -> &'static str + Send + Sync>;

enum Outgoing {
  Edge(Target),
  Conditional {
    router: Router,
    routes: HashMap<String, Target>,
  },
}

/// Validated, immutable graph. Shareable across concurrent runs.
pub struct WorkflowGraph {
  steps: HashMap<String, Arc<dyn Step>>,
  outgoing: HashMap<String, Outgoing>,
  entry: String,
}

impl fmt::Debug for WorkflowGraph {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut steps: Vec<_> = self.steps.keys().collect();
    steps.sort();
    f.debug_struct("WorkflowGraph")
      .field("entry", &self.entry)
      .field("steps", &steps)
      .finish()
  }
}

impl WorkflowGraph {
  pub fn builder() -> GraphBuilder {
    GraphBuilder::default()
  }

  pub fn entry(&self) -> &str {
    &self.entry
  }

  pub fn step(&self, name: &str) -> Option<&Arc<dyn Step>> {
    self.steps.get(name)
  }

  /// Selects where the run goes after `from`, given the post-merge state.
  ///
  /// Errors when `from` is unknown or its router returns a label with no route.
  #[instrument(level = "trace", skip(self, state))]
  pub fn next_target(&self, from: &str, state: &DesignState) -> Result<Target, String> {
    match self.outgoing.get(from) {
      Some(Outgoing::Edge(target)) => Ok(target.clone()),
      Some(Outgoing::Conditional { router, routes }) => {
        let label = router(state);
        routes
          .get(label)
          .cloned()
          .ok_or_else(|| format!("router of `{}` returned unmapped label `{}`", from, label))
      }
      None => Err(format!("step `{}` is not in the graph", from)),
    }
  }
}

/// Collects steps and edges, then validates them in [GraphBuilder::build].
#[derive(Default)]
pub struct GraphBuilder {
  steps: Vec<Arc<dyn Step>>,
  edges: Vec<(String, Target)>,
  conditionals: Vec<(String, Router, HashMap<String, Target>)>,
  entry: Option<String>,
}

impl GraphBuilder {
  pub fn add_step(mut self, step: impl Step + 'static) -> Self {
    self.steps.push(Arc::new(step));
    self
  }

  pub fn add_edge(mut self, from: &str, to: Target) -> Self {
    self.edges.push((from.to_string(), to));
    self
  }

  pub fn add_conditional_edges<'a>(
    mut self,
    from: &str,
    router: Router,
    routes: impl IntoIterator<Item = (&'a str, Target)>,
  ) -> Self {
    let routes = routes
      .into_iter()
      .map(|(label, target)| (label.to_string(), target))
      .collect();
    self.conditionals.push((from.to_string(), router, routes));
    self
  }

  pub fn set_entry(mut self, name: &str) -> Self {
    self.entry = Some(name.to_string());
    self
  }

  /// Validates the wiring and freezes the graph.
  #[instrument(level = "trace", skip(self))]
  pub fn build(self) -> Result<WorkflowGraph, GraphError> {
    let mut order = Vec::with_capacity(self.steps.len());
    let mut steps: HashMap<String, Arc<dyn Step>> = HashMap::new();
    for step in self.steps {
      let name = step.name().to_string();
      if steps.insert(name.clone(), step).is_some() {
        return Err(GraphError::DuplicateStep(name));
      }
      order.push(name);
    }

    let entry = self.entry.ok_or(GraphError::MissingEntry)?;
    if !steps.contains_key(&entry) {
      return Err(GraphError::UnknownEntry(entry));
    }

    let registered = |target: &Target| match target {
      Target::Step(name) => steps.contains_key(name),
      Target::End => true,
    };

    let mut outgoing: HashMap<String, Outgoing> = HashMap::new();
    let mut ambiguous: HashSet<String> = HashSet::new();
    for (from, to) in self.edges {
      if !steps.contains_key(&from) || !registered(&to) {
        return Err(GraphError::UnknownStep {
          from,
          to: to.to_string(),
        });
      }
      if outgoing.insert(from.clone(), Outgoing::Edge(to)).is_some() {
        ambiguous.insert(from);
      }
    }
    for (from, router, routes) in self.conditionals {
      if !steps.contains_key(&from) {
        return Err(GraphError::UnknownStep {
          from,
          to: "<router>".to_string(),
        });
      }
      let mut labels: Vec<_> = routes.iter().collect();
      labels.sort_by(|a, b| a.0.cmp(b.0));
      if let Some((label, target)) = labels.into_iter().find(|entry| !registered(entry.1)) {
        return Err(GraphError::UnknownRouteTarget {
          step: from,
          label: label.clone(),
          target: target.to_string(),
        });
      }
      if outgoing
        .insert(from.clone(), Outgoing::Conditional { router, routes })
        .is_some()
      {
        ambiguous.insert(from);
      }
    }

    for name in &order {
      if ambiguous.contains(name) {
        return Err(GraphError::AmbiguousOutgoing(name.clone()));
      }
      if !outgoing.contains_key(name) {
        return Err(GraphError::NoOutgoing(name.clone()));
      }
    }

    Ok(WorkflowGraph {
      steps,
      outgoing,
      entry,
    })
  }
}
