//! CLI: run an iterative design review for one request.
//!
//! Collaborators are external commands speaking JSON on stdin/stdout (see `--help`).
//! Progress is persisted under the run directory so an interrupted run can be resumed.
//!
//! Usage: `run_review [OPTIONS] <REQUEST>`
//!
//! Set RUST_LOG=design_review_loop=trace for TRACE-level span enter/exit and events.

use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::Parser;
use design_review_loop::collaborators::{
  AutoApprove, ConsoleApproval, HumanInput, command_collaborators,
};
use design_review_loop::config::{ReviewConfig, RuleSource, load_config};
use design_review_loop::{
  CHECKPOINT_FILENAME, CancelToken, EXECUTION_LOG_FILENAME, RunOptions, RunOutcome, RunStart, StepEvent,
  load_checkpoint, load_execution_log, resume_checkpoint_from_log, run_design_review,
};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

const RUN_DIR: &str = ".review-loop";

/// Run an iterative propose / render / approve / analyze / critique design review.
#[derive(Parser, Debug)]
#[command(name = "run_review")]
#[command(
  after_help = r#"Environment variables (override the matching flags when set):
  REVIEW_LOOP_RUN_DIR        Run directory (checkpoint, execution log, snapshots, report).
  REVIEW_LOOP_RETRIEVE_CMD   Rule retrieval command.
  REVIEW_LOOP_PROPOSE_CMD    Proposal generation command.
  REVIEW_LOOP_RENDER_CMD     Image synthesis command.
  REVIEW_LOOP_ANALYZE_CMD    Quantification command.
  REVIEW_LOOP_CRITIQUE_CMD   Critique command.
  REVIEW_LOOP_REPORT_CMD     Report generation command.

Each command receives one JSON object on stdin ({"operation": ...}) and prints one JSON
object on stdout.

Exit status: 0 report produced, 2 iteration ceiling reached without a report, 1 error.

Examples:
  run_review --auto-approve "A small building in a large green park."
  run_review --resume"#
)]
struct Args {
  /// JSON configuration file. Flags override its values.
  #[arg(long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Run directory. Overridden by REVIEW_LOOP_RUN_DIR if set.
  #[arg(long, value_name = "DIR", default_value = RUN_DIR)]
  run_dir: PathBuf,

  /// Resume the run saved in the run directory instead of starting a new one.
  #[arg(long)]
  resume: bool,

  /// Approve every design without asking.
  #[arg(long)]
  auto_approve: bool,

  /// Propose/critique cycles before giving up.
  #[arg(long, value_name = "N")]
  max_iterations: Option<u32>,

  /// Give up if the approval question is not answered within this many seconds.
  #[arg(long, value_name = "SECS")]
  approval_timeout_secs: Option<u64>,

  /// Fixed compliance rules for the critique instead of the retrieved ones.
  #[arg(long, value_name = "RULES")]
  critique_rules: Option<String>,

  /// Stop as soon as rendering or analysis fails.
  #[arg(long)]
  abort_on_degraded: bool,

  #[arg(long, value_name = "CMD")]
  retrieve_cmd: Option<String>,
  #[arg(long, value_name = "CMD")]
  propose_cmd: Option<String>,
  #[arg(long, value_name = "CMD")]
  render_cmd: Option<String>,
  #[arg(long, value_name = "CMD")]
  analyze_cmd: Option<String>,
  #[arg(long, value_name = "CMD")]
  critique_cmd: Option<String>,
  #[arg(long, value_name = "CMD")]
  report_cmd: Option<String>,

  /// The design request (required unless --resume)
  #[arg(value_name = "REQUEST", required_unless_present = "resume")]
  request: Option<String>,
}

fn fail(message: impl std::fmt::Display) -> ! {
  eprintln!("Error: {}", message);
  process::exit(1);
}

/// Env var, then flag, then config file.
fn pick(var: &str, flag: &Option<String>, file: &Option<String>) -> Option<String> {
  env::var(var)
    .ok()
    .filter(|v| !v.trim().is_empty())
    .or_else(|| flag.clone())
    .or_else(|| file.clone())
}

fn effective_config(args: &Args) -> ReviewConfig {
  let mut config = match &args.config {
    Some(path) => load_config(path)
      .unwrap_or_else(|e| fail(format!("reading {}: {}", path.display(), e))),
    None => ReviewConfig::default(),
  };
  if let Some(n) = args.max_iterations {
    config.max_iterations = n;
  }
  if args.approval_timeout_secs.is_some() {
    config.approval_timeout_secs = args.approval_timeout_secs;
  }
  if let Some(rules) = &args.critique_rules {
    config.critique_rules = RuleSource::Fixed(rules.clone());
  }
  config.auto_approve |= args.auto_approve;
  config.abort_on_degraded |= args.abort_on_degraded;
  let c = &mut config.commands;
  c.retrieve = pick("REVIEW_LOOP_RETRIEVE_CMD", &args.retrieve_cmd, &c.retrieve);
  c.propose = pick("REVIEW_LOOP_PROPOSE_CMD", &args.propose_cmd, &c.propose);
  c.render = pick("REVIEW_LOOP_RENDER_CMD", &args.render_cmd, &c.render);
  c.analyze = pick("REVIEW_LOOP_ANALYZE_CMD", &args.analyze_cmd, &c.analyze);
  c.critique = pick("REVIEW_LOOP_CRITIQUE_CMD", &args.critique_cmd, &c.critique);
  c.report = pick("REVIEW_LOOP_REPORT_CMD", &args.report_cmd, &c.report);
  config
}

/// Checkpoint first; the execution log is the fallback.
fn resume_start(run_dir: &Path) -> RunStart {
  match load_checkpoint(&run_dir.join(CHECKPOINT_FILENAME)) {
    Ok(cp) => RunStart::Resume(cp),
    Err(e) => {
      warn!(error = %e, "no usable checkpoint; trying the execution log");
      let log = load_execution_log(&run_dir.join(EXECUTION_LOG_FILENAME))
        .unwrap_or_else(|e| fail(format!("nothing to resume in {}: {}", run_dir.display(), e)));
      match resume_checkpoint_from_log(&log) {
        Some(cp) => RunStart::Resume(cp),
        None => fail(format!("execution log in {} has no steps", run_dir.display())),
      }
    }
  }
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
    .with_writer(std::io::stderr)
    .init();

  info!("run_review starting");
  let args = Args::try_parse().unwrap_or_else(|e| {
    if e.use_stderr() {
      let _ = e.print();
      process::exit(1);
    }
    e.exit()
  });

  let run_dir = env::var("REVIEW_LOOP_RUN_DIR")
    .ok()
    .map(PathBuf::from)
    .unwrap_or_else(|| args.run_dir.clone());
  let config = effective_config(&args);
  if let Err(e) = config.validate() {
    fail(e);
  }
  info!(run_dir = %run_dir.display(), max_iterations = config.max_iterations, auto_approve = config.auto_approve, "options (env, flags, config)");

  let human: Arc<dyn HumanInput> = if config.auto_approve {
    Arc::new(AutoApprove)
  } else {
    Arc::new(ConsoleApproval::new())
  };
  let collaborators = command_collaborators(&config.commands, human).unwrap_or_else(|e| fail(e));

  let start = if args.resume {
    resume_start(&run_dir)
  } else {
    match &args.request {
      Some(request) => RunStart::Request(request.clone()),
      None => fail("a REQUEST is required unless --resume is given"),
    }
  };

  let cancel = CancelToken::new();
  {
    let cancel = cancel.clone();
    tokio::spawn(async move {
      if tokio::signal::ctrl_c().await.is_ok() {
        warn!("interrupt received; stopping after the current step");
        cancel.cancel();
      }
    });
  }

  let (tx, mut rx) = mpsc::channel::<StepEvent>(32);
  let printer = tokio::spawn(async move {
    while let Some(event) = rx.recv().await {
      println!(
        "[{}] {} (iteration {}) -> {}",
        event.seq, event.step, event.state.iteration_count, event.next
      );
    }
  });

  let options = RunOptions {
    run_dir: Some(run_dir.clone()),
    cancel,
    events: Some(tx),
  };
  let outcome = run_design_review(start, &collaborators, &config, options).await;
  let _ = printer.await;

  let report = match outcome {
    Ok(report) => report,
    Err(e) => {
      eprintln!("Run error: {}", e);
      eprintln!("Progress is saved in {}; rerun with --resume to continue.", run_dir.display());
      process::exit(1);
    }
  };

  let r = &report.result;
  info!(outcome = %r.outcome, iterations = r.state.iteration_count, steps = ?r.completed_steps, "review finished");
  println!("Review {}.", r.outcome);
  println!("  Run id: {}", report.run_id);
  println!("  Iterations: {}", r.state.iteration_count);
  if let Some(path) = &report.report_path {
    println!("  Report: {}", path.display());
  }
  match r.outcome {
    RunOutcome::Completed => {
      if let Some(markdown) = &r.state.final_report {
        println!("\n{}", markdown);
      }
    }
    RunOutcome::Exhausted => {
      if let Some(feedback) = &r.state.critique_feedback {
        println!("  Last critique: {}", feedback);
      }
      process::exit(2);
    }
  }
}
