//! `faultline`: the CLI entry point for the fault-recovery harness. Wires a
//! task file, a recovery strategy, a diagnosis backend and (for B4) a
//! memory bank into the runner, then reduces the resulting trace to the
//! metric table in one pass.
//!
//! Independent tasks are run across a `rayon` worker pool; the engine
//! itself stays strictly single-threaded per task, only the shared,
//! mutex-guarded memory bank is touched from more than one thread.

mod cli;
mod errors;
mod report;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use rayon::prelude::*;

use cli::Cli;
use errors::CliError;
use fl_core::event::{FileTraceStore, InMemoryTraceStore, TraceEvent, TraceStore};
use fl_core::{BudgetLimits, EngineError, RealClock};
use fl_domain::task::TaskDescriptor;
use fl_engine::Runner;
use fl_persistence::{MemoryBank, env_defaults, load_tasks};
use fl_policies::{RecoveryPolicy, Strategy};

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            log::error!("{err}");
            eprintln!("faultline: {err}");
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<i32, CliError> {
    let seed = cli.seed.unwrap_or(env_defaults().seed);
    let memory_path = cli
        .memory
        .clone()
        .unwrap_or_else(|| PathBuf::from(&env_defaults().memory_path));
    let strategy: Strategy = cli.strategy.into();

    let tasks = load_tasks(&cli.tasks)?;
    log::info!("loaded {} task(s) from {}", tasks.len(), cli.tasks.display());

    let memory_bank = if strategy == Strategy::B4 {
        Some(Arc::new(MemoryBank::load(&memory_path).map_err(CliError::Memory)?))
    } else {
        None
    };

    let registry = fl_adapters::standard_registry();

    let results: Vec<(TaskDescriptor, Vec<TraceEvent>, Result<fl_core::event::Outcome, EngineError>)> = tasks
        .into_par_iter()
        .map(|task| {
            let diagnosis = cli.diagnosis.build(seed);
            let policy = RecoveryPolicy::new(strategy, diagnosis, memory_bank.clone());
            let runner = Runner::new(&registry, policy, seed, cli.saga, Arc::new(RealClock), BudgetLimits::default());
            let mut trace = InMemoryTraceStore::new();
            let outcome = runner.run_task(&task, &mut trace);
            let events = trace.list(&task.task_id);
            (task, events, outcome)
        })
        .collect();

    let mut all_events = Vec::new();
    let mut fatal: Option<EngineError> = None;
    for (task, events, outcome) in results {
        match outcome {
            Ok(o) => {
                log::info!("task {} finished: {:?}", task.task_id, o);
                all_events.extend(events);
            }
            Err(EngineError::UnknownTool(tool)) => {
                log::error!("task {} skipped: unknown tool {tool}", task.task_id);
            }
            Err(other) => {
                fatal = Some(other);
                break;
            }
        }
    }
    if let Some(err) = fatal {
        return Err(CliError::Engine { task_id: "<run>".to_string(), source: err });
    }

    let trace_out = cli.trace_out.clone().unwrap_or_else(|| default_trace_path(&cli.tasks));
    let mut sink = FileTraceStore::create(&trace_out).map_err(CliError::TraceOut)?;
    for event in &all_events {
        sink.append(event.clone());
    }
    log::info!("wrote {} trace event(s) to {}", all_events.len(), trace_out.display());

    let report = fl_metrics::reduce(&all_events);
    report::print_summary(&report);

    Ok(0)
}

fn default_trace_path(tasks_path: &std::path::Path) -> PathBuf {
    let stem = tasks_path.file_stem().and_then(|s| s.to_str()).unwrap_or("run");
    tasks_path.with_file_name(format!("{stem}.trace.jsonl"))
}
