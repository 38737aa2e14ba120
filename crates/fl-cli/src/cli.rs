//! Command-line surface: strategy/task-file/seed/diagnosis-backend/memory
//! selection for a single `faultline` invocation.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use fl_policies::Strategy;
use fl_providers::{DiagnosisClassifier, ExternalBackend, HeuristicBackend};

#[derive(Parser, Debug)]
#[command(name = "faultline")]
#[command(about = "Fault-recovery strategy harness: runs tasks under a budget and a recovery policy, then reduces the trace to recovery-quality metrics")]
#[command(version)]
pub struct Cli {
    /// Recovery strategy to evaluate.
    #[arg(long, value_enum)]
    pub strategy: StrategyArg,

    /// Line-delimited task-descriptor file.
    #[arg(long)]
    pub tasks: PathBuf,

    /// Process-wide seed; falls back to FAULTLINE_SEED, then a fixed default.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Diagnosis classifier backend used by B3/B4.
    #[arg(long, value_enum, default_value = "heuristic")]
    pub diagnosis: DiagnosisArg,

    /// Memory-bank file, required by B4; falls back to FAULTLINE_MEMORY_PATH.
    #[arg(long)]
    pub memory: Option<PathBuf>,

    /// Enable saga-style compensation on rollback (vs. plain checkpoint reset).
    #[arg(long)]
    pub saga: bool,

    /// Trace-log output path; defaults to "<tasks>.trace.jsonl".
    #[arg(long)]
    pub trace_out: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum StrategyArg {
    B0,
    B1,
    B2,
    B3,
    B4,
}

impl From<StrategyArg> for Strategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::B0 => Strategy::B0,
            StrategyArg::B1 => Strategy::B1,
            StrategyArg::B2 => Strategy::B2,
            StrategyArg::B3 => Strategy::B3,
            StrategyArg::B4 => Strategy::B4,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum DiagnosisArg {
    Heuristic,
    External,
}

impl DiagnosisArg {
    pub fn build(self, seed: u64) -> Box<dyn DiagnosisClassifier> {
        match self {
            DiagnosisArg::Heuristic => Box::new(HeuristicBackend::new(seed)),
            DiagnosisArg::External => Box::new(ExternalBackend),
        }
    }
}
