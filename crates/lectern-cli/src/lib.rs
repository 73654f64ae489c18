use clap::ValueEnum;
use lectern_core::reporter::{Reporter, WorkflowReporter};

pub mod commands;
pub mod pretty;

pub use pretty::PrettyReporter;

/// How progress is written to stdout
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ReportStyle {
    /// GitHub Actions workflow commands
    Workflow,
    /// Indented console output
    Pretty,
}

impl ReportStyle {
    pub fn reporter(&self) -> Box<dyn Reporter> {
        match self {
            ReportStyle::Workflow => Box::new(WorkflowReporter::stdout()),
            ReportStyle::Pretty => Box::new(PrettyReporter::new()),
        }
    }
}
