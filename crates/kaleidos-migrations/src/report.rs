//! Summaries of what a run did.

use chrono::{DateTime, Utc};

/// Outcome of one step against one graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: &'static str,
    pub graph: String,
    /// Write requests issued.
    pub batches: usize,
    /// Entities converted.
    pub records: usize,
}

impl StepReport {
    pub fn new(step: &'static str, graph: impl Into<String>) -> Self {
        Self {
            step,
            graph: graph.into(),
            batches: 0,
            records: 0,
        }
    }
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub steps: Vec<StepReport>,
}

impl PipelineReport {
    /// Total entities converted across all steps.
    pub fn records(&self) -> usize {
        self.steps.iter().map(|s| s.records).sum()
    }

    /// Total write requests across all steps.
    pub fn batches(&self) -> usize {
        self.steps.iter().map(|s| s.batches).sum()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
