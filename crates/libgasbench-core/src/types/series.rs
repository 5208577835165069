use serde::{Deserialize, Serialize};

/// How one invocation ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Committed,
    Rejected { reason: String },
    TimedOut { after_ms: u64 },
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Committed => "committed",
            Outcome::Rejected { .. } => "rejected",
            Outcome::TimedOut { .. } => "timed_out",
        }
    }
}

/// Result of applying one operation to one instance.
///
/// Failed results always carry a zero cost and must never be compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResult {
    pub operation: String,
    pub cost: u64,
    pub outcome: Outcome,
}

impl InvocationResult {
    pub fn committed(operation: impl Into<String>, cost: u64) -> Self {
        Self {
            operation: operation.into(),
            cost,
            outcome: Outcome::Committed,
        }
    }

    pub fn rejected(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            cost: 0,
            outcome: Outcome::Rejected {
                reason: reason.into(),
            },
        }
    }

    pub fn timed_out(operation: impl Into<String>, after_ms: u64) -> Self {
        Self {
            operation: operation.into(),
            cost: 0,
            outcome: Outcome::TimedOut { after_ms },
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Committed
    }

    /// Cost, if the invocation committed
    pub fn committed_cost(&self) -> Option<u64> {
        self.is_success().then_some(self.cost)
    }
}

/// Why a series holds fewer committed results than the scenario has steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SeriesStatus {
    Complete,
    /// This variant failed at `step`; later steps were skipped for it
    Halted { step: usize },
    /// Another variant failed at `step` and the whole scenario stopped
    Aborted { step: usize, by: String },
    /// The variant never got an instance
    NotDeployed { reason: String },
}

impl SeriesStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesStatus::Complete => "complete",
            SeriesStatus::Halted { .. } => "halted",
            SeriesStatus::Aborted { .. } => "aborted",
            SeriesStatus::NotDeployed { .. } => "not_deployed",
        }
    }
}

/// Ordered invocation results for one variant across one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostSeries {
    pub variant: String,
    pub results: Vec<InvocationResult>,
    pub status: SeriesStatus,
}

impl CostSeries {
    pub fn new(variant: impl Into<String>) -> Self {
        Self {
            variant: variant.into(),
            results: Vec::new(),
            status: SeriesStatus::Complete,
        }
    }

    pub fn not_deployed(variant: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            variant: variant.into(),
            results: Vec::new(),
            status: SeriesStatus::NotDeployed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == SeriesStatus::Complete
    }

    pub fn result_at(&self, step: usize) -> Option<&InvocationResult> {
        self.results.get(step)
    }

    /// Committed cost at `step`, or None when the series has no usable value there
    pub fn cost_at(&self, step: usize) -> Option<u64> {
        self.result_at(step).and_then(InvocationResult::committed_cost)
    }
}
