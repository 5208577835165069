//! Execution environment seam
//!
//! The harness never looks inside an environment. It asks for deployments
//! and invocations and gets back addresses, receipts or errors.

pub mod scripted;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EnvError;
use crate::types::{Instance, Params, Variant};

pub use scripted::{ArtifactScript, EnvironmentScript, JournalEntry, OperationScript, Request, ScriptedEnvironment};

/// Commit status of a submitted operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TxStatus {
    Committed,
    Reverted { reason: String },
}

/// Definitive outcome of one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub status: TxStatus,
    pub cost: u64,
}

impl Receipt {
    pub fn committed(cost: u64) -> Self {
        Self {
            status: TxStatus::Committed,
            cost,
        }
    }

    pub fn reverted(reason: impl Into<String>) -> Self {
        Self {
            status: TxStatus::Reverted {
                reason: reason.into(),
            },
            cost: 0,
        }
    }
}

/// Capability set every execution environment provides
#[async_trait]
pub trait ExecutionEnvironment: Send + Sync {
    /// Check the environment can accept requests at all
    async fn probe(&self) -> Result<(), EnvError>;

    /// Instantiate a variant and return its handle once ready
    async fn deploy(&self, variant: &Variant) -> Result<Instance, EnvError>;

    /// Submit an operation and wait until it is committed or reverted
    async fn invoke(
        &self,
        instance: &Instance,
        operation: &str,
        params: &Params,
    ) -> Result<Receipt, EnvError>;
}
