//! Deterministic in-process execution environment
//!
//! Behaviour is driven by an [`EnvironmentScript`]: which artifacts exist,
//! which deployments fail, what every operation costs, which operations
//! revert and how long they take. Every request is journaled so callers can
//! check the order in which the harness issued them.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::trace;

use super::{ExecutionEnvironment, Receipt};
use crate::error::EnvError;
use crate::types::{Instance, ParamEncoding, Params, Variant};

/// Behaviour of the scripted environment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentScript {
    /// Fail the start-of-run probe
    #[serde(default)]
    pub unreachable: bool,
    /// Per-artifact behaviour, keyed by artifact name
    #[serde(default)]
    pub artifacts: BTreeMap<String, ArtifactScript>,
}

/// Behaviour of one deployable artifact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactScript {
    /// Reject deployment with this reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject_deploy: Option<String>,
    #[serde(default)]
    pub operations: BTreeMap<String, OperationScript>,
}

/// Behaviour of one operation on one artifact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperationScript {
    /// Cost of every call
    #[serde(default)]
    pub cost: u64,
    /// Cost of the nth call on an instance; the last entry repeats.
    /// Takes precedence over `cost` when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub costs: Vec<u64>,
    /// Revert every call with this reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject: Option<String>,
    /// Simulated processing time before the receipt is available
    #[serde(default)]
    pub latency_ms: u64,
    /// Required parameters and the encoding each must use
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, ParamEncoding>,
}

impl OperationScript {
    fn cost_for_call(&self, call: usize) -> u64 {
        match self.costs.last() {
            Some(last) => self.costs.get(call).copied().unwrap_or(*last),
            None => self.cost,
        }
    }

    fn check_params(&self, params: &Params) -> Result<(), String> {
        for (name, encoding) in &self.params {
            match params.get(name) {
                None => return Err(format!("missing parameter '{}'", name)),
                Some(value) if !encoding.accepts(value) => {
                    return Err(format!(
                        "parameter '{}' is not {} encoded: {}",
                        name,
                        encoding.as_str(),
                        value
                    ))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// A request the environment received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Deploy { variant: String },
    Invoke { variant: String, operation: String },
}

/// One journaled request with its service window.
///
/// Requests are journaled on arrival. `finished` stays `None` when the
/// caller abandoned the request before a receipt was produced.
#[derive(Debug, Clone)]
pub struct JournalEntry {
    pub seq: u64,
    pub request: Request,
    pub started: Instant,
    pub finished: Option<Instant>,
}

struct DeployedInstance {
    artifact: String,
    calls: HashMap<String, usize>,
}

#[derive(Default)]
struct State {
    next_seq: u64,
    next_address: u64,
    instances: HashMap<String, DeployedInstance>,
    journal: Vec<JournalEntry>,
}

/// Scripted environment context. Create one per run.
pub struct ScriptedEnvironment {
    script: EnvironmentScript,
    state: Mutex<State>,
}

impl ScriptedEnvironment {
    pub fn new(script: EnvironmentScript) -> Self {
        Self {
            script,
            state: Mutex::new(State::default()),
        }
    }

    /// Requests received so far, in arrival order
    pub fn journal(&self) -> Vec<JournalEntry> {
        self.state().journal.clone()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // State is only mutated in short non-panicking sections
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn begin(&self, request: Request) -> u64 {
        let mut state = self.state();
        let seq = state.next_seq;
        state.next_seq += 1;
        trace!(seq, request = ?request, "scripted request received");
        state.journal.push(JournalEntry {
            seq,
            request,
            started: Instant::now(),
            finished: None,
        });
        seq
    }

    fn finish(&self, seq: u64) {
        let mut state = self.state();
        if let Some(entry) = state.journal.iter_mut().rev().find(|e| e.seq == seq) {
            entry.finished = Some(Instant::now());
        }
    }
}

#[async_trait]
impl ExecutionEnvironment for ScriptedEnvironment {
    async fn probe(&self) -> Result<(), EnvError> {
        if self.script.unreachable {
            return Err(EnvError::Unreachable("scripted environment marked unreachable".to_string()));
        }
        Ok(())
    }

    async fn deploy(&self, variant: &Variant) -> Result<Instance, EnvError> {
        let seq = self.begin(Request::Deploy {
            variant: variant.name.clone(),
        });
        let artifact = &variant.recipe.artifact;

        let result = match self.script.artifacts.get(artifact) {
            None => Err(EnvError::DeployRejected(format!("artifact '{}' not found", artifact))),
            Some(ArtifactScript {
                reject_deploy: Some(reason),
                ..
            }) => Err(EnvError::DeployRejected(reason.clone())),
            Some(_) => {
                let mut state = self.state();
                state.next_address += 1;
                let address = format!("0x{:040x}", 0x5fb_d000u64 + state.next_address);
                state.instances.insert(
                    address.clone(),
                    DeployedInstance {
                        artifact: artifact.clone(),
                        calls: HashMap::new(),
                    },
                );
                Ok(Instance {
                    variant: variant.name.clone(),
                    artifact: artifact.clone(),
                    address,
                })
            }
        };

        self.finish(seq);
        result
    }

    async fn invoke(
        &self,
        instance: &Instance,
        operation: &str,
        params: &Params,
    ) -> Result<Receipt, EnvError> {
        let seq = self.begin(Request::Invoke {
            variant: instance.variant.clone(),
            operation: operation.to_string(),
        });

        let lookup = {
            let mut state = self.state();
            let found = state.instances.get_mut(&instance.address).map(|deployed| {
                let script = self
                    .script
                    .artifacts
                    .get(&deployed.artifact)
                    .and_then(|artifact| artifact.operations.get(operation));
                let calls = deployed.calls.entry(operation.to_string()).or_insert(0);
                let call = *calls;
                *calls += 1;
                (script, call)
            });
            found
        };
        let Some((script, call)) = lookup else {
            self.finish(seq);
            return Err(EnvError::UnknownInstance(instance.address.clone()));
        };

        let receipt = match script {
            None => Receipt::reverted(format!(
                "operation '{}' not supported by {}",
                operation, instance.artifact
            )),
            Some(script) => {
                if script.latency_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(script.latency_ms)).await;
                }
                match (&script.reject, script.check_params(params)) {
                    (Some(reason), _) => Receipt::reverted(reason.clone()),
                    (None, Err(reason)) => Receipt::reverted(reason),
                    (None, Ok(())) => Receipt::committed(script.cost_for_call(call)),
                }
            }
        };

        self.finish(seq);
        Ok(receipt)
    }
}
