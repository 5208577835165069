//! Operation invocation

use std::time::Duration;

use tracing::{debug, warn};

use crate::env::{ExecutionEnvironment, Receipt, TxStatus};
use crate::types::{Instance, InvocationResult, Params};

/// Submits operations and waits for their definitive outcome.
///
/// Parameters are passed through untouched; callers supply the encoding
/// each variant expects.
pub struct Invoker<'a> {
    env: &'a dyn ExecutionEnvironment,
    timeout: Option<Duration>,
}

impl<'a> Invoker<'a> {
    pub fn new(env: &'a dyn ExecutionEnvironment, timeout: Option<Duration>) -> Self {
        Self { env, timeout }
    }

    /// Invoke one operation. Never fails: rejections, transport errors and
    /// timeouts all come back as failed results with zero cost.
    pub async fn invoke(&self, instance: &Instance, operation: &str, params: &Params) -> InvocationResult {
        let submitted = self.env.invoke(instance, operation, params);
        let response = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, submitted).await {
                Ok(response) => response,
                Err(_) => {
                    warn!(
                        variant = %instance.variant,
                        operation,
                        timeout_ms = limit.as_millis() as u64,
                        "Invocation timed out"
                    );
                    return InvocationResult::timed_out(operation, limit.as_millis() as u64);
                }
            },
            None => submitted.await,
        };

        match response {
            Ok(Receipt {
                status: TxStatus::Committed,
                cost,
            }) => {
                debug!(variant = %instance.variant, operation, cost, "Invocation committed");
                InvocationResult::committed(operation, cost)
            }
            Ok(Receipt {
                status: TxStatus::Reverted { reason },
                ..
            }) => {
                warn!(variant = %instance.variant, operation, %reason, "Invocation rejected");
                InvocationResult::rejected(operation, reason)
            }
            Err(err) => {
                warn!(variant = %instance.variant, operation, error = %err, "Invocation failed");
                InvocationResult::rejected(operation, err.to_string())
            }
        }
    }
}
