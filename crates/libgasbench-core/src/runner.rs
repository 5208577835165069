//! Scenario runner - drives every step against every deployed variant
//!
//! Invocations are strictly sequential: within a step variants run in
//! configuration order, and a step finishes for every variant before the
//! next one starts.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{FailurePolicy, RunPolicy};
use crate::deploy::{deploy_all, Deployment};
use crate::env::ExecutionEnvironment;
use crate::error::{BenchError, Result};
use crate::invoke::Invoker;
use crate::scenario::{Scenario, StepInfo};
use crate::types::{CostSeries, SeriesStatus, Variant};

/// Every series collected for one scenario, in variant order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioRun {
    pub scenario: String,
    pub steps: Vec<StepInfo>,
    pub series: Vec<CostSeries>,
}

impl ScenarioRun {
    pub fn series_for(&self, variant: &str) -> Option<&CostSeries> {
        self.series.iter().find(|s| s.variant == variant)
    }

    /// Committed costs per variant, `None` where a step has no usable cost
    pub fn costs(&self, variant: &str) -> Option<Vec<Option<u64>>> {
        self.series_for(variant)
            .map(|series| (0..self.steps.len()).map(|step| series.cost_at(step)).collect())
    }
}

/// Runs scenarios against one execution environment context
pub struct ScenarioRunner<'a> {
    env: &'a dyn ExecutionEnvironment,
    policy: &'a RunPolicy,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(env: &'a dyn ExecutionEnvironment, policy: &'a RunPolicy) -> Self {
        Self { env, policy }
    }

    /// Deploy fresh instances of `variants` and replay `scenario` against them
    pub async fn run(&self, variants: &[Variant], scenario: &Scenario) -> Result<ScenarioRun> {
        self.env
            .probe()
            .await
            .map_err(|e| BenchError::EnvironmentUnreachable(e.to_string()))?;

        info!(
            scenario = %scenario.name,
            variants = variants.len(),
            steps = scenario.steps.len(),
            "Scenario starting"
        );

        let deployments = deploy_all(self.env, variants, self.policy.deploy_policy).await?;
        let mut series: Vec<CostSeries> = deployments
            .iter()
            .map(|deployment| match deployment {
                Deployment::Ready(instance) => CostSeries::new(&instance.variant),
                Deployment::Failed { variant, reason } => CostSeries::not_deployed(variant, reason),
            })
            .collect();

        let invoker = Invoker::new(self.env, self.policy.invoke_timeout());

        for (index, step) in scenario.steps.iter().enumerate() {
            let mut aborted_by = None;

            for (deployment, series) in deployments.iter().zip(series.iter_mut()) {
                let Some(instance) = deployment.instance() else {
                    continue;
                };
                if !series.is_complete() {
                    continue;
                }

                let params = step.params_for(&instance.variant);
                let result = invoker.invoke(instance, &step.operation, &params).await;
                let failed = !result.is_success();
                series.results.push(result);

                if failed {
                    warn!(
                        scenario = %scenario.name,
                        variant = %instance.variant,
                        step = step.label(),
                        "Series truncated"
                    );
                    series.status = SeriesStatus::Halted { step: index };
                    if self.policy.failure_policy == FailurePolicy::AbortScenario {
                        aborted_by = Some(instance.variant.clone());
                        break;
                    }
                }
            }

            if let Some(by) = aborted_by {
                warn!(scenario = %scenario.name, step = step.label(), variant = %by, "Scenario aborted");
                for other in series.iter_mut().filter(|s| s.is_complete()) {
                    other.status = SeriesStatus::Aborted {
                        step: index,
                        by: by.clone(),
                    };
                }
                break;
            }
        }

        info!(
            scenario = %scenario.name,
            complete = series.iter().filter(|s| s.is_complete()).count(),
            "Scenario finished"
        );

        Ok(ScenarioRun {
            scenario: scenario.name.clone(),
            steps: scenario.step_infos(),
            series,
        })
    }
}
