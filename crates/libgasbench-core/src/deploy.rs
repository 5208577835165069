//! Instance deployment

use tracing::{info, warn};

use crate::config::DeployPolicy;
use crate::env::ExecutionEnvironment;
use crate::error::{BenchError, Result};
use crate::types::{Instance, Variant};

/// Deployment outcome for one variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deployment {
    Ready(Instance),
    Failed { variant: String, reason: String },
}

impl Deployment {
    pub fn variant(&self) -> &str {
        match self {
            Deployment::Ready(instance) => &instance.variant,
            Deployment::Failed { variant, .. } => variant,
        }
    }

    pub fn instance(&self) -> Option<&Instance> {
        match self {
            Deployment::Ready(instance) => Some(instance),
            Deployment::Failed { .. } => None,
        }
    }
}

/// Deploy a single variant and wait until it is addressable
pub async fn deploy_variant(env: &dyn ExecutionEnvironment, variant: &Variant) -> Result<Instance> {
    let instance = env.deploy(variant).await.map_err(|e| BenchError::Deployment {
        variant: variant.name.clone(),
        reason: e.to_string(),
    })?;
    info!(
        variant = %variant.name,
        artifact = %variant.recipe.artifact,
        address = %instance.address,
        "Variant deployed"
    );
    Ok(instance)
}

/// Deploy every variant in order, one at a time.
///
/// Returns one entry per variant in the same order. Under
/// [`DeployPolicy::FailFast`] the first failure is returned as an error.
pub async fn deploy_all(
    env: &dyn ExecutionEnvironment,
    variants: &[Variant],
    policy: DeployPolicy,
) -> Result<Vec<Deployment>> {
    let mut deployments = Vec::with_capacity(variants.len());
    for variant in variants {
        match deploy_variant(env, variant).await {
            Ok(instance) => deployments.push(Deployment::Ready(instance)),
            Err(err) if policy == DeployPolicy::FailFast => return Err(err),
            Err(err) => {
                warn!(variant = %variant.name, error = %err, "Deployment failed, continuing");
                let reason = match err {
                    BenchError::Deployment { reason, .. } => reason,
                    other => other.to_string(),
                };
                deployments.push(Deployment::Failed {
                    variant: variant.name.clone(),
                    reason,
                });
            }
        }
    }
    Ok(deployments)
}
