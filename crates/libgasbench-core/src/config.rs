//! Suite configuration loaded from TOML

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::env::EnvironmentScript;
use crate::error::{BenchError, Result};
use crate::scenario::Scenario;
use crate::types::Variant;

/// What to do when a variant cannot be deployed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeployPolicy {
    /// Record the failure and keep deploying the remaining variants
    #[default]
    ContinueOnError,
    /// Abort the scenario on the first failed deployment
    FailFast,
}

/// What to do when a step fails for one variant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop only the failing variant's series
    #[default]
    HaltVariant,
    /// Stop every series at the failing step
    AbortScenario,
}

/// Run-level policy shared by every scenario in a suite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunPolicy {
    #[serde(default)]
    pub deploy_policy: DeployPolicy,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    /// Treat Inconclusive assertions as failures for the exit status
    #[serde(default)]
    pub inconclusive_fails: bool,
    /// Per-invocation time budget in milliseconds (0 = wait forever)
    #[serde(default = "default_invoke_timeout_ms")]
    pub invoke_timeout_ms: u64,
}

fn default_invoke_timeout_ms() -> u64 {
    30_000
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self {
            deploy_policy: DeployPolicy::default(),
            failure_policy: FailurePolicy::default(),
            inconclusive_fails: false,
            invoke_timeout_ms: default_invoke_timeout_ms(),
        }
    }
}

impl RunPolicy {
    pub fn invoke_timeout(&self) -> Option<Duration> {
        (self.invoke_timeout_ms > 0).then(|| Duration::from_millis(self.invoke_timeout_ms))
    }
}

/// A complete benchmark suite: variants, policy, environment script and scenarios
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteConfig {
    #[serde(default)]
    pub run: RunPolicy,
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub environment: EnvironmentScript,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

impl SuiteConfig {
    /// Load and validate a suite file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse, expand parameter directives and validate
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: SuiteConfig = toml::from_str(content)?;
        config.expand_directives()?;
        config.validate()?;
        Ok(config)
    }

    /// Replace `{ bytes32 = ".." }` parameter directives with encoded words.
    /// Already-encoded values are left alone, so this can run more than once.
    pub fn expand_directives(&mut self) -> Result<()> {
        for scenario in &mut self.scenarios {
            scenario.expand_directives()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.variants.is_empty() {
            return Err(BenchError::config("no variants configured"));
        }

        let mut names = HashSet::new();
        for variant in &self.variants {
            if variant.name.trim().is_empty() {
                return Err(BenchError::config("variant with empty name"));
            }
            if variant.recipe.artifact.trim().is_empty() {
                return Err(BenchError::config(format!(
                    "variant '{}' has no artifact",
                    variant.name
                )));
            }
            if !names.insert(variant.name.as_str()) {
                return Err(BenchError::config(format!(
                    "duplicate variant name '{}'",
                    variant.name
                )));
            }
        }

        let mut scenario_names = HashSet::new();
        for scenario in &self.scenarios {
            if !scenario_names.insert(scenario.name.as_str()) {
                return Err(BenchError::config(format!(
                    "duplicate scenario name '{}'",
                    scenario.name
                )));
            }
            scenario.validate(&self.variants)?;
        }
        Ok(())
    }

    pub fn scenario(&self, name: &str) -> Result<&Scenario> {
        self.scenarios
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| BenchError::UnknownScenario(name.to_string()))
    }
}
