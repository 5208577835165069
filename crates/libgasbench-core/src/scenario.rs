//! Scenario definitions

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::compare::AssertionSpec;
use crate::error::{BenchError, Result};
use crate::types::{expand_param_directives, merge_params, Params, Variant};

/// One operation applied to every variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    /// Unique label within the scenario (defaults to the operation name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub operation: String,
    /// Parameters sent to every variant. `{ bytes32 = ".." }` directives are
    /// expanded when the suite is loaded or handed to `Harness::new`.
    #[serde(default)]
    pub params: Params,
    /// Per-variant parameter overrides, keyed by variant name.
    /// This is where encoding differences between variants live.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<String, Params>,
}

impl Step {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            label: None,
            operation: operation.into(),
            params: Params::new(),
            overrides: BTreeMap::new(),
        }
    }

    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    pub fn override_param(
        mut self,
        variant: impl Into<String>,
        name: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        self.overrides
            .entry(variant.into())
            .or_default()
            .insert(name.into(), value);
        self
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.operation)
    }

    /// Parameters as the given variant expects them
    pub fn params_for(&self, variant: &str) -> Params {
        merge_params(&self.params, self.overrides.get(variant))
    }

    fn expand_directives(&mut self) -> Result<()> {
        for value in self.params.values_mut().chain(
            self.overrides
                .values_mut()
                .flat_map(|params| params.values_mut()),
        ) {
            *value = expand_param_directives(std::mem::take(value))?;
        }
        Ok(())
    }
}

/// Position and name of a step, as shown in reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepInfo {
    pub index: usize,
    pub label: String,
    pub operation: String,
}

/// Ordered operations applied to a common starting state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub steps: Vec<Step>,
    #[serde(default)]
    pub assertions: Vec<AssertionSpec>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            steps,
            assertions: Vec::new(),
        }
    }

    pub fn with_assertion(mut self, assertion: AssertionSpec) -> Self {
        self.assertions.push(assertion);
        self
    }

    pub fn step_infos(&self) -> Vec<StepInfo> {
        self.steps
            .iter()
            .enumerate()
            .map(|(index, step)| StepInfo {
                index,
                label: step.label().to_string(),
                operation: step.operation.clone(),
            })
            .collect()
    }

    pub fn step_index(&self, label: &str) -> Option<usize> {
        self.steps.iter().position(|step| step.label() == label)
    }

    pub(crate) fn expand_directives(&mut self) -> Result<()> {
        for step in &mut self.steps {
            step.expand_directives()?;
        }
        Ok(())
    }

    /// Check step labels, overrides and assertions against the variant set
    pub fn validate(&self, variants: &[Variant]) -> Result<()> {
        if self.steps.is_empty() {
            return Err(BenchError::config(format!("scenario '{}' has no steps", self.name)));
        }

        let mut labels = HashSet::new();
        for step in &self.steps {
            if step.operation.trim().is_empty() {
                return Err(BenchError::config(format!(
                    "scenario '{}' has a step without an operation",
                    self.name
                )));
            }
            if !labels.insert(step.label()) {
                return Err(BenchError::config(format!(
                    "scenario '{}' has duplicate step label '{}'; give repeated operations distinct labels",
                    self.name,
                    step.label()
                )));
            }
            for variant in step.overrides.keys() {
                if !variants.iter().any(|v| &v.name == variant) {
                    return Err(BenchError::config(format!(
                        "scenario '{}' step '{}' overrides unknown variant '{}'",
                        self.name,
                        step.label(),
                        variant
                    )));
                }
            }
        }

        crate::compare::resolve_assertions(self, variants).map(|_| ())
    }
}
