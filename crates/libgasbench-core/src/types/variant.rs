use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How to instantiate a variant in the execution environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Artifact (contract) name known to the environment
    pub artifact: String,
    /// Constructor arguments, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,
}

/// One implementation under comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    /// Unique, human-readable name used in reports
    pub name: String,
    #[serde(flatten)]
    pub recipe: Recipe,
}

impl Variant {
    pub fn new(name: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            recipe: Recipe {
                artifact: artifact.into(),
                args: Vec::new(),
            },
        }
    }
}

/// A deployed, addressable variant within one run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instance {
    pub variant: String,
    pub artifact: String,
    pub address: String,
}
