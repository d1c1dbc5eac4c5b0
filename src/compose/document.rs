//! Typed model of the generated compose file
//!
//! Only the subset of the compose format that the stack actually emits
//! is modeled. Maps are ordered so serializing the same document twice
//! produces identical bytes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;

/// Top-level compose document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeDocument {
    /// Compose file format version
    pub version: String,
    /// Services keyed by name
    pub services: BTreeMap<String, ServiceDefinition>,
    /// Networks keyed by name
    pub networks: BTreeMap<String, NetworkDefinition>,
}

impl ComposeDocument {
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// One service entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceDefinition {
    /// Image reference
    pub image: String,
    /// Container command in exec form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    /// Environment as KEY=value entries, in insertion order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<String>,
    /// Port mappings in host:container short syntax
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    /// Bind mounts in host:container short syntax
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
    /// Startup dependencies with conditions
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub depends_on: BTreeMap<String, DependsOnCondition>,
    /// Container healthcheck
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<HealthcheckDefinition>,
    /// Networks the service joins
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<String>,
}

/// Startup condition for a dependency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependsOnCondition {
    /// Condition to wait for
    pub condition: String,
}

impl DependsOnCondition {
    pub fn healthy() -> Self {
        Self {
            condition: "service_healthy".to_string(),
        }
    }

    pub fn started() -> Self {
        Self {
            condition: "service_started".to_string(),
        }
    }
}

/// Healthcheck configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthcheckDefinition {
    /// Test command in exec form
    pub test: Vec<String>,
    /// Interval between probes
    pub interval: String,
    /// Per-probe timeout
    pub timeout: String,
    /// Failures before the container is marked unhealthy
    pub retries: u32,
}

/// One network entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkDefinition {
    /// Network driver
    pub driver: String,
}
