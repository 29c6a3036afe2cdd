//! Endpoint registry types.
//!
//! The registry is a static, versionable list of monitored endpoints grouped
//! into display categories. Endpoint identity is the `name`; the group is a
//! display attribute and may change between runs without invalidating any
//! recorded history.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Registry error types.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("failed to read registry file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse registry file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate endpoint name: {0}")]
    DuplicateName(String),
}

/// A single monitored endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    pub target: String,
}

/// A named group of endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointGroup {
    pub group: String,
    pub endpoints: Vec<Endpoint>,
}

/// The full set of monitored endpoints, treated as an immutable parameter
/// for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registry {
    pub groups: Vec<EndpointGroup>,
}

impl Registry {
    /// Load and validate a registry from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RegistryError> {
        let raw = fs::read_to_string(path)?;
        let registry: Registry = serde_json::from_str(&raw)?;
        registry.validate()?;
        Ok(registry)
    }

    /// Reject duplicate endpoint names, since name is the stable identity
    /// that history extraction matches on.
    fn validate(&self) -> Result<(), RegistryError> {
        let mut seen = std::collections::HashSet::new();
        for group in &self.groups {
            for ep in &group.endpoints {
                if !seen.insert(ep.name.as_str()) {
                    return Err(RegistryError::DuplicateName(ep.name.clone()));
                }
            }
        }
        Ok(())
    }

    /// Total number of endpoints across all groups.
    pub fn endpoint_count(&self) -> usize {
        self.groups.iter().map(|g| g.endpoints.len()).sum()
    }
}
