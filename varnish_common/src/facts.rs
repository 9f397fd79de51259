//! Host facts consumed by storage validation.
//!
//! The fact collector publishes total memory as `memorysize_mb` and one
//! `mountpoint_<id>_path` / `mountpoint_<id>_size` pair per mounted device.
//! [`HostFacts::from_flat`] folds that flat key space into a typed
//! [`Mountpoints`] table once, so nothing downstream scans fact names.
//!
//! Two on-disk forms are accepted:
//!
//! ```toml
//! memorysize_mb = 16384.0
//!
//! [mountpoints]
//! "/var/tmp" = 10737418240
//! ```
//!
//! or a facter-style flat JSON object:
//!
//! ```json
//! { "memorysize_mb": "16384.00", "mountpoint_dev_sda1_path": "/var/tmp",
//!   "mountpoint_dev_sda1_size": "10737418240" }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::config::{ConfigError, ConfigLoader};
use crate::consts::{BYTES_PER_MB, MEMORY_FACT, MOUNTPOINT_FACT_PREFIX};
use crate::storage::{Mountpoints, StorageContext};

/// Errors raised while interpreting fact data.
#[derive(Debug, Error)]
pub enum FactsError {
    /// Fact document is not valid JSON.
    #[error("invalid fact JSON: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// Fact document is not a JSON object.
    #[error("fact document must be an object of name/value pairs")]
    NotAnObject,

    /// Required fact is absent.
    #[error("missing fact: {name}")]
    MissingFact { name: String },

    /// Fact value has the wrong shape.
    #[error("invalid value for fact {name}: {value}")]
    InvalidValue { name: String, value: String },

    /// Mountpoint has a path without a size, or a size without a path.
    #[error("incomplete mountpoint facts for '{id}': both _path and _size are required")]
    IncompleteMountpoint { id: String },
}

/// Memory size and mountpoint capacities of one host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostFacts {
    /// Total memory in megabytes, as reported by the fact collector.
    pub memorysize_mb: f64,

    /// Mountpoint path to raw device capacity in bytes.
    #[serde(default)]
    pub mountpoints: Mountpoints,
}

impl HostFacts {
    pub fn new(memorysize_mb: f64, mountpoints: Mountpoints) -> Self {
        Self {
            memorysize_mb,
            mountpoints,
        }
    }

    /// Validate the facts.
    ///
    /// # Errors
    ///
    /// Returns `FactsError::InvalidValue` if `memorysize_mb` is negative or
    /// not finite.
    pub fn validate(&self) -> Result<(), FactsError> {
        if !self.memorysize_mb.is_finite() || self.memorysize_mb < 0.0 {
            return Err(FactsError::InvalidValue {
                name: MEMORY_FACT.to_string(),
                value: self.memorysize_mb.to_string(),
            });
        }
        Ok(())
    }

    /// Build facts from a flat name/value fact map.
    ///
    /// Values may be strings or numbers. Unrelated facts are ignored.
    pub fn from_flat(facts: &Map<String, Value>) -> Result<Self, FactsError> {
        let memory = facts.get(MEMORY_FACT).ok_or_else(|| FactsError::MissingFact {
            name: MEMORY_FACT.to_string(),
        })?;
        let memorysize_mb = fact_f64(MEMORY_FACT, memory)?;

        let mut paths: BTreeMap<&str, String> = BTreeMap::new();
        let mut sizes: BTreeMap<&str, u64> = BTreeMap::new();
        for (name, value) in facts {
            let Some(rest) = name.strip_prefix(MOUNTPOINT_FACT_PREFIX) else {
                continue;
            };
            if let Some(id) = rest.strip_suffix("_path") {
                let path = value.as_str().ok_or_else(|| invalid(name, value))?;
                paths.insert(id, path.to_string());
            } else if let Some(id) = rest.strip_suffix("_size") {
                sizes.insert(id, fact_bytes(name, value)?);
            }
        }

        let mut mountpoints = Mountpoints::new();
        for (id, path) in paths {
            let size = sizes
                .remove(id)
                .ok_or_else(|| FactsError::IncompleteMountpoint { id: id.to_string() })?;
            debug!(id, path = %path, size, "mountpoint fact");
            mountpoints.insert(path, size);
        }
        if let Some(id) = sizes.keys().next() {
            return Err(FactsError::IncompleteMountpoint { id: id.to_string() });
        }

        let facts = Self::new(memorysize_mb, mountpoints);
        facts.validate()?;
        Ok(facts)
    }

    /// Parse a flat facter-style JSON object.
    pub fn from_json(text: &str) -> Result<Self, FactsError> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => Self::from_flat(&map),
            _ => Err(FactsError::NotAnObject),
        }
    }

    /// Load facts from `path`: flat JSON for `.json` files, structured TOML
    /// otherwise.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let facts = if is_json {
            let text = std::fs::read_to_string(path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConfigError::FileNotFound
                } else {
                    ConfigError::ParseError(e.to_string())
                }
            })?;
            Self::from_json(&text).map_err(|e| ConfigError::ParseError(e.to_string()))?
        } else {
            <Self as ConfigLoader>::load(path)?
        };

        facts
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        Ok(facts)
    }
}

impl StorageContext for HostFacts {
    /// `memorysize_mb × 1024²`, truncated to whole bytes.
    fn memory_bytes(&self) -> u64 {
        (self.memorysize_mb * BYTES_PER_MB as f64) as u64
    }

    fn mountpoints(&self) -> &Mountpoints {
        &self.mountpoints
    }
}

fn invalid(name: &str, value: &Value) -> FactsError {
    FactsError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    }
}

fn fact_f64(name: &str, value: &Value) -> Result<f64, FactsError> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| invalid(name, value))
}

/// Byte counts may arrive as integers, floats or numeric strings.
fn fact_bytes(name: &str, value: &Value) -> Result<u64, FactsError> {
    if let Some(bytes) = value.as_u64() {
        return Ok(bytes);
    }
    if let Some(bytes) = value.as_str().and_then(|s| s.trim().parse::<u64>().ok()) {
        return Ok(bytes);
    }
    let bytes = fact_f64(name, value)?;
    if !bytes.is_finite() || bytes < 0.0 {
        return Err(invalid(name, value));
    }
    Ok(bytes as u64)
}
