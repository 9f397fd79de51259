//! Prelude module for common re-exports.
//!
//! ```rust
//! use varnish_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig, VarnishConfig};

// ─── Facts ──────────────────────────────────────────────────────────
pub use crate::facts::{FactsError, HostFacts};

// ─── Storage ────────────────────────────────────────────────────────
pub use crate::storage::{
    Mountpoints, SizeSpec, SizeUnit, StorageContext, StorageKind, StorageSpec, StorageSpecError,
};

// ─── Runtime Options ────────────────────────────────────────────────
pub use crate::runtime_options::RuntimeOptionSet;

// ─── Functions ──────────────────────────────────────────────────────
pub use crate::functions::{FunctionError, normalize_storage_spec, validate_storage_spec};
