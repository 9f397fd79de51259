//! Subcommand implementations.
//!
//! Each command returns a report value; `main` decides how to print it.

use serde::Serialize;
use tracing::{debug, info};
use varnish_common::prelude::*;

use crate::error::CliResult;

/// Result of validating one storage spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidateReport {
    pub spec: String,
    pub valid: bool,
}

/// Result of normalizing one storage spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub spec: String,
    pub normalized: String,
}

/// Rendered runtime option set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionsReport {
    pub options: Vec<String>,
    pub args: String,
}

impl From<&RuntimeOptionSet> for OptionsReport {
    fn from(set: &RuntimeOptionSet) -> Self {
        Self {
            options: set.iter().map(str::to_string).collect(),
            args: set.to_args_string(),
        }
    }
}

/// Validate every spec. Stops at the first invalid one.
pub fn validate(specs: &[String], facts: &HostFacts) -> CliResult<Vec<ValidateReport>> {
    specs
        .iter()
        .map(|spec| -> CliResult<ValidateReport> {
            validate_storage_spec(std::slice::from_ref(spec), facts)?;
            debug!(spec = %spec, "storage spec valid");
            Ok(ValidateReport {
                spec: spec.clone(),
                valid: true,
            })
        })
        .collect()
}

/// Normalize every spec. Stops at the first invalid one.
pub fn normalize(specs: &[String], facts: &HostFacts) -> CliResult<Vec<NormalizeReport>> {
    specs
        .iter()
        .map(|spec| -> CliResult<NormalizeReport> {
            let normalized = normalize_storage_spec(std::slice::from_ref(spec), facts)?;
            debug!(spec = %spec, normalized = %normalized, "storage spec normalized");
            Ok(NormalizeReport {
                spec: spec.clone(),
                normalized,
            })
        })
        .collect()
}

/// Build an option set from configured options followed by `extra`.
pub fn options(configured: &[String], extra: &[String]) -> RuntimeOptionSet {
    let set: RuntimeOptionSet = configured.iter().chain(extra).collect();
    let given = configured.len() + extra.len();
    info!(entries = set.len(), given, "runtime options built");
    set
}

/// Merge the configured runtime options with one `-s` option per
/// normalized storage spec.
pub fn render(config: &VarnishConfig, facts: &HostFacts) -> CliResult<RuntimeOptionSet> {
    let mut set = options(&config.runtime.options, &[]);
    for report in normalize(&config.storage.specs, facts)? {
        set.add(&format!("-s {}", report.normalized));
    }
    Ok(set)
}
