//! Varnish Common Library
//!
//! Validation and normalization of varnish storage specifications and
//! runtime option sets, shared by every configuration front end.
//!
//! # Module Structure
//!
//! - [`storage`] - Storage spec parsing, size units and mountpoint lookup
//! - [`runtime_options`] - Deduplicated, ordered `varnishd` flag set
//! - [`facts`] - Typed host facts (memory, mountpoint capacities)
//! - [`functions`] - `validate_storage_spec` / `normalize_storage_spec` adapters
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use varnish_common::prelude::*;
//!
//! let mounts: Mountpoints = [("/var/tmp", 10u64 << 30)].into_iter().collect();
//! let facts = HostFacts::new(16384.0, mounts);
//!
//! let spec = StorageSpec::parse("file,/var/tmp,5.5g,8192", &facts).unwrap();
//! assert_eq!(spec.to_string(), "file,/var/tmp,5632m,8k");
//! ```

pub mod config;
pub mod consts;
pub mod facts;
pub mod functions;
pub mod prelude;
pub mod runtime_options;
pub mod storage;
