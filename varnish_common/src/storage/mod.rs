//! Storage specification parsing, validation and normalization.
//!
//! - `size`: `SizeSpec` quantities and canonical unit rendering.
//! - `mountpoint`: `Mountpoints` table with longest-prefix capacity lookup.
//! - `spec`: `StorageSpec` (`malloc` / `file` / `persistent`).
//! - `error`: `StorageSpecError`.

pub mod error;
pub mod mountpoint;
pub mod size;
pub mod spec;

pub use error::{StorageResult, StorageSpecError};
pub use mountpoint::Mountpoints;
pub use size::{Magnitude, SizeSpec, SizeUnit};
pub use spec::{StorageContext, StorageKind, StorageSpec};
