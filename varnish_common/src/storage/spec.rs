//! Storage specifications: `malloc[,size]`, `file[,path[,size[,granularity]]]`
//! and `persistent[,path[,size]]`.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{StorageResult, StorageSpecError};
use super::mountpoint::Mountpoints;
use super::size::SizeSpec;

// ─── StorageContext ─────────────────────────────────────────────────

/// Host data a storage spec is validated against.
///
/// Implemented by [`HostFacts`](crate::facts::HostFacts); tests and other
/// callers may supply their own.
pub trait StorageContext {
    /// Total memory in bytes (capacity for `malloc`).
    fn memory_bytes(&self) -> u64;

    /// Mountpoint table (capacity for `file` and `persistent`).
    fn mountpoints(&self) -> &Mountpoints;

    /// Absolute path check applied to `file`/`persistent` paths.
    fn is_absolute_path(&self, path: &str) -> bool {
        Path::new(path).is_absolute()
    }
}

// ─── StorageKind ────────────────────────────────────────────────────

/// Storage backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Malloc,
    File,
    Persistent,
}

impl StorageKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Malloc => "malloc",
            Self::File => "file",
            Self::Persistent => "persistent",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageKind {
    type Err = StorageSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "malloc" => Ok(Self::Malloc),
            "file" => Ok(Self::File),
            "persistent" => Ok(Self::Persistent),
            _ => Err(StorageSpecError::InvalidStorageType {
                kind: s.to_string(),
            }),
        }
    }
}

// ─── StorageSpec ────────────────────────────────────────────────────

/// A parsed and validated storage specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSpec {
    kind: StorageKind,
    path: Option<String>,
    size: Option<SizeSpec>,
    granularity: Option<SizeSpec>,
}

impl StorageSpec {
    /// Parse `spec` and validate every component against `ctx`.
    ///
    /// Tokens beyond those a kind accepts are ignored.
    ///
    /// # Errors
    ///
    /// - `InvalidStorageType` if the first token is not a known kind
    /// - `InvalidStoragePath` if a `file`/`persistent` path is not absolute
    /// - `UnableToFindMountpoint` if no mountpoint contains the path
    /// - `InvalidStorageSize` if a size or granularity is malformed or too large
    pub fn parse<C: StorageContext + ?Sized>(spec: &str, ctx: &C) -> StorageResult<Self> {
        let mut tokens: Vec<&str> = spec.split(',').collect();
        while tokens.len() > 1 && tokens.last().is_some_and(|t| t.is_empty()) {
            tokens.pop();
        }
        let mut tokens = tokens.into_iter();

        let kind: StorageKind = tokens.next().unwrap_or_default().parse()?;
        let mut parsed = Self {
            kind,
            path: None,
            size: None,
            granularity: None,
        };

        match kind {
            StorageKind::Malloc => {
                if let Some(size) = tokens.next() {
                    parsed.size = Some(SizeSpec::parse(size, ctx.memory_bytes())?);
                }
            }
            StorageKind::File | StorageKind::Persistent => {
                if let Some(path) = tokens.next() {
                    if !ctx.is_absolute_path(path) {
                        return Err(StorageSpecError::InvalidStoragePath {
                            path: path.to_string(),
                        });
                    }
                    parsed.path = Some(path.to_string());

                    if let Some(size) = tokens.next() {
                        let capacity = ctx.mountpoints().resolve_capacity(path)?;
                        parsed.size = Some(SizeSpec::parse(size, capacity)?);

                        if kind == StorageKind::File {
                            if let Some(granularity) = tokens.next() {
                                parsed.granularity = Some(SizeSpec::parse(granularity, capacity)?);
                            }
                        }
                    }
                }
            }
        }

        debug!(spec, normalized = %parsed, "parsed storage spec");
        Ok(parsed)
    }

    pub fn kind(&self) -> StorageKind {
        self.kind
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn size(&self) -> Option<&SizeSpec> {
        self.size.as_ref()
    }

    /// Allocation granularity (`file` only).
    pub fn granularity(&self) -> Option<&SizeSpec> {
        self.granularity.as_ref()
    }

    pub fn is_malloc(&self) -> bool {
        self.kind == StorageKind::Malloc
    }

    pub fn is_file(&self) -> bool {
        self.kind == StorageKind::File
    }

    pub fn is_persistent(&self) -> bool {
        self.kind == StorageKind::Persistent
    }

    /// Canonical comma-joined rendering.
    pub fn normalized(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for StorageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(path) = &self.path {
            write!(f, ",{path}")?;
        }
        if let Some(size) = &self.size {
            write!(f, ",{size}")?;
        }
        if let Some(granularity) = &self.granularity {
            write!(f, ",{granularity}")?;
        }
        Ok(())
    }
}
