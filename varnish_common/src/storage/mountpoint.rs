//! Mountpoint capacity table and longest-prefix resolution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{StorageResult, StorageSpecError};

/// Mapping of absolute mountpoint path to raw device capacity in bytes.
///
/// Supplied by the fact collector; this type performs no I/O.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mountpoints(BTreeMap<String, u64>);

impl Mountpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a mountpoint.
    pub fn insert(&mut self, path: impl Into<String>, capacity: u64) -> Option<u64> {
        self.0.insert(path.into(), capacity)
    }

    pub fn get(&self, path: &str) -> Option<u64> {
        self.0.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(path, size)| (path.as_str(), *size))
    }

    /// Capacity of the most specific mountpoint containing `path`.
    ///
    /// Matching is a plain string prefix test, not aligned to path
    /// segments: `/var/t` contains `/var/tmp/x`.
    ///
    /// # Errors
    ///
    /// Returns `StorageSpecError::UnableToFindMountpoint` if no mountpoint is
    /// a prefix of `path`.
    pub fn resolve_capacity(&self, path: &str) -> StorageResult<u64> {
        let (mountpoint, capacity) = self
            .iter()
            .filter(|(mountpoint, _)| path.starts_with(mountpoint))
            .max_by_key(|(mountpoint, _)| mountpoint.len())
            .ok_or_else(|| StorageSpecError::UnableToFindMountpoint {
                path: path.to_string(),
            })?;

        debug!(path, mountpoint, capacity, "resolved mountpoint");
        Ok(capacity)
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for Mountpoints {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<K: Into<String>> Extend<(K, u64)> for Mountpoints {
    fn extend<I: IntoIterator<Item = (K, u64)>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(|(k, v)| (k.into(), v)));
    }
}
