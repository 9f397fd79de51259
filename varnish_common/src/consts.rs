//! Shared constants for the varnish configuration workspace.

/// Bytes per megabyte, for the `memorysize_mb` fact.
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Fact carrying total memory in megabytes.
pub const MEMORY_FACT: &str = "memorysize_mb";

/// Prefix of per-device `mountpoint_<id>_path` / `mountpoint_<id>_size` facts.
pub const MOUNTPOINT_FACT_PREFIX: &str = "mountpoint_";

/// Default `service_name` when the configuration omits one.
pub const DEFAULT_SERVICE_NAME: &str = "varnish-cfg";

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/varnish/varnish-cfg.toml";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mountpoint_prefix_matches_fact_names() {
        let name = "mountpoint_dev_sda1_path";
        assert!(name.starts_with(MOUNTPOINT_FACT_PREFIX));
        assert_eq!(BYTES_PER_MB, 1 << 20);
    }
}
