//! Typed accessors for the sidecar's settings.
//!
//! [`SidecarConfig`] is what the orchestration shell reads when it renders
//! the proxy and storage-engine configuration. Each accessor resolves on
//! every call; a few apply derivation rules on top of the raw setting.

use tracing::{error, warn};

use crate::catalog::{
    ardb, backup, datastore, discovery, dual_account, proxy, redis, token_store, topology, warm_up,
};
use crate::resolver::ConfigResolver;

/// Legacy environment variable for the cluster name.
const LEGACY_CLUSTER_NAME_ENV: &str = "NETFLIX_APP";
/// Legacy environment variable for the token-store seeds.
const LEGACY_SEEDS_ENV: &str = "DM_CASSANDRA_CLUSTER_SEEDS";

const ANY_ADDRESS: &str = "0.0.0.0";

/// Milliseconds the proxy waits before retrying a failed server.
pub const SERVER_RETRY_TIMEOUT_MS: u64 = 30_000;

/// How often snapshots are taken.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BackupSchedule {
    Day,
    Week,
}

impl BackupSchedule {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupSchedule::Day => "day",
            BackupSchedule::Week => "week",
        }
    }
}

/// Typed view over the setting catalog.
#[derive(Clone, Debug)]
pub struct SidecarConfig {
    resolver: ConfigResolver,
}

impl SidecarConfig {
    pub fn new(resolver: ConfigResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &ConfigResolver {
        &self.resolver
    }

    // Proxy
    // =====

    pub fn install_dir(&self) -> String {
        self.resolver.resolve(&proxy::INSTALL_DIR)
    }

    pub fn start_script(&self) -> String {
        self.resolver.resolve(&proxy::START_SCRIPT)
    }

    pub fn stop_script(&self) -> String {
        self.resolver.resolve(&proxy::STOP_SCRIPT)
    }

    /// The legacy environment variable still wins, with a deprecation warning.
    pub fn cluster_name(&self) -> String {
        if let Some(name) = self.resolver.env_var(LEGACY_CLUSTER_NAME_ENV) {
            warn!(
                "{LEGACY_CLUSTER_NAME_ENV} is deprecated, use {}",
                proxy::CLUSTER_NAME.env().unwrap_or_default()
            );
            return name;
        }
        self.resolver.resolve(&proxy::CLUSTER_NAME)
    }

    pub fn seed_provider(&self) -> String {
        self.resolver.resolve(&proxy::SEED_PROVIDER)
    }

    pub fn client_port(&self) -> u16 {
        self.resolver.resolve(&proxy::CLIENT_PORT)
    }

    pub fn peer_port(&self) -> u16 {
        self.resolver.resolve(&proxy::PEER_PORT)
    }

    /// Address the proxy accepts client connections on.
    pub fn client_listen_address(&self) -> String {
        format!("{ANY_ADDRESS}:{}", self.client_port())
    }

    /// Address the proxy accepts peer connections on.
    pub fn peer_listen_address(&self) -> String {
        format!("{ANY_ADDRESS}:{}", self.peer_port())
    }

    pub fn gossip_interval_ms(&self) -> u64 {
        self.resolver.resolve(&proxy::GOSSIP_INTERVAL)
    }

    pub fn hash_algorithm(&self) -> String {
        self.resolver.resolve(&proxy::HASH_ALGORITHM)
    }

    pub fn storage_preconnect(&self) -> bool {
        self.resolver.resolve(&proxy::STORAGE_PRECONNECT)
    }

    pub fn is_multi_dc(&self) -> bool {
        self.resolver.resolve(&proxy::MULTI_DC)
    }

    pub fn pem_key_file(&self) -> String {
        self.resolver.resolve(&proxy::PEM_KEY_FILE)
    }

    pub fn mbuf_size(&self) -> u32 {
        self.resolver.resolve(&proxy::MBUF_SIZE)
    }

    pub fn max_allocated_messages(&self) -> u32 {
        self.resolver.resolve(&proxy::MAX_ALLOCATED_MESSAGES)
    }

    pub fn process_name(&self) -> String {
        self.resolver.resolve(&proxy::PROCESS_NAME)
    }

    /// Relative paths are taken relative to the install dir.
    pub fn membership_yaml(&self) -> String {
        self.under_install_dir(self.resolver.resolve(&proxy::MEMBERSHIP_YAML))
    }

    /// Relative paths are taken relative to the install dir.
    pub fn proxy_yaml(&self) -> String {
        self.under_install_dir(self.resolver.resolve(&proxy::PROXY_YAML))
    }

    pub fn intra_cluster_security(&self) -> String {
        self.resolver.resolve(&proxy::INTRA_CLUSTER_SECURITY)
    }

    pub fn auto_eject_hosts(&self) -> bool {
        self.resolver.resolve(&proxy::AUTO_EJECT_HOSTS)
    }

    pub fn read_consistency(&self) -> String {
        self.resolver.resolve(&proxy::READ_CONSISTENCY)
    }

    pub fn write_consistency(&self) -> String {
        self.resolver.resolve(&proxy::WRITE_CONSISTENCY)
    }

    pub fn request_timeout_ms(&self) -> u64 {
        self.resolver.resolve(&proxy::REQUEST_TIMEOUT)
    }

    pub fn server_retry_timeout_ms(&self) -> u64 {
        SERVER_RETRY_TIMEOUT_MS
    }

    fn under_install_dir(&self, path: String) -> String {
        if path.starts_with('/') {
            path
        } else {
            format!("{}/{}", self.install_dir().trim_end_matches('/'), path)
        }
    }

    // Topology
    // ========

    /// Racks configured for the cluster. Not derived from membership.
    pub fn racks(&self) -> Vec<String> {
        self.resolver.resolve(&topology::RACKS_AVAILABLE)
    }

    /// Defaults to the cluster name.
    pub fn acl_group_name(&self) -> String {
        self.resolver
            .resolve(&topology::ACL_GROUP_NAME)
            .unwrap_or_else(|| self.cluster_name())
    }

    pub fn is_vpc(&self) -> bool {
        self.resolver.resolve(&topology::VPC)
    }

    // Dual account
    // ============

    pub fn ec2_role_assumption_arn(&self) -> Option<String> {
        self.resolver.resolve(&dual_account::EC2_ROLE_ASSUMPTION_ARN)
    }

    pub fn vpc_role_assumption_arn(&self) -> Option<String> {
        self.resolver.resolve(&dual_account::VPC_ROLE_ASSUMPTION_ARN)
    }

    pub fn is_dual_account(&self) -> bool {
        self.resolver.resolve(&dual_account::ENABLED)
    }

    // Warm up
    // =======

    pub fn is_force_warm(&self) -> bool {
        self.resolver.resolve(&warm_up::FORCE)
    }

    pub fn is_warm_bootstrap(&self) -> bool {
        self.resolver.resolve(&warm_up::BOOTSTRAP)
    }

    pub fn allowable_bytes_sync_diff(&self) -> u64 {
        self.resolver.resolve(&warm_up::ALLOWABLE_BYTES_SYNC_DIFF)
    }

    pub fn max_time_to_bootstrap_ms(&self) -> u64 {
        self.resolver.resolve(&warm_up::MAX_TIME_TO_BOOTSTRAP)
    }

    // Backup & restore
    // ================

    pub fn is_backup_enabled(&self) -> bool {
        self.resolver.resolve(&backup::ENABLED)
    }

    pub fn bucket_name(&self) -> String {
        self.resolver.resolve(&backup::BUCKET_NAME)
    }

    pub fn backup_location(&self) -> String {
        self.resolver.resolve(&backup::BASE_DIR)
    }

    pub fn backup_hour(&self) -> u32 {
        self.resolver.resolve(&backup::HOUR)
    }

    /// `None` when unset. Unrecognized values are logged and read as daily.
    pub fn backup_schedule(&self) -> Option<BackupSchedule> {
        let raw = self.resolver.resolve(&backup::SCHEDULE)?;
        match raw.as_str() {
            "day" => Some(BackupSchedule::Day),
            "week" => Some(BackupSchedule::Week),
            other => {
                error!(schedule = other, "backup schedule must be day or week, defaulting to day");
                Some(BackupSchedule::Day)
            }
        }
    }

    pub fn is_restore_enabled(&self) -> bool {
        self.resolver.resolve(&backup::RESTORE_ENABLED)
    }

    pub fn restore_date(&self) -> String {
        self.resolver.resolve(&backup::RESTORE_DATE)
    }

    // Token store
    // ===========

    pub fn token_store_cluster_name(&self) -> String {
        self.resolver.resolve(&token_store::CLUSTER_NAME)
    }

    pub fn token_store_keyspace(&self) -> String {
        self.resolver.resolve(&token_store::KEYSPACE_NAME)
    }

    /// The legacy environment variable still wins, with a deprecation warning.
    pub fn token_store_seeds(&self) -> String {
        if let Some(seeds) = self.resolver.env_var(LEGACY_SEEDS_ENV) {
            warn!(
                "{LEGACY_SEEDS_ENV} is deprecated, use {}",
                token_store::SEEDS.env().unwrap_or_default()
            );
            return seeds;
        }
        self.resolver.resolve(&token_store::SEEDS)
    }

    pub fn token_store_thrift_port(&self) -> u16 {
        self.resolver.resolve(&token_store::THRIFT_PORT)
    }

    // Storage engine
    // ==============

    pub fn datastore_engine(&self) -> String {
        self.resolver.resolve(&datastore::ENGINE)
    }

    pub fn datastore_max_memory_percent(&self) -> u32 {
        self.resolver.resolve(&datastore::MAX_MEMORY_PERCENT)
    }

    pub fn redis_conf(&self) -> String {
        self.resolver.resolve(&redis::CONF)
    }

    pub fn redis_data_dir(&self) -> String {
        self.resolver.resolve(&redis::DATA_DIR)
    }

    pub fn is_redis_persistence_enabled(&self) -> bool {
        self.resolver.resolve(&redis::PERSISTENCE_ENABLED)
    }

    pub fn redis_persistence_type(&self) -> String {
        self.resolver.resolve(&redis::PERSISTENCE_TYPE)
    }

    /// `aof` enables the append-only file, `rdb` disables it. Anything else
    /// is logged and treated as `rdb`.
    pub fn is_redis_aof_enabled(&self) -> bool {
        match self.redis_persistence_type().as_str() {
            "aof" => true,
            "rdb" => false,
            other => {
                error!(
                    persistence_type = other,
                    "redis persistence type must be aof or rdb, using rdb"
                );
                false
            }
        }
    }

    pub fn redis_start_script(&self) -> String {
        self.resolver.resolve(&redis::START_SCRIPT)
    }

    pub fn redis_stop_script(&self) -> String {
        self.resolver.resolve(&redis::STOP_SCRIPT)
    }

    pub fn ardb_conf(&self) -> String {
        self.resolver.resolve(&ardb::CONF)
    }

    pub fn ardb_max_write_buffer_number(&self) -> u32 {
        self.resolver.resolve(&ardb::MAX_WRITE_BUFFER_NUMBER)
    }

    pub fn ardb_min_write_buffers_to_merge(&self) -> u32 {
        self.resolver.resolve(&ardb::MIN_WRITE_BUFFERS_TO_MERGE)
    }

    pub fn ardb_write_buffer_size_mb(&self) -> u32 {
        self.resolver.resolve(&ardb::WRITE_BUFFER_SIZE)
    }

    pub fn ardb_start_script(&self) -> String {
        self.resolver.resolve(&ardb::START_SCRIPT)
    }

    pub fn ardb_stop_script(&self) -> String {
        self.resolver.resolve(&ardb::STOP_SCRIPT)
    }

    // Discovery
    // =========

    pub fn is_hosts_supplier_enabled(&self) -> bool {
        self.resolver.resolve(&discovery::HOSTS_SUPPLIER_ENABLED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{DynamicProperties, MapEnvironment};
    use std::sync::Arc;

    fn config(env: MapEnvironment, props: &[(&str, &str)]) -> SidecarConfig {
        let store = DynamicProperties::new();
        for (key, value) in props {
            store.set(*key, *value);
        }
        SidecarConfig::new(ConfigResolver::new(Arc::new(env), Arc::new(store)))
    }

    #[test]
    fn test_defaults() {
        let cfg = config(MapEnvironment::new(), &[]);
        assert_eq!(cfg.client_listen_address(), "0.0.0.0:8102");
        assert_eq!(cfg.peer_listen_address(), "0.0.0.0:8101");
        assert_eq!(cfg.read_consistency(), "DC_ONE");
        assert_eq!(cfg.backup_hour(), 12);
        assert_eq!(cfg.backup_schedule(), None);
        assert_eq!(cfg.datastore_max_memory_percent(), 85);
        assert!(cfg.is_redis_aof_enabled());
        assert!(cfg.racks().is_empty());
        assert_eq!(cfg.server_retry_timeout_ms(), 30_000);
    }

    #[test]
    fn test_relative_membership_path_joins_install_dir() {
        let cfg = config(
            MapEnvironment::new()
                .with("DM_DYNOMITE_INSTALL_DIR", "/opt/proxy/")
                .with("DM_DYNOMITE_MEMBERSHIP_YAML", "conf/members.yml"),
            &[],
        );
        assert_eq!(cfg.membership_yaml(), "/opt/proxy/conf/members.yml");
        assert_eq!(cfg.proxy_yaml(), "/apps/dynomite/conf/dynomite.yml");
    }

    #[test]
    fn test_legacy_cluster_name_wins() {
        let cfg = config(
            MapEnvironment::new()
                .with("NETFLIX_APP", "legacy")
                .with("DM_DYNOMITE_CLUSTER_NAME", "modern"),
            &[],
        );
        assert_eq!(cfg.cluster_name(), "legacy");
        assert_eq!(cfg.acl_group_name(), "legacy");
    }

    #[test]
    fn test_legacy_seeds_win() {
        let cfg = config(
            MapEnvironment::new().with("DM_CASSANDRA_CLUSTER_SEEDS", "10.0.0.1,10.0.0.2"),
            &[("dm.cassandra.seeds", "10.9.9.9")],
        );
        assert_eq!(cfg.token_store_seeds(), "10.0.0.1,10.0.0.2");
    }

    #[test]
    fn test_acl_group_name_override() {
        let cfg = config(MapEnvironment::new(), &[("dm.acl.groupname", "cache-sg")]);
        assert_eq!(cfg.acl_group_name(), "cache-sg");
    }

    #[test]
    fn test_backup_schedule_validation() {
        let weekly = config(MapEnvironment::new(), &[("dm.dyno.backup.schedule", "week")]);
        assert_eq!(weekly.backup_schedule(), Some(BackupSchedule::Week));

        let bogus = config(MapEnvironment::new(), &[("dm.dyno.backup.schedule", "hourly")]);
        assert_eq!(bogus.backup_schedule(), Some(BackupSchedule::Day));
    }

    #[test]
    fn test_redis_persistence_type() {
        let rdb = config(MapEnvironment::new(), &[("dm.redis.persistence.type", "rdb")]);
        assert!(!rdb.is_redis_aof_enabled());

        let bogus = config(MapEnvironment::new(), &[("dm.redis.persistence.type", "both")]);
        assert!(!bogus.is_redis_aof_enabled());
    }
}
