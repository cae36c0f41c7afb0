//! Every tunable the sidecar knows about.
//!
//! Keys live under the `dm.` namespace; environment aliases use the `DM_`
//! prefix except for a few long-standing operational variables (`EC2_REGION`,
//! `ASG_NAME`). Settings without an alias can only be changed through the
//! property source.

use crate::setting::{AnySetting, Setting};

/// The proxy that fronts the storage engine.
pub mod proxy {
    use super::Setting;

    pub const INSTALL_DIR: Setting<String> =
        Setting::with_env("dm.dynomite.install.dir", "DM_DYNOMITE_INSTALL_DIR", "/apps/dynomite");
    pub const START_SCRIPT: Setting<String> = Setting::with_env(
        "dm.dynomite.start.script",
        "DM_DYNOMITE_START_SCRIPT",
        "/apps/dynomite/bin/launch_dynomite.sh",
    );
    pub const STOP_SCRIPT: Setting<String> = Setting::with_env(
        "dm.dynomite.stop.script",
        "DM_DYNOMITE_STOP_SCRIPT",
        "/apps/dynomite/bin/kill_dynomite.sh",
    );
    pub const CLUSTER_NAME: Setting<String> =
        Setting::with_env("dm.dynomite.cluster.name", "DM_DYNOMITE_CLUSTER_NAME", "dynomite_demo1");
    pub const SEED_PROVIDER: Setting<String> = Setting::with_env(
        "dm.dynomite.seed.provider",
        "DM_DYNOMITE_SEED_PROVIDER",
        "florida_provider",
    );
    pub const CLIENT_PORT: Setting<u16> =
        Setting::with_env("dm.dynomite.client.port", "DM_DYNOMITE_CLIENT_PORT", 8102);
    pub const PEER_PORT: Setting<u16> =
        Setting::with_env("dm.dynomite.peer.port", "DM_DYNOMITE_PEER_PORT", 8101);
    /// Milliseconds.
    pub const GOSSIP_INTERVAL: Setting<u64> =
        Setting::with_env("dm.dynomite.gossip.interval", "DM_DYNOMITE_GOSSIP_INTERVAL", 10_000);
    pub const HASH_ALGORITHM: Setting<String> =
        Setting::with_env("dm.dynomite.hash.algorithm", "DM_DYNOMITE_HASH_ALGORITHM", "murmur");
    pub const STORAGE_PRECONNECT: Setting<bool> =
        Setting::with_env("dm.dynomite.storage.preconnect", "DM_DYNOMITE_STORAGE_PRECONNECT", true);
    pub const MULTI_DC: Setting<bool> =
        Setting::with_env("dm.dynomite.multi.dc", "DM_DYNOMITE_MULTI_DC", true);
    pub const PEM_KEY_FILE: Setting<String> = Setting::with_env(
        "dm.dynomite.pem.key.file",
        "DM_DYNOMITE_PEM_KEY_FILE",
        "/apps/dynomite/conf/dynomite.pem",
    );
    pub const MBUF_SIZE: Setting<u32> =
        Setting::with_env("dm.dynomite.mbuf.size", "DM_DYNOMITE_MBUF_SIZE", 16_384);
    pub const MAX_ALLOCATED_MESSAGES: Setting<u32> = Setting::with_env(
        "dm.dynomite.max.allocated.messages",
        "DM_DYNOMITE_MAX_ALLOCATED_MESSAGES",
        200_000,
    );
    pub const PROCESS_NAME: Setting<String> =
        Setting::with_env("dm.dynomite.process.name", "DM_DYNOMITE_PROCESS_NAME", "dynomite");
    pub const MEMBERSHIP_YAML: Setting<String> = Setting::with_env(
        "dm.dynomite.membership.yaml",
        "DM_DYNOMITE_MEMBERSHIP_YAML",
        "/apps/dynomite/conf/membership.yml",
    );
    pub const PROXY_YAML: Setting<String> = Setting::with_env(
        "dm.dynomite.yaml",
        "DM_DYNOMITE_YAML",
        "/apps/dynomite/conf/dynomite.yml",
    );
    pub const INTRA_CLUSTER_SECURITY: Setting<String> = Setting::with_env(
        "dm.dynomite.intra.cluster.security",
        "DM_DYNOMITE_INTRA_CLUSTER_SECURITY",
        "datacenter",
    );
    pub const AUTO_EJECT_HOSTS: Setting<bool> =
        Setting::with_env("dm.dynomite.auto.eject.hosts", "DM_DYNOMITE_AUTO_EJECT_HOSTS", true);
    pub const READ_CONSISTENCY: Setting<String> =
        Setting::with_env("dm.dynomite.read.consistency", "DM_DYNOMITE_READ_CONSISTENCY", "DC_ONE");
    pub const WRITE_CONSISTENCY: Setting<String> = Setting::with_env(
        "dm.dynomite.write.consistency",
        "DM_DYNOMITE_WRITE_CONSISTENCY",
        "DC_ONE",
    );
    /// Milliseconds.
    pub const REQUEST_TIMEOUT: Setting<u64> = Setting::new("dm.dyno.request.timeout", 5_000);
}

/// Datacenter, rack and zone placement.
pub mod topology {
    use super::Setting;

    pub const RACK: Setting<String> = Setting::with_env("dm.dyno.rack", "DM_RACK", "RAC1");
    pub const USE_ASG_FOR_RACK: Setting<bool> =
        Setting::with_env("dm.dyno.asg.rack", "DM_USE_ASG_FOR_RACK_NAME", true);
    pub const ZONES_AVAILABLE: Setting<Vec<String>> = Setting::list("dm.zones.available", &[]);
    pub const RACKS_AVAILABLE: Setting<Vec<String>> = Setting::list("dm.racks.available", &[]);
    /// Final override of the datacenter. The effective default is computed at
    /// startup from `EC2_REGION` and instance metadata.
    pub const DATACENTER: Setting<String> =
        Setting::with_env("dm.az.region", "DM_DATACENTER", "dc1");
    /// Region override consulted before instance metadata.
    pub const REGION_OVERRIDE: Setting<Option<String>> =
        Setting::with_env("dm.ec2.region", "EC2_REGION", None);
    pub const ASG_NAME: Setting<Option<String>> =
        Setting::with_env("dm.az.asgname", "ASG_NAME", None);
    pub const ACL_GROUP_NAME: Setting<Option<String>> =
        Setting::with_env("dm.acl.groupname", "DM_ACL_GROUPNAME", None);
    pub const VPC: Setting<bool> = Setting::with_env("dm.vpc", "DM_VPC", false);
    /// One of `ec2-classic`, `ec2-default-vpc`, `ec2-vpc`, `local`.
    pub const DEPLOYMENT: Setting<String> =
        Setting::with_env("dm.deployment", "DM_DEPLOYMENT", "ec2-vpc");
}

/// Identity facts for deployments without an instance-metadata endpoint.
pub mod local {
    use super::Setting;

    pub const ZONE: Setting<Option<String>> =
        Setting::with_env("dm.local.zone", "DM_LOCAL_ZONE", None);
    pub const HOSTNAME: Setting<Option<String>> =
        Setting::with_env("dm.local.hostname", "DM_LOCAL_HOSTNAME", None);
    pub const IP: Setting<Option<String>> = Setting::with_env("dm.local.ip", "DM_LOCAL_IP", None);
    pub const INSTANCE_ID: Setting<Option<String>> =
        Setting::with_env("dm.local.instance.id", "DM_LOCAL_INSTANCE_ID", None);
    pub const INSTANCE_TYPE: Setting<Option<String>> =
        Setting::with_env("dm.local.instance.type", "DM_LOCAL_INSTANCE_TYPE", None);
}

/// Cross-account (dual account) operation.
pub mod dual_account {
    use super::Setting;

    pub const EC2_ROLE_ASSUMPTION_ARN: Setting<Option<String>> =
        Setting::new("dm.ec2.roleassumption.arn", None);
    pub const VPC_ROLE_ASSUMPTION_ARN: Setting<Option<String>> =
        Setting::new("dm.vpc.roleassumption.arn", None);
    pub const ENABLED: Setting<bool> = Setting::new("dm.roleassumption.dualaccount", false);
    /// Defaults to the local rack when unset.
    pub const RACK: Setting<Option<String>> = Setting::new("dm.roleassumption.az", None);
}

/// Cache warm-up from peers.
pub mod warm_up {
    use super::Setting;

    pub const FORCE: Setting<bool> =
        Setting::with_env("dm.dyno.warm.force", "DM_DYNO_WARM_FORCE", false);
    pub const BOOTSTRAP: Setting<bool> =
        Setting::with_env("dm.dyno.warm.bootstrap", "DM_DYNO_WARM_BOOTSTRAP", false);
    pub const ALLOWABLE_BYTES_SYNC_DIFF: Setting<u64> = Setting::with_env(
        "dm.dyno.warm.bytes.sync.diff",
        "DM_DYNO_WARM_BYTES_SYNC_DIFF",
        100_000,
    );
    /// Milliseconds.
    pub const MAX_TIME_TO_BOOTSTRAP: Setting<u64> = Setting::with_env(
        "dm.dyno.warm.msec.bootstraptime",
        "DM_DYNO_WARM_MSEC_BOOTSTRAPTIME",
        900_000,
    );
}

/// Snapshot backup and restore.
pub mod backup {
    use super::Setting;

    pub const ENABLED: Setting<bool> =
        Setting::with_env("dm.dyno.backup.snapshot.enabled", "DM_BACKUP_ENABLED", false);
    pub const BUCKET_NAME: Setting<String> = Setting::with_env(
        "dm.dyno.backup.bucket.name",
        "DM_DYNO_BACKUP_BUCKET_NAME",
        "dynomite-backup",
    );
    pub const BASE_DIR: Setting<String> =
        Setting::with_env("dm.dyno.backup.s3.base_dir", "DM_DYNO_BACKUP_S3_BASE_DIR", "backup");
    pub const HOUR: Setting<u32> =
        Setting::with_env("dm.dyno.backup.hour", "DM_DYNO_BACKUP_HOUR", 12);
    /// `day` or `week`.
    pub const SCHEDULE: Setting<Option<String>> =
        Setting::with_env("dm.dyno.backup.schedule", "DM_DYNO_BACKUP_SCHEDULE", None);
    pub const RESTORE_ENABLED: Setting<bool> = Setting::with_env(
        "dm.dyno.backup.restore.enabled",
        "DM_DYNO_BACKUP_RESTORE_ENABLED",
        false,
    );
    /// `yyyyMMdd`.
    pub const RESTORE_DATE: Setting<String> =
        Setting::with_env("dm.dyno.backup.restore.date", "DM_DYNO_BACKUP_RESTORE_DATE", "20101010");
}

/// The token store used for token management.
pub mod token_store {
    use super::Setting;

    pub const CLUSTER_NAME: Setting<String> =
        Setting::with_env("dm.cassandra.cluster.name", "DM_CASSANDRA_CLUSTER_NAME", "cass_dyno");
    pub const KEYSPACE_NAME: Setting<String> = Setting::with_env(
        "dm.cassandra.keyspace.name",
        "DM_CASSANDRA_KEYSPACE_NAME",
        "dyno_bootstrap",
    );
    /// Comma separated.
    pub const SEEDS: Setting<String> =
        Setting::with_env("dm.cassandra.seeds", "DM_CASSANDRA_SEEDS", "127.0.0.1");
    pub const THRIFT_PORT: Setting<u16> =
        Setting::with_env("dm.cassandra.thrift.port", "DM_CASSANDRA_THRIFT_PORT", 9160);
}

/// The storage engine behind the proxy.
pub mod datastore {
    use super::Setting;

    /// `redis` or `ardb`.
    pub const ENGINE: Setting<String> =
        Setting::with_env("dm.datastore.engine", "DM_DATASTORE_ENGINE", "redis");
    /// Share of system memory given to the storage engine.
    pub const MAX_MEMORY_PERCENT: Setting<u32> = Setting::with_env(
        "dm.datastore.max.memory.percent",
        "DM_DATASTORE_MAX_MEMORY_PERCENT",
        85,
    );
}

pub mod redis {
    use super::Setting;

    pub const CONF: Setting<String> =
        Setting::with_env("dm.redis.conf", "DM_REDIS_CONF", "/apps/nfredis/conf/redis.conf");
    pub const DATA_DIR: Setting<String> =
        Setting::with_env("dm.redis.data.dir", "DM_REDIS_DATA_DIR", "/mnt/data/nfredis");
    pub const PERSISTENCE_ENABLED: Setting<bool> =
        Setting::with_env("dm.redis.persistence.enabled", "DM_REDIS_PERSISTENCE_ENABLED", false);
    /// `aof` or `rdb`.
    pub const PERSISTENCE_TYPE: Setting<String> =
        Setting::with_env("dm.redis.persistence.type", "DM_REDIS_PERSISTENCE_TYPE", "aof");
    pub const START_SCRIPT: Setting<String> = Setting::with_env(
        "dm.redis.start.script",
        "DM_REDIS_START_SCRIPT",
        "/apps/nfredis/bin/launch_nfredis.sh",
    );
    pub const STOP_SCRIPT: Setting<String> = Setting::with_env(
        "dm.redis.stop.script",
        "DM_REDIS_STOP_SCRIPT",
        "/apps/nfredis/bin/kill_redis.sh",
    );
}

pub mod ardb {
    use super::Setting;

    pub const CONF: Setting<String> = Setting::with_env(
        "dm.ardb.rocksdb.conf",
        "DM_ARDB_ROCKSDB_CONF",
        "/apps/ardb/conf/rocksdb.conf",
    );
    pub const MAX_WRITE_BUFFER_NUMBER: Setting<u32> = Setting::with_env(
        "dm.ardb.rocksdb.max.write.buffer.number",
        "DM_ARDB_ROCKSDB_MAX_WRITE_BUFFER_NUMBER",
        16,
    );
    pub const MIN_WRITE_BUFFERS_TO_MERGE: Setting<u32> = Setting::with_env(
        "dm.ardb.rocksdb.min.write.buffer.number.to.merge",
        "DM_ARDB_ROCKSDB_MIN_WRITE_BUFFER_NUMBER_TO_MERGE",
        4,
    );
    /// Megabytes.
    pub const WRITE_BUFFER_SIZE: Setting<u32> = Setting::with_env(
        "dm.ardb.rocksdb.write.buffer.size",
        "DM_ARDB_ROCKSDB_WRITE_BUFFER_SIZE",
        128,
    );
    pub const START_SCRIPT: Setting<String> = Setting::with_env(
        "dm.ardb.rocksdb.start.script",
        "DM_ARDB_ROCKSDB_START_SCRIPT",
        "/apps/ardb/bin/launch_ardb.sh",
    );
    pub const STOP_SCRIPT: Setting<String> = Setting::with_env(
        "dm.ardb.rocksdb.stop.script",
        "DM_ARDB_ROCKSDB_STOP_SCRIPT",
        "/apps/ardb/bin/kill_ardb.sh",
    );
}

/// Host discovery through the service registry.
pub mod discovery {
    use super::Setting;

    pub const HOSTS_SUPPLIER_ENABLED: Setting<bool> = Setting::with_env(
        "dm.eureka.hosts.supplier.enabled",
        "DM_EUREKA_HOSTS_SUPPLIER_ENABLED",
        true,
    );
}

/// Every declared setting, in declaration order.
pub static ALL: &[&dyn AnySetting] = &[
    &proxy::INSTALL_DIR,
    &proxy::START_SCRIPT,
    &proxy::STOP_SCRIPT,
    &proxy::CLUSTER_NAME,
    &proxy::SEED_PROVIDER,
    &proxy::CLIENT_PORT,
    &proxy::PEER_PORT,
    &proxy::GOSSIP_INTERVAL,
    &proxy::HASH_ALGORITHM,
    &proxy::STORAGE_PRECONNECT,
    &proxy::MULTI_DC,
    &proxy::PEM_KEY_FILE,
    &proxy::MBUF_SIZE,
    &proxy::MAX_ALLOCATED_MESSAGES,
    &proxy::PROCESS_NAME,
    &proxy::MEMBERSHIP_YAML,
    &proxy::PROXY_YAML,
    &proxy::INTRA_CLUSTER_SECURITY,
    &proxy::AUTO_EJECT_HOSTS,
    &proxy::READ_CONSISTENCY,
    &proxy::WRITE_CONSISTENCY,
    &proxy::REQUEST_TIMEOUT,
    &topology::RACK,
    &topology::USE_ASG_FOR_RACK,
    &topology::ZONES_AVAILABLE,
    &topology::RACKS_AVAILABLE,
    &topology::DATACENTER,
    &topology::REGION_OVERRIDE,
    &topology::ASG_NAME,
    &topology::ACL_GROUP_NAME,
    &topology::VPC,
    &topology::DEPLOYMENT,
    &local::ZONE,
    &local::HOSTNAME,
    &local::IP,
    &local::INSTANCE_ID,
    &local::INSTANCE_TYPE,
    &dual_account::EC2_ROLE_ASSUMPTION_ARN,
    &dual_account::VPC_ROLE_ASSUMPTION_ARN,
    &dual_account::ENABLED,
    &dual_account::RACK,
    &warm_up::FORCE,
    &warm_up::BOOTSTRAP,
    &warm_up::ALLOWABLE_BYTES_SYNC_DIFF,
    &warm_up::MAX_TIME_TO_BOOTSTRAP,
    &backup::ENABLED,
    &backup::BUCKET_NAME,
    &backup::BASE_DIR,
    &backup::HOUR,
    &backup::SCHEDULE,
    &backup::RESTORE_ENABLED,
    &backup::RESTORE_DATE,
    &token_store::CLUSTER_NAME,
    &token_store::KEYSPACE_NAME,
    &token_store::SEEDS,
    &token_store::THRIFT_PORT,
    &datastore::ENGINE,
    &datastore::MAX_MEMORY_PERCENT,
    &redis::CONF,
    &redis::DATA_DIR,
    &redis::PERSISTENCE_ENABLED,
    &redis::PERSISTENCE_TYPE,
    &redis::START_SCRIPT,
    &redis::STOP_SCRIPT,
    &ardb::CONF,
    &ardb::MAX_WRITE_BUFFER_NUMBER,
    &ardb::MIN_WRITE_BUFFERS_TO_MERGE,
    &ardb::WRITE_BUFFER_SIZE,
    &ardb::START_SCRIPT,
    &ardb::STOP_SCRIPT,
    &discovery::HOSTS_SUPPLIER_ENABLED,
];

/// Look a setting up by its dotted key.
pub fn find(key: &str) -> Option<&'static dyn AnySetting> {
    ALL.iter().copied().find(|setting| setting.key() == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_keys_and_aliases_are_unique() {
        let mut keys = HashSet::new();
        let mut aliases = HashSet::new();
        for setting in ALL {
            assert!(keys.insert(setting.key()), "duplicate key {}", setting.key());
            if let Some(env) = setting.env() {
                assert!(aliases.insert(env), "duplicate env alias {env}");
            }
        }
    }

    #[test]
    fn test_keys_are_namespaced() {
        for setting in ALL {
            assert!(setting.key().starts_with("dm."), "{} is outside dm.", setting.key());
        }
    }

    #[test]
    fn test_find() {
        let port = find("dm.dynomite.client.port").unwrap();
        assert_eq!(port.env(), Some("DM_DYNOMITE_CLIENT_PORT"));
        assert_eq!(port.default_display(), "8102");
        assert!(find("dm.nope").is_none());
    }
}
