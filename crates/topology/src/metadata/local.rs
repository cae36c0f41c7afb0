use sidecar_core::catalog::local;
use sidecar_core::ConfigResolver;

use super::InstanceMetadata;

/// Identity facts supplied by configuration, for deployments without a
/// metadata endpoint. Network-interface facts are always absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalMetadata {
    zone: Option<String>,
    public_hostname: Option<String>,
    public_ip: Option<String>,
    instance_id: Option<String>,
    instance_type: Option<String>,
}

impl LocalMetadata {
    /// Read the `dm.local.*` settings.
    pub fn from_resolver(resolver: &ConfigResolver) -> Self {
        Self {
            zone: resolver.resolve(&local::ZONE),
            public_hostname: resolver.resolve(&local::HOSTNAME),
            public_ip: resolver.resolve(&local::IP),
            instance_id: resolver.resolve(&local::INSTANCE_ID),
            instance_type: resolver.resolve(&local::INSTANCE_TYPE),
        }
    }

    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.public_hostname = Some(hostname.into());
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.public_ip = Some(ip.into());
        self
    }

    pub fn with_instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = Some(instance_id.into());
        self
    }

    pub fn with_instance_type(mut self, instance_type: impl Into<String>) -> Self {
        self.instance_type = Some(instance_type.into());
        self
    }
}

impl InstanceMetadata for LocalMetadata {
    fn zone(&self) -> Option<String> {
        self.zone.clone()
    }

    fn public_hostname(&self) -> Option<String> {
        self.public_hostname.clone()
    }

    fn public_ip(&self) -> Option<String> {
        self.public_ip.clone()
    }

    fn instance_id(&self) -> Option<String> {
        self.instance_id.clone()
    }

    fn instance_type(&self) -> Option<String> {
        self.instance_type.clone()
    }

    fn mac(&self) -> Option<String> {
        None
    }

    fn vpc_id(&self) -> Option<String> {
        None
    }

    fn security_group_name(&self) -> Option<String> {
        None
    }
}
