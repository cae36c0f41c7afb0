//! Instance identity facts.
//!
//! Every lookup is a point query returning `None` when the fact is not
//! available. Transport failures never reach the caller.

mod ec2;
mod local;

pub use ec2::{Ec2Metadata, DEFAULT_METADATA_URL};
pub use local::LocalMetadata;

/// Source of identity facts for the running instance.
pub trait InstanceMetadata: Send + Sync {
    /// Availability zone, e.g. `us-east-1a`.
    fn zone(&self) -> Option<String>;

    fn public_hostname(&self) -> Option<String>;

    fn public_ip(&self) -> Option<String>;

    fn instance_id(&self) -> Option<String>;

    fn instance_type(&self) -> Option<String>;

    /// MAC address of the primary network interface.
    fn mac(&self) -> Option<String>;

    fn vpc_id(&self) -> Option<String>;

    fn security_group_name(&self) -> Option<String>;

    /// Datacenter derived from [`zone`](Self::zone). Empty when the zone is
    /// unknown.
    fn datacenter(&self) -> String {
        self.zone().map(|zone| datacenter_from_zone(&zone)).unwrap_or_default()
    }
}

/// Strip the trailing zone letter: `us-east-1a` becomes `us-east-1`.
pub fn datacenter_from_zone(zone: &str) -> String {
    let mut chars = zone.chars();
    chars.next_back();
    chars.as_str().to_string()
}
