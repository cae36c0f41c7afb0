//! Node identity.
//!
//! [`Identity`] is the resolved set of facts about the running node. It is
//! produced once during startup and then only read: share it by reference or
//! behind an `Arc`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Resolved facts about the running node.
///
/// `datacenter` and `rack` are never empty once an `Identity` has been
/// handed out by the topology resolver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Top-level topology grouping, usually the cloud region.
    pub datacenter: String,
    /// Replication unit within the datacenter.
    pub rack: String,
    /// Availability zones the cluster spans, in preference order.
    pub zones: Vec<String>,
    /// The node's own availability zone, as reported at boot.
    pub zone: Option<String>,
    pub public_hostname: Option<String>,
    pub public_ip: Option<String>,
    pub instance_id: Option<String>,
    pub instance_type: Option<String>,
    pub auto_scaling_group: Option<String>,
    pub vpc_id: Option<String>,
}

impl Identity {
    /// Construct an identity with only placement information.
    pub fn new(datacenter: impl Into<String>, rack: impl Into<String>) -> Self {
        Self {
            datacenter: datacenter.into(),
            rack: rack.into(),
            zones: Vec::new(),
            zone: None,
            public_hostname: None,
            public_ip: None,
            instance_id: None,
            instance_type: None,
            auto_scaling_group: None,
            vpc_id: None,
        }
    }

    /// `(datacenter, rack)`, the key into a membership document.
    pub fn placement(&self) -> (&str, &str) {
        (&self.datacenter, &self.rack)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.datacenter, self.rack)?;
        if let Some(instance_id) = &self.instance_id {
            write!(f, " ({instance_id})")?;
        }
        Ok(())
    }
}
