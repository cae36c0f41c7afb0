use std::path::Path;

use sidecar_core::catalog::topology;
use sidecar_core::ConfigResolver;
use tracing::{error, info};

use super::{Membership, MembershipDocument};
use crate::error::MembershipError;
use crate::resolver::Topology;

/// Membership read once from a static YAML document.
///
/// A missing or unreadable document yields an empty rack rather than an
/// error. Cross-account, ACL and expansion operations are unsupported.
#[derive(Debug, Clone)]
pub struct YamlMembership {
    config: ConfigResolver,
    datacenter: String,
    rack: String,
    members: Vec<String>,
}

impl YamlMembership {
    pub fn open(
        path: impl AsRef<Path>,
        datacenter: &str,
        rack: &str,
        config: ConfigResolver,
    ) -> Self {
        let path = path.as_ref();
        let document = match MembershipDocument::load(path) {
            Ok(document) => document,
            Err(err) => {
                error!(path = %path.display(), error = %err, "unable to load membership document");
                MembershipDocument::default()
            }
        };
        Self::from_document(&document, datacenter, rack, config)
    }

    /// Membership of the node's own rack.
    pub fn for_topology(path: impl AsRef<Path>, topology: &Topology) -> Self {
        let (datacenter, rack) = topology.identity().placement();
        Self::open(path, datacenter, rack, topology.config().clone())
    }

    pub fn from_document(
        document: &MembershipDocument,
        datacenter: &str,
        rack: &str,
        config: ConfigResolver,
    ) -> Self {
        let members = document.peers(datacenter, rack);
        info!(datacenter, rack, count = members.len(), ?members, "loaded rack membership");
        Self {
            config,
            datacenter: datacenter.to_string(),
            rack: rack.to_string(),
            members,
        }
    }

    pub fn datacenter(&self) -> &str {
        &self.datacenter
    }

    pub fn rack(&self) -> &str {
        &self.rack
    }
}

impl Membership for YamlMembership {
    fn rack_membership(&self) -> Vec<String> {
        self.members.clone()
    }

    fn rack_membership_size(&self) -> usize {
        self.members.len()
    }

    fn rack_count(&self) -> usize {
        self.config.resolve(&topology::RACKS_AVAILABLE).len()
    }

    fn cross_account_rack_membership(&self) -> Result<Vec<String>, MembershipError> {
        Err(MembershipError::unsupported("cross_account_rack_membership"))
    }

    fn cross_account_rack_membership_size(&self) -> Result<usize, MembershipError> {
        Err(MembershipError::unsupported("cross_account_rack_membership_size"))
    }

    fn add_acl(&self, _addresses: &[String], _from: u16, _to: u16) -> Result<(), MembershipError> {
        Err(MembershipError::unsupported("add_acl"))
    }

    fn remove_acl(
        &self,
        _addresses: &[String],
        _from: u16,
        _to: u16,
    ) -> Result<(), MembershipError> {
        Err(MembershipError::unsupported("remove_acl"))
    }

    fn list_acl(&self, _from: u16, _to: u16) -> Result<Vec<String>, MembershipError> {
        Err(MembershipError::unsupported("list_acl"))
    }

    fn expand_rack_membership(&self, _count: u32) -> Result<(), MembershipError> {
        Err(MembershipError::unsupported("expand_rack_membership"))
    }

    fn supports_dynamic_membership(&self) -> bool {
        false
    }
}
