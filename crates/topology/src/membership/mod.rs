//! Peer membership.
//!
//! A [`Membership`] answers which peers share the local rack. Sources that
//! cannot perform an operation return [`MembershipError::Unsupported`], which
//! is distinct from an empty answer; check
//! [`supports_dynamic_membership`](Membership::supports_dynamic_membership)
//! before relying on ACL or expansion calls.

mod document;
mod yaml;

pub use document::{MembershipDocument, MembershipEntry};
pub use yaml::YamlMembership;

use crate::error::MembershipError;

pub trait Membership: Send + Sync {
    /// Addresses of the peers in the local rack, in document order.
    fn rack_membership(&self) -> Vec<String>;

    fn rack_membership_size(&self) -> usize {
        self.rack_membership().len()
    }

    /// Number of racks configured for the cluster. Sourced independently of
    /// the rack membership, so the two need not agree.
    fn rack_count(&self) -> usize;

    /// Peers of the local rack in the peer account.
    fn cross_account_rack_membership(&self) -> Result<Vec<String>, MembershipError>;

    fn cross_account_rack_membership_size(&self) -> Result<usize, MembershipError>;

    /// Allow `addresses` on the port range `from..=to`.
    fn add_acl(&self, addresses: &[String], from: u16, to: u16) -> Result<(), MembershipError>;

    fn remove_acl(&self, addresses: &[String], from: u16, to: u16) -> Result<(), MembershipError>;

    /// Addresses currently allowed on `from..=to`.
    fn list_acl(&self, from: u16, to: u16) -> Result<Vec<String>, MembershipError>;

    /// Grow the local rack to `count` members.
    fn expand_rack_membership(&self, count: u32) -> Result<(), MembershipError>;

    fn supports_dynamic_membership(&self) -> bool;
}
