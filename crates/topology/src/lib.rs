//! Topology discovery and peer membership for the cache-node sidecar.
//!
//! Startup runs a [`TopologyResolver`] once to produce a [`Topology`]: the
//! node's datacenter, rack, zones and instance facts. Everything that needs
//! placement reads it from there, including the [`Membership`] view of the
//! local rack.

pub mod control_plane;
pub mod credentials;
pub mod deployment;
pub mod error;
pub mod membership;
pub mod metadata;
pub mod resolver;
pub mod retry;

pub use control_plane::{
    AvailabilityZone, ControlPlane, ControlPlaneFactory, StaticControlPlane, Tag,
};
pub use credentials::{CredentialProvider, Credentials, EnvironmentCredentials};
pub use deployment::Deployment;
pub use error::{ControlPlaneError, CredentialsError, MembershipError, TopologyError};
pub use membership::{Membership, MembershipDocument, MembershipEntry, YamlMembership};
pub use metadata::{Ec2Metadata, InstanceMetadata, LocalMetadata};
pub use resolver::{Topology, TopologyResolver};
pub use retry::{RetryError, RetryPolicy};
