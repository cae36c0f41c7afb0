//! Control-plane client contract.
//!
//! The sidecar needs two facts that instance metadata does not carry: the
//! tags attached to the instance (for the auto-scaling-group name) and the
//! availability zones of the region. The embedding process supplies a
//! concrete cloud client through a [`ControlPlaneFactory`], which receives
//! credentials from a [`CredentialProvider`]. [`StaticControlPlane`] answers
//! from memory for deployments without a control plane.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::credentials::{CredentialProvider, Credentials};
use crate::error::ControlPlaneError;
use crate::retry::{RetryError, RetryPolicy};

/// Tag key the auto-scaling service attaches to its instances.
pub const ASG_TAG_KEY: &str = "aws:autoscaling:groupName";

/// Zone state that qualifies a zone for placement.
pub const ZONE_AVAILABLE: &str = "available";

/// Zones taken from the control plane when none are configured.
pub const MAX_DISCOVERED_ZONES: usize = 3;

/// A newly launched instance may take minutes to be tagged.
pub const ASG_LOOKUP_RETRY: RetryPolicy = RetryPolicy::new(15, Duration::from_secs(30));

/// Builds a client for one region from resolved credentials.
pub trait ControlPlaneFactory: Send + Sync {
    fn connect(
        &self,
        region: &str,
        credentials: Credentials,
    ) -> Result<Arc<dyn ControlPlane>, ControlPlaneError>;
}

/// Fetch credentials and hand them to `factory`. Missing credentials fail
/// before any client is built.
pub fn connect(
    factory: &dyn ControlPlaneFactory,
    region: &str,
    provider: &dyn CredentialProvider,
) -> Result<Arc<dyn ControlPlane>, ControlPlaneError> {
    let credentials = provider.credentials()?;
    debug!(region, access_key_id = %credentials.access_key_id, "connecting to control plane");
    factory.connect(region, credentials)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityZone {
    pub name: String,
    pub state: String,
}

impl AvailabilityZone {
    pub fn new(name: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: state.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.state == ZONE_AVAILABLE
    }
}

/// Client for the cloud control plane. Calls block until a response or a
/// transport timeout.
pub trait ControlPlane: Send + Sync {
    /// Tags attached to `instance_id`, in the order the control plane
    /// reports them.
    fn instance_tags(&self, instance_id: &str) -> Result<Vec<Tag>, ControlPlaneError>;

    /// All zones of `region`, in the order the control plane reports them.
    fn availability_zones(&self, region: &str) -> Result<Vec<AvailabilityZone>, ControlPlaneError>;
}

/// One lookup of the auto-scaling-group tag. The first matching tag wins.
pub fn find_auto_scaling_group(
    control_plane: &dyn ControlPlane,
    instance_id: &str,
) -> Result<String, ControlPlaneError> {
    control_plane
        .instance_tags(instance_id)?
        .into_iter()
        .find(|tag| tag.key == ASG_TAG_KEY)
        .map(|tag| tag.value)
        .ok_or_else(|| {
            ControlPlaneError::NotYetAvailable(format!(
                "instance {instance_id} has no {ASG_TAG_KEY} tag"
            ))
        })
}

/// Resolve the auto-scaling-group name, retrying until the tag shows up.
pub fn lookup_auto_scaling_group(
    control_plane: &dyn ControlPlane,
    instance_id: &str,
    policy: &RetryPolicy,
) -> Result<String, RetryError<ControlPlaneError>> {
    let name = policy.call(|| find_auto_scaling_group(control_plane, instance_id))?;
    info!(instance_id, asg = %name, "resolved auto-scaling group");
    Ok(name)
}

/// The first `MAX_DISCOVERED_ZONES` zones of `region` in the available state.
pub fn first_available_zones(
    control_plane: &dyn ControlPlane,
    region: &str,
) -> Result<Vec<String>, ControlPlaneError> {
    let zones: Vec<String> = control_plane
        .availability_zones(region)?
        .into_iter()
        .filter(AvailabilityZone::is_available)
        .take(MAX_DISCOVERED_ZONES)
        .map(|zone| zone.name)
        .collect();
    debug!(region, ?zones, "discovered availability zones");
    Ok(zones)
}

/// In-memory control plane.
///
/// Tags can be made to appear only after a number of lookups, which mirrors
/// how a freshly launched instance looks to the real control plane.
#[derive(Debug, Default)]
pub struct StaticControlPlane {
    tags: HashMap<String, Vec<Tag>>,
    zones: HashMap<String, Vec<AvailabilityZone>>,
    untagged_lookups: u32,
    lookups: AtomicU32,
}

impl StaticControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags(mut self, instance_id: impl Into<String>, tags: Vec<Tag>) -> Self {
        self.tags.insert(instance_id.into(), tags);
        self
    }

    pub fn with_zones(mut self, region: impl Into<String>, zones: Vec<AvailabilityZone>) -> Self {
        self.zones.insert(region.into(), zones);
        self
    }

    /// The first `lookups` tag lookups report no tags at all.
    pub fn tagged_after(mut self, lookups: u32) -> Self {
        self.untagged_lookups = lookups;
        self
    }

    /// Number of tag lookups served so far.
    pub fn tag_lookups(&self) -> u32 {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl ControlPlane for StaticControlPlane {
    fn instance_tags(&self, instance_id: &str) -> Result<Vec<Tag>, ControlPlaneError> {
        let served = self.lookups.fetch_add(1, Ordering::SeqCst);
        if served < self.untagged_lookups {
            return Ok(Vec::new());
        }
        self.tags
            .get(instance_id)
            .cloned()
            .ok_or_else(|| ControlPlaneError::Request(format!("unknown instance {instance_id}")))
    }

    fn availability_zones(&self, region: &str) -> Result<Vec<AvailabilityZone>, ControlPlaneError> {
        self.zones
            .get(region)
            .cloned()
            .ok_or_else(|| ControlPlaneError::Request(format!("unknown region {region}")))
    }
}
