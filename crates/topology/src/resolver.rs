//! Startup identity resolution.
//!
//! [`TopologyResolver::resolve`] runs once, before anything that depends on
//! datacenter or rack. It reads instance metadata, settles the datacenter,
//! discovers the auto-scaling group, picks a rack and a zone list, and hands
//! back a [`Topology`]. The boot facts in a `Topology` never change; rack,
//! auto-scaling group and zones are re-derived on each call so live property
//! changes are picked up.

use std::sync::Arc;

use sidecar_core::catalog::{dual_account, topology};
use sidecar_core::{ConfigResolver, Identity};
use tracing::{debug, error, info, warn};

use crate::control_plane::{self, ControlPlane, ControlPlaneFactory, ASG_LOOKUP_RETRY};
use crate::credentials::CredentialProvider;
use crate::deployment::Deployment;
use crate::error::{ControlPlaneError, TopologyError};
use crate::metadata::{datacenter_from_zone, Ec2Metadata, InstanceMetadata, LocalMetadata};
use crate::retry::RetryPolicy;

/// Datacenter used when neither an override nor instance metadata has one.
pub const FALLBACK_DATACENTER: &str = "dc1";

/// Process-level auto-scaling-group overrides, checked before discovery.
pub const ASG_OVERRIDE_VARS: [&str; 2] = ["ASG_NAME", "AUTO_SCALE_GROUP"];

/// Runs the startup resolution pass.
pub struct TopologyResolver {
    config: ConfigResolver,
    metadata: Arc<dyn InstanceMetadata>,
    control_plane: Option<Arc<dyn ControlPlane>>,
    deployment: Deployment,
    asg_retry: RetryPolicy,
}

impl TopologyResolver {
    pub fn new(
        config: ConfigResolver,
        metadata: Arc<dyn InstanceMetadata>,
        deployment: Deployment,
    ) -> Self {
        Self {
            config,
            metadata,
            control_plane: None,
            deployment,
            asg_retry: ASG_LOOKUP_RETRY,
        }
    }

    /// Pick the deployment from configuration and the matching metadata
    /// source. No control plane is attached, so cloud deployments skip
    /// auto-scaling-group and zone discovery unless one is added with
    /// [`with_control_plane`](Self::with_control_plane) or
    /// [`connect_control_plane`](Self::connect_control_plane).
    pub fn from_config(config: ConfigResolver) -> Result<Self, TopologyError> {
        let deployment = Deployment::from_resolver(&config)?;
        let metadata: Arc<dyn InstanceMetadata> = if deployment.is_cloud() {
            Arc::new(Ec2Metadata::new().map_err(TopologyError::MetadataClient)?)
        } else {
            Arc::new(LocalMetadata::from_resolver(&config))
        };
        Ok(Self::new(config, metadata, deployment))
    }

    pub fn with_control_plane(mut self, control_plane: Arc<dyn ControlPlane>) -> Self {
        self.control_plane = Some(control_plane);
        self
    }

    /// Build a control plane for this node's region through `factory`,
    /// using credentials from `provider`, and attach it.
    pub fn connect_control_plane(
        self,
        factory: &dyn ControlPlaneFactory,
        provider: &dyn CredentialProvider,
    ) -> Result<Self, ControlPlaneError> {
        let region = self.region();
        let control_plane = control_plane::connect(factory, &region, provider)?;
        Ok(self.with_control_plane(control_plane))
    }

    /// Retry policy for the auto-scaling-group lookup.
    pub fn with_asg_retry(mut self, policy: RetryPolicy) -> Self {
        self.asg_retry = policy;
        self
    }

    pub fn deployment(&self) -> Deployment {
        self.deployment
    }

    pub fn resolve(&self) -> Result<Topology, TopologyError> {
        let zone = self.metadata.zone();
        let instance_id = self.metadata.instance_id();
        debug!(?zone, ?instance_id, deployment = %self.deployment, "read instance metadata");

        let datacenter = self.datacenter(zone.as_deref());
        if datacenter.trim().is_empty() {
            return Err(TopologyError::MissingDatacenter);
        }

        let discovered_asg = self.discover_auto_scaling_group(&datacenter, instance_id.as_deref());
        let default_zones = self.default_zones(&datacenter);
        let vpc_id = if self.deployment.is_vpc() {
            self.metadata.vpc_id()
        } else {
            None
        };

        let mut topology = Topology {
            config: self.config.clone(),
            deployment: self.deployment,
            discovered_asg,
            default_zones,
            identity: Identity::new(datacenter, ""),
        };

        let rack = topology.rack();
        if rack.trim().is_empty() {
            return Err(TopologyError::MissingRack {
                datacenter: topology.identity.datacenter,
            });
        }
        let zones = topology.zones();
        let auto_scaling_group = topology.auto_scaling_group();

        let identity = &mut topology.identity;
        identity.rack = rack;
        identity.zones = zones;
        identity.zone = zone;
        identity.public_hostname = self.metadata.public_hostname();
        identity.public_ip = self.metadata.public_ip();
        identity.instance_id = instance_id;
        identity.instance_type = self.metadata.instance_type();
        identity.auto_scaling_group = auto_scaling_group;
        identity.vpc_id = vpc_id;

        info!(
            datacenter = %topology.identity.datacenter,
            rack = %topology.identity.rack,
            asg = ?topology.identity.auto_scaling_group,
            zones = ?topology.identity.zones,
            "resolved node identity"
        );
        Ok(topology)
    }

    /// Region override, then metadata, then the fallback literal; the
    /// datacenter setting overrides all of them.
    fn datacenter(&self, zone: Option<&str>) -> String {
        let metadata_datacenter = zone.map(datacenter_from_zone).unwrap_or_default();
        let default = self
            .config
            .resolve(&topology::REGION_OVERRIDE)
            .filter(|region| !region.is_empty())
            .or_else(|| (!metadata_datacenter.is_empty()).then_some(metadata_datacenter))
            .unwrap_or_else(|| FALLBACK_DATACENTER.to_string());
        self.config.resolve_or(&topology::DATACENTER, default)
    }

    fn region(&self) -> String {
        self.datacenter(self.metadata.zone().as_deref())
    }

    /// `None` when discovery does not apply. `Some(None)` when it ran and
    /// found nothing.
    fn discover_auto_scaling_group(
        &self,
        region: &str,
        instance_id: Option<&str>,
    ) -> Option<Option<String>> {
        if let Some(name) = asg_override(&self.config) {
            debug!(asg = %name, "auto-scaling group set by process override");
            return None;
        }
        if !self.deployment.is_cloud() {
            return None;
        }
        let Some(control_plane) = &self.control_plane else {
            debug!("no control plane configured, auto-scaling group comes from properties");
            return None;
        };
        let Some(instance_id) = instance_id else {
            error!("instance id unknown, cannot look up auto-scaling group");
            return Some(None);
        };

        let lookup = control_plane::lookup_auto_scaling_group(
            control_plane.as_ref(),
            instance_id,
            &self.asg_retry,
        );
        match lookup {
            Ok(name) => Some(Some(name)),
            Err(err) => {
                error!(region, instance_id, error = %err, "failed to determine auto-scaling group");
                Some(None)
            }
        }
    }

    /// Zones to use when no list is configured. Only queried if needed.
    fn default_zones(&self, region: &str) -> Vec<String> {
        if self.config.lookup(&topology::ZONES_AVAILABLE).is_some() {
            return Vec::new();
        }
        let Some(control_plane) = self
            .control_plane
            .as_ref()
            .filter(|_| self.deployment.is_cloud())
        else {
            return Vec::new();
        };
        match control_plane::first_available_zones(control_plane.as_ref(), region) {
            Ok(zones) => zones,
            Err(err) => {
                warn!(region, error = %err, "could not list availability zones");
                Vec::new()
            }
        }
    }
}

/// The resolved topology of the running node.
///
/// Shareable across threads; nothing in it is mutated after
/// [`TopologyResolver::resolve`] returns.
#[derive(Debug, Clone)]
pub struct Topology {
    config: ConfigResolver,
    deployment: Deployment,
    discovered_asg: Option<Option<String>>,
    default_zones: Vec<String>,
    identity: Identity,
}

impl Topology {
    /// Identity as resolved at startup.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn deployment(&self) -> Deployment {
        self.deployment
    }

    pub fn config(&self) -> &ConfigResolver {
        &self.config
    }

    pub fn datacenter(&self) -> &str {
        &self.identity.datacenter
    }

    /// Process override, then the discovered name, then the setting.
    pub fn auto_scaling_group(&self) -> Option<String> {
        if let Some(name) = asg_override(&self.config) {
            return Some(name);
        }
        match &self.discovered_asg {
            Some(discovered) => discovered.clone(),
            None => self
                .config
                .resolve(&topology::ASG_NAME)
                .filter(|name| !name.is_empty()),
        }
    }

    /// The auto-scaling group when it doubles as rack name and is known,
    /// otherwise the rack setting.
    pub fn rack(&self) -> String {
        if self.config.resolve(&topology::USE_ASG_FOR_RACK) {
            if let Some(asg) = self.auto_scaling_group() {
                return asg;
            }
        }
        self.config.resolve(&topology::RACK)
    }

    /// Configured zones, or those discovered at startup.
    pub fn zones(&self) -> Vec<String> {
        self.config
            .resolve_or(&topology::ZONES_AVAILABLE, self.default_zones.clone())
    }

    /// Racks configured for the cluster.
    pub fn racks(&self) -> Vec<String> {
        self.config.resolve(&topology::RACKS_AVAILABLE)
    }

    /// Rack used for the peer account; the local rack unless overridden.
    pub fn cross_account_rack(&self) -> String {
        self.config
            .resolve(&dual_account::RACK)
            .filter(|rack| !rack.is_empty())
            .unwrap_or_else(|| self.rack())
    }
}

fn asg_override(config: &ConfigResolver) -> Option<String> {
    ASG_OVERRIDE_VARS.iter().find_map(|name| config.env_var(name))
}
