//! Tests for startup identity resolution.
//!
//! # Test Strategy
//!
//! 1. **Datacenter**: region override > metadata > fallback, then the setting
//! 2. **Auto-scaling group**: overrides, discovery with retry, failed discovery
//! 3. **Rack and zones**: ASG as rack, configured vs discovered zones
//! 4. **Live changes**: per-call values follow properties, identity stays frozen
//! 5. **Control-plane connection**: credentials reach the factory, region is the datacenter
//! 6. **Retry**: wait counting for the bounded retry helper

use std::cell::Cell;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sidecar_core::{ConfigResolver, DynamicProperties, MapEnvironment};
use sidecar_topology::control_plane::ASG_TAG_KEY;
use sidecar_topology::{
    AvailabilityZone, ControlPlane, ControlPlaneError, ControlPlaneFactory, Credentials,
    CredentialsError, Deployment, EnvironmentCredentials, InstanceMetadata, LocalMetadata,
    RetryPolicy, StaticControlPlane, Tag, Topology, TopologyError, TopologyResolver,
};

/// Metadata with every fact present, including network-interface facts.
struct FixedMetadata {
    zone: &'static str,
}

impl InstanceMetadata for FixedMetadata {
    fn zone(&self) -> Option<String> {
        Some(self.zone.to_string())
    }
    fn public_hostname(&self) -> Option<String> {
        Some("ip-10-0-0-5.ec2.internal".into())
    }
    fn public_ip(&self) -> Option<String> {
        Some("10.0.0.5".into())
    }
    fn instance_id(&self) -> Option<String> {
        Some("i-0abc".into())
    }
    fn instance_type(&self) -> Option<String> {
        Some("r5.large".into())
    }
    fn mac(&self) -> Option<String> {
        Some("0e:49:61:0f:c3:11".into())
    }
    fn vpc_id(&self) -> Option<String> {
        Some("vpc-123".into())
    }
    fn security_group_name(&self) -> Option<String> {
        Some("cache".into())
    }
}

fn sources(env: MapEnvironment) -> (ConfigResolver, Arc<DynamicProperties>) {
    let props = Arc::new(DynamicProperties::new());
    (ConfigResolver::new(Arc::new(env), props.clone()), props)
}

fn tagged_control_plane(asg: &str) -> StaticControlPlane {
    StaticControlPlane::new()
        .with_tags("i-0abc", vec![Tag::new("Name", "cache"), Tag::new(ASG_TAG_KEY, asg)])
        .with_zones(
            "us-east-1",
            vec![
                AvailabilityZone::new("us-east-1a", "available"),
                AvailabilityZone::new("us-east-1b", "available"),
                AvailabilityZone::new("us-east-1c", "impaired"),
                AvailabilityZone::new("us-east-1d", "available"),
                AvailabilityZone::new("us-east-1e", "available"),
            ],
        )
}

fn cloud_resolver(
    config: ConfigResolver,
    control_plane: Arc<StaticControlPlane>,
) -> TopologyResolver {
    let metadata = Arc::new(FixedMetadata { zone: "us-east-1a" });
    TopologyResolver::new(config, metadata, Deployment::Ec2Vpc)
        .with_control_plane(control_plane)
        .with_asg_retry(RetryPolicy::new(3, Duration::ZERO))
}

fn local_resolver(config: ConfigResolver, metadata: LocalMetadata) -> TopologyResolver {
    TopologyResolver::new(config, Arc::new(metadata), Deployment::Local)
}

// ============================================================================
// Datacenter
// ============================================================================

#[test]
fn test_datacenter_from_metadata_zone() {
    let (config, _) = sources(MapEnvironment::new());
    let topology = local_resolver(config, LocalMetadata::default().with_zone("us-west-2b"))
        .resolve()
        .unwrap();
    assert_eq!(topology.datacenter(), "us-west-2");
}

#[test]
fn test_datacenter_fallback_without_zone() {
    let (config, _) = sources(MapEnvironment::new());
    let topology = local_resolver(config, LocalMetadata::default()).resolve().unwrap();
    assert_eq!(topology.datacenter(), "dc1");
}

#[test]
fn test_region_override_beats_metadata() {
    let (config, _) = sources(MapEnvironment::new().with("EC2_REGION", "eu-west-1"));
    let topology = local_resolver(config, LocalMetadata::default().with_zone("us-west-2b"))
        .resolve()
        .unwrap();
    assert_eq!(topology.datacenter(), "eu-west-1");
}

#[test]
fn test_datacenter_setting_has_final_say() {
    // Property beats the computed default...
    let (config, props) = sources(MapEnvironment::new().with("EC2_REGION", "eu-west-1"));
    props.set("dm.az.region", "dc-from-props");
    let topology = local_resolver(config, LocalMetadata::default().with_zone("us-west-2b"))
        .resolve()
        .unwrap();
    assert_eq!(topology.datacenter(), "dc-from-props");

    // ...and the environment alias beats the property.
    let (config, props) = sources(MapEnvironment::new().with("DM_DATACENTER", "dc-from-env"));
    props.set("dm.az.region", "dc-from-props");
    let topology = local_resolver(config, LocalMetadata::default()).resolve().unwrap();
    assert_eq!(topology.datacenter(), "dc-from-env");
}

#[test]
fn test_empty_datacenter_is_fatal() {
    let (config, props) = sources(MapEnvironment::new());
    props.set("dm.az.region", "");
    let err = local_resolver(config, LocalMetadata::default().with_zone("us-east-1a"))
        .resolve()
        .unwrap_err();
    assert!(matches!(err, TopologyError::MissingDatacenter));
}

// ============================================================================
// Auto-scaling Group
// ============================================================================

#[test]
fn test_discovered_asg_becomes_rack() {
    let (config, _) = sources(MapEnvironment::new());
    let cp = Arc::new(tagged_control_plane("cache-useast1a"));
    let topology = cloud_resolver(config, Arc::clone(&cp)).resolve().unwrap();

    assert_eq!(topology.auto_scaling_group().as_deref(), Some("cache-useast1a"));
    assert_eq!(topology.rack(), "cache-useast1a");
    assert_eq!(topology.identity().rack, "cache-useast1a");
    assert_eq!(cp.tag_lookups(), 1);
}

#[test]
fn test_asg_discovery_waits_for_tag() {
    let (config, _) = sources(MapEnvironment::new());
    let cp = Arc::new(tagged_control_plane("cache-useast1a").tagged_after(2));
    let topology = cloud_resolver(config, Arc::clone(&cp)).resolve().unwrap();

    // Two untagged answers, then the tag.
    assert_eq!(cp.tag_lookups(), 3);
    assert_eq!(topology.rack(), "cache-useast1a");
}

#[test]
fn test_failed_discovery_falls_back_to_rack_literal() {
    let (config, props) = sources(MapEnvironment::new());
    // Present, but discovery ran in a cloud deployment and takes precedence.
    props.set("dm.az.asgname", "asg-from-props");
    let cp = Arc::new(tagged_control_plane("cache-useast1a").tagged_after(100));
    let topology = cloud_resolver(config, Arc::clone(&cp)).resolve().unwrap();

    assert_eq!(cp.tag_lookups(), 3);
    assert_eq!(topology.auto_scaling_group(), None);
    assert_eq!(topology.rack(), "RAC1");
}

#[test]
fn test_process_override_skips_discovery() {
    for var in ["ASG_NAME", "AUTO_SCALE_GROUP"] {
        let (config, _) = sources(MapEnvironment::new().with(var, "asg-from-env"));
        let cp = Arc::new(tagged_control_plane("cache-useast1a"));
        let topology = cloud_resolver(config, Arc::clone(&cp)).resolve().unwrap();

        assert_eq!(cp.tag_lookups(), 0, "{var} should skip the control plane");
        assert_eq!(topology.rack(), "asg-from-env");
    }
}

#[test]
fn test_local_asg_comes_from_properties() {
    let (config, props) = sources(MapEnvironment::new());
    props.set("dm.az.asgname", "asg-from-props");
    let topology = local_resolver(config, LocalMetadata::default()).resolve().unwrap();

    assert_eq!(topology.auto_scaling_group().as_deref(), Some("asg-from-props"));
    assert_eq!(topology.rack(), "asg-from-props");
}

// ============================================================================
// Rack and Zones
// ============================================================================

#[test]
fn test_rack_setting_when_asg_not_used() {
    let env = MapEnvironment::new()
        .with("DM_USE_ASG_FOR_RACK_NAME", "false")
        .with("DM_RACK", "rac-east");
    let (config, _) = sources(env);
    let cp = Arc::new(tagged_control_plane("cache-useast1a"));
    let topology = cloud_resolver(config, cp).resolve().unwrap();

    assert_eq!(topology.rack(), "rac-east");
    assert_eq!(topology.auto_scaling_group().as_deref(), Some("cache-useast1a"));
}

#[test]
fn test_zones_discovered_when_not_configured() {
    let (config, _) = sources(MapEnvironment::new());
    let topology = cloud_resolver(config, Arc::new(tagged_control_plane("asg")))
        .resolve()
        .unwrap();
    assert_eq!(topology.zones(), vec!["us-east-1a", "us-east-1b", "us-east-1d"]);
    assert_eq!(topology.identity().zones, topology.zones());
}

#[test]
fn test_configured_zones_win() {
    let (config, props) = sources(MapEnvironment::new());
    props.set("dm.zones.available", vec!["us-east-1e".to_string()]);
    let topology = cloud_resolver(config, Arc::new(tagged_control_plane("asg")))
        .resolve()
        .unwrap();
    assert_eq!(topology.zones(), vec!["us-east-1e"]);
}

#[test]
fn test_zone_listing_failure_leaves_zones_empty() {
    let (config, _) = sources(MapEnvironment::new());
    let cp = StaticControlPlane::new().with_tags("i-0abc", vec![Tag::new(ASG_TAG_KEY, "asg")]);
    let topology = cloud_resolver(config, Arc::new(cp)).resolve().unwrap();
    assert!(topology.zones().is_empty());
}

#[test]
fn test_vpc_id_only_in_vpc_deployments() {
    let (config, _) = sources(MapEnvironment::new().with("ASG_NAME", "asg"));
    let metadata = Arc::new(FixedMetadata { zone: "us-east-1a" });

    let vpc = TopologyResolver::new(config.clone(), metadata.clone(), Deployment::Ec2Vpc)
        .resolve()
        .unwrap();
    assert_eq!(vpc.identity().vpc_id.as_deref(), Some("vpc-123"));

    let classic = TopologyResolver::new(config, metadata, Deployment::Ec2Classic)
        .resolve()
        .unwrap();
    assert_eq!(classic.identity().vpc_id, None);
    assert_eq!(classic.identity().instance_type.as_deref(), Some("r5.large"));
}

// ============================================================================
// Live Changes
// ============================================================================

#[test]
fn test_per_call_values_follow_properties() {
    let (config, props) = sources(MapEnvironment::new());
    let topology = cloud_resolver(config, Arc::new(tagged_control_plane("cache-useast1a")))
        .resolve()
        .unwrap();
    assert_eq!(topology.rack(), "cache-useast1a");

    props.set("dm.dyno.asg.rack", "false");
    props.set("dm.dyno.rack", "rac-live");
    props.set("dm.zones.available", vec!["z1".to_string(), "z2".to_string()]);

    assert_eq!(topology.rack(), "rac-live");
    assert_eq!(topology.zones(), vec!["z1", "z2"]);

    // Boot identity is frozen.
    assert_eq!(topology.identity().rack, "cache-useast1a");
    assert_eq!(topology.identity().zones, vec!["us-east-1a", "us-east-1b", "us-east-1d"]);
}

#[test]
fn test_racks_are_independent_of_identity() {
    let (config, props) = sources(MapEnvironment::new());
    props.set("dm.racks.available", vec!["rac1".to_string(), "rac2".to_string()]);
    let topology = local_resolver(config, LocalMetadata::default()).resolve().unwrap();
    assert_eq!(topology.racks(), vec!["rac1", "rac2"]);
    assert_eq!(topology.rack(), "RAC1");
}

#[test]
fn test_topology_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Topology>();
}

// ============================================================================
// Control-plane Connection
// ============================================================================

/// Hands out the tagged control plane and records what it was given.
#[derive(Default)]
struct RecordingFactory {
    connections: Mutex<Vec<(String, String)>>,
}

impl ControlPlaneFactory for RecordingFactory {
    fn connect(
        &self,
        region: &str,
        credentials: Credentials,
    ) -> Result<Arc<dyn ControlPlane>, ControlPlaneError> {
        self.connections
            .lock()
            .unwrap()
            .push((region.to_string(), credentials.access_key_id));
        Ok(Arc::new(tagged_control_plane("cache-useast1a")))
    }
}

fn metadata_resolver(config: ConfigResolver) -> TopologyResolver {
    let metadata = Arc::new(FixedMetadata { zone: "us-east-1a" });
    TopologyResolver::new(config, metadata, Deployment::Ec2Vpc)
        .with_asg_retry(RetryPolicy::new(1, Duration::ZERO))
}

#[test]
fn test_connected_control_plane_drives_discovery() {
    let (config, _) = sources(MapEnvironment::new());
    let credentials = EnvironmentCredentials::new(Arc::new(
        MapEnvironment::new()
            .with("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE")
            .with("AWS_SECRET_ACCESS_KEY", "secret"),
    ));
    let factory = RecordingFactory::default();

    let topology = metadata_resolver(config)
        .connect_control_plane(&factory, &credentials)
        .unwrap()
        .resolve()
        .unwrap();

    assert_eq!(
        *factory.connections.lock().unwrap(),
        vec![("us-east-1".to_string(), "AKIDEXAMPLE".to_string())]
    );
    assert_eq!(topology.rack(), "cache-useast1a");
    assert_eq!(topology.zones(), vec!["us-east-1a", "us-east-1b", "us-east-1d"]);
}

#[test]
fn test_missing_credentials_build_no_client() {
    let (config, _) = sources(MapEnvironment::new());
    let credentials = EnvironmentCredentials::new(Arc::new(MapEnvironment::new()));
    let factory = RecordingFactory::default();

    let err = metadata_resolver(config)
        .connect_control_plane(&factory, &credentials)
        .err()
        .unwrap();

    assert_eq!(
        err,
        ControlPlaneError::Credentials(CredentialsError::Missing("AWS_ACCESS_KEY_ID"))
    );
    assert!(factory.connections.lock().unwrap().is_empty());
}

#[test]
fn test_from_config_attaches_no_control_plane() {
    let (config, _) = sources(MapEnvironment::new().with("DM_DEPLOYMENT", "local"));
    let topology = TopologyResolver::from_config(config).unwrap().resolve().unwrap();
    assert_eq!(topology.auto_scaling_group(), None);
    assert!(topology.zones().is_empty());
}

// ============================================================================
// Retry
// ============================================================================

#[test]
fn test_retry_fails_twice_then_succeeds() {
    let policy = RetryPolicy::new(3, Duration::from_secs(30));
    let calls = Cell::new(0);
    let waits = Cell::new(0);

    let result = policy.call_with_sleeper(
        || {
            calls.set(calls.get() + 1);
            if calls.get() <= 2 {
                Err(ControlPlaneError::NotYetAvailable("no tag".into()))
            } else {
                Ok("asg")
            }
        },
        |wait| {
            assert_eq!(wait, Duration::from_secs(30));
            waits.set(waits.get() + 1);
        },
    );

    assert_eq!(result.unwrap(), "asg");
    assert_eq!(calls.get(), 3);
    assert_eq!(waits.get(), 2);
}

#[test]
fn test_retry_surfaces_terminal_failure() {
    let policy = RetryPolicy::new(3, Duration::from_millis(1));
    let calls = Cell::new(0);
    let waits = Cell::new(0);

    let result: Result<(), _> = policy.call_with_sleeper(
        || {
            calls.set(calls.get() + 1);
            Err(ControlPlaneError::Request(format!("attempt {}", calls.get())))
        },
        |_| waits.set(waits.get() + 1),
    );

    let err = result.unwrap_err();
    assert_eq!(calls.get(), 3);
    assert_eq!(waits.get(), 2);
    assert_eq!(err.attempts, 3);
    // The last failure is the one surfaced.
    assert_eq!(err.into_inner(), ControlPlaneError::Request("attempt 3".into()));
}
