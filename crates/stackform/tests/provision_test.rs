//! End-to-end provisioning scenarios against the in-memory provider

mod common;

use common::{TEST_OPERATOR_CIDR, fast_policy, test_spec};
use stackform::catalog::DEFAULT_ROUTE_CIDR;
use stackform::{EngineError, Provisioner, StackTopology, Step};
use stackform_cloud::{BlobStore, CloudError, ResourceKind};
use stackform_cloud_mem::{MemoryBlobStore, MemoryCloud};

fn provisioner<'a>(
    cloud: &'a MemoryCloud,
    blob: &'a MemoryBlobStore,
    spec: &'a stackform::StackSpec,
) -> Provisioner<'a> {
    common::init_tracing();
    Provisioner::new(cloud, blob, spec)
        .with_operator_cidr(TEST_OPERATOR_CIDR)
        .with_poll_policy(fast_policy(10))
        .with_visibility_policy(fast_policy(5))
        .with_deletion_policy(fast_policy(8))
}

fn assert_complete(topology: &StackTopology) {
    assert!(topology.vpc.is_some());
    assert!(topology.subnet.is_some());
    assert!(topology.gateway.is_some());
    assert!(topology.route_table.is_some());
    assert!(topology.elb_security_group.is_some());
    assert!(topology.fleet_security_group.is_some());
    assert!(topology.load_balancer.is_some());
    assert!(topology.launch_config.is_some());
    assert!(topology.autoscaling_group.is_some());
    assert_eq!(topology.iam_users.len(), 1);
    assert_eq!(topology.access_keys.len(), 1);
}

#[tokio::test]
async fn test_provision_builds_full_topology() {
    let cloud = MemoryCloud::new();
    let blob = MemoryBlobStore::new();
    let spec = test_spec("pinger");

    let topology = provisioner(&cloud, &blob, &spec).run().await.unwrap();
    assert_complete(&topology);

    for (_, id) in topology.resource_ids() {
        assert!(cloud.contains(&id), "{id} should exist");
    }

    // default route through the stack's gateway
    let table = topology.route_table.as_ref().unwrap();
    let gateway = topology.gateway.as_ref().unwrap();
    let routes = cloud.routes_of(&table.id);
    assert!(
        routes.contains(&(DEFAULT_ROUTE_CIDR.to_string(), gateway.id.clone())),
        "default route missing from {routes:?}"
    );

    // bootstrap bundle written with the user's credentials
    assert!(blob.contains("pinger/bootstrap.json"));
    let raw = blob.get("pinger/bootstrap.json").await.unwrap();
    let bundle: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(bundle["stack"], "pinger");
    assert_eq!(bundle["credentials"][0]["user"], "pinger-telemetry");
    assert!(bundle["liveness_token"].as_str().is_some());
}

#[tokio::test]
async fn test_reprovision_creates_nothing() {
    let cloud = MemoryCloud::new();
    let blob = MemoryBlobStore::new();
    let spec = test_spec("pinger");

    let first = provisioner(&cloud, &blob, &spec).run().await.unwrap();
    cloud.clear_journal();

    let second = provisioner(&cloud, &blob, &spec).run().await.unwrap();

    let ids = |topology: &stackform::StackTopology| {
        let mut ids: Vec<String> = topology
            .resource_ids()
            .into_iter()
            .map(|(_, id)| id)
            .collect();
        ids.sort();
        ids
    };
    assert_eq!(ids(&first), ids(&second));

    assert_eq!(cloud.calls("create"), 0, "re-run must not create anything");
    assert_eq!(blob.mutations(), 1, "bundle written once, then kept");
}

#[tokio::test]
async fn test_reprovision_keeps_liveness_token() {
    let cloud = MemoryCloud::new();
    let blob = MemoryBlobStore::new();
    let spec = test_spec("pinger");

    provisioner(&cloud, &blob, &spec).run().await.unwrap();
    let before = blob.get("pinger/bootstrap.json").await.unwrap();

    provisioner(&cloud, &blob, &spec).run().await.unwrap();
    let after = blob.get("pinger/bootstrap.json").await.unwrap();

    assert_eq!(before, after);
}

#[tokio::test]
async fn test_midway_failure_rolls_back() {
    let cloud = MemoryCloud::new();
    let blob = MemoryBlobStore::new();
    let spec = test_spec("pinger");
    cloud.inject_create_failure(ResourceKind::LoadBalancer);

    let failure = provisioner(&cloud, &blob, &spec).run().await.unwrap_err();

    assert_eq!(failure.step, Step::LoadBalancer);
    assert!(matches!(
        failure.error,
        EngineError::Cloud(CloudError::Permanent(_))
    ));
    assert!(failure.rollback.is_clean(), "rollback: {}", failure.rollback);

    // everything provisioned before the failure is gone again
    assert!(cloud.ids_of(ResourceKind::Vpc).is_empty());
    assert!(cloud.ids_of(ResourceKind::Subnet).is_empty());
    assert!(cloud.ids_of(ResourceKind::InternetGateway).is_empty());
    assert!(cloud.ids_of(ResourceKind::SecurityGroup).is_empty());
    assert!(cloud.ids_of(ResourceKind::IamUser).is_empty());
    assert!(cloud.ids_of(ResourceKind::AccessKey).is_empty());
    assert!(blob.keys().is_empty());
}

#[tokio::test]
async fn test_stuck_pending_surfaces_timeout() {
    let cloud = MemoryCloud::new();
    let blob = MemoryBlobStore::new();
    let spec = test_spec("pinger");
    cloud.inject_stuck_pending(ResourceKind::Vpc);

    let failure = Provisioner::new(&cloud, &blob, &spec)
        .with_operator_cidr(TEST_OPERATOR_CIDR)
        .with_poll_policy(fast_policy(3))
        .with_visibility_policy(fast_policy(3))
        .with_deletion_policy(fast_policy(5))
        .run()
        .await
        .unwrap_err();

    assert_eq!(failure.step, Step::Vpc);
    assert!(matches!(
        failure.error,
        EngineError::Cloud(CloudError::Timeout { attempts: 3, .. })
    ));
    assert!(cloud.ids_of(ResourceKind::Vpc).is_empty(), "rolled back");
}

#[tokio::test]
async fn test_provision_absorbs_visibility_lag() {
    let cloud = MemoryCloud::new();
    let blob = MemoryBlobStore::new();
    let spec = test_spec("pinger");
    cloud.set_visibility_lag(2);
    cloud.set_pending_ticks(2);

    let topology = provisioner(&cloud, &blob, &spec).run().await.unwrap();
    assert_complete(&topology);
}
