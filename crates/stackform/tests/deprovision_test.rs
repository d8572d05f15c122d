//! Teardown scenarios against the in-memory provider

mod common;

use common::{TEST_OPERATOR_CIDR, fast_policy, test_spec};
use stackform::{Deprovisioner, Provisioner};
use stackform_cloud::ResourceKind;
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

fn deprovisioner<'a>(
    cloud: &'a MemoryCloud,
    blob: &'a MemoryBlobStore,
    spec: &'a stackform::StackSpec,
) -> Deprovisioner<'a> {
    common::init_tracing();
    Deprovisioner::new(cloud, blob, spec).with_deletion_policy(fast_policy(8))
}

#[tokio::test]
async fn test_absent_stack_teardown_mutates_nothing() {
    let cloud = MemoryCloud::new();
    let blob = MemoryBlobStore::new();
    let spec = test_spec("pinger");

    let report = deprovisioner(&cloud, &blob, &spec).run().await;

    assert!(report.is_clean());
    assert!(report.deleted.is_empty());
    assert!(!report.skipped.is_empty());
    assert_eq!(cloud.mutation_count(), 0);
    assert_eq!(blob.mutations(), 0);
}

#[tokio::test]
async fn test_full_cycle_removes_everything() {
    let cloud = MemoryCloud::new();
    let blob = MemoryBlobStore::new();
    let spec = test_spec("pinger");

    let topology = provisioner(&cloud, &blob, &spec).run().await.unwrap();
    let vpc = topology.vpc.as_ref().unwrap();
    let default_sg = cloud.default_security_group(&vpc.id).unwrap();

    let report = deprovisioner(&cloud, &blob, &spec).run().await;
    assert!(report.is_clean(), "teardown: {report}");

    for kind in [
        ResourceKind::AutoScalingGroup,
        ResourceKind::LaunchConfig,
        ResourceKind::LoadBalancer,
        ResourceKind::SecurityGroup,
        ResourceKind::RouteTable,
        ResourceKind::InternetGateway,
        ResourceKind::Subnet,
        ResourceKind::Vpc,
        ResourceKind::IamUser,
        ResourceKind::IamPolicy,
        ResourceKind::AccessKey,
    ] {
        assert!(cloud.ids_of(kind).is_empty(), "{kind} left behind");
    }
    assert!(blob.keys().is_empty());

    // the provider-managed default group was cascaded with its VPC, never
    // deleted directly
    assert!(
        !cloud
            .delete_targets(ResourceKind::SecurityGroup)
            .contains(&default_sg)
    );
}

#[tokio::test]
async fn test_teardown_is_idempotent() {
    let cloud = MemoryCloud::new();
    let blob = MemoryBlobStore::new();
    let spec = test_spec("pinger");

    provisioner(&cloud, &blob, &spec).run().await.unwrap();
    deprovisioner(&cloud, &blob, &spec).run().await;
    cloud.clear_journal();

    let report = deprovisioner(&cloud, &blob, &spec).run().await;

    assert!(report.is_clean());
    assert!(report.deleted.is_empty());
    assert_eq!(cloud.mutation_count(), 0);
}

#[tokio::test]
async fn test_blocked_delete_gives_up_after_bounded_attempts() {
    let cloud = MemoryCloud::new();
    let blob = MemoryBlobStore::new();
    let spec = test_spec("pinger");

    let topology = provisioner(&cloud, &blob, &spec).run().await.unwrap();
    let subnet = topology.subnet.as_ref().unwrap();
    cloud.inject_undeletable(ResourceKind::Subnet);
    cloud.clear_journal();

    let policy = fast_policy(4);
    let report = Deprovisioner::new(&cloud, &blob, &spec)
        .with_deletion_policy(policy.clone())
        .run()
        .await;

    assert!(!report.is_clean());
    assert!(
        report
            .failed
            .iter()
            .any(|(label, _)| label.contains(&subnet.id))
    );
    assert_eq!(
        cloud.delete_targets(ResourceKind::Subnet).len(),
        policy.max_attempts as usize,
        "one delete call per attempt, then give up"
    );
    assert!(cloud.contains(&subnet.id));
}

#[tokio::test]
async fn test_scaling_group_drains_before_delete() {
    let cloud = MemoryCloud::new();
    let blob = MemoryBlobStore::new();
    let spec = test_spec("pinger");
    cloud.set_drain_ticks(3);

    let topology = provisioner(&cloud, &blob, &spec).run().await.unwrap();
    let group = topology.autoscaling_group.as_ref().unwrap();

    let report = deprovisioner(&cloud, &blob, &spec).run().await;

    assert!(report.is_clean(), "teardown: {report}");
    assert!(!cloud.contains(&group.id));
    // draining forced more than one delete attempt
    assert!(cloud.delete_targets(ResourceKind::AutoScalingGroup).len() > 1);
}
