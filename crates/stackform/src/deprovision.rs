//! Deprovisioning orchestrator
//!
//! Walks the exact reverse of the provisioning order. Every step is total
//! over {present, absent}: an absent resource is logged and counted as
//! already gone, so teardown is idempotent and safe to re-run on a
//! partially deleted stack. Two remote error kinds get bounded
//! retry-with-backoff instead of failing the step outright: a dependency
//! violation (something not yet deleted still references the resource)
//! and a transient condition; `NotFound` at delete time is success.
//!
//! Step failures never abort the run. They are collected into the report
//! so the caller knows exactly which resources need manual remediation.

use crate::catalog::DEFAULT_ROUTE_CIDR;
use crate::plan::{Step, deprovision_order};
use crate::spec::StackSpec;
use crate::topology::StackTopology;
use stackform_cloud::{
    BlobStore, CloudClient, CloudError, Filter, ResourceHandle, ResourceKind, RetryPolicy,
};
use tokio::time::sleep;

/// Outcome of one deletion attempt sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    AlreadyGone,
}

/// Delete a resource, riding out dependency violations and transient
/// errors with bounded backoff. `NotFound` means the resource is already
/// gone and is success, not an error.
pub async fn delete_with_retry(
    client: &dyn CloudClient,
    kind: ResourceKind,
    id: &str,
    policy: &RetryPolicy,
) -> Result<DeleteOutcome, CloudError> {
    for attempt in 0..policy.max_attempts {
        match client.delete(kind, id).await {
            Ok(()) => return Ok(DeleteOutcome::Deleted),
            Err(e) if e.is_not_found() => return Ok(DeleteOutcome::AlreadyGone),
            Err(e) if e.is_dependency_violation() || e.is_transient() => {
                tracing::debug!(
                    "delete of {} {} blocked ({}); attempt {}/{}",
                    kind,
                    id,
                    e,
                    attempt + 1,
                    policy.max_attempts
                );
                if attempt + 1 < policy.max_attempts {
                    sleep(policy.delay_for_attempt(attempt)).await;
                }
            }
            Err(e) => return Err(e),
        }
    }

    Err(CloudError::Timeout {
        what: format!("deletion of {kind} {id}"),
        attempts: policy.max_attempts,
    })
}

/// Collected outcome of a teardown run
#[derive(Debug, Default)]
pub struct DeprovisionReport {
    /// Resources actually deleted this run
    pub deleted: Vec<String>,

    /// Resources that were already absent
    pub skipped: Vec<String>,

    /// Resources that could not be deleted, with the final error
    pub failed: Vec<(String, CloudError)>,
}

impl DeprovisionReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    fn note_deleted(&mut self, label: String) {
        tracing::info!("deleted {}", label);
        self.deleted.push(label);
    }

    fn note_skipped(&mut self, label: String) {
        tracing::debug!("{} already absent", label);
        self.skipped.push(label);
    }

    fn note_failed(&mut self, label: String, error: CloudError) {
        tracing::warn!("could not delete {}: {}", label, error);
        self.failed.push((label, error));
    }
}

impl std::fmt::Display for DeprovisionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} deleted, {} already absent, {} failed",
            self.deleted.len(),
            self.skipped.len(),
            self.failed.len()
        )?;
        for (label, error) in &self.failed {
            write!(f, "; {label}: {error}")?;
        }
        Ok(())
    }
}

/// Reverse orchestrator for one stack
pub struct Deprovisioner<'a> {
    client: &'a dyn CloudClient,
    blob: &'a dyn BlobStore,
    spec: &'a StackSpec,
    deletion: RetryPolicy,
}

impl<'a> Deprovisioner<'a> {
    pub fn new(client: &'a dyn CloudClient, blob: &'a dyn BlobStore, spec: &'a StackSpec) -> Self {
        Self {
            client,
            blob,
            spec,
            deletion: RetryPolicy::deletion(),
        }
    }

    pub fn with_deletion_policy(mut self, policy: RetryPolicy) -> Self {
        self.deletion = policy;
        self
    }

    /// Tear the stack down. Never fails wholesale; the report carries
    /// everything that could not be cleaned up.
    pub async fn run(&self) -> DeprovisionReport {
        tracing::info!("deprovisioning stack {}", self.spec.name);
        let mut report = DeprovisionReport::default();

        let topology = match StackTopology::discover(self.client, self.spec).await {
            Ok(topology) => topology,
            Err(error) => {
                report.note_failed(format!("discovery of stack {}", self.spec.name), error);
                return report;
            }
        };

        for step in deprovision_order() {
            self.teardown(step, &topology, &mut report).await;
        }

        tracing::info!("deprovisioned stack {}: {}", self.spec.name, report);
        report
    }

    async fn teardown(&self, step: Step, topology: &StackTopology, report: &mut DeprovisionReport) {
        match step {
            Step::AutoScalingGroup => {
                self.teardown_autoscaling_group(topology, report).await;
            }
            Step::LaunchConfig => {
                self.delete_handle(&topology.launch_config, step, report)
                    .await;
            }
            Step::FleetSecurityGroup => {
                self.delete_security_group(&topology.fleet_security_group, report)
                    .await;
            }
            Step::LoadBalancer => {
                self.delete_handle(&topology.load_balancer, step, report)
                    .await;
            }
            Step::ElbSecurityGroup => {
                self.delete_security_group(&topology.elb_security_group, report)
                    .await;
            }
            Step::RouteTable => self.teardown_default_route(topology, report).await,
            Step::InternetGateway => self.teardown_gateway(topology, report).await,
            Step::Subnet => self.delete_handle(&topology.subnet, step, report).await,
            Step::Vpc => self.delete_handle(&topology.vpc, step, report).await,
            Step::BootstrapConfig => self.teardown_bootstrap(topology, report).await,
            Step::IamUsers => self.teardown_iam_users(report).await,
        }
    }

    async fn delete_resource(
        &self,
        kind: ResourceKind,
        id: &str,
        report: &mut DeprovisionReport,
    ) {
        let label = format!("{kind} {id}");
        match delete_with_retry(self.client, kind, id, &self.deletion).await {
            Ok(DeleteOutcome::Deleted) => report.note_deleted(label),
            Ok(DeleteOutcome::AlreadyGone) => report.note_skipped(label),
            Err(error) => report.note_failed(label, error),
        }
    }

    async fn delete_handle(
        &self,
        handle: &Option<ResourceHandle>,
        step: Step,
        report: &mut DeprovisionReport,
    ) {
        match handle {
            Some(handle) => self.delete_resource(handle.kind, &handle.id, report).await,
            None => report.note_skipped(format!("{step} of stack {}", self.spec.name)),
        }
    }

    /// The default/system security group must never be deleted; doing so
    /// is a destructive permanent error on the remote side.
    async fn delete_security_group(
        &self,
        handle: &Option<ResourceHandle>,
        report: &mut DeprovisionReport,
    ) {
        match handle {
            Some(group) if group.name().as_deref() == Some("default") => {
                tracing::warn!("refusing to delete default security group {}", group.id);
                report.note_skipped(format!("security-group {} (default)", group.id));
            }
            Some(group) => self.delete_resource(group.kind, &group.id, report).await,
            None => report.note_skipped(format!("security-group of stack {}", self.spec.name)),
        }
    }

    async fn teardown_autoscaling_group(
        &self,
        topology: &StackTopology,
        report: &mut DeprovisionReport,
    ) {
        let Some(group) = &topology.autoscaling_group else {
            report.note_skipped(format!("autoscaling-group of stack {}", self.spec.name));
            return;
        };

        // Drain members before deleting the group; the delete retries
        // through the dependency violations while instances terminate.
        if let Err(error) = self
            .client
            .update(
                ResourceKind::AutoScalingGroup,
                &group.id,
                serde_json::json!({ "min_size": 0, "max_size": 0, "desired_capacity": 0 }),
            )
            .await
            && !error.is_not_found()
        {
            report.note_failed(format!("{} {}", group.kind, group.id), error);
            return;
        }

        self.delete_resource(group.kind, &group.id, report).await;
    }

    async fn teardown_default_route(
        &self,
        topology: &StackTopology,
        report: &mut DeprovisionReport,
    ) {
        // Only the default route is removed. The table itself is the
        // VPC's main table and goes away with the VPC.
        let Some(table) = &topology.route_table else {
            report.note_skipped(format!("route-table of stack {}", self.spec.name));
            return;
        };

        let label = format!("route {} on {}", DEFAULT_ROUTE_CIDR, table.id);
        match self.client.remove_route(&table.id, DEFAULT_ROUTE_CIDR).await {
            Ok(()) => report.note_deleted(label),
            Err(e) if e.is_not_found() => report.note_skipped(label),
            Err(e) => report.note_failed(label, e),
        }
    }

    async fn teardown_gateway(&self, topology: &StackTopology, report: &mut DeprovisionReport) {
        let Some(gateway) = &topology.gateway else {
            report.note_skipped(format!("internet-gateway of stack {}", self.spec.name));
            return;
        };

        if let Some(vpc) = &topology.vpc {
            match self
                .client
                .detach(ResourceKind::InternetGateway, &gateway.id, &vpc.id)
                .await
            {
                Ok(()) => tracing::debug!("detached {} from {}", gateway.id, vpc.id),
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    report.note_failed(format!("detach of {}", gateway.id), e);
                    return;
                }
            }
        }

        self.delete_resource(gateway.kind, &gateway.id, report).await;
    }

    async fn teardown_bootstrap(&self, topology: &StackTopology, report: &mut DeprovisionReport) {
        let key = topology
            .bootstrap_key
            .clone()
            .unwrap_or_else(|| self.spec.names().bootstrap_key());

        let label = format!("bootstrap bundle {key}");
        match self.blob.delete(&key).await {
            Ok(()) => report.note_deleted(label),
            Err(e) if e.is_not_found() => report.note_skipped(label),
            Err(e) => report.note_failed(label, e),
        }
    }

    /// IAM teardown order within itself: inline policies, then access
    /// keys, then the user — the reverse of how they were created.
    async fn teardown_iam_users(&self, report: &mut DeprovisionReport) {
        for user in &self.spec.iam_users {
            let filter = [Filter::param("user_name", &user.name)];

            let policies = match self.client.find(ResourceKind::IamPolicy, &filter).await {
                Ok(policies) => policies,
                Err(e) => {
                    report.note_failed(format!("policies of user {}", user.name), e);
                    continue;
                }
            };
            for policy in policies {
                self.delete_resource(policy.kind, &policy.id, report).await;
            }

            let keys = match self.client.find(ResourceKind::AccessKey, &filter).await {
                Ok(keys) => keys,
                Err(e) => {
                    report.note_failed(format!("access keys of user {}", user.name), e);
                    continue;
                }
            };
            for key in keys {
                self.delete_resource(key.kind, &key.id, report).await;
            }

            match self.client.find(ResourceKind::IamUser, &filter).await {
                Ok(users) => match users.into_iter().next() {
                    Some(found) => self.delete_resource(found.kind, &found.id, report).await,
                    None => report.note_skipped(format!("iam-user {}", user.name)),
                },
                Err(e) => report.note_failed(format!("iam-user {}", user.name), e),
            }
        }
    }
}
