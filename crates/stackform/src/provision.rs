//! Provisioning orchestrator
//!
//! Drives the forward dependency order, one idempotent reconciliation per
//! step, threading each step's handle into the next. Any permanent
//! failure rolls the stack back through the deprovisioner; the original
//! error is surfaced to the caller with the rollback outcome attached,
//! never masked by rollback failures.
//!
//! Running two provisions (or a provision and a deprovision) concurrently
//! against the same stack name is unsupported: discovery is name-based
//! and gives no mutual exclusion. Callers needing that must serialize
//! runs externally.

use crate::bootstrap::{BootstrapBundle, CredentialEntry};
use crate::catalog::DEFAULT_ROUTE_CIDR;
use crate::deprovision::{DeprovisionReport, Deprovisioner};
use crate::error::EngineError;
use crate::plan::{PROVISION_ORDER, Step};
use crate::reconcile::Reconciler;
use crate::rules;
use crate::spec::StackSpec;
use crate::topology::StackTopology;
use stackform_cloud::{
    BlobStore, CloudClient, Filter, ResourceHandle, ResourceKind, RetryPolicy, RuleSpec,
};
use thiserror::Error;

/// A failed provisioning run: the step that failed, the original error,
/// and the outcome of the compensating rollback.
#[derive(Error, Debug)]
#[error("provisioning failed at step {step}: {error}")]
pub struct ProvisionFailure {
    pub step: Step,
    #[source]
    pub error: EngineError,
    pub rollback: DeprovisionReport,
}

#[derive(Default)]
struct RunState {
    topology: StackTopology,
    credentials: Vec<CredentialEntry>,
}

/// Forward orchestrator for one stack
pub struct Provisioner<'a> {
    client: &'a dyn CloudClient,
    blob: &'a dyn BlobStore,
    spec: &'a StackSpec,
    poll: RetryPolicy,
    visibility: RetryPolicy,
    deletion: RetryPolicy,
    operator_cidr: Option<String>,
}

impl<'a> Provisioner<'a> {
    pub fn new(client: &'a dyn CloudClient, blob: &'a dyn BlobStore, spec: &'a StackSpec) -> Self {
        Self {
            client,
            blob,
            spec,
            poll: RetryPolicy::polling(),
            visibility: RetryPolicy::visibility(),
            deletion: RetryPolicy::deletion(),
            operator_cidr: None,
        }
    }

    /// CIDR substituted for the operator placeholder in rule specs.
    pub fn with_operator_cidr(mut self, cidr: impl Into<String>) -> Self {
        self.operator_cidr = Some(cidr.into());
        self
    }

    pub fn with_poll_policy(mut self, policy: RetryPolicy) -> Self {
        self.poll = policy;
        self
    }

    pub fn with_visibility_policy(mut self, policy: RetryPolicy) -> Self {
        self.visibility = policy;
        self
    }

    pub fn with_deletion_policy(mut self, policy: RetryPolicy) -> Self {
        self.deletion = policy;
        self
    }

    fn reconciler(&self) -> Reconciler<'a> {
        Reconciler::new(self.client)
            .with_poll_policy(self.poll.clone())
            .with_visibility_policy(self.visibility.clone())
    }

    /// Provision the whole stack, rolling back on failure.
    pub async fn run(&self) -> Result<StackTopology, ProvisionFailure> {
        tracing::info!("provisioning stack {}", self.spec.name);
        let mut run = RunState::default();

        for step in PROVISION_ORDER {
            if let Err(error) = self.apply(step, &mut run).await {
                tracing::warn!(
                    "step {} failed for stack {}: {}; rolling back",
                    step,
                    self.spec.name,
                    error
                );
                let rollback = self.rollback().await;
                if !rollback.is_clean() {
                    tracing::warn!(
                        "rollback of stack {} left resources behind: {}",
                        self.spec.name,
                        rollback
                    );
                }
                return Err(ProvisionFailure {
                    step,
                    error,
                    rollback,
                });
            }
        }

        tracing::info!("stack {} provisioned", self.spec.name);
        Ok(run.topology)
    }

    async fn rollback(&self) -> DeprovisionReport {
        Deprovisioner::new(self.client, self.blob, self.spec)
            .with_deletion_policy(self.deletion.clone())
            .run()
            .await
    }

    async fn apply(&self, step: Step, run: &mut RunState) -> Result<(), EngineError> {
        match step {
            Step::IamUsers => self.ensure_iam_users(run).await,
            Step::BootstrapConfig => self.ensure_bootstrap(run).await,
            Step::Vpc => self.ensure_vpc(run).await,
            Step::Subnet => self.ensure_subnet(run).await,
            Step::InternetGateway => self.ensure_gateway(run).await,
            Step::RouteTable => self.ensure_route_table(run).await,
            Step::ElbSecurityGroup => self.ensure_elb_security_group(run).await,
            Step::LoadBalancer => self.ensure_load_balancer(run).await,
            Step::FleetSecurityGroup => self.ensure_fleet_security_group(run).await,
            Step::LaunchConfig => self.ensure_launch_config(run).await,
            Step::AutoScalingGroup => self.ensure_autoscaling_group(run).await,
        }
    }

    async fn ensure_iam_users(&self, run: &mut RunState) -> Result<(), EngineError> {
        let reconciler = self.reconciler();

        for user in &self.spec.iam_users {
            let handle = reconciler
                .ensure(
                    ResourceKind::IamUser,
                    &user.name,
                    &[],
                    serde_json::json!({ "user_name": user.name }),
                )
                .await?;

            for policy in &user.policies {
                let existing = self
                    .client
                    .find(
                        ResourceKind::IamPolicy,
                        &[
                            Filter::param("user_name", &user.name),
                            Filter::param("policy_name", &policy.name),
                        ],
                    )
                    .await?;
                if existing.is_empty() {
                    self.client
                        .create(
                            ResourceKind::IamPolicy,
                            serde_json::json!({
                                "user_name": user.name,
                                "policy_name": policy.name,
                                "document": policy.document,
                            }),
                        )
                        .await?;
                    tracing::info!("attached policy {} to user {}", policy.name, user.name);
                }
            }

            let keys = self
                .client
                .find(
                    ResourceKind::AccessKey,
                    &[Filter::param("user_name", &user.name)],
                )
                .await?;
            let key = match keys.into_iter().next() {
                Some(key) => key,
                None => {
                    self.client
                        .create(
                            ResourceKind::AccessKey,
                            serde_json::json!({ "user_name": user.name }),
                        )
                        .await?
                }
            };

            if let Some(secret) = key.attribute::<String>("secret_access_key") {
                run.credentials.push(CredentialEntry {
                    user: user.name.clone(),
                    access_key_id: key.id.clone(),
                    secret_access_key: secret,
                });
            }
            run.topology.access_keys.push(key);
            run.topology.iam_users.push(handle);
        }
        Ok(())
    }

    async fn ensure_bootstrap(&self, run: &mut RunState) -> Result<(), EngineError> {
        let key = self.spec.names().bootstrap_key();

        match self.blob.get(&key).await {
            Ok(_) => {
                // An existing bundle keeps its liveness token; health
                // checks already depend on it.
                tracing::debug!("bootstrap bundle {} already present", key);
            }
            Err(e) if e.is_not_found() => {
                let bundle = BootstrapBundle::compose(self.spec, run.credentials.clone());
                self.blob.put(&key, &bundle.to_bytes()?).await?;
                tracing::info!("wrote bootstrap bundle {}", key);
            }
            Err(e) => return Err(e.into()),
        }

        run.topology.bootstrap_key = Some(key);
        Ok(())
    }

    async fn ensure_vpc(&self, run: &mut RunState) -> Result<(), EngineError> {
        let names = self.spec.names();
        let network = &self.spec.network;

        let vpc = self
            .reconciler()
            .ensure(
                ResourceKind::Vpc,
                names.vpc(),
                &[],
                serde_json::json!({
                    "cidr_block": network.vpc_cidr,
                    "instance_tenancy": network.instance_tenancy,
                }),
            )
            .await?;
        run.topology.vpc = Some(vpc);
        Ok(())
    }

    async fn ensure_subnet(&self, run: &mut RunState) -> Result<(), EngineError> {
        let names = self.spec.names();
        let vpc = require(&run.topology.vpc, ResourceKind::Vpc, names.vpc())?;

        let subnet = self
            .reconciler()
            .ensure(
                ResourceKind::Subnet,
                &names.subnet(),
                &[Filter::param("vpc_id", &vpc.id)],
                serde_json::json!({
                    "vpc_id": vpc.id,
                    "cidr_block": self.spec.network.subnet_cidr,
                    "availability_zone": self.spec.network.availability_zone,
                }),
            )
            .await?;
        run.topology.subnet = Some(subnet);
        Ok(())
    }

    async fn ensure_gateway(&self, run: &mut RunState) -> Result<(), EngineError> {
        let names = self.spec.names();
        let vpc = require(&run.topology.vpc, ResourceKind::Vpc, names.vpc())?;

        let gateway = self
            .reconciler()
            .ensure(
                ResourceKind::InternetGateway,
                &names.gateway(),
                &[],
                serde_json::json!({}),
            )
            .await?;

        // attaching is an idempotent upsert at the boundary
        self.client
            .attach(ResourceKind::InternetGateway, &gateway.id, &vpc.id)
            .await?;
        run.topology.gateway = Some(gateway);
        Ok(())
    }

    async fn ensure_route_table(&self, run: &mut RunState) -> Result<(), EngineError> {
        let names = self.spec.names();
        let vpc = require(&run.topology.vpc, ResourceKind::Vpc, names.vpc())?;
        let gateway = require(
            &run.topology.gateway,
            ResourceKind::InternetGateway,
            &names.gateway(),
        )?;
        let scope = [Filter::param("vpc_id", &vpc.id)];
        let reconciler = self.reconciler();

        // The VPC's main route table is adopted rather than replaced:
        // discover it by scope, tag it, and route through the gateway.
        let table = match reconciler
            .find_by_name(ResourceKind::RouteTable, &names.route_table(), &scope)
            .await?
        {
            Some(table) => table,
            None => match self
                .client
                .find(ResourceKind::RouteTable, &scope)
                .await?
                .into_iter()
                .next()
            {
                Some(main) => {
                    tracing::info!("adopting main route table {} of {}", main.id, vpc.id);
                    main
                }
                None => {
                    reconciler
                        .ensure(
                            ResourceKind::RouteTable,
                            &names.route_table(),
                            &scope,
                            serde_json::json!({ "vpc_id": vpc.id }),
                        )
                        .await?
                }
            },
        };

        self.client
            .tag(
                ResourceKind::RouteTable,
                &table.id,
                "Name",
                &names.route_table(),
            )
            .await?;
        self.client
            .add_route(&table.id, DEFAULT_ROUTE_CIDR, &gateway.id)
            .await?;

        run.topology.route_table = Some(table);
        Ok(())
    }

    async fn ensure_security_group(
        &self,
        run: &RunState,
        name: &str,
        description: String,
        ingress: &[RuleSpec],
        egress: &[RuleSpec],
    ) -> Result<ResourceHandle, EngineError> {
        let names = self.spec.names();
        let vpc = require(&run.topology.vpc, ResourceKind::Vpc, names.vpc())?;

        let group = self
            .reconciler()
            .ensure(
                ResourceKind::SecurityGroup,
                name,
                &[Filter::param("vpc_id", &vpc.id)],
                serde_json::json!({ "vpc_id": vpc.id, "description": description }),
            )
            .await?;

        let ingress = rules::resolve_operator_cidr(ingress, self.operator_cidr.as_deref())?;
        rules::reconcile_ingress(self.client, &group.id, &ingress).await?;

        let egress = rules::resolve_operator_cidr(egress, self.operator_cidr.as_deref())?;
        rules::reconcile_egress(self.client, &group.id, &egress).await?;

        Ok(group)
    }

    async fn ensure_elb_security_group(&self, run: &mut RunState) -> Result<(), EngineError> {
        let group = self
            .ensure_security_group(
                run,
                &self.spec.names().elb_security_group(),
                format!("load balancer rules for {}", self.spec.name),
                &self.spec.load_balancer.ingress,
                &self.spec.load_balancer.egress,
            )
            .await?;
        run.topology.elb_security_group = Some(group);
        Ok(())
    }

    async fn ensure_fleet_security_group(&self, run: &mut RunState) -> Result<(), EngineError> {
        let group = self
            .ensure_security_group(
                run,
                &self.spec.names().fleet_security_group(),
                format!("fleet rules for {}", self.spec.name),
                &self.spec.fleet.ingress,
                &self.spec.fleet.egress,
            )
            .await?;
        run.topology.fleet_security_group = Some(group);
        Ok(())
    }

    async fn ensure_load_balancer(&self, run: &mut RunState) -> Result<(), EngineError> {
        let names = self.spec.names();
        let subnet = require(&run.topology.subnet, ResourceKind::Subnet, &names.subnet())?;
        let group = require(
            &run.topology.elb_security_group,
            ResourceKind::SecurityGroup,
            &names.elb_security_group(),
        )?;
        let lb_spec = &self.spec.load_balancer;

        let balancer = self
            .reconciler()
            .ensure(
                ResourceKind::LoadBalancer,
                &names.load_balancer(),
                &[],
                serde_json::json!({
                    "subnet_id": subnet.id,
                    "security_group_id": group.id,
                    "listen_port": lb_spec.listen_port,
                    "target_port": lb_spec.target_port,
                    "health_check": lb_spec.health_check,
                }),
            )
            .await?;
        run.topology.load_balancer = Some(balancer);
        Ok(())
    }

    async fn ensure_launch_config(&self, run: &mut RunState) -> Result<(), EngineError> {
        let names = self.spec.names();
        let group = require(
            &run.topology.fleet_security_group,
            ResourceKind::SecurityGroup,
            &names.fleet_security_group(),
        )?;
        let fleet = &self.spec.fleet;

        let config = self
            .reconciler()
            .ensure(
                ResourceKind::LaunchConfig,
                &names.launch_config(),
                &[],
                serde_json::json!({
                    "ami_id": fleet.ami_id,
                    "instance_type": fleet.instance_type,
                    "key_pair": fleet.key_pair,
                    "security_group_id": group.id,
                }),
            )
            .await?;
        run.topology.launch_config = Some(config);
        Ok(())
    }

    async fn ensure_autoscaling_group(&self, run: &mut RunState) -> Result<(), EngineError> {
        let names = self.spec.names();
        let subnet = require(&run.topology.subnet, ResourceKind::Subnet, &names.subnet())?;
        let config = require(
            &run.topology.launch_config,
            ResourceKind::LaunchConfig,
            &names.launch_config(),
        )?;
        let balancer = require(
            &run.topology.load_balancer,
            ResourceKind::LoadBalancer,
            &names.load_balancer(),
        )?;
        let fleet = &self.spec.fleet;

        let group = self
            .reconciler()
            .ensure(
                ResourceKind::AutoScalingGroup,
                &names.autoscaling_group(),
                &[],
                serde_json::json!({
                    "launch_config_id": config.id,
                    "subnet_id": subnet.id,
                    "load_balancer_id": balancer.id,
                    "min_size": fleet.min_size,
                    "max_size": fleet.max_size,
                }),
            )
            .await?;
        run.topology.autoscaling_group = Some(group);
        Ok(())
    }
}

fn require<'h>(
    handle: &'h Option<ResourceHandle>,
    kind: ResourceKind,
    name: &str,
) -> Result<&'h ResourceHandle, EngineError> {
    handle.as_ref().ok_or_else(|| EngineError::MissingDependency {
        kind,
        name: name.to_string(),
    })
}
