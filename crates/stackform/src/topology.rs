//! Stack topology
//!
//! The full set of resource handles for one stack at one point in time.
//! A topology is ephemeral: it is rebuilt every invocation by querying the
//! remote system by name, never loaded from local state — the remote
//! system is the source of truth.

use crate::reconcile::Reconciler;
use crate::spec::StackSpec;
use serde::{Deserialize, Serialize};
use stackform_cloud::{CloudClient, CloudError, Filter, ResourceHandle, ResourceKind};

/// Per-run snapshot of every resource handle in one stack
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackTopology {
    pub vpc: Option<ResourceHandle>,
    pub subnet: Option<ResourceHandle>,
    pub gateway: Option<ResourceHandle>,
    pub route_table: Option<ResourceHandle>,
    pub elb_security_group: Option<ResourceHandle>,
    pub fleet_security_group: Option<ResourceHandle>,
    pub load_balancer: Option<ResourceHandle>,
    pub launch_config: Option<ResourceHandle>,
    pub autoscaling_group: Option<ResourceHandle>,
    pub iam_users: Vec<ResourceHandle>,
    pub access_keys: Vec<ResourceHandle>,
    pub bootstrap_key: Option<String>,
}

impl StackTopology {
    /// All known resource ids, for reporting.
    pub fn resource_ids(&self) -> Vec<(ResourceKind, String)> {
        let singles = [
            &self.vpc,
            &self.subnet,
            &self.gateway,
            &self.route_table,
            &self.elb_security_group,
            &self.fleet_security_group,
            &self.load_balancer,
            &self.launch_config,
            &self.autoscaling_group,
        ];

        let mut ids: Vec<(ResourceKind, String)> = singles
            .into_iter()
            .flatten()
            .map(|h| (h.kind, h.id.clone()))
            .collect();
        ids.extend(
            self.iam_users
                .iter()
                .chain(self.access_keys.iter())
                .map(|h| (h.kind, h.id.clone())),
        );
        ids
    }

    /// Rediscover the stack's resources by name.
    ///
    /// Every lookup is by Name tag (scoped by VPC where applicable), so a
    /// partially created or partially deleted stack comes back as a
    /// partially filled topology. The route table falls back to the VPC's
    /// main table when the named one is not found, matching how
    /// provisioning adopts it.
    pub async fn discover(
        client: &dyn CloudClient,
        spec: &StackSpec,
    ) -> Result<Self, CloudError> {
        let names = spec.names();
        let reconciler = Reconciler::new(client);
        let mut topology = StackTopology {
            bootstrap_key: Some(names.bootstrap_key()),
            ..Default::default()
        };

        topology.vpc = reconciler
            .find_by_name(ResourceKind::Vpc, names.vpc(), &[])
            .await?;

        let scope: Vec<Filter> = topology
            .vpc
            .iter()
            .map(|vpc| Filter::param("vpc_id", &vpc.id))
            .collect();

        topology.subnet = reconciler
            .find_by_name(ResourceKind::Subnet, &names.subnet(), &scope)
            .await?;
        topology.gateway = reconciler
            .find_by_name(ResourceKind::InternetGateway, &names.gateway(), &[])
            .await?;

        topology.route_table = reconciler
            .find_by_name(ResourceKind::RouteTable, &names.route_table(), &scope)
            .await?;
        if topology.route_table.is_none() && !scope.is_empty() {
            topology.route_table = client
                .find(ResourceKind::RouteTable, &scope)
                .await?
                .into_iter()
                .next();
        }

        topology.elb_security_group = reconciler
            .find_by_name(
                ResourceKind::SecurityGroup,
                &names.elb_security_group(),
                &scope,
            )
            .await?;
        topology.fleet_security_group = reconciler
            .find_by_name(
                ResourceKind::SecurityGroup,
                &names.fleet_security_group(),
                &scope,
            )
            .await?;

        topology.load_balancer = reconciler
            .find_by_name(ResourceKind::LoadBalancer, &names.load_balancer(), &[])
            .await?;
        topology.launch_config = reconciler
            .find_by_name(ResourceKind::LaunchConfig, &names.launch_config(), &[])
            .await?;
        topology.autoscaling_group = reconciler
            .find_by_name(
                ResourceKind::AutoScalingGroup,
                &names.autoscaling_group(),
                &[],
            )
            .await?;

        for user in &spec.iam_users {
            let filter = [Filter::param("user_name", &user.name)];
            topology.iam_users.extend(
                client
                    .find(ResourceKind::IamUser, &filter)
                    .await?
                    .into_iter()
                    .next(),
            );
            topology.access_keys.extend(
                client
                    .find(ResourceKind::AccessKey, &filter)
                    .await?
                    .into_iter()
                    .next(),
            );
        }

        Ok(topology)
    }
}
