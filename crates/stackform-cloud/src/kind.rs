//! Resource kinds and lifecycle states

use serde::{Deserialize, Serialize};

/// The fixed set of resource kinds that make up one stack.
///
/// This is deliberately a closed enum, not an open registry: the engine
/// targets exactly one stack topology, and the dependency order over these
/// kinds is a total order (see the engine's plan module).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Vpc,
    Subnet,
    InternetGateway,
    RouteTable,
    SecurityGroup,
    LoadBalancer,
    LaunchConfig,
    AutoScalingGroup,
    IamUser,
    IamPolicy,
    AccessKey,
}

impl ResourceKind {
    /// Short id prefix used by providers when minting identifiers.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            ResourceKind::Vpc => "vpc",
            ResourceKind::Subnet => "subnet",
            ResourceKind::InternetGateway => "igw",
            ResourceKind::RouteTable => "rtb",
            ResourceKind::SecurityGroup => "sg",
            ResourceKind::LoadBalancer => "elb",
            ResourceKind::LaunchConfig => "lc",
            ResourceKind::AutoScalingGroup => "asg",
            ResourceKind::IamUser => "user",
            ResourceKind::IamPolicy => "policy",
            ResourceKind::AccessKey => "akia",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Vpc => write!(f, "vpc"),
            ResourceKind::Subnet => write!(f, "subnet"),
            ResourceKind::InternetGateway => write!(f, "internet-gateway"),
            ResourceKind::RouteTable => write!(f, "route-table"),
            ResourceKind::SecurityGroup => write!(f, "security-group"),
            ResourceKind::LoadBalancer => write!(f, "load-balancer"),
            ResourceKind::LaunchConfig => write!(f, "launch-config"),
            ResourceKind::AutoScalingGroup => write!(f, "autoscaling-group"),
            ResourceKind::IamUser => write!(f, "iam-user"),
            ResourceKind::IamPolicy => write!(f, "iam-policy"),
            ResourceKind::AccessKey => write!(f, "access-key"),
        }
    }
}

/// Remote lifecycle state of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    /// Created remotely but not yet usable
    Pending,
    /// Ready for use
    Available,
    /// Ready and referenced by other resources
    InUse,
    /// Deletion in progress
    Deleting,
    /// Does not exist remotely
    Absent,
}

impl std::fmt::Display for ResourceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceState::Pending => write!(f, "pending"),
            ResourceState::Available => write!(f, "available"),
            ResourceState::InUse => write!(f, "in_use"),
            ResourceState::Deleting => write!(f, "deleting"),
            ResourceState::Absent => write!(f, "absent"),
        }
    }
}
