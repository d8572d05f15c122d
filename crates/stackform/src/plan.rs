//! Dependency plan
//!
//! The dependency order over the stack's resource kinds is a fixed total
//! order, written down once as an explicit step list. Deprovisioning walks
//! the exact reverse, so the forward and reverse orders are inverses by
//! construction and testable without a live provider.

/// One orchestration step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    IamUsers,
    BootstrapConfig,
    Vpc,
    Subnet,
    InternetGateway,
    RouteTable,
    ElbSecurityGroup,
    LoadBalancer,
    FleetSecurityGroup,
    LaunchConfig,
    AutoScalingGroup,
}

/// Forward (provisioning) order, leaves first.
pub const PROVISION_ORDER: [Step; 11] = [
    Step::IamUsers,
    Step::BootstrapConfig,
    Step::Vpc,
    Step::Subnet,
    Step::InternetGateway,
    Step::RouteTable,
    Step::ElbSecurityGroup,
    Step::LoadBalancer,
    Step::FleetSecurityGroup,
    Step::LaunchConfig,
    Step::AutoScalingGroup,
];

/// Reverse (deprovisioning) order.
pub fn deprovision_order() -> [Step; 11] {
    let mut order = PROVISION_ORDER;
    order.reverse();
    order
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::IamUsers => write!(f, "iam-users"),
            Step::BootstrapConfig => write!(f, "bootstrap-config"),
            Step::Vpc => write!(f, "vpc"),
            Step::Subnet => write!(f, "subnet"),
            Step::InternetGateway => write!(f, "internet-gateway"),
            Step::RouteTable => write!(f, "route-table"),
            Step::ElbSecurityGroup => write!(f, "elb-security-group"),
            Step::LoadBalancer => write!(f, "load-balancer"),
            Step::FleetSecurityGroup => write!(f, "fleet-security-group"),
            Step::LaunchConfig => write!(f, "launch-config"),
            Step::AutoScalingGroup => write!(f, "autoscaling-group"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_are_inverses() {
        let forward = PROVISION_ORDER;
        let mut reverse = deprovision_order();
        reverse.reverse();
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_structural_dependencies_come_first() {
        let position = |step| {
            PROVISION_ORDER
                .iter()
                .position(|s| *s == step)
                .expect("step in order")
        };

        // later steps consume handles from earlier ones
        assert!(position(Step::Vpc) < position(Step::Subnet));
        assert!(position(Step::Subnet) < position(Step::LoadBalancer));
        assert!(position(Step::InternetGateway) < position(Step::RouteTable));
        assert!(position(Step::ElbSecurityGroup) < position(Step::LoadBalancer));
        assert!(position(Step::FleetSecurityGroup) < position(Step::LaunchConfig));
        assert!(position(Step::LaunchConfig) < position(Step::AutoScalingGroup));
        assert!(position(Step::IamUsers) < position(Step::BootstrapConfig));
    }
}
