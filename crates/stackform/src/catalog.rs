//! Stack naming catalog
//!
//! Every resource in a stack is named `{stack}{suffix}` and tagged with
//! that name. Uniqueness within a stack is enforced by the name, not by a
//! separately tracked id: each run rediscovers existing resources by name
//! and must never create duplicates.

/// Destination CIDR of the default route added to the stack's route table.
pub const DEFAULT_ROUTE_CIDR: &str = "0.0.0.0/0";

pub const SUBNET_SUFFIX: &str = "-SN";
pub const GATEWAY_SUFFIX: &str = "-IG";
pub const ROUTE_TABLE_SUFFIX: &str = "-RT";
pub const FLEET_SG_SUFFIX: &str = "-SG";
pub const ELB_SG_SUFFIX: &str = "-ELB-SG";
pub const LOAD_BALANCER_SUFFIX: &str = "-ELB";
pub const AUTOSCALING_SUFFIX: &str = "-AS";
pub const LAUNCH_CONFIG_SUFFIX: &str = "-LC";

/// Derived names for every resource of one stack
#[derive(Debug, Clone)]
pub struct StackNames {
    stack: String,
}

impl StackNames {
    pub fn new(stack: impl Into<String>) -> Self {
        Self {
            stack: stack.into(),
        }
    }

    /// The VPC carries the bare stack name.
    pub fn vpc(&self) -> &str {
        &self.stack
    }

    pub fn subnet(&self) -> String {
        format!("{}{}", self.stack, SUBNET_SUFFIX)
    }

    pub fn gateway(&self) -> String {
        format!("{}{}", self.stack, GATEWAY_SUFFIX)
    }

    pub fn route_table(&self) -> String {
        format!("{}{}", self.stack, ROUTE_TABLE_SUFFIX)
    }

    pub fn fleet_security_group(&self) -> String {
        format!("{}{}", self.stack, FLEET_SG_SUFFIX)
    }

    pub fn elb_security_group(&self) -> String {
        format!("{}{}", self.stack, ELB_SG_SUFFIX)
    }

    pub fn load_balancer(&self) -> String {
        format!("{}{}", self.stack, LOAD_BALANCER_SUFFIX)
    }

    pub fn autoscaling_group(&self) -> String {
        format!("{}{}", self.stack, AUTOSCALING_SUFFIX)
    }

    pub fn launch_config(&self) -> String {
        format!("{}{}", self.stack, LAUNCH_CONFIG_SUFFIX)
    }

    /// Blob key of the per-stack bootstrap bundle.
    pub fn bootstrap_key(&self) -> String {
        format!("{}/bootstrap.json", self.stack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_names() {
        let names = StackNames::new("pinger");
        assert_eq!(names.vpc(), "pinger");
        assert_eq!(names.subnet(), "pinger-SN");
        assert_eq!(names.gateway(), "pinger-IG");
        assert_eq!(names.route_table(), "pinger-RT");
        assert_eq!(names.fleet_security_group(), "pinger-SG");
        assert_eq!(names.elb_security_group(), "pinger-ELB-SG");
        assert_eq!(names.load_balancer(), "pinger-ELB");
        assert_eq!(names.autoscaling_group(), "pinger-AS");
        assert_eq!(names.launch_config(), "pinger-LC");
        assert_eq!(names.bootstrap_key(), "pinger/bootstrap.json");
    }
}
