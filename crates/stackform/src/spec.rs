//! Declarative stack specification
//!
//! The engine treats this as fully validated input; loading and validating
//! it is the caller's concern. The shape mirrors the deployment config
//! sections: network, load balancer, fleet, and synthetic IAM users.

use crate::catalog::StackNames;
use serde::{Deserialize, Serialize};
use stackform_cloud::RuleSpec;

/// Full declarative input for one stack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackSpec {
    /// Logical deployment name; every resource name derives from it.
    pub name: String,

    pub network: NetworkSpec,
    pub load_balancer: LoadBalancerSpec,
    pub fleet: FleetSpec,

    /// Synthetic users whose credentials end up in the bootstrap bundle.
    #[serde(default)]
    pub iam_users: Vec<IamUserSpec>,
}

impl StackSpec {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn names(&self) -> StackNames {
        StackNames::new(&self.name)
    }
}

/// VPC and subnet parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub vpc_cidr: String,
    pub subnet_cidr: String,
    pub availability_zone: String,

    #[serde(default = "default_tenancy")]
    pub instance_tenancy: String,
}

fn default_tenancy() -> String {
    "default".to_string()
}

/// Load balancer listener, rules and health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadBalancerSpec {
    pub listen_port: u16,
    pub target_port: u16,

    #[serde(default)]
    pub ingress: Vec<RuleSpec>,
    #[serde(default)]
    pub egress: Vec<RuleSpec>,

    pub health_check: HealthCheckSpec,
}

/// Health check probed by the load balancer against fleet members
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckSpec {
    pub interval_secs: u32,
    pub healthy_threshold: u32,
    pub unhealthy_threshold: u32,
    pub path: String,
    pub port: u16,
}

/// Autoscaling fleet bounds and launch parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetSpec {
    pub min_size: u32,
    pub max_size: u32,
    pub instance_type: String,
    pub ami_id: String,

    #[serde(default)]
    pub key_pair: Option<String>,

    #[serde(default)]
    pub ingress: Vec<RuleSpec>,
    #[serde(default)]
    pub egress: Vec<RuleSpec>,
}

/// One synthetic IAM user with inline policies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IamUserSpec {
    pub name: String,

    #[serde(default)]
    pub policies: Vec<PolicyDocument>,
}

/// Inline policy document; content is opaque to the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDocument {
    pub name: String,
    pub document: serde_json::Value,
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;

    pub fn minimal_spec(name: &str) -> StackSpec {
        StackSpec {
            name: name.to_string(),
            network: NetworkSpec {
                vpc_cidr: "10.0.0.0/16".into(),
                subnet_cidr: "10.0.1.0/24".into(),
                availability_zone: "us-east-1a".into(),
                instance_tenancy: "default".into(),
            },
            load_balancer: LoadBalancerSpec {
                listen_port: 443,
                target_port: 8443,
                ingress: Vec::new(),
                egress: Vec::new(),
                health_check: HealthCheckSpec {
                    interval_secs: 30,
                    healthy_threshold: 2,
                    unhealthy_threshold: 5,
                    path: "/status".into(),
                    port: 8443,
                },
            },
            fleet: FleetSpec {
                min_size: 1,
                max_size: 2,
                instance_type: "m3.medium".into(),
                ami_id: "ami-1ecae776".into(),
                key_pair: None,
                ingress: Vec::new(),
                egress: Vec::new(),
            },
            iam_users: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let spec = StackSpec::from_json(
            r#"{
                "name": "pinger",
                "network": {
                    "vpc_cidr": "10.0.0.0/16",
                    "subnet_cidr": "10.0.1.0/24",
                    "availability_zone": "us-east-1a"
                },
                "load_balancer": {
                    "listen_port": 443,
                    "target_port": 8443,
                    "ingress": [
                        {"protocol": "tcp", "from_port": 443, "to_port": 443,
                         "cidr": "0.0.0.0/0", "direction": "ingress"}
                    ],
                    "health_check": {
                        "interval_secs": 30,
                        "healthy_threshold": 2,
                        "unhealthy_threshold": 5,
                        "path": "/status",
                        "port": 8443
                    }
                },
                "fleet": {
                    "min_size": 2,
                    "max_size": 4,
                    "instance_type": "m3.medium",
                    "ami_id": "ami-1ecae776"
                },
                "iam_users": [
                    {"name": "pinger-telemetry", "policies": [
                        {"name": "s3-read", "document": {"Statement": []}}
                    ]}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(spec.name, "pinger");
        assert_eq!(spec.network.instance_tenancy, "default");
        assert_eq!(spec.load_balancer.ingress.len(), 1);
        assert_eq!(spec.fleet.key_pair, None);
        assert_eq!(spec.iam_users[0].policies[0].name, "s3-read");
    }
}
