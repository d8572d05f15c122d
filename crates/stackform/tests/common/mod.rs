//! Shared builders for engine integration tests

#![allow(dead_code)]

use stackform::{
    FleetSpec, HealthCheckSpec, IamUserSpec, LoadBalancerSpec, NetworkSpec, PolicyDocument,
    StackSpec,
};
use stackform_cloud::{OPERATOR_CIDR, RetryPolicy, RuleSpec};
use std::time::Duration;

/// Install a subscriber once so `RUST_LOG` works during test runs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A retry policy that resolves in microseconds so tests stay fast.
pub fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(1),
        multiplier: 1.0,
    }
}

/// Full-featured stack spec: rules on both groups, an operator-gated SSH
/// rule, and one synthetic user with an inline policy.
pub fn test_spec(name: &str) -> StackSpec {
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
            ingress: vec![RuleSpec::ingress("tcp", 443, 443, "0.0.0.0/0")],
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
            max_size: 3,
            instance_type: "m3.medium".into(),
            ami_id: "ami-1ecae776".into(),
            key_pair: Some("ops".into()),
            ingress: vec![
                RuleSpec::ingress("tcp", 8443, 8443, "10.0.0.0/16"),
                RuleSpec::ingress("tcp", 22, 22, OPERATOR_CIDR),
            ],
            egress: vec![RuleSpec::egress("tcp", 443, 443, "0.0.0.0/0")],
        },
        iam_users: vec![IamUserSpec {
            name: format!("{name}-telemetry"),
            policies: vec![PolicyDocument {
                name: "blob-read".into(),
                document: serde_json::json!({
                    "Statement": [{ "Effect": "Allow", "Action": "s3:GetObject" }]
                }),
            }],
        }],
    }
}

pub const TEST_OPERATOR_CIDR: &str = "203.0.113.9/32";
