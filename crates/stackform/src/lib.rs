//! Stackform orchestration engine
//!
//! Provisions and tears down the complete resource set of one named
//! deployment ("stack") — network, routing, firewall rules, load
//! balancer, autoscaling fleet, identity credentials, bootstrap
//! configuration — idempotently against an eventually-consistent remote
//! API reached through the [`stackform_cloud`] boundary traits.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │            Provisioner / Deprovisioner            │
//! │        (explicit step order, rollback policy)     │
//! ├──────────────┬──────────────┬────────────────────┤
//! │  Reconciler  │ RuleReconcile│  BootstrapBundle    │
//! │ (find-or-    │ (ingress add,│  (credentials +     │
//! │  create)     │ egress swap) │   liveness token)   │
//! ├──────────────┴──────────────┴────────────────────┤
//! │        stackform-cloud: CloudClient, BlobStore,   │
//! │        error taxonomy, retry policy, waiter       │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! A run owns the whole stack for its duration and is strictly
//! sequential; nothing is persisted between runs — every invocation
//! rediscovers its resources by name.

pub mod bootstrap;
pub mod catalog;
pub mod deprovision;
pub mod error;
pub mod plan;
pub mod provision;
pub mod reconcile;
pub mod rules;
pub mod spec;
pub mod topology;

// Re-exports
pub use bootstrap::{BootstrapBundle, CredentialEntry};
pub use catalog::StackNames;
pub use deprovision::{DeleteOutcome, DeprovisionReport, Deprovisioner, delete_with_retry};
pub use error::{EngineError, Result};
pub use plan::{PROVISION_ORDER, Step, deprovision_order};
pub use provision::{ProvisionFailure, Provisioner};
pub use reconcile::Reconciler;
pub use spec::{
    FleetSpec, HealthCheckSpec, IamUserSpec, LoadBalancerSpec, NetworkSpec, PolicyDocument,
    StackSpec,
};
pub use topology::StackTopology;
