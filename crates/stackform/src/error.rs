//! Engine error types

use stackform_cloud::{CloudError, ResourceKind};
use thiserror::Error;

/// Failures raised by orchestration steps
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("cloud provider error: {0}")]
    Cloud(#[from] CloudError),

    /// A rule carries the operator-CIDR placeholder but no operator CIDR
    /// was supplied for this run.
    #[error("a rule references the operator CIDR but none was supplied")]
    MissingOperatorCidr,

    /// A step needed a handle an earlier step should have produced.
    #[error("required {kind} \"{name}\" is not available")]
    MissingDependency { kind: ResourceKind, name: String },

    #[error("bootstrap bundle error: {0}")]
    Bundle(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
