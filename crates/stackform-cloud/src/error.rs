//! Provider error taxonomy
//!
//! Every provider implementation classifies its raw failures into this
//! taxonomy at the boundary. Orchestration code dispatches on the
//! classification only and never sees provider-specific error codes.

use thiserror::Error;

/// Classified cloud provider errors
#[derive(Error, Debug)]
pub enum CloudError {
    /// Resource not yet visible or not yet ready; safe to retry locally.
    #[error("transient provider condition: {0}")]
    Transient(String),

    /// Resource is still referenced by something not yet deleted.
    /// Retried with backoff during deletion only.
    #[error("dependency violation: {0}")]
    DependencyViolation(String),

    /// Resource does not exist. An error for required lookups, a success
    /// for deletions.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Quota, invalid spec, auth failure. Never retried; aborts the run.
    #[error("permanent provider error: {0}")]
    Permanent(String),

    /// A bounded retry loop exhausted its attempts.
    #[error("timed out waiting for {what} after {attempts} attempts")]
    Timeout { what: String, attempts: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    pub fn is_transient(&self) -> bool {
        matches!(self, CloudError::Transient(_))
    }

    pub fn is_dependency_violation(&self) -> bool {
        matches!(self, CloudError::DependencyViolation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::NotFound(_))
    }

    /// Anything that is neither retryable nor an already-absent signal.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient() && !self.is_dependency_violation() && !self.is_not_found()
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_predicates() {
        assert!(CloudError::Transient("pending".into()).is_transient());
        assert!(CloudError::DependencyViolation("in use".into()).is_dependency_violation());
        assert!(CloudError::NotFound("vpc-1".into()).is_not_found());
        assert!(CloudError::Permanent("quota".into()).is_permanent());
        assert!(
            CloudError::Timeout {
                what: "vpc vpc-1".into(),
                attempts: 5
            }
            .is_permanent()
        );
        assert!(!CloudError::NotFound("gone".into()).is_permanent());
    }
}
