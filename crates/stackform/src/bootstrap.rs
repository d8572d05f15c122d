//! Bootstrap bundle composition
//!
//! A per-stack configuration bundle written to the blob store before the
//! network phase: synthetic-user credentials plus a one-time liveness
//! token consumed by the fleet's health checks. Everything outside this
//! module treats the bundle as opaque bytes.

use crate::spec::StackSpec;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Credentials for one synthetic user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialEntry {
    pub user: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// The per-stack bootstrap bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapBundle {
    pub stack: String,

    /// One-time token the health-check endpoint answers with.
    pub liveness_token: String,

    pub health_check_path: String,
    pub health_check_port: u16,

    pub credentials: Vec<CredentialEntry>,

    pub written_at: DateTime<Utc>,
}

impl BootstrapBundle {
    /// Compose a fresh bundle with a newly minted liveness token.
    pub fn compose(spec: &StackSpec, credentials: Vec<CredentialEntry>) -> Self {
        Self {
            stack: spec.name.clone(),
            liveness_token: Uuid::new_v4().to_string(),
            health_check_path: spec.load_balancer.health_check.path.clone(),
            health_check_port: spec.load_balancer.health_check.port,
            credentials,
            written_at: Utc::now(),
        }
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::tests_support::minimal_spec;

    #[test]
    fn test_round_trip() {
        let spec = minimal_spec("pinger");
        let bundle = BootstrapBundle::compose(
            &spec,
            vec![CredentialEntry {
                user: "pinger-telemetry".into(),
                access_key_id: "akia-0001".into(),
                secret_access_key: "sk-0001".into(),
            }],
        );

        let restored = BootstrapBundle::from_bytes(&bundle.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.stack, "pinger");
        assert_eq!(restored.liveness_token, bundle.liveness_token);
        assert_eq!(restored.credentials.len(), 1);
    }

    #[test]
    fn test_tokens_are_unique_per_bundle() {
        let spec = minimal_spec("pinger");
        let a = BootstrapBundle::compose(&spec, Vec::new());
        let b = BootstrapBundle::compose(&spec, Vec::new());
        assert_ne!(a.liveness_token, b.liveness_token);
    }
}
