//! Resource handles
//!
//! A handle is the engine's view of one remote resource: the opaque
//! provider id plus the live state cached at fetch time. Handles are never
//! persisted across runs; the remote system is the source of truth and
//! every run rediscovers its resources by Name tag.

use crate::kind::{ResourceKind, ResourceState};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque remote identifier plus cached live state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceHandle {
    /// Provider-assigned identifier
    pub id: String,

    /// Resource kind
    pub kind: ResourceKind,

    /// Lifecycle state as of the last fetch
    pub state: ResourceState,

    /// Provider-reported extras (cidr, dns name, secret material, ...)
    pub attributes: HashMap<String, serde_json::Value>,
}

impl ResourceHandle {
    pub fn new(id: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            id: id.into(),
            kind,
            state: ResourceState::Pending,
            attributes: HashMap::new(),
        }
    }

    pub fn with_state(mut self, state: ResourceState) -> Self {
        self.state = state;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Get an attribute deserialized into a concrete type.
    pub fn attribute<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// The value of the `Name` tag, if the provider reported it.
    pub fn name(&self) -> Option<String> {
        self.attribute("name")
    }
}

impl std::fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({}, {})", self.kind, self.id, self.state)
    }
}
