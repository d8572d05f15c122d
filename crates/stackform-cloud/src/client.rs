//! Cloud client trait definition

use crate::error::Result;
use crate::handle::ResourceHandle;
use crate::kind::ResourceKind;
use crate::rule::{Direction, RuleSpec};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Lookup filter for [`CloudClient::find`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub key: String,
    pub value: String,
}

impl Filter {
    /// Match on the `Name` tag.
    pub fn name(value: impl Into<String>) -> Self {
        Self::tag("Name", value)
    }

    /// Match on an arbitrary tag.
    pub fn tag(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: format!("tag:{}", key.into()),
            value: value.into(),
        }
    }

    /// Match on a creation parameter (e.g. `vpc_id`, `cidr_block`).
    pub fn param(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Cloud provider client abstraction
///
/// The one seam between the orchestration engine and the remote API.
/// Implementations translate raw provider failures into the
/// [`CloudError`](crate::CloudError) taxonomy before returning; the engine
/// dispatches on that classification only.
///
/// Contract notes:
/// - `find` returns an empty vector when nothing matches; "no match" is
///   never an error.
/// - `get` returns `NotFound` for an absent resource. Freshly created
///   resources may be invisible to `get`/`find` for a short window; the
///   waiter retries the initial lookup.
/// - `delete` returns `NotFound` when the resource is already gone and
///   `DependencyViolation` while something still references it.
#[async_trait]
pub trait CloudClient: Send + Sync {
    /// Look up resources of one kind by filters.
    async fn find(&self, kind: ResourceKind, filters: &[Filter]) -> Result<Vec<ResourceHandle>>;

    /// Re-fetch a single resource by id.
    async fn get(&self, kind: ResourceKind, id: &str) -> Result<ResourceHandle>;

    /// Create a resource. Parameters are an open payload whose shape is
    /// agreed per kind between engine and provider.
    async fn create(&self, kind: ResourceKind, params: serde_json::Value)
    -> Result<ResourceHandle>;

    /// Update mutable properties of an existing resource (e.g. scale an
    /// autoscaling group).
    async fn update(&self, kind: ResourceKind, id: &str, params: serde_json::Value) -> Result<()>;

    /// Delete a resource by id.
    async fn delete(&self, kind: ResourceKind, id: &str) -> Result<()>;

    /// Set a tag on a resource.
    async fn tag(&self, kind: ResourceKind, id: &str, key: &str, value: &str) -> Result<()>;

    /// Attach a resource to another (internet gateway to VPC).
    async fn attach(&self, kind: ResourceKind, id: &str, target_id: &str) -> Result<()>;

    /// Detach a resource from another.
    async fn detach(&self, kind: ResourceKind, id: &str, target_id: &str) -> Result<()>;

    /// List live rules of a security group in one direction.
    async fn list_rules(&self, group_id: &str, direction: Direction) -> Result<Vec<RuleSpec>>;

    /// Add a rule to a security group.
    async fn add_rule(&self, group_id: &str, rule: &RuleSpec) -> Result<()>;

    /// Remove a rule from a security group.
    async fn remove_rule(&self, group_id: &str, rule: &RuleSpec) -> Result<()>;

    /// Add a route to a route table. Re-adding an identical route is a
    /// no-op.
    async fn add_route(&self, table_id: &str, cidr: &str, gateway_id: &str) -> Result<()>;

    /// Remove a route from a route table.
    async fn remove_route(&self, table_id: &str, cidr: &str) -> Result<()>;
}
