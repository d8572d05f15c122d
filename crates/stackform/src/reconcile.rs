//! Idempotent resource reconciliation
//!
//! "Find by name or create": each resource kind is ensured present by
//! looking it up by Name tag (scoped to the parent stack where the kind
//! requires it), and created, tagged, and waited out of `pending` only
//! when absent. Existing resources are returned untouched; idempotency
//! here means "ensure present", not "ensure exactly matching spec". The
//! exceptions are security-group rules, which are reconciled separately.

use stackform_cloud::{
    CloudClient, CloudError, Filter, ResourceHandle, ResourceKind, ResourceState, RetryPolicy,
    waiter,
};

/// Find-or-create reconciler over one cloud client
pub struct Reconciler<'a> {
    client: &'a dyn CloudClient,
    poll: RetryPolicy,
    visibility: RetryPolicy,
}

impl<'a> Reconciler<'a> {
    pub fn new(client: &'a dyn CloudClient) -> Self {
        Self {
            client,
            poll: RetryPolicy::polling(),
            visibility: RetryPolicy::visibility(),
        }
    }

    pub fn with_poll_policy(mut self, policy: RetryPolicy) -> Self {
        self.poll = policy;
        self
    }

    pub fn with_visibility_policy(mut self, policy: RetryPolicy) -> Self {
        self.visibility = policy;
        self
    }

    /// Look up a resource by Name tag plus scope filters.
    ///
    /// "No match" is an empty result, not an error; any other lookup
    /// failure is permanent and aborts the run.
    pub async fn find_by_name(
        &self,
        kind: ResourceKind,
        name: &str,
        scope: &[Filter],
    ) -> Result<Option<ResourceHandle>, CloudError> {
        let mut filters = vec![Filter::name(name)];
        filters.extend_from_slice(scope);
        match self.client.find(kind, &filters).await {
            Ok(handles) => Ok(handles.into_iter().next()),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Ensure a resource exists: discover it by name, or create it, tag it
    /// for future discovery, and wait until it leaves `pending`.
    pub async fn ensure(
        &self,
        kind: ResourceKind,
        name: &str,
        scope: &[Filter],
        params: serde_json::Value,
    ) -> Result<ResourceHandle, CloudError> {
        if let Some(existing) = self.find_by_name(kind, name, scope).await? {
            tracing::debug!("{} {} already exists as {}", kind, name, existing.id);
            return Ok(existing);
        }

        tracing::info!("creating {} {}", kind, name);
        let created = self.client.create(kind, params).await?;

        // The create may return before the resource is queryable.
        let visible = waiter::await_visible(self.client, kind, &created.id, &self.visibility).await?;
        self.client.tag(kind, &visible.id, "Name", name).await?;

        let ready =
            waiter::await_state(self.client, &visible, &[ResourceState::Pending], &self.poll)
                .await?;
        tracing::info!("created {}", ready);
        Ok(ready)
    }
}
