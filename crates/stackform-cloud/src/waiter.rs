//! Eventual-consistency waiter
//!
//! The remote API is eventually consistent in two ways the engine has to
//! absorb: a freshly created resource may not be queryable yet, and a
//! queryable resource may sit in a transient state before becoming usable.
//! Both are handled by bounded polling loops driven by a [`RetryPolicy`];
//! exhausting the attempt budget is a permanent failure, never silently
//! ignored.

use crate::client::CloudClient;
use crate::error::{CloudError, Result};
use crate::handle::ResourceHandle;
use crate::kind::{ResourceKind, ResourceState};
use crate::retry::RetryPolicy;
use tokio::time::sleep;

/// Poll a resource until its state leaves the transient set.
///
/// Issues exactly one fetch per attempt, up to `policy.max_attempts`
/// fetches, sleeping the policy's backed-off delay between attempts.
pub async fn await_state(
    client: &dyn CloudClient,
    handle: &ResourceHandle,
    transient_states: &[ResourceState],
    policy: &RetryPolicy,
) -> Result<ResourceHandle> {
    for attempt in 0..policy.max_attempts {
        let fresh = client.get(handle.kind, &handle.id).await?;
        if !transient_states.contains(&fresh.state) {
            return Ok(fresh);
        }

        tracing::debug!(
            "waiting for {} to leave {} (attempt {}/{})",
            fresh,
            fresh.state,
            attempt + 1,
            policy.max_attempts
        );
        if attempt + 1 < policy.max_attempts {
            sleep(policy.delay_for_attempt(attempt)).await;
        }
    }

    Err(CloudError::Timeout {
        what: format!("{} {}", handle.kind, handle.id),
        attempts: policy.max_attempts,
    })
}

/// Poll until a lookup that initially fails with `NotFound` starts
/// succeeding.
///
/// A create call may succeed remotely before the resource is queryable;
/// this retries the lookup itself a small fixed number of times before
/// treating "not found yet" as a real failure. Any non-`NotFound` error
/// aborts immediately.
pub async fn await_visible(
    client: &dyn CloudClient,
    kind: ResourceKind,
    id: &str,
    policy: &RetryPolicy,
) -> Result<ResourceHandle> {
    for attempt in 0..policy.max_attempts {
        match client.get(kind, id).await {
            Ok(handle) => return Ok(handle),
            Err(e) if e.is_not_found() => {
                tracing::debug!(
                    "{} {} not visible yet (attempt {}/{})",
                    kind,
                    id,
                    attempt + 1,
                    policy.max_attempts
                );
                if attempt + 1 < policy.max_attempts {
                    sleep(policy.delay_for_attempt(attempt)).await;
                }
            }
            Err(e) => return Err(e),
        }
    }

    Err(CloudError::Timeout {
        what: format!("{kind} {id} to become visible"),
        attempts: policy.max_attempts,
    })
}
