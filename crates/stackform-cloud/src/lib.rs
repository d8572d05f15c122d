//! Stackform cloud boundary
//!
//! This crate defines the seam between the stackform orchestration engine
//! and a remote cloud provider: the fixed set of resource kinds, opaque
//! resource handles, security-group rule specs, the [`CloudClient`] and
//! [`BlobStore`] traits, the classified error taxonomy, and the bounded
//! polling/retry primitives built on top of them.
//!
//! Provider implementations live in sibling crates and translate raw
//! provider failures into [`CloudError`] at this boundary, so the engine
//! never inspects provider-specific error codes.

pub mod blob;
pub mod client;
pub mod error;
pub mod handle;
pub mod kind;
pub mod retry;
pub mod rule;
pub mod waiter;

// Re-exports
pub use blob::{BlobStore, FsBlobStore};
pub use client::{CloudClient, Filter};
pub use error::{CloudError, Result};
pub use handle::ResourceHandle;
pub use kind::{ResourceKind, ResourceState};
pub use retry::RetryPolicy;
pub use rule::{Direction, OPERATOR_CIDR, RuleSpec};
