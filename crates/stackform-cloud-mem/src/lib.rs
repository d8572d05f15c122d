//! In-memory cloud provider
//!
//! A deterministic [`CloudClient`](stackform_cloud::CloudClient) +
//! [`BlobStore`](stackform_cloud::BlobStore) implementation for tests and
//! dry runs. It simulates the awkward parts of a real provider the engine
//! has to tolerate:
//!
//! - eventual consistency: resources spend a configurable number of
//!   fetches in `pending`, and are invisible to lookups for a configurable
//!   number of fetches after creation
//! - referential integrity: deletes fail with `DependencyViolation` while
//!   other resources still reference the target
//! - provider-managed children: every VPC gets a `default` security group
//!   and a main route table, like the real thing
//! - fault injection: permanent create failures per kind, resources stuck
//!   in `pending`, deletes that never stop violating
//!
//! Every call is journaled so tests can assert exact call counts
//! ("provisioning a second time issues zero creates").

mod blob;
mod cloud;

pub use blob::MemoryBlobStore;
pub use cloud::{Call, MemoryCloud};
