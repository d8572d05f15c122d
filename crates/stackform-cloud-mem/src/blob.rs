//! In-memory `BlobStore` implementation

use async_trait::async_trait;
use stackform_cloud::{BlobStore, CloudError, Result};
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory blob store
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    mutations: Mutex<usize>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .blobs
            .lock()
            .expect("memory blob state poisoned")
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    pub fn contains(&self, key: &str) -> bool {
        self.blobs
            .lock()
            .expect("memory blob state poisoned")
            .contains_key(key)
    }

    /// Count of writes and successful deletes.
    pub fn mutations(&self) -> usize {
        *self.mutations.lock().expect("memory blob state poisoned")
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.blobs
            .lock()
            .expect("memory blob state poisoned")
            .get(key)
            .cloned()
            .ok_or_else(|| CloudError::NotFound(format!("blob {key}")))
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.blobs
            .lock()
            .expect("memory blob state poisoned")
            .insert(key.to_string(), bytes.to_vec());
        *self.mutations.lock().expect("memory blob state poisoned") += 1;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let removed = self
            .blobs
            .lock()
            .expect("memory blob state poisoned")
            .remove(key);
        match removed {
            Some(_) => {
                *self.mutations.lock().expect("memory blob state poisoned") += 1;
                Ok(())
            }
            None => Err(CloudError::NotFound(format!("blob {key}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_and_mutation_count() {
        let store = MemoryBlobStore::new();
        store.put("pinger/bootstrap.json", b"{}").await.unwrap();
        assert_eq!(store.get("pinger/bootstrap.json").await.unwrap(), b"{}");
        store.delete("pinger/bootstrap.json").await.unwrap();
        assert_eq!(store.mutations(), 2);

        assert!(store.delete("missing").await.unwrap_err().is_not_found());
        assert_eq!(store.mutations(), 2);
    }
}
