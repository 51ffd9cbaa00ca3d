//! # Previously, on csvferry...
//!
//! 🎬 The bucket was far away. Across a network. Behind credentials. Someone had to
//! pretend to be it, so the tests could run on a plane with the WiFi off.
//!
//! That someone was this module.
//!
//! `in_mem` provides an [`ObjectStore`] that keeps every object in a `HashMap` behind an
//! `Arc<Mutex<...>>`. Clone it, hand one copy to the pipeline, keep the other to peek
//! at what got written. Great for assertions, great for trust issues, great for both.
//!
//! ⚠️ This is NOT for production. If you're deploying this to prod, please also deploy
//! a therapist.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::trace;

use crate::backends::ObjectStore;
use crate::error::EtlError;

type ObjectKey = (String, String);

/// 📦 An object store that never forgets (until it's dropped).
///
/// Every clone shares the same objects. The `Arc` means everyone sees the same HashMap.
#[derive(Debug, Default, Clone)]
pub struct InMemoryObjectStore {
    objects: Arc<Mutex<HashMap<ObjectKey, Vec<u8>>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 📥 Put an object on the shelf directly, no pipeline required.
    pub async fn insert(&self, bucket: &str, key: &str, body: Vec<u8>) {
        self.objects
            .lock()
            .await
            .insert((bucket.to_string(), key.to_string()), body);
    }

    /// 🔍 Peek at an object without going through `get_object`.
    pub async fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// 🔢 How many objects are sitting on the shelf.
    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, EtlError> {
        trace!("🔍 rummaging through the HashMap for s3://{}/{}", bucket, key);
        self.object(bucket, key)
            .await
            .ok_or_else(|| EtlError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), EtlError> {
        trace!(
            "📬 {} bytes shelved at s3://{}/{}",
            body.len(),
            bucket,
            key
        );
        self.insert(bucket, key, body).await;
        Ok(())
    }
}
