//! 🔌 Backends: where the real I/O happens.
//!
//! 🚰 One object comes off the dock, another goes back on. That's the whole contract.
//! Whole-object GET, whole-object PUT, no ranges, no multipart, no retries.
//!
//! 🎭 This module is the casting agency. Need a real S3-compatible store with a network,
//! credentials, and feelings? `S3ObjectStore`. Need a store that lives in a HashMap and
//! never argues? `InMemoryObjectStore`. Both play the same role: `ObjectStore`.
//!
//! 🦆 The duck is here because every file must have one. This is law. Do not question the duck.

use async_trait::async_trait;

use crate::error::EtlError;

pub mod in_mem;
pub mod s3;

pub use in_mem::InMemoryObjectStore;
pub use s3::S3ObjectStore;

/// 🪣 A key-addressed blob store: bucket + key in, bytes out (and back).
///
/// # Contract
/// - `get_object` returns the full body. A missing bucket or key is `EtlError::ObjectNotFound`.
/// - `put_object` creates or fully replaces the object. No append, no versioning.
/// - Unreachable endpoints are `EtlError::Connection`, rejected credentials are
///   `EtlError::Authentication`. One failed call is one failed run. Nobody retries.
#[async_trait]
pub trait ObjectStore: std::fmt::Debug + Send + Sync {
    /// 📥 Fetch the whole object body.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, EtlError>;

    /// 📤 Write (or overwrite) the whole object body.
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), EtlError>;
}
