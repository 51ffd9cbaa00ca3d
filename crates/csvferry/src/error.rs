//! 💀 Errors: the complete catalogue of ways a one-way CSV trip can end badly.
//!
//! 🎬 Every stage of the ferry returns `Result<_, EtlError>`. Nobody catches anything.
//! Nobody retries. The first failure sinks the boat, and the CLI reads the
//! wreckage report out loud before exiting with status 1.
//!
//! 🧠 Knowledge graph:
//! - `Configuration` → `app_config` (pre-flight, before any store exists)
//! - `Connection` / `Authentication` / `ObjectNotFound` / `ObjectStore` → `backends`
//! - `Decoding` / `Parse` → `extract`
//! - `Serialization` → `load`
//!
//! 🦆 The duck has read every variant. The duck is not surprised by any of them.

use thiserror::Error;

/// 🏷️ Every way the pipeline can fail, one variant per failure class.
#[derive(Debug, Error)]
pub enum EtlError {
    /// 🔧 Required settings are missing, empty, or unparseable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// 📡 The endpoint could not be reached (refused, DNS, timeout).
    #[error("could not reach the object store at {endpoint}: {message}")]
    Connection { endpoint: String, message: String },

    /// 🔒 The store rejected our credentials.
    #[error("object store rejected the credentials for s3://{bucket}/{key}: {message}")]
    Authentication {
        bucket: String,
        key: String,
        message: String,
    },

    /// 🕳️ The bucket or key does not exist.
    #[error("object s3://{bucket}/{key} does not exist")]
    ObjectNotFound { bucket: String, key: String },

    /// 🪣 The store answered, but not with anything we could use.
    #[error("object store request for s3://{bucket}/{key} failed: {message}")]
    ObjectStore {
        bucket: String,
        key: String,
        message: String,
    },

    /// 🔤 The source object is not UTF-8.
    #[error("source object is not valid UTF-8: {0}")]
    Decoding(#[from] std::string::FromUtf8Error),

    /// 📜 The CSV structure is broken.
    #[error("malformed CSV: {0}")]
    Parse(String),

    /// 📤 The table could not be written back out as CSV.
    #[error("failed to serialize CSV: {0}")]
    Serialization(String),
}

impl EtlError {
    /// 📡 True for failures that smell like "the store isn't running".
    pub fn is_connection(&self) -> bool {
        matches!(self, EtlError::Connection { .. })
    }
}
