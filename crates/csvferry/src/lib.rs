//! ⛴️ csvferry: one CSV off the dock, two transforms, one CSV back on.
//!
//! 🎬 *[narrator voice]* "Every morning a file lands in `raw/`. Every morning
//! someone needs it in `processed/`, minus the rows with no id, plus a column
//! nobody can explain. This is that someone."
//!
//! 📦 Layout:
//! - `app_config` → env + optional TOML → `EtlConfig`
//! - `backends` → `ObjectStore` seam, `S3ObjectStore` for real, `InMemoryObjectStore` for tests
//! - `extract` / `transforms` / `load` → the three stages
//! - `pipeline` → wires them together and reports a `RunSummary`
//! - `table` → the in-memory `Table` every stage passes around
//! - `error` → `EtlError`, the one place failures get names 🦆

pub mod app_config;
pub mod backends;
pub mod error;
pub mod extract;
pub mod load;
pub mod pipeline;
pub mod table;
pub mod transforms;

use anyhow::{Context, Result};

pub use crate::app_config::EtlConfig;
pub use crate::backends::{InMemoryObjectStore, ObjectStore, S3ObjectStore};
pub use crate::error::EtlError;
pub use crate::pipeline::{Pipeline, RunSummary};

/// 🚀 Build the S3 client from the config and sail the pipeline once.
pub async fn run(config: EtlConfig) -> Result<RunSummary> {
    let the_store = S3ObjectStore::connect(&config).await;
    let the_trip = format!(
        "💀 The ferry from {} to {} did not make it",
        config.source_uri(),
        config.destination_uri()
    );
    Pipeline::new(config, the_store)
        .run()
        .await
        .context(the_trip)
}
