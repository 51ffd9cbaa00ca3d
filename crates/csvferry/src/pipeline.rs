//! 🚢 Pipeline: extract, transform, load. In that order. Once.
//!
//! 🎬 COLD OPEN: INT. TERMINAL, 09:00
//!
//! The ferry leaves the dock at `source_key`, sails through two transforms, and moors
//! at `destination_key`. Same bucket both ends. If anything sinks on the way, the
//! destination is never touched: the PUT is the very last thing that happens.
//!
//! ```text
//!   get_object ──▶ decode ──▶ parse_csv ──▶ drop nulls ──▶ row_length ──▶ to_csv ──▶ put_object
//!   └──────────── extract ──────────────┘  └──── transforms ─────────┘  └───── load ─────┘
//! ```
//!
//! 🧠 Knowledge graph:
//! - Generic over `ObjectStore`, so the tests sail on `InMemoryObjectStore`.
//! - Progress goes to `tracing` at `info`. The raw-data preview is a `comfy-table`.
//! - The run returns a `RunSummary`; the CLI doesn't need it, the tests love it.

use tracing::info;

use crate::app_config::EtlConfig;
use crate::backends::ObjectStore;
use crate::error::EtlError;
use crate::{extract, load, transforms};

// 🍽️ Rows shown in the raw-data preview log line.
const PREVIEW_ROWS: usize = 5;

/// 📋 What one run did, start to finish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub rows_written: usize,
    pub bytes_written: usize,
    /// 🗺️ `s3://bucket/key` of the object that was written.
    pub destination: String,
}

/// 🚢 One config, one store, one trip.
#[derive(Debug)]
pub struct Pipeline<S: ObjectStore> {
    config: EtlConfig,
    store: S,
}

impl<S: ObjectStore> Pipeline<S> {
    pub fn new(config: EtlConfig, store: S) -> Self {
        Self { config, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 🚀 Run the whole trip. The first error ends it.
    pub async fn run(&self) -> Result<RunSummary, EtlError> {
        let bucket = self.config.bucket_name.as_str();
        info!("🪣 Bucket: {}", bucket);

        info!("📥 Downloading {}", self.config.source_uri());
        let mut the_table = extract::extract(&self.store, bucket, &self.config.source_key).await?;
        info!(
            "📋 Raw data ({} rows, {} columns):\n{}",
            the_table.row_count(),
            the_table.column_count(),
            the_table.preview(PREVIEW_ROWS)
        );

        info!("🔄 Transforming");
        let the_report = transforms::apply(&mut the_table);
        info!(
            "✂️ Dropped {} of {} rows with an empty '{}'",
            the_report.rows_dropped,
            the_report.rows_in,
            the_table
                .column_names()
                .first()
                .copied()
                .unwrap_or("<no columns>")
        );

        let bytes_written =
            load::load(&self.store, bucket, &self.config.destination_key, &the_table).await?;
        let destination = self.config.destination_uri();

        info!("✅ ETL complete: {} rows written", the_report.rows_out);
        info!("📤 Saved to {}", destination);

        Ok(RunSummary {
            rows_read: the_report.rows_in,
            rows_dropped: the_report.rows_dropped,
            rows_written: the_report.rows_out,
            bytes_written,
            destination,
        })
    }
}
