//! 🔧 App Configuration: the sacred env-to-struct pipeline.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the fridge.
//! In `AWS_ENDPOINT_URL`. Nothing." (every developer at 3am) 🦆
//!
//! 🏗️ Powered by Figment, because manually parsing env vars is a form of
//! self-harm that even the borrow checker wouldn't approve of.
//!
//! 🧠 Knowledge graph:
//! - Env vars are read with `Env::raw().only(...)` and handed to figment as plain strings
//!   (`Serialized::defaults` over a lowercase-keyed map). `Env` on its own would parse
//!   `S3_BUCKET_NAME=007` into the number 7. `RawConfig` fields use the lowercase names.
//! - An optional TOML file is merged on top (file wins), using the same lowercase keys.
//! - `EtlConfig::from_figment` is the single place where validation happens. Tests feed it
//!   `Toml::string(...)` so nobody has to mutate the real process environment.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::EtlError;

/// 🔑 Default access key, the one every local S3 emulator accepts without asking questions.
pub const DEFAULT_ACCESS_KEY: &str = "test";
/// 🔑 Default secret key. Yes, also "test". Security through optimism.
pub const DEFAULT_SECRET_KEY: &str = "test";
/// 📥 Where the raw CSV lives unless told otherwise.
pub const DEFAULT_SOURCE_KEY: &str = "raw/input.csv";
/// 📤 Where the processed CSV lands unless told otherwise.
pub const DEFAULT_DESTINATION_KEY: &str = "processed/output.csv";
/// 🌎 us-east-1. The Florida of AWS regions. Everyone ends up there eventually.
pub const REGION: &str = "us-east-1";

// 📋 The only env vars we listen to. Everything else in the environment is background noise.
const ENV_KEYS: &[&str] = &[
    "AWS_ENDPOINT_URL",
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "S3_BUCKET_NAME",
    "ETL_SOURCE_KEY",
    "ETL_DESTINATION_KEY",
    "ETL_OPERATION_TIMEOUT_SECS",
];

/// 📦 The EtlConfig: one struct to rule them all, built once, never mutated.
///
/// Passed explicitly into the store client and the pipeline. No globals were harmed.
#[derive(Clone, PartialEq)]
pub struct EtlConfig {
    /// 📡 S3-compatible endpoint URL, e.g. `http://localhost:4566`.
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    /// 🪣 The bucket holding both the source and the destination objects.
    pub bucket_name: String,
    pub source_key: String,
    pub destination_key: String,
    /// 🌎 Always `us-east-1`. It's a field so the store doesn't have to import a constant.
    pub region: String,
    /// ⏱️ Per-operation timeout for store calls. `None` = wait forever, like a golden retriever.
    pub operation_timeout: Option<Duration>,
}

// 🔒 Hand-rolled Debug so the secret key never shows up in logs. The duck saw it once. Never again.
impl fmt::Debug for EtlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EtlConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("bucket_name", &self.bucket_name)
            .field("source_key", &self.source_key)
            .field("destination_key", &self.destination_key)
            .field("region", &self.region)
            .field("operation_timeout", &self.operation_timeout)
            .finish()
    }
}

impl EtlConfig {
    /// 🚀 A config with the two required values and every default filled in.
    pub fn new(endpoint: impl Into<String>, bucket_name: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_key: DEFAULT_ACCESS_KEY.to_string(),
            secret_key: DEFAULT_SECRET_KEY.to_string(),
            bucket_name: bucket_name.into(),
            source_key: DEFAULT_SOURCE_KEY.to_string(),
            destination_key: DEFAULT_DESTINATION_KEY.to_string(),
            region: REGION.to_string(),
            operation_timeout: None,
        }
    }

    /// 🔧 Extract and validate from any figment. The one true door into an `EtlConfig`.
    ///
    /// 💀 Fails with `EtlError::Configuration` when the endpoint or bucket is missing or blank,
    /// or when a value can't be parsed at all.
    pub fn from_figment(figment: &Figment) -> Result<Self, EtlError> {
        let raw: RawConfig = figment.extract().map_err(|e| {
            EtlError::Configuration(format!("could not read configuration values: {e}"))
        })?;

        let endpoint = required(raw.aws_endpoint_url, "AWS_ENDPOINT_URL")?;
        let bucket_name = required(raw.s3_bucket_name, "S3_BUCKET_NAME")?;

        let operation_timeout = match non_blank(raw.etl_operation_timeout_secs) {
            Some(text) => match text.parse::<u64>() {
                Ok(0) => {
                    return Err(EtlError::Configuration(
                        "ETL_OPERATION_TIMEOUT_SECS must be greater than zero".to_string(),
                    ));
                }
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(_) => {
                    return Err(EtlError::Configuration(format!(
                        "ETL_OPERATION_TIMEOUT_SECS must be a whole number of seconds, got '{text}'"
                    )));
                }
            },
            None => None,
        };

        Ok(Self {
            endpoint,
            // -- 🔑 unset means "test". set-but-empty means empty. we pass it on either way.
            access_key: raw
                .aws_access_key_id
                .unwrap_or_else(|| DEFAULT_ACCESS_KEY.to_string()),
            secret_key: raw
                .aws_secret_access_key
                .unwrap_or_else(|| DEFAULT_SECRET_KEY.to_string()),
            bucket_name,
            source_key: non_blank(raw.etl_source_key)
                .unwrap_or_else(|| DEFAULT_SOURCE_KEY.to_string()),
            destination_key: non_blank(raw.etl_destination_key)
                .unwrap_or_else(|| DEFAULT_DESTINATION_KEY.to_string()),
            region: REGION.to_string(),
            operation_timeout,
        })
    }

    /// 🗺️ `s3://bucket/raw/input.csv`, for logs and error messages.
    pub fn source_uri(&self) -> String {
        format!("s3://{}/{}", self.bucket_name, self.source_key)
    }

    /// 🗺️ `s3://bucket/processed/output.csv`, for logs and the summary.
    pub fn destination_uri(&self) -> String {
        format!("s3://{}/{}", self.bucket_name, self.destination_key)
    }
}

/// 🚀 Load the config from the environment, optionally layered with a TOML file.
///
/// 📐 Layering:
///   - `config_file` is None → env vars only.
///   - `config_file` is Some → env vars + TOML file, merged. TOML wins on conflicts.
///
/// 💀 A config file that was asked for but isn't on disk is a configuration error. We don't
/// quietly pretend it was empty.
pub fn load_config(config_file: Option<&Path>) -> Result<EtlConfig, EtlError> {
    let figment = Figment::new().merge(Serialized::defaults(env_layer()));

    let figment = match config_file {
        Some(path) => {
            info!("🔧 Loading configuration from env and '{}'", path.display());
            let exists = path.try_exists().map_err(|e| {
                EtlError::Configuration(format!(
                    "could not check config file '{}': {e}",
                    path.display()
                ))
            })?;
            if !exists {
                return Err(EtlError::Configuration(format!(
                    "config file '{}' does not exist",
                    path.display()
                )));
            }
            figment.merge(Toml::file(path))
        }
        None => {
            info!("🔧 Loading configuration from env");
            figment
        }
    };

    let config = EtlConfig::from_figment(&figment)?;
    debug!("✅ configuration resolved: {:?}", config);
    Ok(config)
}

// ============================================================
//  🧱 RawConfig: what figment hands us before we judge it
// ============================================================

// 🧱 Everything optional here; `from_figment` decides what is actually required.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default, deserialize_with = "lenient_string")]
    aws_endpoint_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    aws_access_key_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    aws_secret_access_key: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    s3_bucket_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    etl_source_key: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    etl_destination_key: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    etl_operation_timeout_secs: Option<String>,
}

// 🔤 The env vars we care about, verbatim. Keys lowercased to match `RawConfig`.
fn env_layer() -> BTreeMap<String, String> {
    Env::raw()
        .only(ENV_KEYS)
        .iter()
        .map(|(key, value)| (key.as_str().to_ascii_lowercase(), value))
        .collect()
}

fn required(value: Option<String>, env_name: &str) -> Result<String, EtlError> {
    non_blank(value).ok_or_else(|| {
        EtlError::Configuration(format!(
            "missing required environment variable {env_name}"
        ))
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// 🔢 TOML is typed, so `s3_bucket_name = 12345` shows up as a number. We want the text.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LenientStringVisitor)
}

struct LenientStringVisitor;

impl<'de> Visitor<'de> for LenientStringVisitor {
    type Value = Option<String>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, number, or boolean")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(Some(v))
    }

    fn visit_char<E: de::Error>(self, v: char) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(LenientStringVisitor)
    }
}
