use std::fmt;
use std::time::Duration;

use airdata_bucket::S3Config;

use crate::error::ConfigError;

pub const DEFAULT_API_BASE: &str = "https://developer-apis.awair.is";
pub const DEFAULT_REGION: &str = "us-east-1";

/// Everything one export run needs, resolved before any network call is made.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub awair: AwairConfig,
    pub storage: S3Config,
    pub fail_on_empty: bool,
}

#[derive(Clone)]
pub struct AwairConfig {
    pub api_base: String,
    pub device_type: String,
    pub device_id: String,
    pub api_key: String,
    pub timeout: Option<Duration>,
}

impl fmt::Debug for AwairConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwairConfig")
            .field("api_base", &self.api_base)
            .field("device_type", &self.device_type)
            .field("device_id", &self.device_id)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ExportConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// Builds the configuration from an arbitrary variable source. Blank values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            awair: AwairConfig::from_lookup(&lookup)?,
            storage: storage_from_lookup(&lookup)?,
            fail_on_empty: optional_bool(&lookup, "AIRDATA_FAIL_ON_EMPTY")?.unwrap_or(false),
        })
    }
}

impl AwairConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout = match non_blank(&lookup, "AIRDATA_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|err: std::num::ParseIntError| {
                    ConfigError::Invalid {
                        name: "AIRDATA_HTTP_TIMEOUT_SECS",
                        value: raw.clone(),
                        reason: err.to_string(),
                    }
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            api_base: non_blank(&lookup, "AWAIR_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            device_type: required(&lookup, "DEVICE_TYPE")?,
            device_id: required(&lookup, "DEVICE_ID")?,
            api_key: required(&lookup, "AWAIR_API_KEY")?,
            timeout,
        })
    }
}

pub fn storage_from_lookup<F>(lookup: F) -> Result<S3Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(S3Config {
        bucket: required(&lookup, "BUCKET")?,
        region: non_blank(&lookup, "S3_REGION")
            .or_else(|| non_blank(&lookup, "AWS_REGION"))
            .unwrap_or_else(|| DEFAULT_REGION.to_string()),
        endpoint: non_blank(&lookup, "S3_ENDPOINT_URL"),
        access_key_id: non_blank(&lookup, "S3_ACCESS_KEY_ID"),
        secret_access_key: non_blank(&lookup, "S3_SECRET_ACCESS_KEY"),
        force_path_style: optional_bool(&lookup, "S3_FORCE_PATH_STYLE")?.unwrap_or(false),
    })
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn non_blank<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    non_blank(lookup, name).ok_or(ConfigError::Missing(name))
}

fn optional_bool<F>(lookup: &F, name: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = non_blank(lookup, name) else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::Invalid {
            name,
            value: raw,
            reason: "expected a boolean".into(),
        }),
    }
}
