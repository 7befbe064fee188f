//! Disclosure bridge configuration.
//!
//! Configuration is read from an optional JSON file and then overridden by
//! individual options (command line flags or `BRIDGE_*` environment
//! variables, see [`crate::cli`]). Option names match the JSON keys.
//! Secrets are redacted in Debug output.

use crate::models::AttributeConDisCon;
use crate::services::RoomPolicies;
use common::secret::{is_blank, SecretString};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const LISTEN_ADDRESS: &str = "listen-address";
pub const IRMA_SERVER: &str = "irma-server";
pub const ROOM_MAP: &str = "room-map";
pub const DEFAULT_ROOM: &str = "default-room";
pub const BACKEND_NAME: &str = "backend-name";
pub const BACKEND_SECRET: &str = "backend-secret";
pub const JITSI_NAME: &str = "jitsi-name";
pub const JITSI_SECRET: &str = "jitsi-secret";
pub const JITSI_DOMAIN: &str = "jitsi-domain";
pub const TRUSTED_FACTS_TTL_SECONDS: &str = "trusted-facts-ttl-seconds";
pub const IRMA_TIMEOUT_SECONDS: &str = "irma-timeout-seconds";
pub const IRMA_MAX_RETRIES: &str = "irma-max-retries";
pub const ALLOWED_ORIGINS: &str = "allowed-origins";

/// Default trusted-facts lifetime in seconds.
pub const DEFAULT_TRUSTED_FACTS_TTL_SECONDS: u64 = 900;

/// Upper bound for the trusted-facts lifetime (one day).
pub const MAX_TRUSTED_FACTS_TTL_SECONDS: u64 = 86_400;

/// Default per-attempt IRMA request timeout in seconds.
pub const DEFAULT_IRMA_TIMEOUT_SECONDS: u64 = 10;

/// Upper bound for the IRMA request timeout.
pub const MAX_IRMA_TIMEOUT_SECONDS: u64 = 300;

/// Default number of retries after a failed IRMA request.
pub const DEFAULT_IRMA_MAX_RETRIES: u32 = 2;

/// Upper bound for IRMA retries.
pub const MAX_IRMA_MAX_RETRIES: u32 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required option: {0}")]
    MissingOption(String),

    #[error("Could not read configuration file {path}: {reason}")]
    UnreadableFile { path: String, reason: String },

    #[error("Could not parse {option}: {reason}")]
    InvalidJson { option: String, reason: String },

    #[error("Invalid {option}: {reason}")]
    InvalidOption { option: String, reason: String },
}

/// Raw configuration as it appears in the JSON file.
///
/// Every field is optional here; required options are enforced when
/// converting to [`Config`].
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileConfig {
    pub listen_address: Option<String>,
    pub irma_server: Option<String>,
    pub room_map: Option<HashMap<String, AttributeConDisCon>>,
    pub default_room: Option<AttributeConDisCon>,
    pub backend_name: Option<String>,
    pub backend_secret: Option<SecretString>,
    pub jitsi_name: Option<String>,
    pub jitsi_secret: Option<SecretString>,
    pub jitsi_domain: Option<String>,
    pub trusted_facts_ttl_seconds: Option<u64>,
    pub irma_timeout_seconds: Option<u64>,
    pub irma_max_retries: Option<u32>,
    pub allowed_origins: Option<String>,
}

impl FileConfig {
    /// Parse the contents of a configuration file.
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(contents).map_err(|e| ConfigError::InvalidJson {
            option: "configuration file".to_string(),
            reason: e.to_string(),
        })
    }

    /// Read and parse a configuration file.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::UnreadableFile {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Self::from_json(&contents)
    }

    /// Apply individual option overrides keyed by option name.
    ///
    /// Empty values leave the file value in place. Unknown keys are ignored.
    pub fn apply_overrides(&mut self, vars: &HashMap<String, String>) -> Result<(), ConfigError> {
        for (key, value) in vars {
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                LISTEN_ADDRESS => self.listen_address = Some(value.clone()),
                IRMA_SERVER => self.irma_server = Some(value.clone()),
                ROOM_MAP => self.room_map = Some(parse_json(ROOM_MAP, value)?),
                DEFAULT_ROOM => self.default_room = Some(parse_json(DEFAULT_ROOM, value)?),
                BACKEND_NAME => self.backend_name = Some(value.clone()),
                BACKEND_SECRET => self.backend_secret = Some(SecretString::from(value.clone())),
                JITSI_NAME => self.jitsi_name = Some(value.clone()),
                JITSI_SECRET => self.jitsi_secret = Some(SecretString::from(value.clone())),
                JITSI_DOMAIN => self.jitsi_domain = Some(value.clone()),
                TRUSTED_FACTS_TTL_SECONDS => {
                    self.trusted_facts_ttl_seconds =
                        Some(parse_number(TRUSTED_FACTS_TTL_SECONDS, value)?);
                }
                IRMA_TIMEOUT_SECONDS => {
                    self.irma_timeout_seconds = Some(parse_number(IRMA_TIMEOUT_SECONDS, value)?);
                }
                IRMA_MAX_RETRIES => {
                    self.irma_max_retries = Some(parse_number(IRMA_MAX_RETRIES, value)?);
                }
                ALLOWED_ORIGINS => self.allowed_origins = Some(value.clone()),
                _ => {}
            }
        }
        Ok(())
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(option: &str, value: &str) -> Result<T, ConfigError> {
    serde_json::from_str(value).map_err(|e| ConfigError::InvalidJson {
        option: option.to_string(),
        reason: e.to_string(),
    })
}

fn parse_number<T: std::str::FromStr>(option: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidOption {
        option: option.to_string(),
        reason: format!("must be a non-negative integer, got '{value}': {e}"),
    })
}

/// Validated disclosure bridge configuration.
#[derive(Clone)]
pub struct Config {
    /// Address to listen on; a bare `:port` is expanded to `0.0.0.0:port`.
    pub listen_address: String,

    /// IRMA server base URL, without trailing slash.
    pub irma_server: String,

    /// Room policies, including the default policy if configured.
    pub rooms: RoomPolicies,

    /// Issuer of both trusted-facts and access tokens.
    pub backend_name: String,

    /// HS256 key for trusted facts.
    pub backend_secret: SecretString,

    /// Audience of access tokens.
    pub jitsi_name: String,

    /// HS256 key for access tokens, shared with Jitsi.
    pub jitsi_secret: SecretString,

    /// Subject of access tokens.
    pub jitsi_domain: String,

    pub trusted_facts_ttl: Duration,

    /// Per-attempt timeout for IRMA requests.
    pub irma_timeout: Duration,

    pub irma_max_retries: u32,

    /// CORS origins; `None` disables the CORS layer, `"*"` allows any.
    pub allowed_origins: Option<Vec<String>>,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("listen_address", &self.listen_address)
            .field("irma_server", &self.irma_server)
            .field("rooms", &self.rooms.len())
            .field("default_room", &self.rooms.has_default())
            .field("backend_name", &self.backend_name)
            .field("backend_secret", &"[REDACTED]")
            .field("jitsi_name", &self.jitsi_name)
            .field("jitsi_secret", &"[REDACTED]")
            .field("jitsi_domain", &self.jitsi_domain)
            .field("trusted_facts_ttl", &self.trusted_facts_ttl)
            .field("irma_timeout", &self.irma_timeout)
            .field("irma_max_retries", &self.irma_max_retries)
            .field("allowed_origins", &self.allowed_origins)
            .finish()
    }
}

impl Config {
    /// Load configuration from an optional file plus option overrides.
    pub fn load(
        config_file: Option<&Path>,
        overrides: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let file = match config_file {
            Some(path) => FileConfig::read(path)?,
            None => FileConfig::default(),
        };
        Self::from_parts(file, overrides)
    }

    /// Load configuration from a HashMap of options only (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_parts(FileConfig::default(), vars)
    }

    /// Merge overrides into a parsed file and validate the result.
    pub fn from_parts(
        mut file: FileConfig,
        overrides: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        file.apply_overrides(overrides)?;
        Self::validate(file)
    }

    fn validate(file: FileConfig) -> Result<Self, ConfigError> {
        let listen_address = normalize_listen_address(&required(file.listen_address, LISTEN_ADDRESS)?);

        let irma_server = required(file.irma_server, IRMA_SERVER)?;
        if !(irma_server.starts_with("http://") || irma_server.starts_with("https://")) {
            return Err(ConfigError::InvalidOption {
                option: IRMA_SERVER.to_string(),
                reason: format!("must be an http(s) URL, got '{irma_server}'"),
            });
        }
        let irma_server = irma_server.trim_end_matches('/').to_string();

        let room_map = file
            .room_map
            .ok_or_else(|| ConfigError::MissingOption(ROOM_MAP.to_string()))?;

        let backend_name = required(file.backend_name, BACKEND_NAME)?;
        let backend_secret = required_secret(file.backend_secret, BACKEND_SECRET)?;
        let jitsi_name = required(file.jitsi_name, JITSI_NAME)?;
        let jitsi_secret = required_secret(file.jitsi_secret, JITSI_SECRET)?;
        let jitsi_domain = required(file.jitsi_domain, JITSI_DOMAIN)?;

        let ttl_seconds = bounded(
            file.trusted_facts_ttl_seconds,
            DEFAULT_TRUSTED_FACTS_TTL_SECONDS,
            1,
            MAX_TRUSTED_FACTS_TTL_SECONDS,
            TRUSTED_FACTS_TTL_SECONDS,
        )?;
        let timeout_seconds = bounded(
            file.irma_timeout_seconds,
            DEFAULT_IRMA_TIMEOUT_SECONDS,
            1,
            MAX_IRMA_TIMEOUT_SECONDS,
            IRMA_TIMEOUT_SECONDS,
        )?;
        let irma_max_retries = bounded(
            file.irma_max_retries,
            DEFAULT_IRMA_MAX_RETRIES,
            0,
            MAX_IRMA_MAX_RETRIES,
            IRMA_MAX_RETRIES,
        )?;

        let allowed_origins = file.allowed_origins.and_then(|origins| {
            let list: Vec<String> = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
            (!list.is_empty()).then_some(list)
        });

        Ok(Config {
            listen_address,
            irma_server,
            rooms: RoomPolicies::new(room_map, file.default_room),
            backend_name,
            backend_secret,
            jitsi_name,
            jitsi_secret,
            jitsi_domain,
            trusted_facts_ttl: Duration::from_secs(ttl_seconds),
            irma_timeout: Duration::from_secs(timeout_seconds),
            irma_max_retries,
            allowed_origins,
        })
    }
}

fn required(value: Option<String>, option: &str) -> Result<String, ConfigError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingOption(option.to_string()))
}

fn required_secret(value: Option<SecretString>, option: &str) -> Result<SecretString, ConfigError> {
    value
        .filter(|v| !is_blank(v))
        .ok_or_else(|| ConfigError::MissingOption(option.to_string()))
}

fn bounded<T>(value: Option<T>, default: T, min: T, max: T, option: &str) -> Result<T, ConfigError>
where
    T: PartialOrd + fmt::Display + Copy,
{
    let value = value.unwrap_or(default);
    if value < min || value > max {
        return Err(ConfigError::InvalidOption {
            option: option.to_string(),
            reason: format!("must be between {min} and {max}, got {value}"),
        });
    }
    Ok(value)
}

/// `:8080` listens on all interfaces.
fn normalize_listen_address(address: &str) -> String {
    if address.starts_with(':') {
        format!("0.0.0.0{address}")
    } else {
        address.to_string()
    }
}
