//! Command line interface.
//!
//! Every option except `--config` can also be given through a `BRIDGE_*`
//! environment variable. Options given here override the configuration file.

use crate::config;
use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "disclosure-bridge",
    version,
    about = "Issues Jitsi access tokens for attributes disclosed through IRMA"
)]
pub struct Cli {
    /// The file to read configuration from. Further options override.
    #[arg(short = 'c', long = "config", env = "BRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// The address to listen for external requests, e.g. ":8080".
    #[arg(long = "listen-address", env = "BRIDGE_LISTEN_ADDRESS")]
    pub listen_address: Option<String>,

    /// The address of the IRMA server to use for disclosure.
    #[arg(long = "irma-server", env = "BRIDGE_IRMA_SERVER")]
    pub irma_server: Option<String>,

    /// The map from rooms to attribute condiscons, as JSON.
    #[arg(long = "room-map", env = "BRIDGE_ROOM_MAP")]
    pub room_map: Option<String>,

    /// Attribute condiscon for all rooms missing from the room map. Without it,
    /// such rooms are refused.
    #[arg(long = "default-room", env = "BRIDGE_DEFAULT_ROOM")]
    pub default_room: Option<String>,

    /// The issuer name used in the tokens this bridge produces.
    #[arg(long = "backend-name", env = "BRIDGE_BACKEND_NAME")]
    pub backend_name: Option<String>,

    /// The HS256 secret used to sign and verify trusted facts.
    #[arg(long = "backend-secret", env = "BRIDGE_BACKEND_SECRET", hide_env_values = true)]
    pub backend_secret: Option<String>,

    /// The HS256 secret Jitsi uses to verify access tokens.
    #[arg(long = "jitsi-secret", env = "BRIDGE_JITSI_SECRET", hide_env_values = true)]
    pub jitsi_secret: Option<String>,

    /// The audience name the Jitsi token module expects.
    #[arg(long = "jitsi-name", env = "BRIDGE_JITSI_NAME")]
    pub jitsi_name: Option<String>,

    /// The XMPP domain in use by Jitsi (the token subject).
    #[arg(long = "jitsi-domain", env = "BRIDGE_JITSI_DOMAIN")]
    pub jitsi_domain: Option<String>,

    /// Lifetime of trusted facts in seconds (default 900).
    #[arg(long = "trusted-facts-ttl-seconds", env = "BRIDGE_TRUSTED_FACTS_TTL_SECONDS")]
    pub trusted_facts_ttl_seconds: Option<u64>,

    /// Timeout of a single IRMA server request in seconds (default 10).
    #[arg(long = "irma-timeout-seconds", env = "BRIDGE_IRMA_TIMEOUT_SECONDS")]
    pub irma_timeout_seconds: Option<u64>,

    /// Retries of a failed IRMA server request (default 2, at most 5).
    #[arg(long = "irma-max-retries", env = "BRIDGE_IRMA_MAX_RETRIES")]
    pub irma_max_retries: Option<u32>,

    /// Comma separated origins allowed to call the bridge; "*" allows any.
    #[arg(long = "allowed-origins", env = "BRIDGE_ALLOWED_ORIGINS")]
    pub allowed_origins: Option<String>,
}

impl Cli {
    /// Options given on the command line or environment, keyed by option name.
    pub fn overrides(&self) -> HashMap<String, String> {
        [
            (config::LISTEN_ADDRESS, self.listen_address.clone()),
            (config::IRMA_SERVER, self.irma_server.clone()),
            (config::ROOM_MAP, self.room_map.clone()),
            (config::DEFAULT_ROOM, self.default_room.clone()),
            (config::BACKEND_NAME, self.backend_name.clone()),
            (config::BACKEND_SECRET, self.backend_secret.clone()),
            (config::JITSI_SECRET, self.jitsi_secret.clone()),
            (config::JITSI_NAME, self.jitsi_name.clone()),
            (config::JITSI_DOMAIN, self.jitsi_domain.clone()),
            (
                config::TRUSTED_FACTS_TTL_SECONDS,
                self.trusted_facts_ttl_seconds.map(|v| v.to_string()),
            ),
            (
                config::IRMA_TIMEOUT_SECONDS,
                self.irma_timeout_seconds.map(|v| v.to_string()),
            ),
            (
                config::IRMA_MAX_RETRIES,
                self.irma_max_retries.map(|v| v.to_string()),
            ),
            (config::ALLOWED_ORIGINS, self.allowed_origins.clone()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
        .collect()
    }
}
