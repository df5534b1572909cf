//! Environment-driven configuration

use crate::messaging::TwilioConfig;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub db_path: PathBuf,
    pub port: u16,
    /// How long a per-customer worker lingers without traffic
    pub idle_timeout: Duration,
    /// Optional JSON catalog imported at startup
    pub menu_seed: Option<PathBuf>,
    pub kitchen_number: Option<String>,
    pub twilio: TwilioConfig,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let db_path = get("CARDAPIO_DB_PATH").map_or_else(
            || {
                let home = get("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(format!("{home}/.cardapio-bot/cardapio.db"))
            },
            PathBuf::from,
        );

        let port = get("CARDAPIO_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let idle_timeout = get("CARDAPIO_IDLE_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .filter(|secs| *secs > 0)
            .map_or(Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS), Duration::from_secs);

        let twilio = TwilioConfig {
            account_sid: require("TWILIO_ACCOUNT_SID")?,
            auth_token: require("TWILIO_AUTH_TOKEN")?,
            from_number: require("TWILIO_PHONE_NUMBER")?,
            api_base: get("TWILIO_API_BASE"),
        };

        Ok(Self {
            db_path,
            port,
            idle_timeout,
            menu_seed: get("CARDAPIO_MENU_SEED").map(PathBuf::from),
            kitchen_number: get("KITCHEN_WHATSAPP_NUMBER"),
            twilio,
        })
    }
}
