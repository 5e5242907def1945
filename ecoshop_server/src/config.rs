use std::{env, str::FromStr, time::Duration};

use ecoshop_common::{parse_boolean_flag, Secret};
use log::*;

use crate::gateway::SandboxSettlement;

const DEFAULT_ECOSHOP_HOST: &str = "127.0.0.1";
const DEFAULT_ECOSHOP_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/ecoshop.db";
const DEFAULT_MAX_DB_CONNECTIONS: u32 = 25;
const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_HMAC_HEADER: &str = "X-Callback-Signature";
const DEFAULT_NOTIFICATION_RETRIES: u32 = 3;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_db_connections: u32,
    /// Every call to the payment gateway is abandoned after this long.
    pub gateway_timeout: Duration,
    pub gateway: GatewayConfig,
    /// How many times a push notification is attempted before giving up on it.
    pub notification_retries: u32,
    pub event_buffer_size: usize,
}

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// The key the gateway signs its callbacks with.
    pub hmac_secret: Secret<String>,
    /// If false, callbacks are accepted without checking their signature. **DANGER**
    pub hmac_checks: bool,
    pub hmac_header: String,
    /// How the sandbox gateway resolves the payments it has been asked to process.
    pub sandbox_settlement: SandboxSettlement,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            hmac_secret: Secret::default(),
            hmac_checks: true,
            hmac_header: DEFAULT_HMAC_HEADER.to_string(),
            sandbox_settlement: SandboxSettlement::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_ECOSHOP_HOST.to_string(),
            port: DEFAULT_ECOSHOP_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_db_connections: DEFAULT_MAX_DB_CONNECTIONS,
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
            gateway: GatewayConfig::default(),
            notification_retries: DEFAULT_NOTIFICATION_RETRIES,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("ECOSHOP_HOST").ok().unwrap_or_else(|| DEFAULT_ECOSHOP_HOST.into());
        let port = parse_env("ECOSHOP_PORT", DEFAULT_ECOSHOP_PORT);
        let database_url = env::var("ECOSHOP_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ ECOSHOP_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_db_connections = parse_env("ECOSHOP_MAX_DB_CONNECTIONS", DEFAULT_MAX_DB_CONNECTIONS);
        let gateway_timeout =
            Duration::from_secs(parse_env("ECOSHOP_GATEWAY_TIMEOUT_SECS", DEFAULT_GATEWAY_TIMEOUT.as_secs()));
        let gateway = GatewayConfig::from_env_or_defaults();
        let notification_retries = parse_env("ECOSHOP_NOTIFICATION_RETRIES", DEFAULT_NOTIFICATION_RETRIES);
        let event_buffer_size = parse_env("ECOSHOP_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE);
        Self {
            host,
            port,
            database_url,
            max_db_connections,
            gateway_timeout,
            gateway,
            notification_retries,
            event_buffer_size,
        }
    }
}

impl GatewayConfig {
    pub fn from_env_or_defaults() -> Self {
        let hmac_secret = env::var("ECOSHOP_GATEWAY_HMAC_SECRET").ok().unwrap_or_else(|| {
            error!(
                "🪛️ ECOSHOP_GATEWAY_HMAC_SECRET is not set. Please set it to the key your payment gateway signs its \
                 callbacks with."
            );
            String::default()
        });
        let hmac_secret = Secret::new(hmac_secret);
        let hmac_checks = parse_boolean_flag(env::var("ECOSHOP_GATEWAY_HMAC_CHECKS").ok(), true);
        if !hmac_checks {
            warn!("🚨️ Payment callback signatures are NOT being checked. Do not run a production instance like this.");
        }
        let hmac_header = env::var("ECOSHOP_GATEWAY_HMAC_HEADER").ok().unwrap_or_else(|| DEFAULT_HMAC_HEADER.into());
        let sandbox_settlement = parse_env("ECOSHOP_SANDBOX_SETTLEMENT", SandboxSettlement::default());
        Self { hmac_secret, hmac_checks, hmac_header, sandbox_settlement }
    }
}

fn parse_env<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default, {default}.");
            default
        },
    }
}
