//! Server configuration.
//!
//! Everything is read from environment variables, with warn-and-default behaviour for anything that is
//! missing: the server should always come up, even if it only serves health checks usefully.
use std::env;

use base64::encode as base64_encode;
use bps_common::Secret;
use chrono::Duration;
use log::*;
use rand::RngCore;

const DEFAULT_BPS_HOST: &str = "127.0.0.1";
const DEFAULT_BPS_PORT: u16 = 8390;
/// How long a buyer has to approve the charge on their phone before the transaction is abandoned.
const DEFAULT_PAYMENT_WINDOW: Duration = Duration::minutes(2);
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than
    /// the connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// The payment window for new boost purchases. Settlements arriving after this window are rejected.
    pub payment_window: Duration,
    /// How often the expiry worker demotes lapsed boosts and reconciles abandoned payments.
    pub sweep_interval_secs: u64,
    /// Mobile-money aggregator configuration.
    pub paygate: PayGateConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BPS_HOST.to_string(),
            port: DEFAULT_BPS_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            payment_window: DEFAULT_PAYMENT_WINDOW,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            paygate: PayGateConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("BPS_HOST").ok().unwrap_or_else(|| DEFAULT_BPS_HOST.into());
        let port = env::var("BPS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for BPS_PORT. {e} Using the default, {DEFAULT_BPS_PORT}, instead."
                    );
                    DEFAULT_BPS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_BPS_PORT);
        let database_url = env::var("BPS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ BPS_DATABASE_URL is not set. Please set it to the URL for the promotions database.");
            String::default()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|| {
            warn!(
                "🪛️ BPS_JWT_SECRET is not set. A random secret will be used for this session; access tokens will not \
                 survive a restart, and other services will not be able to issue compatible tokens."
            );
            AuthConfig::default()
        });
        let use_x_forwarded_for =
            env::var("BPS_USE_X_FORWARDED_FOR").map(|s| &s == "1" || &s == "true").unwrap_or(false);
        let use_forwarded = env::var("BPS_USE_FORWARDED").map(|s| &s == "1" || &s == "true").unwrap_or(false);
        let payment_window = env_duration_secs("BPS_PAYMENT_WINDOW_SECS").unwrap_or(DEFAULT_PAYMENT_WINDOW);
        let sweep_interval_secs = env::var("BPS_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| {
                        error!("🪛️ {s} is not a valid value for BPS_SWEEP_INTERVAL_SECS. {e} Using the default.");
                        e
                    })
                    .ok()
            })
            .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS);
        let paygate = PayGateConfig::from_env_or_default();
        Self {
            host,
            port,
            database_url,
            auth,
            use_x_forwarded_for,
            use_forwarded,
            payment_window,
            sweep_interval_secs,
            paygate,
        }
    }
}

fn env_duration_secs(var: &str) -> Option<Duration> {
    env::var(var).ok().and_then(|s| {
        s.parse::<i64>()
            .map_err(|e| {
                error!("🪛️ {s} is not a valid value for {var}. {e} Using the default.");
                e
            })
            .ok()
            .map(Duration::seconds)
    })
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 signing secret for access tokens. Shared with the main marketplace backend, which issues
    /// the tokens this server verifies.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { jwt_secret: Secret::new(base64_encode(bytes)) }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Option<Self> {
        env::var("BPS_JWT_SECRET").ok().map(|s| Self { jwt_secret: Secret::new(s) })
    }
}

#[derive(Clone, Debug, Default)]
pub struct PayGateConfig {
    /// The base url of the aggregator's REST API, e.g. "https://paygateglobal.com/api/v1"
    pub base_url: String,
    pub api_key: Secret<String>,
    /// The key used to verify the HMAC signature on settlement callbacks.
    pub hmac_secret: Secret<String>,
    /// If false, the signature on settlement callbacks is not checked. Only ever disable this in
    /// development.
    pub hmac_checks: bool,
}

impl PayGateConfig {
    pub fn from_env_or_default() -> Self {
        let base_url = env::var("BPS_PAYGATE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ BPS_PAYGATE_URL is not set. Charge requests will fail until it is configured.");
            String::default()
        });
        let api_key = env::var("BPS_PAYGATE_API_KEY").ok().unwrap_or_else(|| {
            error!("🪛️ BPS_PAYGATE_API_KEY is not set. Charge requests will fail until it is configured.");
            String::default()
        });
        let hmac_secret = env::var("BPS_PAYGATE_HMAC_SECRET").ok().unwrap_or_else(|| {
            error!(
                "🪛️ BPS_PAYGATE_HMAC_SECRET is not set. Settlement callbacks will be rejected until it is configured."
            );
            String::default()
        });
        let hmac_checks = env::var("BPS_PAYGATE_HMAC_CHECKS").map(|s| &s != "0" && &s != "false").unwrap_or(true);
        if !hmac_checks {
            warn!("🚨️ HMAC checks on settlement callbacks are DISABLED. Never run like this in production.");
        }
        Self { base_url, api_key: Secret::new(api_key), hmac_secret: Secret::new(hmac_secret), hmac_checks }
    }
}
