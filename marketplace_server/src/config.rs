use std::env;

use jwt_compact::alg::Hs256Key;
use log::*;
use rand::{thread_rng, Rng};
use tms_common::{helpers::parse_boolean_flag, Secret};

use crate::errors::ServerError;

const DEFAULT_TMS_HOST: &str = "127.0.0.1";
const DEFAULT_TMS_PORT: u16 = 8420;
const DEFAULT_QC_THRESHOLD: i64 = 70;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// The minimum QC score (inclusive) for a report to pass inspection and release the escrow.
    pub qc_threshold: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_TMS_HOST.to_string(),
            port: DEFAULT_TMS_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            qc_threshold: DEFAULT_QC_THRESHOLD,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("TMS_HOST").ok().unwrap_or_else(|| DEFAULT_TMS_HOST.into());
        let port = env::var("TMS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for TMS_PORT. {e} Using the default, {DEFAULT_TMS_PORT}, instead."
                    );
                    DEFAULT_TMS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_TMS_PORT);
        let database_url = env::var("TMS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ TMS_DATABASE_URL is not set. Please set it to the URL for the marketplace database.");
            String::default()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("TMS_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("TMS_USE_FORWARDED").ok(), false);
        let qc_threshold = env::var("TMS_QC_THRESHOLD")
            .map_err(|_| {
                info!("🪛️ TMS_QC_THRESHOLD is not set. Using the default value of {DEFAULT_QC_THRESHOLD}.");
            })
            .and_then(|s| {
                s.parse::<i64>().map_err(|e| warn!("🪛️ Invalid configuration value for TMS_QC_THRESHOLD. {e}"))
            })
            .ok()
            .filter(|t| {
                let valid = (0..=100).contains(t);
                if !valid {
                    warn!("🪛️ TMS_QC_THRESHOLD must be between 0 and 100. Using the default instead.");
                }
                valid
            })
            .unwrap_or(DEFAULT_QC_THRESHOLD);
        Self { host, port, database_url, auth, use_x_forwarded_for, use_forwarded, qc_threshold }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The symmetric key material used to sign and verify access tokens. At least 32 characters.
    pub jwt_signing_key: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT signing key has not been set. I'm using a random value for this session. Access tokens \
             will not survive a restart. Set the TMS_JWT_SIGNING_KEY environment variable on production instances. \
             🚨️🚨️🚨️"
        );
        let mut key = [0u8; 32];
        thread_rng().fill(&mut key);
        let material = key.iter().map(|b| format!("{b:02x}")).collect::<String>();
        Self { jwt_signing_key: Secret::new(material) }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret = env::var("TMS_JWT_SIGNING_KEY")
            .map_err(|e| ServerError::ConfigurationError(format!("{e} [TMS_JWT_SIGNING_KEY]")))?;
        if secret.len() < 32 {
            return Err(ServerError::ConfigurationError(
                "TMS_JWT_SIGNING_KEY must be at least 32 characters long.".to_string(),
            ));
        }
        Ok(Self { jwt_signing_key: Secret::new(secret) })
    }

    pub fn hs256_key(&self) -> Hs256Key {
        Hs256Key::new(self.jwt_signing_key.reveal().as_bytes())
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep
/// this as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}
