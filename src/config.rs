use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "DentalClinic";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Credential lifetime when `CLINIC_TOKEN_TTL_SECS` is unset (24 hours).
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 86_400;

/// PBKDF2-SHA256 work factor for stored passwords.
pub const DEFAULT_PASSWORD_ITERATIONS: u32 = 600_000;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";

/// Secret used only by debug builds when none is configured.
#[cfg(debug_assertions)]
const DEV_JWT_SECRET: &str = "dental-clinic-dev-secret-do-not-deploy";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Cannot determine a data directory for the database")]
    NoDataDir,
}

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "dental_clinic_lib=info,tower_http=warn"
}

/// Get the application data directory
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join(APP_NAME))
}

/// Optional admin account created on first start.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
}

/// Runtime settings for the HTTP server.
///
/// Built once at startup and injected into `CoreState`; nothing else in the
/// crate reads the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub password_iterations: u32,
    pub request_timeout: Duration,
    pub admin: Option<AdminBootstrap>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env::var("CLINIC_BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .map_err(|e| ConfigError::Invalid {
                var: "CLINIC_BIND_ADDR",
                reason: format!("{e}"),
            })?;

        let db_path = match env::var("CLINIC_DB_PATH") {
            Ok(path) => PathBuf::from(path),
            Err(_) => app_data_dir()
                .ok_or(ConfigError::NoDataDir)?
                .join("dental_clinic.db"),
        };

        let admin = match (
            env::var("CLINIC_ADMIN_EMAIL"),
            env::var("CLINIC_ADMIN_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) if !email.is_empty() && !password.is_empty() => {
                Some(AdminBootstrap { email, password })
            }
            _ => None,
        };

        Ok(Self {
            bind_addr,
            db_path,
            jwt_secret: jwt_secret_from_env()?,
            token_ttl_secs: parse_var("CLINIC_TOKEN_TTL_SECS", DEFAULT_TOKEN_TTL_SECS)?,
            password_iterations: parse_var(
                "CLINIC_PASSWORD_ITERATIONS",
                DEFAULT_PASSWORD_ITERATIONS,
            )?,
            request_timeout: Duration::from_secs(parse_var(
                "CLINIC_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            admin,
        })
    }

    /// Settings for tests: fast hashing, throwaway secret, given database file.
    #[cfg(test)]
    pub fn for_tests(db_path: PathBuf) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            db_path,
            jwt_secret: "test-secret".to_string(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            password_iterations: 1_000,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            admin: None,
        }
    }
}

fn jwt_secret_from_env() -> Result<String, ConfigError> {
    match env::var("CLINIC_JWT_SECRET") {
        Ok(secret) if secret.len() >= 16 => Ok(secret),
        Ok(_) => Err(ConfigError::Invalid {
            var: "CLINIC_JWT_SECRET",
            reason: "must be at least 16 characters".into(),
        }),
        Err(_) => dev_secret(),
    }
}

#[cfg(debug_assertions)]
fn dev_secret() -> Result<String, ConfigError> {
    tracing::warn!("CLINIC_JWT_SECRET not set, using development secret");
    Ok(DEV_JWT_SECRET.to_string())
}

#[cfg(not(debug_assertions))]
fn dev_secret() -> Result<String, ConfigError> {
    Err(ConfigError::Missing("CLINIC_JWT_SECRET"))
}

fn parse_var<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
