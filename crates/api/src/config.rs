use std::path::PathBuf;

use crate::auth::jwt::JwtConfig;
use crate::auth::password::hash_password;

/// Server configuration loaded from environment variables.
///
/// All fields except the admin credentials have defaults suitable for
/// local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8001`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Root directory of uploaded vehicle photos (default: `uploads/vehicles`).
    pub upload_dir: PathBuf,
    /// Deployment name reported by `/api/version` (default: `development`).
    pub environment: String,
    /// Admin token signing configuration.
    pub jwt: JwtConfig,
    /// Admin password and login throttling.
    pub admin: AdminAuthConfig,
}

/// The single shared admin credential and its brute-force limits.
#[derive(Debug, Clone)]
pub struct AdminAuthConfig {
    /// Argon2id PHC string of the admin password.
    pub password_hash: String,
    pub max_login_attempts: u32,
    pub lockout_minutes: u64,
}

impl AdminAuthConfig {
    /// | Env Var                 | Required | Default |
    /// |-------------------------|----------|---------|
    /// | `ADMIN_PASSWORD_HASH`   | one of   | --      |
    /// | `ADMIN_PASSWORD`        | one of   | --      |
    /// | `MAX_LOGIN_ATTEMPTS`    | no       | `5`     |
    /// | `LOGIN_LOCKOUT_MINUTES` | no       | `15`    |
    ///
    /// A plaintext `ADMIN_PASSWORD` is hashed once at startup.
    ///
    /// # Panics
    ///
    /// Panics if neither password variable is set.
    pub fn from_env() -> Self {
        let password_hash = match non_empty_var("ADMIN_PASSWORD_HASH") {
            Some(hash) => hash,
            None => {
                let plain = non_empty_var("ADMIN_PASSWORD")
                    .expect("ADMIN_PASSWORD_HASH or ADMIN_PASSWORD must be set");
                hash_password(&plain).expect("ADMIN_PASSWORD must be hashable")
            }
        };

        let max_login_attempts: u32 = std::env::var("MAX_LOGIN_ATTEMPTS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("MAX_LOGIN_ATTEMPTS must be a valid u32");

        let lockout_minutes: u64 = std::env::var("LOGIN_LOCKOUT_MINUTES")
            .unwrap_or_else(|_| "15".into())
            .parse()
            .expect("LOGIN_LOCKOUT_MINUTES must be a valid u64");

        Self {
            password_hash,
            max_login_attempts,
            lockout_minutes,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `8001`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:3000`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    /// | `UPLOAD_DIR`           | `uploads/vehicles`         |
    /// | `ENVIRONMENT`          | `development`              |
    ///
    /// See [`JwtConfig::from_env`] and [`AdminAuthConfig::from_env`] for the
    /// admin auth block.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8001".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let upload_dir = PathBuf::from(
            std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads/vehicles".into()),
        );

        let environment =
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            upload_dir,
            environment,
            jwt: JwtConfig::from_env(),
            admin: AdminAuthConfig::from_env(),
        }
    }
}
