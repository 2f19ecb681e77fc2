//! Configuration module for the RateMyBite backend.
//!
//! Configuration is loaded from environment variables (optionally via a `.env` file).
//! The store URI, the token signing secret and the listen port are required.

use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

/// Default endpoint of the address lookup service.
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection URI (e.g. `sqlite:./data/ratemybite.sqlite`)
    pub database_url: String,
    /// Secret used to sign and verify bearer tokens
    pub jwt_secret: String,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of the human readable format
    pub log_json: bool,
    /// Address lookup endpoint
    pub geocoder_url: String,
    /// Upper bound for a single address lookup
    pub geocoder_timeout: Duration,
    /// Whether new reviews wait for administrator approval
    pub review_moderation: bool,
    /// Administrator account created or promoted at startup
    pub admin: Option<AdminBootstrap>,
    /// Insert sample restaurants into an empty database
    pub seed_demo: bool,
}

/// Credentials of the bootstrap administrator.
#[derive(Clone)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Configuration loading failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let database_url = required("RMB_DATABASE_URL")?;
        let jwt_secret = required("RMB_JWT_SECRET")?;

        let port: u16 = required("RMB_PORT")?
            .trim()
            .parse()
            .map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                name: "RMB_PORT",
                reason: e.to_string(),
            })?;

        let host = lookup("RMB_BIND_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let bind_addr = format!("{}:{}", host.trim(), port)
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                name: "RMB_BIND_HOST",
                reason: e.to_string(),
            })?;

        let log_level = lookup("RMB_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let log_json = lookup("RMB_LOG_FORMAT")
            .map(|v| v.trim().eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let geocoder_url =
            lookup("RMB_GEOCODER_URL").unwrap_or_else(|| DEFAULT_GEOCODER_URL.to_string());

        let geocoder_timeout = match lookup("RMB_GEOCODER_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 =
                    raw.trim()
                        .parse()
                        .map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                            name: "RMB_GEOCODER_TIMEOUT_SECS",
                            reason: e.to_string(),
                        })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(10),
        };

        let review_moderation = parse_flag(&lookup, "RMB_REVIEW_MODERATION", true)?;
        let seed_demo = parse_flag(&lookup, "RMB_SEED_DEMO", false)?;

        let admin = match (lookup("RMB_ADMIN_EMAIL"), lookup("RMB_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminBootstrap { email, password }),
            (Some(_), None) => return Err(ConfigError::Missing("RMB_ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("RMB_ADMIN_EMAIL")),
            (None, None) => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            log_level,
            log_json,
            geocoder_url,
            geocoder_timeout,
            review_moderation,
            admin,
            seed_demo,
        })
    }
}

fn parse_flag<F>(lookup: &F, name: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            name,
            reason: format!("expected a boolean, got '{}'", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("RMB_DATABASE_URL", "sqlite::memory:"),
        ("RMB_JWT_SECRET", "secret"),
        ("RMB_PORT", "4000"),
    ];

    #[test]
    fn test_default_config() {
        let config = Config::from_lookup(lookup_from(&REQUIRED)).unwrap();

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:4000");
        assert_eq!(config.log_level, "info");
        assert!(!config.log_json);
        assert_eq!(config.geocoder_url, DEFAULT_GEOCODER_URL);
        assert_eq!(config.geocoder_timeout, Duration::from_secs(10));
        assert!(config.review_moderation);
        assert!(config.admin.is_none());
        assert!(!config.seed_demo);
    }

    #[test]
    fn test_missing_required_values() {
        let err = Config::from_lookup(lookup_from(&REQUIRED[..2])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("RMB_PORT")));

        let err = Config::from_lookup(lookup_from(&[("RMB_PORT", "4000")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("RMB_DATABASE_URL")));
    }

    #[test]
    fn test_invalid_port() {
        let mut pairs = REQUIRED.to_vec();
        pairs[2] = ("RMB_PORT", "not-a-port");
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "RMB_PORT", .. }));
    }

    #[test]
    fn test_optional_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("RMB_BIND_HOST", "0.0.0.0"),
            ("RMB_LOG_FORMAT", "JSON"),
            ("RMB_GEOCODER_TIMEOUT_SECS", "3"),
            ("RMB_REVIEW_MODERATION", "off"),
            ("RMB_SEED_DEMO", "1"),
            ("RMB_ADMIN_EMAIL", "root@example.com"),
            ("RMB_ADMIN_PASSWORD", "hunter22"),
        ]);
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();

        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:4000");
        assert!(config.log_json);
        assert_eq!(config.geocoder_timeout, Duration::from_secs(3));
        assert!(!config.review_moderation);
        assert!(config.seed_demo);
        assert_eq!(config.admin.unwrap().email, "root@example.com");
    }

    #[test]
    fn test_half_configured_admin_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("RMB_ADMIN_EMAIL", "root@example.com"));
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("RMB_ADMIN_PASSWORD")));
    }

    #[test]
    fn test_invalid_flag() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("RMB_REVIEW_MODERATION", "maybe"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }
}
