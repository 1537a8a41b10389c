use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Anamnesa";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 1800;
pub const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 10;

/// How often idle sessions are swept.
pub const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub const ENV_BIND: &str = "ANAMNESA_BIND";
pub const ENV_MODEL_DIR: &str = "ANAMNESA_MODEL_DIR";
pub const ENV_LEXICON_DIR: &str = "ANAMNESA_LEXICON_DIR";
pub const ENV_ORACLE_URL: &str = "ANAMNESA_ORACLE_URL";
pub const ENV_SESSION_IDLE_SECS: &str = "ANAMNESA_SESSION_IDLE_SECS";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "anamnesa=debug,anamnesa_lib=debug,tower_http=info"
    } else {
        "anamnesa=info,anamnesa_lib=info,tower_http=warn"
    }
}

/// Get the application data directory
/// ~/Anamnesa/ on all platforms
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_NAME))
}

/// Intent model and normalizer artifacts.
pub fn models_dir() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join("models"))
}

/// Overrides for the built-in symptom/severity/location tables.
pub fn lexicon_dir() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join("lexicon"))
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {var}: '{value}' ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime configuration resolved from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub model_dir: Option<PathBuf>,
    pub lexicon_dir: Option<PathBuf>,
    /// When set, classification goes to this service instead of the local model.
    pub oracle_url: Option<String>,
    pub oracle_timeout: Duration,
    pub session_idle: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Resolve configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_raw = get(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind_raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            var: ENV_BIND,
            value: bind_raw.clone(),
            reason: e.to_string(),
        })?;

        let session_idle = match get(ENV_SESSION_IDLE_SECS) {
            None => Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                Ok(_) => {
                    return Err(ConfigError::Invalid {
                        var: ENV_SESSION_IDLE_SECS,
                        value: raw,
                        reason: "must be positive".into(),
                    })
                }
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        var: ENV_SESSION_IDLE_SECS,
                        value: raw,
                        reason: e.to_string(),
                    })
                }
            },
        };

        let oracle_url = match get(ENV_ORACLE_URL) {
            Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                return Err(ConfigError::Invalid {
                    var: ENV_ORACLE_URL,
                    value: url,
                    reason: "expected an http(s) URL".into(),
                })
            }
            other => other,
        };

        Ok(Self {
            bind,
            model_dir: get(ENV_MODEL_DIR).map(PathBuf::from).or_else(models_dir),
            lexicon_dir: get(ENV_LEXICON_DIR).map(PathBuf::from).or_else(lexicon_dir),
            oracle_url,
            oracle_timeout: Duration::from_secs(DEFAULT_ORACLE_TIMEOUT_SECS),
            session_idle,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind, DEFAULT_BIND.parse::<SocketAddr>().unwrap());
        assert_eq!(config.session_idle, Duration::from_secs(DEFAULT_SESSION_IDLE_SECS));
        assert!(config.oracle_url.is_none());
        assert_eq!(config.model_dir, models_dir());
    }

    #[test]
    fn explicit_values_win() {
        let config = config_from(&[
            (ENV_BIND, "0.0.0.0:8080"),
            (ENV_MODEL_DIR, "/srv/anamnesa/models"),
            (ENV_ORACLE_URL, "http://classifier:8000"),
            (ENV_SESSION_IDLE_SECS, "60"),
        ])
        .unwrap();
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.model_dir, Some(PathBuf::from("/srv/anamnesa/models")));
        assert_eq!(config.oracle_url.as_deref(), Some("http://classifier:8000"));
        assert_eq!(config.session_idle, Duration::from_secs(60));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = config_from(&[(ENV_BIND, "  "), (ENV_ORACLE_URL, "")]).unwrap();
        assert_eq!(config.bind.port(), 5000);
        assert!(config.oracle_url.is_none());
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(config_from(&[(ENV_BIND, "localhost")]).is_err());
        assert!(config_from(&[(ENV_SESSION_IDLE_SECS, "0")]).is_err());
        assert!(config_from(&[(ENV_SESSION_IDLE_SECS, "soon")]).is_err());
        assert!(config_from(&[(ENV_ORACLE_URL, "classifier:8000")]).is_err());
    }

    #[test]
    fn app_data_dir_under_home() {
        if let (Some(dir), Some(home)) = (app_data_dir(), dirs::home_dir()) {
            assert!(dir.starts_with(home));
            assert!(dir.ends_with("Anamnesa"));
        }
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
