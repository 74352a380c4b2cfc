//! Server configuration read from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use adventure_llm::DEFAULT_MODEL;
use adventure_narrative::application::generator::DEFAULT_GENERATION_TIMEOUT;
use adventure_session::application::choice_processor::DEFAULT_MAX_ATTEMPTS;
use adventure_stats::DEFAULT_HISTORY_CAP;

use crate::error::AppError;

/// Everything the server needs to start.
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// PostgreSQL URL; the in-memory store is used when absent.
    pub database_url: Option<String>,
    /// Story model key; generation is procedural-only when absent.
    pub anthropic_api_key: Option<String>,
    pub model: String,
    pub generator_timeout: Duration,
    pub history_cap: usize,
    pub max_attempts: u32,
    /// Seed graph override; the embedded graph is used when absent.
    pub seed_path: Option<PathBuf>,
    pub otlp_endpoint: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database_url.as_ref().map(|_| "<set>"))
            .field("anthropic_api_key", &self.anthropic_api_key.as_ref().map(|_| "<set>"))
            .field("model", &self.model)
            .field("generator_timeout", &self.generator_timeout)
            .field("history_cap", &self.history_cap)
            .field("max_attempts", &self.max_attempts)
            .field("seed_path", &self.seed_path)
            .field("otlp_endpoint", &self.otlp_endpoint)
            .finish()
    }
}

impl AppConfig {
    /// Reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`, which returns the value of a
    /// variable if set.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let timeout_ms: u64 = parsed(&var, "ADVENTURE_GENERATOR_TIMEOUT_MS")?.unwrap_or_else(|| {
            u64::try_from(DEFAULT_GENERATION_TIMEOUT.as_millis()).unwrap_or(8000)
        });
        let history_cap: usize =
            parsed(&var, "ADVENTURE_HISTORY_CAP")?.unwrap_or(DEFAULT_HISTORY_CAP);
        let max_attempts: u32 =
            parsed(&var, "ADVENTURE_MAX_ATTEMPTS")?.unwrap_or(DEFAULT_MAX_ATTEMPTS);
        if history_cap == 0 {
            return Err(AppError::Config(
                "ADVENTURE_HISTORY_CAP must be at least 1".into(),
            ));
        }
        if max_attempts == 0 {
            return Err(AppError::Config(
                "ADVENTURE_MAX_ATTEMPTS must be at least 1".into(),
            ));
        }

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port: parsed(&var, "PORT")?.unwrap_or(3000),
            database_url: var("DATABASE_URL"),
            anthropic_api_key: var("ANTHROPIC_API_KEY"),
            model: var("ADVENTURE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            generator_timeout: Duration::from_millis(timeout_ms),
            history_cap,
            max_attempts,
            seed_path: var("ADVENTURE_SEED_PATH").map(PathBuf::from),
            otlp_endpoint: var("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }
}

fn parsed<T, F>(var: &F, name: &str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    var(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| AppError::Config(format!("{name} is invalid ({raw:?}): {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.database_url, None);
        assert_eq!(config.anthropic_api_key, None);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.generator_timeout, Duration::from_secs(8));
        assert_eq!(config.history_cap, 10);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.seed_path, None);
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/adventure"),
            ("ADVENTURE_GENERATOR_TIMEOUT_MS", "2500"),
            ("ADVENTURE_HISTORY_CAP", "25"),
            ("ADVENTURE_SEED_PATH", "/etc/adventure/seed.yaml"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/adventure"));
        assert_eq!(config.generator_timeout, Duration::from_millis(2500));
        assert_eq!(config.history_cap, 25);
        assert_eq!(config.seed_path, Some(PathBuf::from("/etc/adventure/seed.yaml")));
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let config = config_from(&[("ANTHROPIC_API_KEY", "  ")]).unwrap();

        assert_eq!(config.anthropic_api_key, None);
    }

    #[test]
    fn test_invalid_port_is_a_config_error() {
        let result = config_from(&[("PORT", "eighty")]);

        assert!(matches!(result, Err(AppError::Config(message)) if message.contains("PORT")));
    }

    #[test]
    fn test_zero_attempts_is_rejected() {
        assert!(matches!(
            config_from(&[("ADVENTURE_MAX_ATTEMPTS", "0")]),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = config_from(&[
            ("ANTHROPIC_API_KEY", "sk-secret"),
            ("DATABASE_URL", "postgres://user:hunter2@db/adventure"),
        ])
        .unwrap();

        let rendered = format!("{config:?}");

        assert!(!rendered.contains("sk-secret"));
        assert!(!rendered.contains("hunter2"));
    }
}
