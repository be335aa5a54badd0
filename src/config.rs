//! Configuration for the SleepyPillow sensor simulator.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default Supabase project hosting the realtime webhook.
pub const DEFAULT_PROJECT_ID: &str = "ubdbjosolrkzculoedtl";

/// Default functions host.
pub const DEFAULT_HOST: &str = "supabase.co";

/// Default edge function serving the webhook.
pub const DEFAULT_FUNCTION_PATH: &str = "make-server-c3b54980";

/// Default user the readings are attributed to.
pub const DEFAULT_USER_ID: &str = "default-user";

/// Main configuration for the simulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project identifier, used as the host's first label
    pub project_id: String,

    /// Functions host (e.g. `supabase.co`)
    pub host: String,

    /// Edge function path segment
    pub function_path: String,

    /// Full webhook URL, replaces the composed one when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,

    /// Static bearer token
    pub token: String,

    /// Value of the `X-User-Id` header
    pub user_id: String,

    /// Delay between two reporting cycles
    #[serde(rename = "interval_secs", with = "duration_serde")]
    pub interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_id: DEFAULT_PROJECT_ID.to_string(),
            host: DEFAULT_HOST.to_string(),
            function_path: DEFAULT_FUNCTION_PATH.to_string(),
            endpoint_url: None,
            token: String::new(),
            user_id: DEFAULT_USER_ID.to_string(),
            interval: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sleepy-sensor")
            .join("config.json")
    }

    /// URL readings are posted to.
    pub fn webhook_url(&self) -> String {
        match &self.endpoint_url {
            Some(url) => url.clone(),
            None => format!(
                "https://{}.{}/functions/v1/{}/webhook/realtime",
                self.project_id, self.host, self.function_path
            ),
        }
    }

    /// Token with everything but the last four characters hidden.
    pub fn masked_token(&self) -> String {
        let chars: Vec<char> = self.token.chars().collect();
        if chars.is_empty() {
            return "(not set)".to_string();
        }
        let visible = chars.len().min(4);
        let tail: String = chars[chars.len() - visible..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - visible), tail)
    }

    /// Apply command-line overrides on top of the loaded values.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(secs) = overrides.interval_secs {
            self.interval = Duration::from_secs(secs);
        }
        if let Some(ref user_id) = overrides.user_id {
            self.user_id = user_id.clone();
        }
        if let Some(ref token) = overrides.token {
            self.token = token.clone();
        }
        if let Some(ref url) = overrides.endpoint_url {
            self.endpoint_url = Some(url.clone());
        }
    }
}

/// Optional values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub interval_secs: Option<u64>,
    pub user_id: Option<String>,
    pub token: Option<String>,
    pub endpoint_url: Option<String>,
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("sleepy-sensor-test-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.interval, Duration::from_secs(30));
        assert_eq!(config.user_id, "default-user");
        assert!(config.endpoint_url.is_none());
        assert_eq!(
            config.webhook_url(),
            "https://ubdbjosolrkzculoedtl.supabase.co/functions/v1/make-server-c3b54980/webhook/realtime"
        );
    }

    #[test]
    fn test_endpoint_override_wins() {
        let config = Config {
            endpoint_url: Some("http://127.0.0.1:9000/webhook/realtime".to_string()),
            ..Config::default()
        };
        assert_eq!(config.webhook_url(), "http://127.0.0.1:9000/webhook/realtime");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let path = temp_config_path("config.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"user_id": "alice", "interval_secs": 300}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.user_id, "alice");
        assert_eq!(config.interval, Duration::from_secs(300));
        assert_eq!(config.project_id, DEFAULT_PROJECT_ID);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_save_and_reload() {
        let path = temp_config_path("config.json");
        let config = Config {
            token: "secret-token".to_string(),
            interval: Duration::from_secs(5),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let path = temp_config_path("config.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.apply_overrides(&ConfigOverrides {
            interval_secs: Some(300),
            user_id: Some("bob".to_string()),
            token: None,
            endpoint_url: Some("http://localhost:8080/webhook/realtime".to_string()),
        });
        assert_eq!(config.interval, Duration::from_secs(300));
        assert_eq!(config.user_id, "bob");
        assert!(config.token.is_empty());
        assert_eq!(config.webhook_url(), "http://localhost:8080/webhook/realtime");
    }

    #[test]
    fn test_masked_token() {
        let mut config = Config::default();
        assert_eq!(config.masked_token(), "(not set)");
        config.token = "abcdefgh".to_string();
        assert_eq!(config.masked_token(), "****efgh");
        config.token = "xy".to_string();
        assert_eq!(config.masked_token(), "xy");
    }
}
