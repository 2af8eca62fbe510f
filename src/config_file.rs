use minijinja::Environment;
use serde::{Deserialize, Serialize};

use std::{
    collections::HashMap,
    num::NonZeroU64,
    path::Path,
    time::Duration,
};

use crate::secrets::{self, SecretError};

/// Values substituted into the config file before it is parsed.
#[derive(Debug, Default)]
pub struct WatcherVars {
    inner: HashMap<String, String>,
}

impl<'de> Deserialize<'de> for WatcherVars {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let inner = HashMap::deserialize(deserializer)?;
        Ok(Self { inner })
    }
}

impl Serialize for WatcherVars {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.inner.serialize(serializer)
    }
}

impl WatcherVars {
    fn try_init_from_string(val: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(val)?)
    }
    fn try_init(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(vars) => Self::try_init_from_string(&vars),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No vars file at {path:?}, rendering config without vars");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Templating error: {0:?}")]
    Template(#[from] minijinja::Error),
    #[error("Unable to resolve webhook url: {0}")]
    Secret(#[from] SecretError),
    #[error("Invalid config: {0}")]
    Invalid(&'static str),
}

fn default_call_timeout() -> NonZeroU64 {
    NonZeroU64::new(5).unwrap_or(NonZeroU64::MIN)
}

fn default_pop_timeout() -> NonZeroU64 {
    NonZeroU64::new(5).unwrap_or(NonZeroU64::MIN)
}

fn default_health_port() -> u16 {
    8080
}

fn default_gcp_secret_version() -> String {
    "latest".to_string()
}

#[derive(Debug, Deserialize)]
pub struct WatcherConfigFile {
    /// Upper bound in seconds for each snapshot store and alert call.
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: NonZeroU64,
    pub redis: RedisConfig,
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub health: HealthConfig,
}

#[derive(Debug, Deserialize)]
pub struct RedisConfig {
    pub address: String,
    pub info_list_name: String,
    pub details_list_name: String,
    /// How long a single BLPOP waits before reporting an empty queue.
    #[serde(default = "default_pop_timeout")]
    pub pop_timeout_secs: NonZeroU64,
}

#[derive(Debug, Deserialize)]
pub struct AlertsConfig {
    pub webhook_url: WebhookUrl,
}

#[derive(Debug, Deserialize)]
pub struct HealthConfig {
    #[serde(default = "default_health_port")]
    pub port: u16,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            port: default_health_port(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Secret {
    Google {
        name: String,
        #[serde(default = "default_gcp_secret_version")]
        version: String,
    },
}

/// The alert webhook, either inline or stored in a secret manager.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum WebhookUrl {
    Raw(String),
    Secret(Secret),
}

impl WebhookUrl {
    pub async fn resolve(self) -> Result<String, ConfigError> {
        let url = match self {
            WebhookUrl::Raw(url) => url,
            WebhookUrl::Secret(Secret::Google { name, version }) => {
                log::info!("Fetching webhook url from secret {name}");
                secrets::gcp::fetch_secret(&name, &version).await?
            }
        };
        if url.is_empty() {
            return Err(ConfigError::Invalid("alerts.webhook_url is empty"));
        }
        Ok(url)
    }
}

impl WatcherConfigFile {
    fn try_init_from_string(config: &str, vars: &WatcherVars) -> Result<Self, ConfigError> {
        let mut env = Environment::new();
        env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);
        let template = env.template_from_str(config)?;
        let rendered = template.render(vars)?;

        let config: Self = toml::from_str(&rendered)?;
        config.validate()?;
        Ok(config)
    }

    pub fn try_init(config_path: &Path, vars_path: &Path) -> Result<Self, ConfigError> {
        let config = std::fs::read_to_string(config_path)?;
        let vars = WatcherVars::try_init(vars_path)?;

        Self::try_init_from_string(&config, &vars)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.redis.info_list_name.is_empty() || self.redis.details_list_name.is_empty() {
            return Err(ConfigError::Invalid("redis list names must not be empty"));
        }
        if self.redis.info_list_name == self.redis.details_list_name {
            return Err(ConfigError::Invalid(
                "redis.info_list_name and redis.details_list_name must differ",
            ));
        }
        Ok(())
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs.get())
    }
}

impl RedisConfig {
    pub fn pop_timeout(&self) -> Duration {
        Duration::from_secs(self.pop_timeout_secs.get())
    }
}
