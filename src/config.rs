use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub channel: ChannelConfig,
    pub directory: EndpointConfig,
    pub reports: EndpointConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Realtime voice channel configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    /// NATS server URL
    pub nats_url: String,

    /// Channel API key; calls are refused while it is absent
    #[serde(default)]
    pub api_key: Option<String>,

    /// Pre-provisioned assistant id; absence selects the inline
    /// persona-overlay start path
    #[serde(default)]
    pub assistant_id: Option<String>,

    /// Bounded wait for call-started while connecting
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_connect_timeout() -> u64 {
    15
}

/// Base URL of an HTTP collaborator
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub base_url: String,
}

impl Config {
    /// Load from a config file, with environment overrides for secrets
    /// (e.g. `SANA__CHANNEL__API_KEY`)
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("SANA").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
