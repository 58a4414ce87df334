use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    #[serde(default)]
    pub view: ViewSettings,
    pub stream: StreamSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub base_url: String,
    pub events_path: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ViewSettings {
    /// Set to follow a single device; unset shows the whole fleet.
    #[serde(default)]
    pub device_id: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StreamSettings {
    pub retry_ms: u64,
    pub channel_capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub filter: String,
}

impl AppConfig {
    pub fn events_url(&self) -> String {
        join_url(&self.server.base_url, &self.server.events_path)
    }
}

fn builder() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(config::Config::builder()
        .set_default("server.base_url", "http://127.0.0.1:5000")?
        .set_default("server.events_path", "/events/devices")?
        .set_default("stream.retry_ms", 2000)?
        .set_default("stream.channel_capacity", 64)?
        .set_default("logging.filter", "info")?)
}

pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = builder()?
        .add_source(config::File::with_name("config/droplet").required(false))
        .add_source(
            config::Environment::with_prefix("DROPLET")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Join a base URL and an absolute path without doubling the slash
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
