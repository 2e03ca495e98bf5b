use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Подключение к удалённому хранилищу записей
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub base_url: String,
    /// Сервисный токен (Bearer); можно задать через FARM_STORE_TOKEN
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Секрет для проверки JWT; можно задать через FARM_JWT_SECRET
    pub jwt_secret: String,
}

/// Ограничения размера выборок
#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    /// Максимум записей для аналитики
    #[serde(default = "default_analytics_cap")]
    pub analytics_cap: u32,
    /// Максимум записей на секцию экспорта
    #[serde(default = "default_export_cap")]
    pub export_cap: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            analytics_cap: default_analytics_cap(),
            export_cap: default_export_cap(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> u32 {
    50
}

fn default_analytics_cap() -> u32 {
    500
}

fn default_export_cap() -> u32 {
    1000
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[server]
host = "0.0.0.0"
port = 3000

[store]
base_url = "http://127.0.0.1:8090"
timeout_secs = 30

[auth]
jwt_secret = ""

[limits]
default_page_size = 50
analytics_cap = 500
export_cap = 1000
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
///
/// FARM_STORE_TOKEN and FARM_JWT_SECRET override the file values.
pub fn load_config() -> anyhow::Result<Config> {
    let mut config = match find_config_file() {
        Some(path) => {
            tracing::info!("Loading config from: {}", path.display());
            let contents = std::fs::read_to_string(&path)?;
            parse_config(&contents)?
        }
        None => {
            tracing::info!("Using default embedded configuration");
            parse_config(DEFAULT_CONFIG)?
        }
    };

    if let Ok(token) = std::env::var("FARM_STORE_TOKEN") {
        config.store.api_token = Some(token);
    }
    if let Ok(secret) = std::env::var("FARM_JWT_SECRET") {
        config.auth.jwt_secret = secret;
    }

    if config.auth.jwt_secret.trim().is_empty() {
        anyhow::bail!("auth.jwt_secret is empty: set it in config.toml or FARM_JWT_SECRET");
    }
    Ok(config)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(contents)?;
    Ok(config)
}

fn find_config_file() -> Option<std::path::PathBuf> {
    let exe_path = std::env::current_exe().ok()?;
    let config_path = exe_path.parent()?.join("config.toml");
    if config_path.exists() {
        Some(config_path)
    } else {
        tracing::warn!("config.toml not found at: {}", config_path.display());
        None
    }
}
