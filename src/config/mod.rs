use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub resources: ResourcesConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResourcesConfig {
    /// Directory uploaded images are stored under.
    #[serde(default = "default_resource_root")]
    pub root: String,
    #[serde(default = "default_max_upload")]
    pub max_upload_size: String,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            root: default_resource_root(),
            max_upload_size: default_max_upload(),
        }
    }
}

impl ResourcesConfig {
    pub fn max_upload_bytes(&self) -> Result<usize> {
        parse_size(&self.max_upload_size)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContentConfig {
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            max_content_length: default_max_content_length(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default = "default_session_lifetime")]
    pub session_lifetime: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_lifetime: default_session_lifetime(),
        }
    }
}

impl AuthConfig {
    pub fn session_lifetime_hours(&self) -> Result<i64> {
        parse_lifetime_hours(&self.session_lifetime)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_pool_size() -> u32 {
    10
}

fn default_resource_root() -> String {
    "resources".to_string()
}

fn default_max_upload() -> String {
    "10MB".to_string()
}

fn default_page_size() -> usize {
    10
}

fn default_max_page_size() -> usize {
    100
}

fn default_max_content_length() -> usize {
    100_000
}

fn default_session_lifetime() -> String {
    "7d".to_string()
}

/// Parses sizes such as `512KB`, `10MB` or a bare byte count.
pub fn parse_size(raw: &str) -> Result<usize> {
    let s = raw.trim().to_uppercase();
    let (digits, multiplier) = if let Some(n) = s.strip_suffix("GB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("KB") {
        (n, 1024)
    } else if let Some(n) = s.strip_suffix('B') {
        (n, 1)
    } else {
        (s.as_str(), 1)
    };

    let value: usize = digits
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid size '{}'", raw))?;
    Ok(value * multiplier)
}

/// Parses lifetimes such as `7d` or `12h` into hours.
pub fn parse_lifetime_hours(raw: &str) -> Result<i64> {
    let s = raw.trim().to_lowercase();
    let (digits, multiplier) = if let Some(n) = s.strip_suffix('d') {
        (n, 24)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 1)
    } else {
        anyhow::bail!("Invalid lifetime '{}': expected a number followed by 'd' or 'h'", raw);
    };

    let value: i64 = digits
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid lifetime '{}'", raw))?;
    Ok(value * multiplier)
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!(
                "Could not read config file '{}': {}. Run `inkpost init` to create one.",
                path.display(),
                e
            )
        })?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.max_page_size == 0 || self.api.max_page_size > 100 {
            anyhow::bail!("api.max_page_size must be between 1 and 100");
        }
        if self.api.default_page_size == 0 {
            anyhow::bail!("api.default_page_size must be greater than 0");
        }
        if self.api.default_page_size > self.api.max_page_size {
            anyhow::bail!("api.default_page_size must not exceed api.max_page_size");
        }
        if self.content.max_content_length == 0 {
            anyhow::bail!("content.max_content_length must be greater than 0");
        }
        if self.resources.max_upload_bytes()? == 0 {
            anyhow::bail!("resources.max_upload_size must be greater than 0");
        }
        if self.auth.session_lifetime_hours()? <= 0 {
            anyhow::bail!("auth.session_lifetime must be positive");
        }
        Ok(())
    }

    pub fn default_toml() -> &'static str {
        r#"[server]
host = "127.0.0.1"
port = 3000

[database]
path = "./data/inkpost.db"

[resources]
root = "./resources"
max_upload_size = "10MB"

[api]
default_page_size = 10
max_page_size = 100

[content]
max_content_length = 100000

[auth]
session_lifetime = "7d"
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_toml_parses_and_validates() {
        let config: Config = toml::from_str(Config::default_toml()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.api.max_page_size, 100);
        assert_eq!(config.resources.max_upload_bytes().unwrap(), 10 * 1024 * 1024);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config = toml::from_str("[database]\npath = \"x.db\"\n").unwrap();
        config.validate().unwrap();
        assert_eq!(config.resources.root, "resources");
        assert_eq!(config.api.default_page_size, 10);
        assert_eq!(config.auth.session_lifetime_hours().unwrap(), 168);
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("512").unwrap(), 512);
        assert_eq!(parse_size("2KB").unwrap(), 2048);
        assert_eq!(parse_size(" 1mb ").unwrap(), 1024 * 1024);
        assert!(parse_size("lots").is_err());
    }

    #[test]
    fn test_parse_lifetime_hours() {
        assert_eq!(parse_lifetime_hours("12h").unwrap(), 12);
        assert_eq!(parse_lifetime_hours("2d").unwrap(), 48);
        assert!(parse_lifetime_hours("2w").is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_page() {
        let mut config: Config = toml::from_str("[database]\npath = \"x.db\"\n").unwrap();
        config.api.max_page_size = 500;
        assert!(config.validate().is_err());
    }
}
