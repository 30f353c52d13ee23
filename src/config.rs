use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub notion: NotionConfig,
    pub blob: BlobConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotionConfig {
    pub database_id: String,
    pub integration_token: String,
    #[serde(default = "default_notion_base_url")]
    pub base_url: String,
    #[serde(default = "default_notion_version")]
    pub api_version: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BlobConfig {
    pub account: String,
    pub container: String,
    pub sas_token: String,
    /// Overrides the derived `https://{account}.blob.core.windows.net`
    /// endpoint; useful against Azurite in local runs.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl BlobConfig {
    pub fn endpoint(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.blob.core.windows.net", self.account),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_notion_base_url() -> String {
    "https://api.notion.com".to_string()
}

fn default_notion_version() -> String {
    // Latest version supported by the integration.
    "2021-05-13".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Rejects blank required values at startup instead of failing deep
    /// inside a request.
    fn validate(&self) -> Result<()> {
        let required = [
            ("notion.database_id", &self.notion.database_id),
            ("notion.integration_token", &self.notion.integration_token),
            ("blob.account", &self.blob.account),
            ("blob.container", &self.blob.container),
            ("blob.sas_token", &self.blob.sas_token),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                bail!("Missing required config value: {key}");
            }
        }
        Ok(())
    }
}
