use anyhow::Result;
use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::insight::DEFAULT_TOP_N;

pub const DEFAULT_CONFIG_PATH: &str = "config/settings.toml";

/// 占位符密钥，视为未配置
pub const PLACEHOLDER_API_KEY: &str = "your-api-key";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub summarizer: SummarizerConfig,
    pub insight: InsightConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

/// 摘要服务配置，进程启动时加载一次
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub system_prompt: String,
    pub max_tokens: u32,
    /// 发送给服务商前截断的字符数
    pub max_input_chars: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InsightConfig {
    pub top_n: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: String,
    pub upload_dir: String,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// 依次叠加: 默认值 -> TOML 文件 -> PDF_INSIGHT_* 环境变量 -> SARVAM_* 环境变量
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let settings = Config::builder()
            .add_source(
                File::from(path.as_ref())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix("PDF_INSIGHT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option("summarizer.api_key", std::env::var("SARVAM_API_KEY").ok())?
            .set_override_option("summarizer.api_url", std::env::var("SARVAM_BASE").ok())?
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn database_url(&self) -> String {
        format!("sqlite:{}", self.storage.database_path)
    }
}

impl SummarizerConfig {
    pub fn has_credential(&self) -> bool {
        let key = self.api_key.trim();
        !key.is_empty() && key != PLACEHOLDER_API_KEY
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: "https://api.sarvam.ai/v1".to_string(),
            model: "sarvam-m".to_string(),
            system_prompt: "You are a helpful summarizer.".to_string(),
            max_tokens: 300,
            max_input_chars: 100_000,
            timeout_secs: 40,
        }
    }
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "./data/insights.db".to_string(),
            upload_dir: "./storage".to_string(),
        }
    }
}
