use std::sync::Arc;

use crate::config::AppConfig;
use crate::insight::InsightPipeline;
use crate::storage::{Database, FileStore};
use crate::summarizer::Summarizer;
use crate::utils::InsightResult;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<InsightPipeline>,
}

impl AppState {
    pub fn new(pipeline: InsightPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    /// 按配置打开数据库、上传目录和摘要客户端
    pub async fn from_config(config: &AppConfig) -> InsightResult<Self> {
        if let Some(parent) = std::path::Path::new(&config.storage.database_path).parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let db = Database::new(&config.database_url()).await?;
        db.init_schema().await?;

        let files = FileStore::new(&config.storage.upload_dir).await?;
        let summarizer = Summarizer::new(config.summarizer.clone())?;
        if !summarizer.is_configured() {
            tracing::warn!("⚠️ API key 未配置，所有上传将使用关键词统计");
        }

        Ok(Self::new(InsightPipeline::new(
            summarizer,
            files,
            db,
            config.insight.top_n,
        )))
    }

    pub fn pipeline(&self) -> &InsightPipeline {
        &self.pipeline
    }

    pub fn database(&self) -> &Database {
        self.pipeline.database()
    }
}
