use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::insight::keywords::{top_words, DEFAULT_TOP_N};
use crate::parser::PdfParser;
use crate::storage::models::{Insight, NewDocument, UploadedDocument};
use crate::storage::{Database, FileStore};
use crate::summarizer::Summarizer;
use crate::utils::{InsightError, InsightResult};

/// 上传处理管道：提取文本 -> AI摘要 -> 失败时关键词统计 -> 入库
pub struct InsightPipeline {
    summarizer: Summarizer,
    files: FileStore,
    db: Database,
    top_n: usize,
}

impl InsightPipeline {
    /// `top_n` 超过 `DEFAULT_TOP_N` 时按上限处理
    pub fn new(summarizer: Summarizer, files: FileStore, db: Database, top_n: usize) -> Self {
        if top_n > DEFAULT_TOP_N {
            warn!("top_n={} 超过上限，按 {} 处理", top_n, DEFAULT_TOP_N);
        }
        let top_n = top_n.min(DEFAULT_TOP_N);

        Self {
            summarizer,
            files,
            db,
            top_n,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// 处理一次上传。文本为空时拒绝，不保存记录
    pub async fn ingest(&self, original_name: &str, bytes: &[u8]) -> InsightResult<UploadedDocument> {
        info!("开始处理上传: {} ({} 字节)", original_name, bytes.len());

        let stored = self.files.save(original_name, bytes).await?;

        // 1. 提取全文
        let text = match extract_text(stored.path.clone()).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!("PDF中未提取到文本内容: {}", original_name);
                self.files.remove(&stored.path).await;
                return Err(InsightError::Validation(
                    "PDF has no extractable text".to_string(),
                ));
            }
            Err(e) => {
                warn!("PDF解析失败 {}: {}", original_name, e);
                self.files.remove(&stored.path).await;
                return Err(InsightError::Validation("Could not read PDF".to_string()));
            }
        };

        // 2. 生成洞察
        let insight = self.derive_insight(&text).await;

        // 3. 入库
        let doc = NewDocument {
            filename: stored.filename,
            storage_path: stored.path.to_string_lossy().to_string(),
            insight,
        };
        let id = match self.db.save_document(&doc).await {
            Ok(id) => id,
            Err(e) => {
                warn!("保存记录失败，删除已上传文件: {}", e);
                self.files.remove(&stored.path).await;
                return Err(e);
            }
        };
        info!("文档已保存，ID: {}，类型: {}", id, doc.insight.insight_type());

        self.db.get_document(id).await
    }

    /// 先尝试AI摘要，任何失败都直接改用关键词统计（基于未截断的全文）
    pub async fn derive_insight(&self, text: &str) -> Insight {
        match self.summarizer.summarize(text).await {
            Ok(summary) => Insight::Ai { summary },
            Err(e) => {
                info!("使用关键词统计代替AI摘要: {}", e);
                Insight::Fallback {
                    top_words: top_words(text, self.top_n),
                }
            }
        }
    }

    /// 处理本地文件，不入库
    pub async fn process_file(&self, path: &Path) -> InsightResult<Insight> {
        let text = extract_text(path.to_path_buf()).await?;
        if text.trim().is_empty() {
            return Err(InsightError::Validation(
                "PDF has no extractable text".to_string(),
            ));
        }

        Ok(self.derive_insight(&text).await)
    }
}

/// PDF解析是CPU密集的阻塞操作
async fn extract_text(path: PathBuf) -> InsightResult<String> {
    tokio::task::spawn_blocking(move || PdfParser::new().extract_full_text(&path))
        .await
        .map_err(|e| InsightError::Internal(format!("提取任务失败: {}", e)))?
}
