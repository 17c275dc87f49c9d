use chrono::{SecondsFormat, Utc};
use sqlx::{sqlite::SqliteConnectOptions, sqlite::SqlitePoolOptions, SqlitePool};
use tracing::info;

use crate::storage::models::{DocumentRow, DocumentSummary, Insight, NewDocument, UploadedDocument};
use crate::utils::{InsightError, InsightResult};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> InsightResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(
                database_url.parse::<SqliteConnectOptions>()?
                    .create_if_missing(true)
            )
            .await?;

        info!("数据库连接成功: {}", database_url);
        Ok(Self { pool })
    }

    /// 内存数据库只能使用单个连接，否则每个连接各自一份数据
    pub async fn in_memory() -> InsightResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with("sqlite::memory:".parse::<SqliteConnectOptions>()?)
            .await?;

        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    pub async fn init_schema(&self) -> InsightResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filename TEXT NOT NULL,
                storage_path TEXT NOT NULL,
                created_at TEXT NOT NULL,
                insight_type TEXT NOT NULL,
                summary_text TEXT,
                top_words TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_created_at ON documents(created_at)")
            .execute(&self.pool)
            .await?;

        info!("数据库表结构初始化完成");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// 保存上传记录，返回新记录ID。记录创建后不再修改
    pub async fn save_document(&self, doc: &NewDocument) -> InsightResult<i64> {
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        let (summary_text, top_words) = match &doc.insight {
            Insight::Ai { summary } => (Some(summary.clone()), None),
            Insight::Fallback { top_words } => (None, Some(serde_json::to_string(top_words)?)),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO documents (filename, storage_path, created_at, insight_type, summary_text, top_words)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&doc.filename)
        .bind(&doc.storage_path)
        .bind(&created_at)
        .bind(doc.insight.insight_type().as_str())
        .bind(summary_text)
        .bind(top_words)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_document(&self, id: i64) -> InsightResult<UploadedDocument> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, filename, storage_path, created_at, insight_type, summary_text, top_words
            FROM documents WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(InsightError::NotFound(id))?;

        UploadedDocument::try_from(row)
    }

    /// 按创建时间倒序列出记录
    pub async fn list_recent(&self, limit: Option<i64>) -> InsightResult<Vec<DocumentSummary>> {
        // SQLite 中 LIMIT -1 表示不限制
        let docs = sqlx::query_as::<_, DocumentSummary>(
            r#"
            SELECT id, filename, created_at, insight_type
            FROM documents
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit.unwrap_or(-1))
        .fetch_all(&self.pool)
        .await?;

        Ok(docs)
    }

    pub async fn count_documents(&self) -> InsightResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::{InsightType, WordCount};

    fn ai_doc(name: &str) -> NewDocument {
        NewDocument {
            filename: name.to_string(),
            storage_path: format!("./storage/{}", name),
            insight: Insight::Ai {
                summary: "Short summary.".to_string(),
            },
        }
    }

    fn fallback_doc(name: &str) -> NewDocument {
        NewDocument {
            filename: name.to_string(),
            storage_path: format!("./storage/{}", name),
            insight: Insight::Fallback {
                top_words: vec![
                    WordCount { word: "dog".to_string(), count: 3 },
                    WordCount { word: "cat".to_string(), count: 2 },
                ],
            },
        }
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let db = Database::in_memory().await.unwrap();

        let ai_id = db.save_document(&ai_doc("a.pdf")).await.unwrap();
        let fb_id = db.save_document(&fallback_doc("b.pdf")).await.unwrap();
        assert_ne!(ai_id, fb_id);

        let ai = db.get_document(ai_id).await.unwrap();
        assert_eq!(ai.filename, "a.pdf");
        assert_eq!(ai.insight.summary(), Some("Short summary."));
        assert!(ai.insight.top_words().is_none());

        let fb = db.get_document(fb_id).await.unwrap();
        assert_eq!(fb.insight.insight_type(), InsightType::Fallback);
        assert_eq!(fb.insight.top_words().unwrap().len(), 2);
        assert_eq!(fb.insight.top_words().unwrap()[0].word, "dog");
        assert!(fb.insight.summary().is_none());
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let db = Database::in_memory().await.unwrap();
        db.save_document(&ai_doc("a.pdf")).await.unwrap();

        let result = db.get_document(999).await;
        assert!(matches!(result, Err(InsightError::NotFound(999))));
        assert_eq!(db.count_documents().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_recent_newest_first() {
        let db = Database::in_memory().await.unwrap();
        for name in ["first.pdf", "second.pdf", "third.pdf"] {
            db.save_document(&ai_doc(name)).await.unwrap();
        }

        let all = db.list_recent(None).await.unwrap();
        let names: Vec<&str> = all.iter().map(|d| d.filename.as_str()).collect();
        assert_eq!(names, vec!["third.pdf", "second.pdf", "first.pdf"]);
        assert!(all.iter().all(|d| d.insight_type == "ai"));

        let limited = db.list_recent(Some(2)).await.unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].filename, "third.pdf");
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("insights.db").display());

        let id = {
            let db = Database::new(&url).await.unwrap();
            db.init_schema().await.unwrap();
            db.save_document(&fallback_doc("c.pdf")).await.unwrap()
        };

        let db = Database::new(&url).await.unwrap();
        db.init_schema().await.unwrap();
        let doc = db.get_document(id).await.unwrap();
        assert_eq!(doc.filename, "c.pdf");
    }
}
