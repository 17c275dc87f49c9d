//! HTTP 处理函数：上传、历史记录与详情

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::server::state::AppState;
use crate::storage::models::{DocumentSummary, InsightType, UploadedDocument, WordCount};
use crate::utils::{InsightError, InsightResult};

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// 上传处理完成后的响应
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub id: i64,
    pub filename: String,
    pub insight_type: InsightType,
    pub summary: Option<String>,
    pub top_words: Option<Vec<WordCount>>,
}

impl From<&UploadedDocument> for UploadResponse {
    fn from(doc: &UploadedDocument) -> Self {
        Self {
            id: doc.id,
            filename: doc.filename.clone(),
            insight_type: doc.insight.insight_type(),
            summary: doc.insight.summary().map(str::to_string),
            top_words: doc.insight.top_words().map(<[WordCount]>::to_vec),
        }
    }
}

/// 单个文档的完整记录
#[derive(Debug, Serialize, Deserialize)]
pub struct InsightDetail {
    pub id: i64,
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub insight_type: InsightType,
    pub summary: Option<String>,
    pub top_words: Option<Vec<WordCount>>,
}

impl From<UploadedDocument> for InsightDetail {
    fn from(doc: UploadedDocument) -> Self {
        Self {
            id: doc.id,
            filename: doc.filename,
            created_at: doc.created_at,
            insight_type: doc.insight.insight_type(),
            summary: doc.insight.summary().map(str::to_string),
            top_words: doc.insight.top_words().map(<[WordCount]>::to_vec),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

/// GET /
pub async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Backend running" }))
}

/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}

/// POST /upload - 接收PDF并生成洞察
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> InsightResult<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Invalid multipart body", e))?
    {
        let Some(original_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        if field.content_type() != Some(PDF_CONTENT_TYPE) {
            return Err(InsightError::Validation("Only PDF files allowed".to_string()));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error("Failed to read file", e))?;

        let doc = state.pipeline().ingest(&original_name, &data).await?;
        return Ok(Json(UploadResponse::from(&doc)));
    }

    Err(InsightError::Validation("No file uploaded".to_string()))
}

/// 超出 DefaultBodyLimit 时返回 413，其余读取错误为 400
fn multipart_error(context: &str, e: MultipartError) -> InsightError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!("上传内容超过限制: {}", e.body_text());
        return InsightError::PayloadTooLarge("File too large".to_string());
    }
    InsightError::Validation(format!("{}: {}", context, e.body_text()))
}

/// GET /history - 最新的在前，不含洞察内容
pub async fn history(
    State(state): State<AppState>,
    Query(params): Query<HistoryQuery>,
) -> InsightResult<Json<Vec<DocumentSummary>>> {
    let docs = state.database().list_recent(params.limit).await?;
    Ok(Json(docs))
}

/// GET /insights/:id
pub async fn get_insight(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> InsightResult<Json<InsightDetail>> {
    let doc = state.database().get_document(id).await?;
    Ok(Json(InsightDetail::from(doc)))
}
