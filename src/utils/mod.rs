pub mod logger;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsightError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("校验错误: {0}")]
    Validation(String),

    #[error("上传内容过大: {0}")]
    PayloadTooLarge(String),

    #[error("文档不存在: {0}")]
    NotFound(i64),

    #[error("PDF处理错误: {0}")]
    Pdf(String),

    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("内部错误: {0}")]
    Internal(String),
}

pub type InsightResult<T> = Result<T, InsightError>;

impl IntoResponse for InsightError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            InsightError::Validation(msg) | InsightError::Pdf(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            InsightError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg.clone()),
            InsightError::NotFound(_) => (StatusCode::NOT_FOUND, "Document not found".to_string()),
            other => {
                tracing::error!("请求处理失败: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let resp = InsightError::Validation("Only PDF files allowed".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = InsightError::PayloadTooLarge("File too large".into()).into_response();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let resp = InsightError::NotFound(42).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = InsightError::Internal("boom".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
