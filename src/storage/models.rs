use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use crate::utils::{InsightError, InsightResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

/// 生成洞察所走的分支
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightType {
    Ai,
    Fallback,
}

impl InsightType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightType::Ai => "ai",
            InsightType::Fallback => "fallback",
        }
    }

    pub fn parse(value: &str) -> InsightResult<Self> {
        match value {
            "ai" => Ok(InsightType::Ai),
            "fallback" => Ok(InsightType::Fallback),
            other => Err(InsightError::Internal(format!("未知的洞察类型: {}", other))),
        }
    }
}

impl fmt::Display for InsightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// AI 摘要与关键词二选一
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insight {
    Ai { summary: String },
    Fallback { top_words: Vec<WordCount> },
}

impl Insight {
    pub fn insight_type(&self) -> InsightType {
        match self {
            Insight::Ai { .. } => InsightType::Ai,
            Insight::Fallback { .. } => InsightType::Fallback,
        }
    }

    pub fn summary(&self) -> Option<&str> {
        match self {
            Insight::Ai { summary } => Some(summary),
            Insight::Fallback { .. } => None,
        }
    }

    pub fn top_words(&self) -> Option<&[WordCount]> {
        match self {
            Insight::Ai { .. } => None,
            Insight::Fallback { top_words } => Some(top_words),
        }
    }
}

/// 待保存的上传记录，id 与 created_at 由存储层分配
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub filename: String,
    pub storage_path: String,
    pub insight: Insight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadedDocument {
    pub id: i64,
    pub filename: String,
    pub storage_path: String,
    pub created_at: DateTime<Utc>,
    pub insight: Insight,
}

/// documents 表的一行
#[derive(Debug, Clone, FromRow)]
pub struct DocumentRow {
    pub id: i64,
    pub filename: String,
    pub storage_path: String,
    pub created_at: String,
    pub insight_type: String,
    pub summary_text: Option<String>,
    pub top_words: Option<String>,
}

impl TryFrom<DocumentRow> for UploadedDocument {
    type Error = InsightError;

    fn try_from(row: DocumentRow) -> InsightResult<Self> {
        let insight = match (InsightType::parse(&row.insight_type)?, row.summary_text, row.top_words) {
            (InsightType::Ai, Some(summary), None) => Insight::Ai { summary },
            (InsightType::Fallback, None, Some(json)) => Insight::Fallback {
                top_words: serde_json::from_str(&json)?,
            },
            _ => {
                return Err(InsightError::Internal(format!(
                    "文档 {} 的洞察字段与类型不一致",
                    row.id
                )))
            }
        };

        Ok(Self {
            id: row.id,
            filename: row.filename,
            storage_path: row.storage_path,
            created_at: parse_timestamp(&row.created_at)?,
            insight,
        })
    }
}

/// 历史列表只包含元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DocumentSummary {
    pub id: i64,
    pub filename: String,
    pub created_at: String,
    pub insight_type: String,
}

pub fn parse_timestamp(value: &str) -> InsightResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| InsightError::Internal(format!("无效的时间戳 '{}': {}", value, e)))
}
