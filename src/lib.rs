//! pdf-insight: PDF 上传、文本提取、AI 摘要与关键词备选方案

pub mod config;
pub mod insight;
pub mod parser;
pub mod server;
pub mod storage;
pub mod summarizer;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::config::AppConfig;
pub use crate::insight::InsightPipeline;
pub use crate::utils::{InsightError, InsightResult};
