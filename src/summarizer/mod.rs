use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::SummarizerConfig;
use crate::utils::{InsightError, InsightResult};

/// 摘要失败的原因，调用方统一按"改用备选方案"处理
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SummarizeError {
    #[error("摘要服务未配置: {0}")]
    Configuration(String),

    #[error("摘要服务错误: {0}")]
    Provider(String),
}

/// Chat completion 请求体
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// 服务商的响应格式不固定，只接受以下两种 choice
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Choice {
    Message { message: ResponseMessage },
    Text { text: String },
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

impl Choice {
    fn into_content(self) -> String {
        match self {
            Choice::Message { message } => message.content,
            Choice::Text { text } => text,
        }
    }
}

pub struct Summarizer {
    client: reqwest::Client,
    config: SummarizerConfig,
}

impl Summarizer {
    pub fn new(config: SummarizerConfig) -> InsightResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| InsightError::Config(format!("无法创建HTTP客户端: {}", e)))?;

        Ok(Self { client, config })
    }

    /// 检查 API key 是否已配置
    pub fn is_configured(&self) -> bool {
        self.config.has_credential()
    }

    /// 生成摘要，只尝试一次，不重试
    pub async fn summarize(&self, text: &str) -> Result<String, SummarizeError> {
        if !self.is_configured() {
            return Err(SummarizeError::Configuration(
                "no API key configured".to_string(),
            ));
        }

        let text = truncate_chars(text, self.config.max_input_chars);

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: self.config.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format!("Summarize the following text:\n\n{}", text),
                },
            ],
            max_tokens: self.config.max_tokens,
        };

        match self.do_request(&request).await {
            Ok(summary) => {
                info!("摘要生成成功: {} 字符", summary.chars().count());
                Ok(summary)
            }
            Err(e) => {
                warn!("摘要服务调用失败: {}", e);
                Err(e)
            }
        }
    }

    async fn do_request(&self, request: &ChatRequest) -> Result<String, SummarizeError> {
        let url = format!("{}/chat/completions", self.config.api_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| SummarizeError::Provider(format!("发送请求失败: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SummarizeError::Provider(format!("读取响应失败: {}", e)))?;

        if !status.is_success() {
            return Err(SummarizeError::Provider(format!(
                "API 返回错误 {}: {}",
                status,
                truncate_chars(&body, 500)
            )));
        }

        parse_summary(&body)
    }
}

/// 从响应体中取出第一个 choice 的文本
fn parse_summary(body: &str) -> Result<String, SummarizeError> {
    let unexpected = || {
        SummarizeError::Provider(format!(
            "unexpected response format: {}",
            truncate_chars(body, 500)
        ))
    };

    let response: ChatResponse = serde_json::from_str(body).map_err(|_| unexpected())?;
    let content = response
        .choices
        .into_iter()
        .next()
        .map(Choice::into_content)
        .ok_or_else(unexpected)?;

    let summary = content.trim();
    if summary.is_empty() {
        return Err(SummarizeError::Provider("empty summary".to_string()));
    }

    Ok(summary.to_string())
}

/// 按字符截断，保证落在字符边界上
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
