//! Chat Completion 请求模型

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 默认采样温度
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
/// 默认最大生成 token 数
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

/// 调用方发来的请求，缺省字段由代理补齐
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatMessage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// 转发给上游的完整请求
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpstreamChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl ChatRequest {
    /// 补齐默认值，`messages` 缺失或为空时返回 None
    pub fn with_defaults(self, default_model: &str) -> Option<UpstreamChatRequest> {
        let messages = self.messages.filter(|m| !m.is_empty())?;
        Some(UpstreamChatRequest {
            model: self
                .model
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| default_model.to_string()),
            messages,
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: self.max_tokens.filter(|t| *t > 0).unwrap_or(DEFAULT_MAX_TOKENS),
        })
    }
}

/// 取出 `choices[0].message.content`
pub fn completion_text(response: &Value) -> Option<&str> {
    response
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
}
