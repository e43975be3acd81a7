//! Chat Completion 转发（/api/ai）
//!
//! 调用方的 Bearer token 原样转发给上游，代理本身不保存任何密钥

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::error::UpstreamError;
use crate::models::{ChatRequest, UpstreamChatRequest};

/// 上游 Chat Completion 接口
#[async_trait]
pub trait ChatRelay: Send + Sync {
    async fn complete(&self, api_key: &str, request: &UpstreamChatRequest) -> Result<Value, UpstreamError>;
}

/// OpenAI 兼容的 HTTP 接口
pub struct HttpChatRelay {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpChatRelay {
    pub fn new(client: Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self { client, url: url.into(), timeout }
    }
}

#[async_trait]
impl ChatRelay for HttpChatRelay {
    async fn complete(&self, api_key: &str, request: &UpstreamChatRequest) -> Result<Value, UpstreamError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(request)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        log::info!("🤖 上游模型响应状态: {}", status);

        if !status.is_success() {
            return Err(UpstreamError::Status { status: status.as_u16(), body });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

pub struct ChatService {
    relay: Arc<dyn ChatRelay>,
    default_model: String,
}

impl ChatService {
    pub fn new(relay: Arc<dyn ChatRelay>, default_model: impl Into<String>) -> Self {
        Self { relay, default_model: default_model.into() }
    }

    pub fn from_config(config: &AppConfig, client: Client) -> Self {
        let relay = HttpChatRelay::new(client, &config.upstream.chat_url, config.api.chat_timeout());
        Self::new(Arc::new(relay), &config.upstream.default_model)
    }

    /// 补齐默认参数后转发，`messages` 缺失时返回 None
    pub async fn forward(&self, api_key: &str, request: ChatRequest) -> Option<Result<Value, UpstreamError>> {
        let request = request.with_defaults(&self.default_model)?;
        log::info!("🤖 转发对话请求: model={}, {} 条消息", request.model, request.messages.len());
        Some(self.relay.complete(api_key, &request).await)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// 记录收到的请求并返回固定结果
    pub struct RecordingRelay {
        pub result: Result<Value, UpstreamError>,
        pub seen: Mutex<Vec<(String, UpstreamChatRequest)>>,
    }

    impl RecordingRelay {
        pub fn new(result: Result<Value, UpstreamError>) -> Arc<Self> {
            Arc::new(Self { result, seen: Mutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl ChatRelay for RecordingRelay {
        async fn complete(&self, api_key: &str, request: &UpstreamChatRequest) -> Result<Value, UpstreamError> {
            self.seen.lock().unwrap().push((api_key.to_string(), request.clone()));
            self.result.clone()
        }
    }
}
