//! 代理接口客户端
//!
//! 行情聚合和信号生成只通过这两个接口访问外部，测试中替换为内存实现

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use crate::models::{
    completion_text, AssetsResponse, NewsKind, NewsResponse, PriceKind, StockQuote, StocksResponse,
    UpstreamChatRequest,
};

/// 错误信息中保留的响应体长度
const ERROR_BODY_CHARS: usize = 200;

/// 行情代理接口
#[async_trait]
pub trait MarketProxy: Send + Sync {
    /// 全市场行情（source=cafef）
    async fn stock_board(&self) -> anyhow::Result<StocksResponse>;
    /// 单只报价（source=quote）
    async fn stock_quote(&self, symbol: &str) -> anyhow::Result<StockQuote>;
    /// 指定多只（source=batch）
    async fn stock_batch(&self, symbols: &[String]) -> anyhow::Result<StocksResponse>;
    /// 加密货币 / 贵金属
    async fn prices(&self, kind: PriceKind) -> anyhow::Result<AssetsResponse>;
    async fn news(&self, query: &str, kind: NewsKind) -> anyhow::Result<NewsResponse>;
}

/// 大模型对话接口，返回回复文本
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: &UpstreamChatRequest) -> anyhow::Result<String>;
}

fn price_param(kind: PriceKind) -> &'static str {
    match kind {
        PriceKind::Crypto => "crypto",
        PriceKind::Metals => "metals",
        PriceKind::All => "all",
    }
}

fn truncate_body(body: &str) -> String {
    body.chars().take(ERROR_BODY_CHARS).collect()
}

/// 通过 HTTP 访问本服务的 `/api/*`
pub struct HttpMarketProxy {
    client: Client,
    base: Url,
    timeout: Duration,
}

impl HttpMarketProxy {
    pub fn new(client: Client, base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base = Url::parse(base_url).map_err(|e| anyhow!("代理地址无效 {}: {}", base_url, e))?;
        Ok(Self { client, base, timeout })
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> anyhow::Result<Url> {
        let mut url = self.base.join(path)?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> anyhow::Result<T> {
        let url = self.endpoint(path, params)?;
        log::debug!("📡 请求代理接口: {}", url);

        let response = self.client.get(url).timeout(self.timeout).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("HTTP {}: {}", status.as_u16(), truncate_body(&body));
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl MarketProxy for HttpMarketProxy {
    async fn stock_board(&self) -> anyhow::Result<StocksResponse> {
        self.get("/api/stocks", &[("source", "cafef")]).await
    }

    async fn stock_quote(&self, symbol: &str) -> anyhow::Result<StockQuote> {
        self.get("/api/stocks", &[("source", "quote"), ("symbols", symbol)]).await
    }

    async fn stock_batch(&self, symbols: &[String]) -> anyhow::Result<StocksResponse> {
        let joined = symbols.join(",");
        self.get("/api/stocks", &[("source", "batch"), ("symbols", joined.as_str())]).await
    }

    async fn prices(&self, kind: PriceKind) -> anyhow::Result<AssetsResponse> {
        self.get("/api/crypto", &[("type", price_param(kind))]).await
    }

    async fn news(&self, query: &str, kind: NewsKind) -> anyhow::Result<NewsResponse> {
        let mut params = vec![("query", query)];
        if let Some(kind) = kind.as_param() {
            params.push(("type", kind));
        }
        self.get("/api/news", &params).await
    }
}

/// 经由 `/api/ai` 转发的对话接口
pub struct HttpChatBackend {
    client: Client,
    url: Url,
    api_key: String,
}

impl HttpChatBackend {
    pub fn new(client: Client, base_url: &str, api_key: impl Into<String>) -> anyhow::Result<Self> {
        let url = Url::parse(base_url)
            .and_then(|base| base.join("/api/ai"))
            .map_err(|e| anyhow!("代理地址无效 {}: {}", base_url, e))?;
        Ok(Self { client, url, api_key: api_key.into() })
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn complete(&self, request: &UpstreamChatRequest) -> anyhow::Result<String> {
        log::info!("📡 调用模型接口: {} (model={})", self.url, request.model);

        let response = self
            .client
            .post(self.url.clone())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        log::info!("📥 响应状态: {}", status);
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("❌ 模型接口错误: {}", body);
            bail!("API Error {}: {}", status.as_u16(), truncate_body(&body));
        }

        let value: serde_json::Value = response.json().await?;
        Ok(completion_text(&value).unwrap_or_default().to_string())
    }
}
