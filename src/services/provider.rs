//! 数据源抽象
//!
//! 同一类数据通常有多个上游，按顺序尝试，第一个返回有效数据的为准

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::UpstreamError;
use crate::models::{Asset, StockQuote};

/// 资产列表数据源（全市场行情、贵金属、加密货币）
#[async_trait]
pub trait AssetFeed: Send + Sync {
    /// 来源名称，写入响应的 `source` 字段
    fn name(&self) -> &'static str;

    async fn fetch(&self) -> Result<Vec<Asset>, UpstreamError>;
}

/// 单只股票报价数据源
#[async_trait]
pub trait QuoteFeed: Send + Sync {
    fn name(&self) -> &'static str;

    async fn quote(&self, symbol: &str) -> Result<StockQuote, UpstreamError>;
}

/// 依次尝试资产数据源，返回第一个非空结果及其来源
pub async fn first_assets(
    feeds: &[Arc<dyn AssetFeed>],
) -> Result<(Vec<Asset>, &'static str), UpstreamError> {
    let mut last_error = UpstreamError::Payload("no provider configured".to_string());

    for feed in feeds {
        match feed.fetch().await {
            Ok(assets) if !assets.is_empty() => return Ok((assets, feed.name())),
            Ok(_) => {
                log::warn!("⚠️ {} 未返回数据，尝试下一个数据源", feed.name());
                last_error = UpstreamError::Payload(format!("{} returned no data", feed.name()));
            }
            Err(e) => {
                log::warn!("⚠️ {} 请求失败: {}", feed.name(), e);
                last_error = e;
            }
        }
    }

    Err(last_error)
}

/// 依次尝试报价数据源
pub async fn first_quote(
    feeds: &[Arc<dyn QuoteFeed>],
    symbol: &str,
) -> Result<StockQuote, UpstreamError> {
    let mut last_error = UpstreamError::Payload("no provider configured".to_string());

    for feed in feeds {
        match feed.quote(symbol).await {
            Ok(quote) if quote.price > 0.0 => return Ok(quote),
            Ok(_) => {
                log::warn!("⚠️ {} 报价无效: {}", feed.name(), symbol);
                last_error = UpstreamError::Payload(format!("{} has no price for {}", feed.name(), symbol));
            }
            Err(e) => {
                log::warn!("⚠️ {} 获取 {} 失败: {}", feed.name(), symbol, e);
                last_error = e;
            }
        }
    }

    Err(last_error)
}
