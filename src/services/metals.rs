//! 贵金属行情
//!
//! 数据源顺序：GoldPrice.org 现货 → CoinGecko 代币化金银 → 静态表。
//! 结果始终包含金、银两条

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::{self, GOLD_SYMBOL, SILVER_SYMBOL};
use crate::error::UpstreamError;
use crate::models::{Asset, AssetType};
use crate::services::common::{get_json, number_field};
use crate::services::crypto::{fetch_tickers, simple_price_url, CoinTicker};
use crate::services::provider::{first_assets, AssetFeed};

/// GoldPrice.org 现货金银（美元/盎司）
pub struct GoldPriceProvider {
    client: Client,
    url: String,
    timeout: Duration,
}

impl GoldPriceProvider {
    pub fn new(client: Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self { client, url: url.into(), timeout }
    }
}

#[async_trait]
impl AssetFeed for GoldPriceProvider {
    fn name(&self) -> &'static str {
        "GoldPrice.org"
    }

    async fn fetch(&self) -> Result<Vec<Asset>, UpstreamError> {
        log::info!("📡 请求 GoldPrice.org 现货价格");
        let value = get_json(&self.client, &self.url, self.timeout).await?;
        Ok(parse_spot(&value))
    }
}

/// 解析 GoldPrice.org 响应
///
/// 格式: {"ts":...,"items":[{"curr":"USD","xauPrice":4890.1,"xagPrice":79.2,"pcXau":-1.8,"pcXag":-1.2,"chgXau":-89.6,"chgXag":-0.96}]}
pub fn parse_spot(value: &Value) -> Vec<Asset> {
    let Some(item) = value.get("items").and_then(Value::as_array).and_then(|a| a.first()) else {
        return Vec::new();
    };

    let spot = |price_key: &str, pc_key: &str, chg_key: &str, template: Asset| -> Option<Asset> {
        let price = number_field(item, &[price_key]).filter(|p| *p > 0.0)?;
        let mut asset = Asset::new(template.symbol, template.name, AssetType::Metal, price)
            .with_change(number_field(item, &[pc_key]).unwrap_or(0.0))
            .live("GoldPrice.org");
        asset.icon = template.icon;
        asset.price_change = number_field(item, &[chg_key]);
        Some(asset)
    };

    [
        spot("xauPrice", "pcXau", "chgXau", catalog::fallback_gold()),
        spot("xagPrice", "pcXag", "chgXag", catalog::fallback_silver()),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// CoinGecko 代币化贵金属：PAX Gold 对应黄金，Kinesis Silver 对应白银
pub struct TokenizedMetalProvider {
    client: Client,
    url: String,
    timeout: Duration,
}

/// 代币 id、对应现货代码、来源标记
const METAL_TOKENS: [(&str, &str, &str); 2] = [
    ("pax-gold", GOLD_SYMBOL, "CoinGecko/PAXGold"),
    ("kinesis-silver", SILVER_SYMBOL, "CoinGecko/KAG"),
];

impl TokenizedMetalProvider {
    pub fn new(client: Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self { client, url: url.into(), timeout }
    }
}

#[async_trait]
impl AssetFeed for TokenizedMetalProvider {
    fn name(&self) -> &'static str {
        "CoinGecko"
    }

    async fn fetch(&self) -> Result<Vec<Asset>, UpstreamError> {
        let ids: Vec<&str> = METAL_TOKENS.iter().map(|(id, ..)| *id).collect();
        let url = simple_price_url(&self.url, &ids, false)?;
        let tickers = fetch_tickers(&self.client, &url, self.timeout).await?;
        Ok(metals_from_tickers(&tickers))
    }
}

pub fn metals_from_tickers(tickers: &HashMap<String, CoinTicker>) -> Vec<Asset> {
    METAL_TOKENS
        .iter()
        .filter_map(|(id, symbol, source)| {
            let ticker = tickers.get(*id)?;
            let price = ticker.usd.filter(|p| *p > 0.0)?;
            let template = if *symbol == GOLD_SYMBOL {
                catalog::fallback_gold()
            } else {
                catalog::fallback_silver()
            };

            let mut asset = Asset::new(*symbol, template.name, AssetType::Metal, price)
                .with_change(ticker.usd_24h_change.unwrap_or(0.0))
                .live(source);
            asset.icon = template.icon;
            Some(asset)
        })
        .collect()
}

/// 依次尝试贵金属数据源，全部失败时使用静态表，不会返回错误
pub async fn metal_prices(feeds: &[Arc<dyn AssetFeed>]) -> (Vec<Asset>, String) {
    match first_assets(feeds).await {
        Ok((mut metals, source)) => {
            catalog::ensure_gold_and_silver(&mut metals);
            (metals, source.to_string())
        }
        Err(e) => {
            log::warn!("⚠️ 贵金属数据源全部失败，使用静态价格: {}", e);
            (catalog::fallback_metals(), catalog::FALLBACK_SOURCE.to_string())
        }
    }
}
