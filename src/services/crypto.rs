//! 加密货币行情（CoinGecko simple/price）

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

use crate::catalog::COINGECKO_COINS;
use crate::error::UpstreamError;
use crate::models::{Asset, AssetType};
use crate::services::common::get_json;
use crate::services::provider::AssetFeed;

/// simple/price 中单个币种的数据
#[derive(Debug, Deserialize)]
pub struct CoinTicker {
    pub usd: Option<f64>,
    #[serde(default)]
    pub usd_24h_change: Option<f64>,
    #[serde(default)]
    pub usd_24h_vol: Option<f64>,
    #[serde(default)]
    pub usd_market_cap: Option<f64>,
}

/// 构造 simple/price 请求地址
pub fn simple_price_url(base: &str, ids: &[&str], extended: bool) -> Result<Url, UpstreamError> {
    let mut url = Url::parse(base).map_err(|e| UpstreamError::Transport(format!("invalid CoinGecko url: {e}")))?;
    {
        let mut qp = url.query_pairs_mut();
        qp.append_pair("ids", &ids.join(","));
        qp.append_pair("vs_currencies", "usd");
        qp.append_pair("include_24hr_change", "true");
        if extended {
            qp.append_pair("include_24hr_vol", "true");
            qp.append_pair("include_market_cap", "true");
        }
    }
    Ok(url)
}

/// 请求 simple/price 并解析为 id -> 行情
pub async fn fetch_tickers(
    client: &Client,
    url: &Url,
    timeout: Duration,
) -> Result<HashMap<String, CoinTicker>, UpstreamError> {
    let value = get_json(client, url.as_str(), timeout).await?;
    Ok(serde_json::from_value(value)?)
}

/// CoinGecko 加密货币行情，固定 20 个币种
pub struct CoingeckoProvider {
    client: Client,
    url: String,
    timeout: Duration,
}

impl CoingeckoProvider {
    pub fn new(client: Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self { client, url: url.into(), timeout }
    }
}

#[async_trait]
impl AssetFeed for CoingeckoProvider {
    fn name(&self) -> &'static str {
        "CoinGecko"
    }

    async fn fetch(&self) -> Result<Vec<Asset>, UpstreamError> {
        let ids: Vec<&str> = COINGECKO_COINS.iter().map(|(id, ..)| *id).collect();
        let url = simple_price_url(&self.url, &ids, true)?;

        log::info!("📡 请求 CoinGecko 行情: {} 个币种", ids.len());
        let tickers = fetch_tickers(&self.client, &url, self.timeout).await?;
        Ok(coins_from_tickers(&tickers))
    }
}

/// 按固定顺序转换为资产列表，缺失或无价格的币种跳过
pub fn coins_from_tickers(tickers: &HashMap<String, CoinTicker>) -> Vec<Asset> {
    COINGECKO_COINS
        .iter()
        .filter_map(|(id, symbol, name, icon)| {
            let ticker = tickers.get(*id)?;
            let mut asset = Asset::new(*symbol, *name, AssetType::Crypto, ticker.usd?)
                .with_change(ticker.usd_24h_change.unwrap_or(0.0))
                .with_icon(icon)
                .live("CoinGecko");
            asset.volume = ticker.usd_24h_vol;
            Some(asset).filter(Asset::is_valid)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_price_url() {
        let url = simple_price_url("https://api.coingecko.com/api/v3/simple/price", &["bitcoin", "pax-gold"], false)
            .unwrap();
        let query = url.query().unwrap();

        assert!(query.contains("ids=bitcoin%2Cpax-gold"));
        assert!(query.contains("include_24hr_change=true"));
        assert!(!query.contains("include_market_cap"));
    }

    #[test]
    fn test_coins_keep_catalog_order() {
        let tickers: HashMap<String, CoinTicker> = serde_json::from_value(serde_json::json!({
            "solana": { "usd": 240.5, "usd_24h_change": -3.2 },
            "bitcoin": { "usd": 105000.0, "usd_24h_change": 1.25, "usd_24h_vol": 3.1e10 },
            "dogecoin": { "usd": null },
            "unknown-coin": { "usd": 1.0 }
        }))
        .unwrap();

        let coins = coins_from_tickers(&tickers);
        let symbols: Vec<&str> = coins.iter().map(|c| c.symbol.as_str()).collect();

        assert_eq!(symbols, vec!["BTC", "SOL"]);
        assert_eq!(coins[0].icon.as_deref(), Some("₿"));
        assert_eq!(coins[0].volume, Some(3.1e10));
        assert_eq!(coins[1].change, -3.2);
        assert!(coins.iter().all(|c| c.is_realtime && c.source == "CoinGecko"));
    }
}
