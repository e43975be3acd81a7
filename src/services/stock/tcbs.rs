//! TCBS 日K线接口
//!
//! 取最近两根日线，最新收盘价为现价，前一根收盘价为参考价

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::error::UpstreamError;
use crate::models::StockQuote;
use crate::services::common::{data_array, get_json, number_field, string_field, to_thousand_vnd};
use crate::services::provider::QuoteFeed;

pub struct TcbsProvider {
    client: Client,
    url: String,
    timeout: Duration,
}

impl TcbsProvider {
    pub fn new(client: Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self { client, url: url.into(), timeout }
    }

    fn bars_url(&self, symbol: &str) -> Result<Url, UpstreamError> {
        Url::parse_with_params(
            &self.url,
            &[("ticker", symbol), ("type", "stock"), ("resolution", "D"), ("countBack", "2")],
        )
        .map_err(|e| UpstreamError::Transport(format!("invalid TCBS url: {e}")))
    }
}

#[async_trait]
impl QuoteFeed for TcbsProvider {
    fn name(&self) -> &'static str {
        "TCBS"
    }

    async fn quote(&self, symbol: &str) -> Result<StockQuote, UpstreamError> {
        let url = self.bars_url(symbol)?;
        log::debug!("📡 请求 TCBS 日线: {}", url);
        let value = get_json(&self.client, url.as_str(), self.timeout).await?;

        parse_bars(symbol, &value)
            .ok_or_else(|| UpstreamError::Payload(format!("TCBS has no bars for {}", symbol)))
    }
}

/// 解析日K线
///
/// 格式: {"ticker":"VNM","data":[{"open":68000,"high":69000,"low":67500,"close":68500,"volume":123,"tradingDate":"..."}]}
pub fn parse_bars(symbol: &str, value: &Value) -> Option<StockQuote> {
    let bars = data_array(value)?;
    let latest = bars.last()?;
    let previous = if bars.len() > 1 { &bars[0] } else { latest };

    let price = to_thousand_vnd(number_field(latest, &["close"])?);
    let ref_price = number_field(previous, &["close"]).map(to_thousand_vnd);

    let mut quote = StockQuote {
        symbol: symbol.to_uppercase(),
        price,
        ref_price,
        change: ref_price.map(|r| price - r),
        change_percent: None,
        open: number_field(latest, &["open"]).map(to_thousand_vnd),
        high: number_field(latest, &["high"]).map(to_thousand_vnd),
        low: number_field(latest, &["low"]).map(to_thousand_vnd),
        volume: number_field(latest, &["volume"]),
        time: string_field(latest, &["tradingDate"]),
        source: Some("TCBS".to_string()),
        timestamp: None,
    };
    quote.change_percent = Some(quote.percent_change());

    Some(quote).filter(|q| q.price > 0.0)
}
