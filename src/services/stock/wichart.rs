//! WiChart 单只报价（备用源）

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::error::UpstreamError;
use crate::models::StockQuote;
use crate::services::common::{data_array, get_json, number_field, string_field, to_thousand_vnd};
use crate::services::provider::QuoteFeed;

pub struct WichartProvider {
    client: Client,
    url: String,
    timeout: Duration,
}

impl WichartProvider {
    pub fn new(client: Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self { client, url: url.into(), timeout }
    }
}

#[async_trait]
impl QuoteFeed for WichartProvider {
    fn name(&self) -> &'static str {
        "WiChart"
    }

    async fn quote(&self, symbol: &str) -> Result<StockQuote, UpstreamError> {
        let url = Url::parse_with_params(&self.url, &[("code", symbol)])
            .map_err(|e| UpstreamError::Transport(format!("invalid WiChart url: {e}")))?;
        let value = get_json(&self.client, url.as_str(), self.timeout).await?;

        parse_quote(symbol, &value)
            .ok_or_else(|| UpstreamError::Payload(format!("WiChart has no quote for {}", symbol)))
    }
}

/// 解析报价，兼容对象、`data` 对象和 `data` 数组三种包装
pub fn parse_quote(symbol: &str, value: &Value) -> Option<StockQuote> {
    let item = match value.get("data") {
        Some(Value::Object(_)) => &value["data"],
        _ => data_array(value).and_then(|rows| rows.first()).unwrap_or(value),
    };

    let price = to_thousand_vnd(number_field(item, &["price", "close", "lastPrice", "matchPrice"])?);
    let ref_price = number_field(item, &["refPrice", "prevClose", "reference", "basicPrice"]).map(to_thousand_vnd);

    let mut quote = StockQuote {
        symbol: symbol.to_uppercase(),
        price,
        ref_price,
        change: ref_price.map(|r| price - r),
        change_percent: number_field(item, &["changePercent", "percentChange", "pctChange"]),
        open: number_field(item, &["open", "openPrice"]).map(to_thousand_vnd),
        high: number_field(item, &["high", "highPrice"]).map(to_thousand_vnd),
        low: number_field(item, &["low", "lowPrice"]).map(to_thousand_vnd),
        volume: number_field(item, &["volume", "totalVolume"]),
        time: string_field(item, &["time", "date"]),
        source: Some("WiChart".to_string()),
        timestamp: None,
    };
    quote.change_percent = Some(quote.percent_change());

    Some(quote).filter(|q| q.price > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_quote_shapes() {
        let flat = json!({ "price": 92500, "refPrice": 91800 });
        let nested = json!({ "data": { "close": 92.5, "prevClose": 91.8 } });
        let listed = json!({ "data": [{ "lastPrice": "92500", "reference": "91800" }] });

        for value in [flat, nested, listed] {
            let quote = parse_quote("VCB", &value).unwrap();
            assert_eq!(quote.price, 92.5);
            assert_eq!(quote.ref_price, Some(91.8));
            assert!((quote.change_percent.unwrap() - 0.7625).abs() < 0.001);
        }
    }

    #[test]
    fn test_missing_price() {
        assert!(parse_quote("VCB", &json!({ "data": { "volume": 10 } })).is_none());
    }
}
