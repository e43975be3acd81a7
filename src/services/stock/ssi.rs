//! SSI iBoard 全市场行情
//!
//! 对接 https://iboard-api.ssi.com.vn/statistics/getliststockdata，价格单位为越南盾

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::catalog;
use crate::error::UpstreamError;
use crate::models::{Asset, AssetType};
use crate::services::common::{data_array, get_json, number_field, percent_change, string_field, to_thousand_vnd};
use crate::services::provider::AssetFeed;

pub struct SsiProvider {
    client: Client,
    url: String,
    timeout: Duration,
}

impl SsiProvider {
    pub fn new(client: Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self { client, url: url.into(), timeout }
    }
}

#[async_trait]
impl AssetFeed for SsiProvider {
    fn name(&self) -> &'static str {
        "SSI"
    }

    async fn fetch(&self) -> Result<Vec<Asset>, UpstreamError> {
        log::info!("📡 请求 SSI 行情: {}", self.url);
        let value = get_json(&self.client, &self.url, self.timeout).await?;
        Ok(parse_list(&value))
    }
}

/// 解析 SSI 列表，兼容完整字段名和缩写字段名
pub fn parse_list(value: &Value) -> Vec<Asset> {
    let Some(rows) = data_array(value) else {
        return Vec::new();
    };

    rows.iter()
        .filter_map(|item| {
            let symbol = string_field(item, &["stockSymbol", "ss"])?.to_uppercase();
            let price = to_thousand_vnd(number_field(item, &["matchedPrice", "mp", "lastPrice"])?);
            let ref_price = number_field(item, &["refPrice", "r"]).map(to_thousand_vnd);

            let change = number_field(item, &["priceChangePercent", "pcp"])
                .unwrap_or_else(|| ref_price.map(|r| percent_change(price, r)).unwrap_or(0.0));
            let name = string_field(item, &["stockName", "organ"])
                .unwrap_or_else(|| catalog::stock_name(&symbol));

            let mut asset = Asset::new(&symbol, name, AssetType::Stock, price)
                .with_change(change)
                .live("SSI");
            asset.exchange = string_field(item, &["exchange", "mc"]).map(|e| e.to_uppercase());
            asset.ref_price = ref_price;
            asset.price_change = number_field(item, &["priceChange", "pc"]).map(to_thousand_vnd);
            asset.high = number_field(item, &["highest", "h"]).map(to_thousand_vnd);
            asset.low = number_field(item, &["lowest", "l"]).map(to_thousand_vnd);
            asset.volume = number_field(item, &["totalMatchedVol", "tmv"]);

            Some(asset).filter(Asset::is_valid)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_list() {
        let mock = json!({
            "code": "SUCCESS",
            "data": [
                { "stockSymbol": "ACB", "stockName": "Ngân hàng Á Châu", "exchange": "hose",
                  "matchedPrice": 26100, "refPrice": 25950, "priceChange": 150,
                  "priceChangePercent": 0.58, "totalMatchedVol": 5_000_000 },
                { "ss": "SSI", "mp": 38700, "r": 37900, "tmv": 100 },
                { "ss": "ZERO", "mp": 0 }
            ]
        });

        let stocks = parse_list(&mock);
        assert_eq!(stocks.len(), 2);

        assert_eq!(stocks[0].symbol, "ACB");
        assert_eq!(stocks[0].price, 26.1);
        assert_eq!(stocks[0].change, 0.58);
        assert_eq!(stocks[0].exchange.as_deref(), Some("HOSE"));

        assert_eq!(stocks[1].name, "SSI Securities");
        assert!((stocks[1].change - 2.11).abs() < 0.01);
    }
}
