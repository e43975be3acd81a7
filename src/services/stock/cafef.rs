//! CafeF 实时行情接口实现
//!
//! 对接 https://banggia.cafef.vn/stockhandler.ashx，返回整个交易所的实时行情表，
//! 价格单位为千越南盾

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::catalog;
use crate::error::UpstreamError;
use crate::models::{Asset, AssetType, StockQuote};
use crate::services::common::{
    data_array, get_json, number_field, percent_change, string_field, to_thousand_vnd, VND_UNIT_THRESHOLD,
};
use crate::services::provider::{AssetFeed, QuoteFeed};

/// CafeF 行情表
pub struct CafefProvider {
    client: Client,
    url: String,
    timeout: Duration,
}

impl CafefProvider {
    pub fn new(client: Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self { client, url: url.into(), timeout }
    }
}

#[async_trait]
impl AssetFeed for CafefProvider {
    fn name(&self) -> &'static str {
        "CafeF"
    }

    async fn fetch(&self) -> Result<Vec<Asset>, UpstreamError> {
        log::info!("📡 请求 CafeF 行情表: {}", self.url);
        let value = get_json(&self.client, &self.url, self.timeout).await?;
        let stocks = parse_board(&value);
        log::info!("📊 CafeF 解析到 {} 只股票", stocks.len());
        Ok(stocks)
    }
}

#[async_trait]
impl QuoteFeed for CafefProvider {
    fn name(&self) -> &'static str {
        "CafeF"
    }

    /// 单只报价：拉取行情表后查找
    async fn quote(&self, symbol: &str) -> Result<StockQuote, UpstreamError> {
        let board = AssetFeed::fetch(self).await?;
        board
            .iter()
            .find(|s| s.symbol.eq_ignore_ascii_case(symbol))
            .map(StockQuote::from)
            .ok_or_else(|| UpstreamError::Payload(format!("{} not found on CafeF board", symbol)))
    }
}

/// 解析 CafeF 行情表
///
/// 格式: [{"a":"VNM","b":68.0,"l":68.5,"k":0.5,"n":1234500,"v":69.0,"w":67.8,"Time":"14:45"},...]
/// a=代码 b=参考价 l=最新价 k=涨跌额 n=成交量 v=最高 w=最低
pub fn parse_board(value: &Value) -> Vec<Asset> {
    let Some(rows) = data_array(value) else {
        return Vec::new();
    };

    rows.iter().filter_map(parse_row).collect()
}

fn parse_row(item: &Value) -> Option<Asset> {
    let symbol = string_field(item, &["a", "symbol", "Symbol"])?.to_uppercase();
    let raw_ref = number_field(item, &["b", "refPrice", "RefPrice"]);
    let raw_last = number_field(item, &["l", "price", "lastPrice", "Price"]);
    let ref_price = raw_ref.map(to_thousand_vnd);
    let last = raw_last.map(to_thousand_vnd);

    // 以越南盾报价的行，涨跌额按同一比例换算
    let unit = if [raw_last, raw_ref].into_iter().flatten().any(|p| p >= VND_UNIT_THRESHOLD) {
        1000.0
    } else {
        1.0
    };

    // 开盘前没有成交价，使用参考价
    let price = match (last, ref_price) {
        (Some(p), _) if p > 0.0 => p,
        (_, Some(r)) if r > 0.0 => r,
        _ => return None,
    };
    let reference = ref_price.unwrap_or(price);

    let mut asset = Asset::new(&symbol, catalog::stock_name(&symbol), AssetType::Stock, price)
        .with_change(percent_change(price, reference))
        .live("CafeF");
    asset.exchange = Some("HOSE".to_string());
    asset.ref_price = ref_price;
    asset.price_change = number_field(item, &["k", "change"])
        .map(|k| k / unit)
        .or(Some(price - reference));
    asset.high = number_field(item, &["v", "high", "highPrice"]).map(to_thousand_vnd);
    asset.low = number_field(item, &["w", "low", "lowPrice"]).map(to_thousand_vnd);
    asset.volume = number_field(item, &["n", "totalVolume", "volume"]);
    asset.time = string_field(item, &["Time", "time"]);

    Some(asset).filter(Asset::is_valid)
}
