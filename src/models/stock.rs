//! 股票数据模型
//!
//! 定义股票报价、查询参数等数据结构

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::asset::{Asset, AssetType};

/// 批量查询的股票数量上限
pub const MAX_BATCH_SYMBOLS: usize = 20;

/// 单只股票实时报价
///
/// 价格单位为千越南盾。兼容上游的 `close` / `prevClose` 字段名
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockQuote {
    /// 股票代码
    #[serde(default)]
    pub symbol: String,
    /// 最新价
    #[serde(alias = "close")]
    pub price: f64,
    /// 参考价（前收盘）
    #[serde(default, alias = "prevClose", skip_serializing_if = "Option::is_none")]
    pub ref_price: Option<f64>,
    /// 涨跌额
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    /// 涨跌幅（百分比）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    /// 行情时间
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// 数据来源
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// 响应时间戳
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl StockQuote {
    /// 涨跌幅，上游未提供时根据参考价计算
    pub fn percent_change(&self) -> f64 {
        if let Some(pct) = self.change_percent.filter(|p| p.is_finite()) {
            return pct;
        }
        match self.ref_price {
            Some(reference) if reference > 0.0 => (self.price - reference) / reference * 100.0,
            _ => 0.0,
        }
    }

    /// 转换为统一资产结构
    pub fn into_asset(self, name: &str) -> Asset {
        let change = self.percent_change();
        let price_change = self
            .change
            .or_else(|| self.ref_price.filter(|r| *r > 0.0).map(|r| self.price - r));
        let source = self.source.clone().unwrap_or_else(|| "Quote".to_string());

        let mut asset = Asset::new(&self.symbol, name, AssetType::Stock, self.price)
            .with_change(change)
            .live(&source);
        asset.ref_price = self.ref_price;
        asset.price_change = price_change;
        asset.open = self.open.or(self.ref_price);
        asset.high = self.high;
        asset.low = self.low;
        asset.volume = self.volume;
        asset.time = self.time;
        asset
    }
}

impl From<&Asset> for StockQuote {
    fn from(asset: &Asset) -> Self {
        Self {
            symbol: asset.symbol.clone(),
            price: asset.price,
            ref_price: asset.ref_price,
            change: asset.price_change,
            change_percent: Some(asset.change),
            open: asset.open,
            high: asset.high,
            low: asset.low,
            volume: asset.volume,
            time: asset.time.clone(),
            source: Some(asset.source.clone()),
            timestamp: None,
        }
    }
}

/// 股票代理接口的数据源参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockSource {
    /// 全市场实时行情（cafef / all）
    Board,
    /// 单只实时报价
    Quote,
    /// 指定多只
    Batch,
    Tcbs,
    Ssi,
    Wichart,
}

impl FromStr for StockSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cafef" | "all" => Ok(Self::Board),
            "quote" => Ok(Self::Quote),
            "batch" => Ok(Self::Batch),
            "tcbs" => Ok(Self::Tcbs),
            "ssi" => Ok(Self::Ssi),
            "wichart" => Ok(Self::Wichart),
            _ => Err("Invalid source. Use: cafef, all, quote, batch, tcbs, ssi, or wichart".to_string()),
        }
    }
}

/// 股票查询参数
#[derive(Debug, Default, Deserialize)]
pub struct StockQuery {
    /// 数据源
    pub source: Option<String>,
    /// 股票代码，逗号分隔
    pub symbols: Option<String>,
}

impl StockQuery {
    /// 解析代码列表：去空白、转大写、去重，最多 `cap` 个
    pub fn symbol_list(&self, cap: usize) -> Vec<String> {
        let mut list: Vec<String> = Vec::new();
        if let Some(raw) = &self.symbols {
            for s in raw.split(',').map(|s| s.trim().to_uppercase()).filter(|s| !s.is_empty()) {
                if !list.contains(&s) {
                    list.push(s);
                }
            }
        }
        list.truncate(cap);
        list
    }
}

/// 价格代理接口的类别参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceKind {
    Crypto,
    Metals,
    All,
}

impl FromStr for PriceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "crypto" => Ok(Self::Crypto),
            "metals" | "gold" => Ok(Self::Metals),
            "all" => Ok(Self::All),
            _ => Err("Invalid type. Use: crypto, metals, gold, or all".to_string()),
        }
    }
}

/// 价格查询参数
#[derive(Debug, Default, Deserialize)]
pub struct PriceQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}
