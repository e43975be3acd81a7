//! 资产数据模型
//!
//! 股票、贵金属、加密货币统一使用 `Asset` 表示

use serde::{Deserialize, Deserializer, Serialize};

/// 资产类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Stock,
    Crypto,
    Metal,
}

impl AssetType {
    /// 提示词中使用的类别名称
    pub fn label(&self) -> &'static str {
        match self {
            AssetType::Stock => "Cổ phiếu Việt Nam",
            AssetType::Crypto => "Tiền điện tử",
            AssetType::Metal => "Kim loại quý",
        }
    }

    pub fn default_icon(&self) -> &'static str {
        match self {
            AssetType::Stock => "📈",
            AssetType::Crypto => "🪙",
            AssetType::Metal => "🥇",
        }
    }
}

/// 统一资产结构
///
/// 价格单位：股票为千越南盾，贵金属和加密货币为美元
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// 代码（大写）
    pub symbol: String,
    /// 显示名称
    pub name: String,
    /// 资产类别
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    /// 当前价格
    pub price: f64,
    /// 涨跌幅（百分比），缺失按 0 处理
    #[serde(default, deserialize_with = "zero_if_null")]
    pub change: f64,
    /// 是否为本次实时获取
    #[serde(default)]
    pub is_realtime: bool,
    /// 数据来源
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    /// 参考价（前收盘）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_price: Option<f64>,
    /// 涨跌额
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_change: Option<f64>,
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
}

fn zero_if_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

impl Asset {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, asset_type: AssetType, price: f64) -> Self {
        Self {
            symbol: symbol.into().trim().to_uppercase(),
            name: name.into(),
            asset_type,
            price,
            change: 0.0,
            is_realtime: false,
            source: String::new(),
            icon: Some(asset_type.default_icon().to_string()),
            exchange: None,
            ref_price: None,
            price_change: None,
            open: None,
            high: None,
            low: None,
            volume: None,
            time: None,
        }
    }

    pub fn with_change(mut self, change: f64) -> Self {
        self.change = if change.is_finite() { change } else { 0.0 };
        self
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    /// 标记为实时数据
    pub fn live(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self.is_realtime = true;
        self
    }

    /// 标记为静态兜底数据
    pub fn stale(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self.is_realtime = false;
        self
    }

    /// 可展示的记录：代码非空且为大写，价格为正数
    pub fn is_valid(&self) -> bool {
        !self.symbol.is_empty()
            && self.symbol == self.symbol.to_uppercase()
            && self.price.is_finite()
            && self.price > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_or_null_change_reads_as_zero() {
        let json = serde_json::json!({
            "symbol": "FPT", "name": "FPT Corp", "type": "stock", "price": 148.2, "change": null
        });
        let asset: Asset = serde_json::from_value(json).unwrap();
        assert_eq!(asset.change, 0.0);
        assert!(!asset.is_realtime);

        let json = serde_json::json!({ "symbol": "XAU/USD", "name": "Gold", "type": "metal", "price": 4900.0 });
        let asset: Asset = serde_json::from_value(json).unwrap();
        assert_eq!(asset.asset_type, AssetType::Metal);
        assert_eq!(asset.change, 0.0);
    }

    #[test]
    fn test_wire_names_are_camel_case() {
        let asset = Asset::new("vnm", "Vinamilk", AssetType::Stock, 68.5).live("CafeF");
        let value = serde_json::to_value(&asset).unwrap();

        assert_eq!(value["symbol"], "VNM");
        assert_eq!(value["type"], "stock");
        assert_eq!(value["isRealtime"], true);
        assert!(value.get("refPrice").is_none());
    }

    #[test]
    fn test_is_valid() {
        assert!(Asset::new("HPG", "Hòa Phát", AssetType::Stock, 26.5).is_valid());
        assert!(!Asset::new("HPG", "Hòa Phát", AssetType::Stock, 0.0).is_valid());
        assert!(!Asset::new("", "?", AssetType::Stock, 10.0).is_valid());
        assert!(!Asset::new("BTC", "Bitcoin", AssetType::Crypto, f64::NAN).is_valid());
    }
}
