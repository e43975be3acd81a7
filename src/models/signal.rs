//! 交易信号数据模型

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::asset::AssetType;

/// 交易动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl Action {
    /// 宽松解析：大小写不敏感，兼容越南语
    pub fn parse_loose(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "BUY" | "MUA" => Some(Self::Buy),
            "SELL" | "BÁN" | "BAN" => Some(Self::Sell),
            "HOLD" | "GIỮ" | "GIU" => Some(Self::Hold),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        };
        write!(f, "{s}")
    }
}

/// 分析周期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    #[default]
    Short,
    Medium,
    Long,
}

impl Timeframe {
    /// 持仓周期描述
    pub fn horizon(&self) -> &'static str {
        match self {
            Self::Short => "1-7 ngày",
            Self::Medium => "1-4 tuần",
            Self::Long => "1-6 tháng",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Short => "Ngắn hạn",
            Self::Medium => "Trung hạn",
            Self::Long => "Dài hạn",
        }
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "medium" => Ok(Self::Medium),
            "long" => Ok(Self::Long),
            other => Err(format!("unknown timeframe: {other}")),
        }
    }
}

/// 分析理由
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reasoning {
    #[serde(default)]
    pub technical: String,
    #[serde(default)]
    pub news: String,
    #[serde(default)]
    pub summary: String,
}

/// 信号来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalOrigin {
    /// 大模型输出解析成功
    Model,
    /// 规则兜底
    Fallback,
}

/// 交易信号
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub symbol: String,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub icon: String,
    pub action: Action,
    /// 入场价
    pub entry: f64,
    /// 止损价
    pub stop_loss: f64,
    /// 三个止盈位，按预期收益从小到大
    pub targets: [f64; 3],
    /// 风险收益比，如 "1:2"
    pub risk_reward: String,
    /// 信心等级 1-5
    pub confidence: u8,
    pub reasoning: Reasoning,
    pub timeframe_label: Timeframe,
    pub origin: SignalOrigin,
    /// 生成时间
    pub created_at: String,
}
