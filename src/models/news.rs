//! 新闻数据模型

use serde::{Deserialize, Serialize};

/// 新闻重要程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Critical,
    High,
    Medium,
}

/// 新闻条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub date: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<Importance>,
}

/// 新闻查询的资产类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsKind {
    Stock,
    Metal,
    General,
}

impl NewsKind {
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("stock") => Self::Stock,
            Some("metal") | Some("gold") => Self::Metal,
            _ => Self::General,
        }
    }

    pub fn as_param(&self) -> Option<&'static str> {
        match self {
            Self::Stock => Some("stock"),
            Self::Metal => Some("metal"),
            Self::General => None,
        }
    }
}

/// 新闻查询参数
#[derive(Debug, Default, Deserialize)]
pub struct NewsQuery {
    pub query: Option<String>,
    pub symbol: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl NewsQuery {
    /// 搜索词，`query` 优先于 `symbol`
    pub fn search_term(&self) -> Option<String> {
        self.query
            .as_deref()
            .or(self.symbol.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}
