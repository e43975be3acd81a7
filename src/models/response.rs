//! 代理接口响应模型
//!
//! 定义各接口的统一响应格式

use chrono::Utc;
use chrono_tz::Asia::Ho_Chi_Minh;
use serde::{Deserialize, Serialize};

use super::asset::Asset;
use super::news::Article;

/// 获取越南时间（UTC+7）
pub fn get_vietnam_time() -> chrono::DateTime<chrono_tz::Tz> {
    Utc::now().with_timezone(&Ho_Chi_Minh)
}

/// 越南时间字符串（ISO 8601 格式，带+07:00时区）
pub fn vietnam_timestamp() -> String {
    get_vietnam_time().to_rfc3339()
}

/// 价格接口响应（加密货币 / 贵金属）
///
/// - assets: 资产列表
/// - count: 数量
/// - source: 实际命中的数据源
/// - timestamp: 响应时间戳
#[derive(Debug, Serialize, Deserialize)]
pub struct AssetsResponse {
    pub assets: Vec<Asset>,
    pub count: usize,
    pub source: String,
    pub timestamp: String,
}

impl AssetsResponse {
    pub fn new(assets: Vec<Asset>, source: impl Into<String>) -> Self {
        Self {
            count: assets.len(),
            assets,
            source: source.into(),
            timestamp: vietnam_timestamp(),
        }
    }
}

/// 股票列表响应
#[derive(Debug, Serialize, Deserialize)]
pub struct StocksResponse {
    pub stocks: Vec<Asset>,
    pub count: usize,
    pub source: String,
    pub timestamp: String,
}

impl StocksResponse {
    pub fn new(stocks: Vec<Asset>, source: impl Into<String>) -> Self {
        Self {
            count: stocks.len(),
            stocks,
            source: source.into(),
            timestamp: vietnam_timestamp(),
        }
    }
}

/// 新闻接口响应
#[derive(Debug, Serialize, Deserialize)]
pub struct NewsResponse {
    pub query: String,
    pub articles: Vec<Article>,
    pub count: usize,
    #[serde(default)]
    pub sources: Vec<String>,
    pub timestamp: String,
}

impl NewsResponse {
    pub fn new(query: String, articles: Vec<Article>, sources: Vec<String>) -> Self {
        Self {
            query,
            count: articles.len(),
            articles,
            sources,
            timestamp: vietnam_timestamp(),
        }
    }
}

/// 健康检查响应
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}
