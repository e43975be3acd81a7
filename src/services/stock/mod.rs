//! 股票数据服务模块
//!
//! 越南股市行情，支持多种数据源：
//! - CafeF / SSI：全市场实时行情表
//! - TCBS：日K线（单只报价、逐个补齐）
//! - WiChart：单只报价备用源

pub mod cafef;
pub mod ssi;
pub mod tcbs;
pub mod wichart;

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::catalog;
use crate::config::AppConfig;
use crate::error::UpstreamError;
use crate::models::{vietnam_timestamp, Asset, StockQuote, StocksResponse};
use crate::services::provider::{first_assets, first_quote, AssetFeed, QuoteFeed};

pub use cafef::CafefProvider;
pub use ssi::SsiProvider;
pub use tcbs::TcbsProvider;
pub use wichart::WichartProvider;

/// 股票行情服务
pub struct StockService {
    /// 全市场行情源，按顺序尝试
    board: Vec<Arc<dyn AssetFeed>>,
    /// 单只报价源，按顺序尝试
    quotes: Vec<Arc<dyn QuoteFeed>>,
    ssi: Arc<dyn AssetFeed>,
    tcbs: Arc<dyn QuoteFeed>,
    wichart: Arc<dyn QuoteFeed>,
    /// 逐个请求 TCBS 的间隔
    batch_delay: Duration,
}

impl StockService {
    pub fn new(
        board: Vec<Arc<dyn AssetFeed>>,
        quotes: Vec<Arc<dyn QuoteFeed>>,
        ssi: Arc<dyn AssetFeed>,
        tcbs: Arc<dyn QuoteFeed>,
        wichart: Arc<dyn QuoteFeed>,
        batch_delay: Duration,
    ) -> Self {
        Self { board, quotes, ssi, tcbs, wichart, batch_delay }
    }

    /// 按配置创建真实数据源
    pub fn from_config(config: &AppConfig, client: Client) -> Self {
        let api = &config.api;
        let upstream = &config.upstream;

        let cafef = Arc::new(CafefProvider::new(client.clone(), &upstream.cafef_url, api.timeout()));
        let cafef_board: Arc<dyn AssetFeed> = cafef.clone();
        let cafef_quote: Arc<dyn QuoteFeed> = cafef;
        let ssi: Arc<dyn AssetFeed> =
            Arc::new(SsiProvider::new(client.clone(), &upstream.ssi_url, api.timeout()));
        let tcbs: Arc<dyn QuoteFeed> =
            Arc::new(TcbsProvider::new(client.clone(), &upstream.tcbs_url, api.secondary_timeout()));
        let wichart: Arc<dyn QuoteFeed> =
            Arc::new(WichartProvider::new(client, &upstream.wichart_url, api.secondary_timeout()));

        Self::new(
            vec![cafef_board, ssi.clone()],
            vec![cafef_quote, tcbs.clone(), wichart.clone()],
            ssi,
            tcbs,
            wichart,
            api.batch_delay(),
        )
    }

    /// 全市场实时行情（source=cafef / all）
    pub async fn board(&self) -> Result<StocksResponse, UpstreamError> {
        let (stocks, source) = first_assets(&self.board).await?;
        log::info!("✅ 行情表获取成功: {} 只股票 (来源 {})", stocks.len(), source);
        Ok(StocksResponse::new(stocks, source))
    }

    /// 单只报价（source=quote），依次尝试 CafeF、TCBS、WiChart
    pub async fn quote(&self, symbol: &str) -> Result<StockQuote, UpstreamError> {
        let quote = first_quote(&self.quotes, symbol).await?;
        Ok(stamp(quote))
    }

    /// 指定多只股票（source=batch）
    ///
    /// 先从行情表中筛选，缺失的代码逐个请求 TCBS，单只失败直接跳过
    pub async fn batch(&self, symbols: &[String]) -> Result<StocksResponse, UpstreamError> {
        let mut found: Vec<Asset> = Vec::new();
        let mut board_source = None;

        match first_assets(&self.board).await {
            Ok((board, source)) => {
                found = symbols
                    .iter()
                    .filter_map(|s| board.iter().find(|a| &a.symbol == s).cloned())
                    .collect();
                board_source = Some(source).filter(|_| !found.is_empty());
            }
            Err(e) => log::warn!("⚠️ 行情表不可用，改为逐个请求 TCBS: {}", e),
        }

        let missing: Vec<&String> = symbols
            .iter()
            .filter(|s| !found.iter().any(|a| &a.symbol == *s))
            .collect();

        let mut fetched = 0;
        for (i, symbol) in missing.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.batch_delay).await;
            }
            match self.tcbs.quote(symbol).await {
                Ok(quote) if quote.price > 0.0 => {
                    found.push(quote.into_asset(&catalog::stock_name(symbol)));
                    fetched += 1;
                }
                Ok(_) => log::warn!("⚠️ TCBS {} 无有效价格", symbol),
                Err(e) => log::warn!("⚠️ TCBS 获取 {} 失败: {}", symbol, e),
            }
        }

        // 保持请求中的顺序
        found.sort_by_key(|a| symbols.iter().position(|s| s == &a.symbol));

        let source = match (board_source, fetched) {
            (Some(board), 0) => board.to_string(),
            (Some(board), _) => format!("{}+TCBS", board),
            (None, _) => "TCBS".to_string(),
        };
        log::info!("✅ 批量报价: 请求 {} 只，获得 {} 只", symbols.len(), found.len());
        Ok(StocksResponse::new(found, source))
    }

    /// 仅 SSI（兼容路径，上游错误原样返回）
    pub async fn ssi(&self) -> Result<StocksResponse, UpstreamError> {
        let stocks = self.ssi.fetch().await?;
        Ok(StocksResponse::new(stocks, self.ssi.name()))
    }

    /// 仅 TCBS（兼容路径）
    pub async fn tcbs(&self, symbol: &str) -> Result<StockQuote, UpstreamError> {
        self.tcbs.quote(symbol).await.map(stamp)
    }

    /// 仅 WiChart（兼容路径）
    pub async fn wichart(&self, symbol: &str) -> Result<StockQuote, UpstreamError> {
        self.wichart.quote(symbol).await.map(stamp)
    }
}

fn stamp(mut quote: StockQuote) -> StockQuote {
    quote.change_percent = Some(quote.percent_change());
    quote.timestamp = Some(vietnam_timestamp());
    quote
}
