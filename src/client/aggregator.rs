//! 行情聚合
//!
//! 通过代理接口获取股票、贵金属和加密货币行情，带缓存与静态兜底。
//! 请求失败不会写入缓存，下次调用会重新请求

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use super::proxy::MarketProxy;
use super::store::MarketStore;
use crate::catalog::{self, DASHBOARD_SYMBOLS};
use crate::config::AppConfig;
use crate::models::{vietnam_timestamp, Asset, AssetType, PriceKind, MAX_BATCH_SYMBOLS};

/// 全市场股票列表的缓存键
pub const STOCK_LIST_KEY: &str = "all_vn_symbols";
/// 贵金属缓存键
pub const METAL_KEY: &str = "metal_prices";
/// 加密货币缓存键
pub const CRYPTO_KEY: &str = "crypto_prices";

/// 搜索结果上限
pub const SEARCH_LIMIT: usize = 30;
/// 搜索结果中股票的上限
const SEARCH_STOCK_LIMIT: usize = 20;

/// 搜索范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssetFilter {
    #[default]
    All,
    Stock,
    Metal,
}

impl std::str::FromStr for AssetFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "stock" => Ok(Self::Stock),
            "metal" | "gold" => Ok(Self::Metal),
            other => Err(format!("unknown filter: {other}")),
        }
    }
}

/// 涨跌方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// 首页数据
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub metals: Vec<Asset>,
    pub stocks: Vec<Asset>,
    pub total_stocks_available: usize,
    pub updated_at: String,
}

pub struct PriceAggregator {
    proxy: Arc<dyn MarketProxy>,
    metal_ttl: Duration,
    batch_delay: Duration,
}

/// 统一代码格式并丢弃无效记录
fn normalize(assets: Vec<Asset>, asset_type: AssetType) -> Vec<Asset> {
    assets
        .into_iter()
        .map(|mut asset| {
            asset.symbol = asset.symbol.trim().to_uppercase();
            asset.asset_type = asset_type;
            if asset.icon.is_none() {
                asset.icon = Some(asset_type.default_icon().to_string());
            }
            asset
        })
        .filter(Asset::is_valid)
        .collect()
}

impl PriceAggregator {
    pub fn new(proxy: Arc<dyn MarketProxy>, metal_ttl: Duration, batch_delay: Duration) -> Self {
        Self { proxy, metal_ttl, batch_delay }
    }

    pub fn from_config(config: &AppConfig, proxy: Arc<dyn MarketProxy>) -> Self {
        Self::new(
            proxy,
            Duration::from_secs(config.client.metal_ttl_secs),
            Duration::from_millis(config.client.batch_delay_ms),
        )
    }

    /// 全市场股票列表
    pub async fn get_stock_list(&self, store: &mut MarketStore) -> Vec<Asset> {
        if let Some(cached) = store.cache.get(STOCK_LIST_KEY) {
            return cached;
        }
        let result = self.proxy.stock_board().await.map(|r| r.stocks);
        apply_stock_list(store, result)
    }

    /// 贵金属，至少包含金和银
    pub async fn get_metal_prices(&self, store: &mut MarketStore) -> Vec<Asset> {
        if let Some(cached) = store.cache.get(METAL_KEY) {
            return cached;
        }
        let result = self.proxy.prices(PriceKind::Metals).await.map(|r| r.assets);
        apply_metals(store, result, self.metal_ttl)
    }

    pub async fn get_crypto_prices(&self, store: &mut MarketStore) -> Vec<Asset> {
        if let Some(cached) = store.cache.get(CRYPTO_KEY) {
            return cached;
        }

        match self.proxy.prices(PriceKind::Crypto).await {
            Ok(response) => {
                let assets = normalize(response.assets, AssetType::Crypto);
                if !assets.is_empty() {
                    log::info!("✅ 加密货币: {} 个 (来源 {})", assets.len(), response.source);
                    store.cache.set(CRYPTO_KEY, assets.clone());
                    return assets;
                }
                log::warn!("⚠️ 加密货币列表为空，使用静态数据");
            }
            Err(e) => log::warn!("⚠️ 获取加密货币失败，使用静态数据: {}", e),
        }
        catalog::fallback_crypto()
    }

    /// 单只实时报价，失败时使用已加载或静态记录
    pub async fn get_quote(&self, store: &MarketStore, symbol: &str) -> Option<Asset> {
        let symbol = symbol.trim().to_uppercase();

        match self.proxy.stock_quote(&symbol).await {
            Ok(mut quote) if quote.price > 0.0 => {
                if quote.symbol.trim().is_empty() {
                    quote.symbol = symbol.clone();
                }
                return Some(quote.into_asset(&catalog::stock_name(&symbol)));
            }
            Ok(_) => log::warn!("⚠️ {} 报价无效", symbol),
            Err(e) => log::warn!("⚠️ 获取 {} 报价失败: {}", symbol, e),
        }

        let known = store.known_stock(&symbol).cloned().or_else(|| {
            catalog::popular_stocks().into_iter().find(|a| a.symbol == symbol)
        })?;
        let mut asset = known;
        asset.is_realtime = false;
        Some(asset)
    }

    /// 批量报价，批量接口失败时逐个查询
    pub async fn get_batch(&self, store: &MarketStore, symbols: &[String]) -> Vec<Asset> {
        let symbols: Vec<String> = symbols
            .iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .take(MAX_BATCH_SYMBOLS)
            .collect();
        if symbols.is_empty() {
            return Vec::new();
        }

        match self.proxy.stock_batch(&symbols).await {
            Ok(response) => {
                let stocks: Vec<Asset> = normalize(response.stocks, AssetType::Stock)
                    .into_iter()
                    .map(|mut a| {
                        a.name = catalog::stock_name(&a.symbol);
                        a
                    })
                    .collect();
                if !stocks.is_empty() {
                    log::info!("✅ 批量报价 {} 只 (来源 {})", stocks.len(), response.source);
                    return stocks;
                }
                log::warn!("⚠️ 批量报价为空，改为逐个查询");
            }
            Err(e) => log::warn!("⚠️ 批量报价失败，改为逐个查询: {}", e),
        }

        let mut results = Vec::new();
        for (i, symbol) in symbols.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.batch_delay).await;
            }
            if let Some(asset) = self.get_quote(store, symbol).await {
                results.push(asset);
            }
        }
        results
    }

    /// 按代码或名称搜索（不区分大小写），股票在前
    pub fn search(&self, store: &mut MarketStore, query: &str, filter: AssetFilter) -> Vec<Asset> {
        let q = query.trim().to_uppercase();
        if q.is_empty() {
            return Vec::new();
        }
        let hit = |a: &Asset| a.symbol.contains(&q) || a.name.to_uppercase().contains(&q);

        let mut results: Vec<Asset> = Vec::new();
        if matches!(filter, AssetFilter::All | AssetFilter::Stock) {
            let stocks = if store.stocks.is_empty() { catalog::popular_stocks() } else { store.stocks.clone() };
            results.extend(stocks.into_iter().filter(|a| hit(a)).take(SEARCH_STOCK_LIMIT));
        }
        if matches!(filter, AssetFilter::All | AssetFilter::Metal) {
            let metals = store.cache.get(METAL_KEY).unwrap_or_else(catalog::fallback_metals);
            results.extend(metals.into_iter().filter(|a| hit(a)));
        }

        results.truncate(SEARCH_LIMIT);
        results
    }

    /// 已加载股票中涨跌幅最大的 `count` 只
    pub fn top_movers(&self, store: &MarketStore, count: usize, direction: MoveDirection) -> Vec<Asset> {
        let mut sorted = store.stocks.clone();
        match direction {
            MoveDirection::Up => sorted.sort_by(|a, b| b.change.total_cmp(&a.change)),
            MoveDirection::Down => sorted.sort_by(|a, b| a.change.total_cmp(&b.change)),
        }
        sorted.truncate(count);
        sorted
    }

    /// 首页数据：股票列表和贵金属并发获取，再批量获取热门股票
    pub async fn load_dashboard(&self, store: &mut MarketStore) -> MarketSnapshot {
        log::info!("🔄 加载市场数据...");
        let cached_stocks = store.cache.get(STOCK_LIST_KEY);
        let cached_metals = store.cache.get(METAL_KEY);

        let proxy = &self.proxy;
        let need_stocks = cached_stocks.is_none();
        let need_metals = cached_metals.is_none();
        let (board, metals) = futures::join!(
            async move {
                if need_stocks {
                    Some(proxy.stock_board().await.map(|r| r.stocks))
                } else {
                    None
                }
            },
            async move {
                if need_metals {
                    Some(proxy.prices(PriceKind::Metals).await.map(|r| r.assets))
                } else {
                    None
                }
            }
        );

        if let Some(result) = board {
            apply_stock_list(store, result);
        }
        let metals = match (cached_metals, metals) {
            (Some(cached), _) => cached,
            (None, Some(result)) => apply_metals(store, result, self.metal_ttl),
            (None, None) => catalog::fallback_metals(),
        };

        let symbols: Vec<String> = DASHBOARD_SYMBOLS.iter().map(|s| s.to_string()).collect();
        let stocks = self.get_batch(store, &symbols).await;

        MarketSnapshot {
            metals,
            stocks,
            total_stocks_available: store.stocks.len(),
            updated_at: vietnam_timestamp(),
        }
    }

    /// 清空缓存，下次调用强制刷新
    pub fn clear_cache(&self, store: &mut MarketStore) {
        store.cache.clear();
        log::info!("🗑️ 缓存已清空");
    }
}

fn apply_stock_list(store: &mut MarketStore, result: anyhow::Result<Vec<Asset>>) -> Vec<Asset> {
    let stocks = match result {
        Ok(stocks) => normalize(stocks, AssetType::Stock),
        Err(e) => {
            log::warn!("⚠️ 获取股票列表失败，使用热门股票: {}", e);
            Vec::new()
        }
    };

    // 保留上次完整加载的列表，仅在尚未加载过时使用静态表
    if stocks.is_empty() {
        let fallback = catalog::popular_stocks();
        if store.stocks.is_empty() {
            store.stocks = fallback.clone();
        }
        return fallback;
    }

    log::info!("✅ 股票列表: {} 只", stocks.len());
    store.cache.set(STOCK_LIST_KEY, stocks.clone());
    store.stocks = stocks.clone();
    stocks
}

fn apply_metals(store: &mut MarketStore, result: anyhow::Result<Vec<Asset>>, ttl: Duration) -> Vec<Asset> {
    let mut metals = match result {
        Ok(assets) => normalize(assets, AssetType::Metal),
        Err(e) => {
            log::warn!("⚠️ 获取贵金属失败，使用静态数据: {}", e);
            return catalog::fallback_metals();
        }
    };
    if metals.is_empty() {
        return catalog::fallback_metals();
    }

    catalog::ensure_gold_and_silver(&mut metals);
    store.cache.set_with_ttl(METAL_KEY, metals.clone(), ttl);
    metals
}
