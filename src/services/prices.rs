//! 加密货币与贵金属价格服务（/api/crypto）

use reqwest::Client;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::UpstreamError;
use crate::models::{AssetsResponse, PriceKind};
use crate::services::crypto::CoingeckoProvider;
use crate::services::metals::{metal_prices, GoldPriceProvider, TokenizedMetalProvider};
use crate::services::provider::AssetFeed;

pub struct PriceService {
    crypto: Arc<dyn AssetFeed>,
    metals: Vec<Arc<dyn AssetFeed>>,
}

impl PriceService {
    pub fn new(crypto: Arc<dyn AssetFeed>, metals: Vec<Arc<dyn AssetFeed>>) -> Self {
        Self { crypto, metals }
    }

    pub fn from_config(config: &AppConfig, client: Client) -> Self {
        let api = &config.api;
        let upstream = &config.upstream;

        let crypto = Arc::new(CoingeckoProvider::new(client.clone(), &upstream.coingecko_url, api.timeout()));
        let metals: Vec<Arc<dyn AssetFeed>> = vec![
            Arc::new(GoldPriceProvider::new(client.clone(), &upstream.goldprice_url, api.secondary_timeout())),
            Arc::new(TokenizedMetalProvider::new(client, &upstream.coingecko_url, api.secondary_timeout())),
        ];

        Self::new(crypto, metals)
    }

    /// 加密货币，上游失败时原样返回错误
    pub async fn crypto(&self) -> Result<AssetsResponse, UpstreamError> {
        let coins = self.crypto.fetch().await?;
        log::info!("✅ 获取 {} 个加密货币价格", coins.len());
        Ok(AssetsResponse::new(coins, self.crypto.name()))
    }

    /// 贵金属，始终成功
    pub async fn metals(&self) -> AssetsResponse {
        let (metals, source) = metal_prices(&self.metals).await;
        AssetsResponse::new(metals, source)
    }

    /// 加密货币与贵金属并发获取后合并
    pub async fn all(&self) -> Result<AssetsResponse, UpstreamError> {
        let (coins, (metals, metal_source)) =
            futures::join!(self.crypto.fetch(), metal_prices(&self.metals));

        let mut assets = coins?;
        assets.extend(metals);
        Ok(AssetsResponse::new(assets, format!("{}+{}", self.crypto.name(), metal_source)))
    }

    pub async fn by_kind(&self, kind: PriceKind) -> Result<AssetsResponse, UpstreamError> {
        match kind {
            PriceKind::Crypto => self.crypto().await,
            PriceKind::Metals => Ok(self.metals().await),
            PriceKind::All => self.all().await,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::catalog;
    use crate::models::{Asset, AssetType};
    use crate::services::provider::testing::feed;

    pub fn service(crypto_ok: bool, metals_ok: bool) -> PriceService {
        let crypto = if crypto_ok {
            Ok(vec![Asset::new("BTC", "Bitcoin", AssetType::Crypto, 105000.0).live("CoinGecko")])
        } else {
            Err(UpstreamError::Status { status: 429, body: r#"{"status":{"error_code":429}}"#.to_string() })
        };
        let metals = if metals_ok {
            Ok(vec![catalog::fallback_gold().live("GoldPrice.org"), catalog::fallback_silver().live("GoldPrice.org")])
        } else {
            Err(UpstreamError::Transport("timeout".to_string()))
        };

        PriceService::new(feed("CoinGecko", crypto), vec![feed("GoldPrice.org", metals)])
    }
}

#[cfg(test)]
mod tests {
    use super::testing::service;
    use super::*;

    #[tokio::test]
    async fn test_all_concatenates() {
        let resp = service(true, true).by_kind(PriceKind::All).await.unwrap();

        assert_eq!(resp.count, 3);
        assert_eq!(resp.source, "CoinGecko+GoldPrice.org");
        assert_eq!(resp.assets[0].symbol, "BTC");
    }

    #[tokio::test]
    async fn test_metals_never_fail() {
        let resp = service(false, false).by_kind(PriceKind::Metals).await.unwrap();

        assert_eq!(resp.count, 2);
        assert_eq!(resp.source, "Fallback");
        assert!(resp.assets.iter().all(|a| !a.is_realtime));
    }

    #[tokio::test]
    async fn test_crypto_failure_propagates() {
        match service(false, true).by_kind(PriceKind::Crypto).await {
            Err(UpstreamError::Status { status, .. }) => assert_eq!(status, 429),
            other => panic!("unexpected: {:?}", other.map(|r| r.count)),
        }
    }
}
