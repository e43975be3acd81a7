//! 静态数据表
//!
//! 所有数据源都失败时使用的参考价格，以及代码到名称的映射。
//! 股票价格单位为千越南盾，参考时间 2026 年 1 月

use crate::models::{Asset, AssetType};

/// 现货黄金代码
pub const GOLD_SYMBOL: &str = "XAU/USD";
/// 现货白银代码
pub const SILVER_SYMBOL: &str = "XAG/USD";

/// 静态数据的来源标记
pub const FALLBACK_SOURCE: &str = "Fallback";

/// 热门越南股票：代码、名称、参考价、涨跌幅
pub const POPULAR_VN_STOCKS: [(&str, &str, f64, f64); 25] = [
    ("VNM", "Vinamilk", 68.5, -0.7),
    ("FPT", "FPT Corp", 148.2, 1.5),
    ("VIC", "Vingroup", 41.3, 0.5),
    ("VHM", "Vinhomes", 38.9, -0.3),
    ("VCB", "Vietcombank", 92.5, 0.8),
    ("BID", "BIDV", 50.2, 0.4),
    ("CTG", "VietinBank", 36.8, -0.5),
    ("TCB", "Techcombank", 55.4, 1.2),
    ("MBB", "MB Bank", 27.3, 0.7),
    ("VPB", "VPBank", 19.8, -1.1),
    ("HPG", "Hòa Phát", 26.5, 2.3),
    ("MSN", "Masan", 72.1, 0.9),
    ("VRE", "Vincom Retail", 21.5, -0.2),
    ("PLX", "Petrolimex", 39.7, 0.3),
    ("GAS", "PV Gas", 75.8, 1.8),
    ("SAB", "Sabeco", 58.2, -0.8),
    ("ACB", "ACB Bank", 26.1, 0.6),
    ("STB", "Sacombank", 35.4, 1.4),
    ("SSI", "SSI Securities", 38.7, 2.1),
    ("VJC", "Vietjet Air", 98.5, 0.4),
    ("NVL", "Novaland", 10.8, -2.5),
    ("VND", "VNDirect", 17.2, 1.9),
    ("HDB", "HDBank", 24.6, 0.5),
    ("POW", "PV Power", 11.5, 0.8),
    ("REE", "REE Corp", 52.3, -0.4),
];

/// 首页默认展示的股票
pub const DASHBOARD_SYMBOLS: [&str; 12] = [
    "VNM", "FPT", "VIC", "VHM", "VCB", "TCB", "HPG", "MSN", "BID", "MBB", "ACB", "SSI",
];

/// CoinGecko 币种：id、代码、名称、图标
pub const COINGECKO_COINS: [(&str, &str, &str, &str); 20] = [
    ("bitcoin", "BTC", "Bitcoin", "₿"),
    ("ethereum", "ETH", "Ethereum", "Ξ"),
    ("tether", "USDT", "Tether", "₮"),
    ("binancecoin", "BNB", "Binance Coin", "🔶"),
    ("ripple", "XRP", "Ripple", "✕"),
    ("solana", "SOL", "Solana", "◎"),
    ("dogecoin", "DOGE", "Dogecoin", "🐕"),
    ("cardano", "ADA", "Cardano", "₳"),
    ("polkadot", "DOT", "Polkadot", "●"),
    ("shiba-inu", "SHIB", "Shiba Inu", "🐕"),
    ("avalanche-2", "AVAX", "Avalanche", "🔺"),
    ("chainlink", "LINK", "Chainlink", "⬡"),
    ("litecoin", "LTC", "Litecoin", "Ł"),
    ("uniswap", "UNI", "Uniswap", "🦄"),
    ("cosmos", "ATOM", "Cosmos", "⚛"),
    ("stellar", "XLM", "Stellar", "★"),
    ("monero", "XMR", "Monero", "ɱ"),
    ("tron", "TRX", "TRON", "⟁"),
    ("near", "NEAR", "NEAR Protocol", "Ⓝ"),
    ("aptos", "APT", "Aptos", "◈"),
];

/// 股票显示名称，未知代码返回代码本身
pub fn stock_name(symbol: &str) -> String {
    let symbol = symbol.trim().to_uppercase();
    POPULAR_VN_STOCKS
        .iter()
        .find(|(s, ..)| *s == symbol)
        .map(|(_, name, ..)| name.to_string())
        .unwrap_or(symbol)
}

/// 热门股票静态表（非实时）
pub fn popular_stocks() -> Vec<Asset> {
    POPULAR_VN_STOCKS
        .iter()
        .map(|(symbol, name, price, change)| {
            let mut asset = Asset::new(*symbol, *name, AssetType::Stock, *price)
                .with_change(*change)
                .stale(FALLBACK_SOURCE);
            asset.exchange = Some("HOSE".to_string());
            asset
        })
        .collect()
}

pub fn fallback_gold() -> Asset {
    Asset::new(GOLD_SYMBOL, "Vàng (Spot Gold)", AssetType::Metal, 4900.0)
        .with_change(-2.0)
        .with_icon("🥇")
        .stale(FALLBACK_SOURCE)
}

pub fn fallback_silver() -> Asset {
    Asset::new(SILVER_SYMBOL, "Bạc (Spot Silver)", AssetType::Metal, 80.0)
        .with_change(-1.5)
        .with_icon("🥈")
        .stale(FALLBACK_SOURCE)
}

/// 贵金属静态表：金、银各一条
pub fn fallback_metals() -> Vec<Asset> {
    vec![fallback_gold(), fallback_silver()]
}

/// 补齐缺失的金或银，保证结果至少包含这两条
pub fn ensure_gold_and_silver(assets: &mut Vec<Asset>) {
    if !assets.iter().any(|a| a.symbol == GOLD_SYMBOL) {
        assets.insert(0, fallback_gold());
    }
    if !assets.iter().any(|a| a.symbol == SILVER_SYMBOL) {
        assets.push(fallback_silver());
    }
}

/// 加密货币静态表
pub fn fallback_crypto() -> Vec<Asset> {
    [
        ("BTC", "Bitcoin", "₿", 105000.0),
        ("ETH", "Ethereum", "Ξ", 3300.0),
        ("BNB", "BNB", "◈", 650.0),
        ("XRP", "Ripple", "✕", 3.1),
        ("SOL", "Solana", "◎", 240.0),
        ("ADA", "Cardano", "₳", 1.0),
    ]
    .iter()
    .map(|(symbol, name, icon, price)| {
        Asset::new(*symbol, *name, AssetType::Crypto, *price)
            .with_icon(icon)
            .stale(FALLBACK_SOURCE)
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_popular_stocks_are_valid_and_static() {
        let stocks = popular_stocks();
        assert_eq!(stocks.len(), 25);
        for s in &stocks {
            assert!(s.is_valid(), "{} 应为有效记录", s.symbol);
            assert!(!s.is_realtime);
            assert_eq!(s.asset_type, AssetType::Stock);
        }
    }

    #[test]
    fn test_stock_name_lookup() {
        assert_eq!(stock_name("vnm"), "Vinamilk");
        assert_eq!(stock_name("XYZ"), "XYZ");
    }

    #[test]
    fn test_ensure_gold_and_silver() {
        let mut only_gold = vec![fallback_gold().live("GoldPrice.org")];
        ensure_gold_and_silver(&mut only_gold);
        assert_eq!(only_gold.len(), 2);
        assert_eq!(only_gold[0].source, "GoldPrice.org");
        assert_eq!(only_gold[1].symbol, SILVER_SYMBOL);

        let mut empty = Vec::new();
        ensure_gold_and_silver(&mut empty);
        assert_eq!(empty.iter().map(|a| a.symbol.as_str()).collect::<Vec<_>>(), vec![GOLD_SYMBOL, SILVER_SYMBOL]);
    }
}
