//! FinAI 命令行
//!
//! 通过代理服务查看行情、搜索、生成交易信号

use anyhow::bail;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::sync::Arc;

use finai_backend::client::format::{format_change, format_price};
use finai_backend::client::signal::build_scan_candidates;
use finai_backend::client::storage::API_KEY;
use finai_backend::client::{
    AssetFilter, ChatBackend, ClientStorage, HttpChatBackend, HttpMarketProxy, MarketProxy, MarketStore,
    MoveDirection, PriceAggregator, SignalGenerator,
};
use finai_backend::config::AppConfig;
use finai_backend::models::{Asset, NewsKind, Signal, Timeframe};
use finai_backend::services::common::build_client;

#[derive(Parser)]
#[command(name = "finai")]
#[command(about = "FinAI 行情与交易信号", long_about = None)]
struct Cli {
    /// 代理服务地址，默认读取配置
    #[arg(long, global = true)]
    proxy: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 全市场股票列表
    Stocks {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// 金银价格
    Metals,
    /// 加密货币价格
    Crypto,
    /// 单只股票实时报价
    Quote { symbol: String },
    /// 多只股票报价
    Batch {
        #[arg(value_delimiter = ',', required = true)]
        symbols: Vec<String>,
    },
    /// 按代码或名称搜索
    Search {
        query: String,
        /// all | stock | metal
        #[arg(short, long, default_value = "all")]
        filter: AssetFilter,
    },
    /// 涨跌幅榜
    Movers {
        #[arg(short, long, default_value_t = 10)]
        count: usize,
        /// 跌幅榜
        #[arg(long)]
        down: bool,
    },
    /// 首页数据
    Dashboard,
    /// 分析单个资产
    Analyze {
        symbol: String,
        /// short | medium | long
        #[arg(short, long, default_value = "short")]
        timeframe: Timeframe,
    },
    /// 扫描市场寻找买入机会
    Scan {
        #[arg(short, long, default_value = "short")]
        timeframe: Timeframe,
    },
    /// 新闻搜索
    News {
        query: String,
        /// stock | metal
        #[arg(short, long)]
        kind: Option<String>,
    },
    /// 保存 API key
    SetKey { key: String },
    /// 删除已保存的 API key
    ClearKey,
    /// 测试 API key
    TestKey,
}

fn print_assets(assets: &[Asset]) {
    for asset in assets {
        println!(
            "{} {:<10} {:<28} {:>16} {:>8} {}",
            asset.icon.as_deref().unwrap_or(" "),
            asset.symbol,
            asset.name,
            format_price(asset.price, asset.asset_type),
            format_change(asset.change),
            if asset.is_realtime { asset.source.as_str() } else { "offline" },
        );
    }
}

fn print_signal(signal: &Signal) {
    let targets: Vec<String> = signal.targets.iter().map(|t| format_price(*t, signal.asset_type)).collect();
    println!("{} {} ({}) [{:?}]", signal.icon, signal.symbol, signal.name, signal.origin);
    println!("  {} | {} | {}", signal.action, signal.timeframe_label.label(), "⭐".repeat(signal.confidence as usize));
    println!("  Entry:     {}", format_price(signal.entry, signal.asset_type));
    println!("  Stop loss: {}", format_price(signal.stop_loss, signal.asset_type));
    println!("  Targets:   {}", targets.join(" / "));
    println!("  R:R        {}", signal.risk_reward);
    for line in [&signal.reasoning.technical, &signal.reasoning.news, &signal.reasoning.summary] {
        if !line.is_empty() {
            println!("  - {}", line);
        }
    }
}

struct Shell {
    config: AppConfig,
    client: reqwest::Client,
    base_url: String,
    storage: ClientStorage,
    proxy: Arc<dyn MarketProxy>,
    aggregator: PriceAggregator,
    store: MarketStore,
}

impl Shell {
    fn new(config: AppConfig, base_url: Option<String>) -> anyhow::Result<Self> {
        let client = build_client(&config.api)?;
        let base_url = base_url.unwrap_or_else(|| config.client.proxy_base_url.clone());
        let proxy: Arc<dyn MarketProxy> = Arc::new(HttpMarketProxy::new(client.clone(), &base_url, config.api.timeout())?);
        let aggregator = PriceAggregator::from_config(&config, proxy.clone());
        let storage = ClientStorage::new(&config.client.storage_path, config.client.storage_prefix.clone());
        let store = MarketStore::new(std::time::Duration::from_secs(config.client.cache_ttl_secs));

        Ok(Self { config, client, base_url, storage, proxy, aggregator, store })
    }

    fn signal_generator(&self) -> anyhow::Result<SignalGenerator> {
        let Some(key) = self.storage.get_string(API_KEY)?.filter(|k| !k.trim().is_empty()) else {
            bail!("API key required: finai set-key <KEY>");
        };
        let backend: Arc<dyn ChatBackend> = Arc::new(HttpChatBackend::new(self.client.clone(), &self.base_url, key)?);
        Ok(SignalGenerator::from_config(&self.config, backend))
    }

    /// 按代码查找资产：先查贵金属和加密货币，再查股票报价
    async fn find_asset(&mut self, symbol: &str) -> Option<Asset> {
        let symbol = symbol.trim().to_uppercase();
        let metals = self.aggregator.get_metal_prices(&mut self.store).await;
        if let Some(metal) = metals.into_iter().find(|a| a.symbol == symbol) {
            return Some(metal);
        }
        let crypto = self.aggregator.get_crypto_prices(&mut self.store).await;
        if let Some(coin) = crypto.into_iter().find(|a| a.symbol == symbol) {
            return Some(coin);
        }
        self.aggregator.get_quote(&self.store, &symbol).await
    }

    async fn run(&mut self, command: Commands) -> anyhow::Result<()> {
        match command {
            Commands::Stocks { limit } => {
                let stocks = self.aggregator.get_stock_list(&mut self.store).await;
                println!("📈 {} mã", stocks.len());
                print_assets(&stocks[..limit.min(stocks.len())]);
            }
            Commands::Metals => print_assets(&self.aggregator.get_metal_prices(&mut self.store).await),
            Commands::Crypto => print_assets(&self.aggregator.get_crypto_prices(&mut self.store).await),
            Commands::Quote { symbol } => match self.aggregator.get_quote(&self.store, &symbol).await {
                Some(asset) => print_assets(&[asset]),
                None => bail!("Không tìm thấy {}", symbol.to_uppercase()),
            },
            Commands::Batch { symbols } => {
                print_assets(&self.aggregator.get_batch(&self.store, &symbols).await);
            }
            Commands::Search { query, filter } => {
                if matches!(filter, AssetFilter::All | AssetFilter::Stock) {
                    self.aggregator.get_stock_list(&mut self.store).await;
                }
                if matches!(filter, AssetFilter::All | AssetFilter::Metal) {
                    self.aggregator.get_metal_prices(&mut self.store).await;
                }
                print_assets(&self.aggregator.search(&mut self.store, &query, filter));
            }
            Commands::Movers { count, down } => {
                self.aggregator.get_stock_list(&mut self.store).await;
                let direction = if down { MoveDirection::Down } else { MoveDirection::Up };
                print_assets(&self.aggregator.top_movers(&self.store, count, direction));
            }
            Commands::Dashboard => {
                let snapshot = self.aggregator.load_dashboard(&mut self.store).await;
                println!("🕒 {} | {} mã", snapshot.updated_at, snapshot.total_stocks_available);
                print_assets(&snapshot.metals);
                print_assets(&snapshot.stocks);
            }
            Commands::Analyze { symbol, timeframe } => {
                let generator = self.signal_generator()?;
                let Some(asset) = self.find_asset(&symbol).await else {
                    bail!("Không tìm thấy {}", symbol.to_uppercase());
                };
                let signal = generator.analyze(&asset, timeframe).await;
                print_signal(&signal);
                self.store.signals.upsert(signal);
            }
            Commands::Scan { timeframe } => {
                let generator = self.signal_generator()?;
                let snapshot = self.aggregator.load_dashboard(&mut self.store).await;
                let current: Vec<Asset> = snapshot.stocks.into_iter().chain(snapshot.metals).collect();
                let gainers = self.aggregator.top_movers(&self.store, 5, MoveDirection::Up);
                let losers = self.aggregator.top_movers(&self.store, 5, MoveDirection::Down);

                let candidates = build_scan_candidates(&current, &gainers, &losers);
                let signals = generator.scan_market(&candidates, timeframe).await?;
                println!("✅ Tìm thấy {} cơ hội", signals.len());
                signals.iter().for_each(print_signal);
                self.store.signals.replace_all(signals);
            }
            Commands::News { query, kind } => {
                let kind = NewsKind::from_param(kind.as_deref());
                let news = self.proxy.news(&query, kind).await?;
                println!("📰 {} ({})", news.query, news.sources.join(", "));
                for article in &news.articles {
                    println!("- [{}] {}", article.source, article.title);
                }
            }
            Commands::SetKey { key } => {
                self.storage.set(API_KEY, key.trim(), None)?;
                println!("✅ Đã lưu API key");
            }
            Commands::ClearKey => {
                self.storage.remove(API_KEY)?;
                println!("🗑️ Đã xóa API key");
            }
            Commands::TestKey => {
                let ok = self.signal_generator()?.test_connection().await;
                println!("{}", if ok { "✅ API connected" } else { "❌ API not responding" });
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load();
    env_logger::init_from_env(Env::default().default_filter_or("warn"));

    let cli = Cli::parse();
    let mut shell = Shell::new(config, cli.proxy)?;
    shell.run(cli.command).await
}
