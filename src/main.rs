//! FinAI 后端服务
//!
//! 提供股票、贵金属、加密货币、新闻和大模型对话的代理接口
//! 数据来源：CafeF、SSI、TCBS、WiChart、GoldPrice.org、CoinGecko、Google News、VnExpress

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use finai_backend::config::AppConfig;
use finai_backend::handlers;
use finai_backend::middleware::CorsMiddleware;
use finai_backend::services::{
    chat::ChatService, common::build_client, news::NewsService, prices::PriceService, stock::StockService,
};

/// 应用程序入口
///
/// 加载配置后启动 HTTP 服务器，默认监听 0.0.0.0:8080
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = AppConfig::load();

    // 初始化日志系统，RUST_LOG 优先于配置文件
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));

    let client = build_client(&config.api).map_err(std::io::Error::other)?;

    let stocks = web::Data::new(StockService::from_config(&config, client.clone()));
    let prices = web::Data::new(PriceService::from_config(&config, client.clone()));
    let news = web::Data::new(NewsService::from_config(&config, client.clone()));
    let chat = web::Data::new(ChatService::from_config(&config, client));

    let bind_addr = config.bind_addr();
    log::info!("启动 FinAI 后端服务: {}", bind_addr);

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(CorsMiddleware) // 跨域与预检
            .wrap(Logger::default()) // 请求日志
            .app_data(stocks.clone())
            .app_data(prices.clone())
            .app_data(news.clone())
            .app_data(chat.clone())
            .configure(handlers::config)
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(bind_addr)?.run().await
}
