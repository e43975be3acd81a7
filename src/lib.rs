//! FinAI 后端
//!
//! 越南股票、贵金属、加密货币行情代理服务，以及基于大模型的交易信号生成
//! 数据来源：CafeF、SSI、TCBS、GoldPrice.org、CoinGecko、Google News、VnExpress

pub mod catalog;  // 静态兜底数据表
pub mod client;   // 行情聚合与信号生成（代理的消费端）
pub mod config;   // 配置
pub mod error;    // 错误类型
pub mod handlers; // HTTP 请求处理器
pub mod middleware; // 中间件
pub mod models;   // 数据模型定义
pub mod services; // 上游数据源
