//! 代理接口的消费端
//!
//! 行情聚合（缓存、兜底、搜索）、交易信号生成，以及命令行使用的本地存储

pub mod aggregator;   // 行情聚合
pub mod cache;        // 带过期时间的缓存
pub mod format;       // 价格格式化
pub mod json_extract; // 从模型回复中提取 JSON
pub mod prompt;       // 提示词
pub mod proxy;        // 代理接口客户端
pub mod signal;       // 交易信号生成
pub mod storage;      // 本地持久化
pub mod store;        // 行情与信号状态

pub use aggregator::{AssetFilter, MarketSnapshot, MoveDirection, PriceAggregator};
pub use cache::Cache;
pub use proxy::{ChatBackend, HttpChatBackend, HttpMarketProxy, MarketProxy};
pub use signal::SignalGenerator;
pub use storage::ClientStorage;
pub use store::{MarketStore, SignalBoard};
