//! 业务逻辑服务模块
//!
//! 封装上游数据获取和处理逻辑

pub mod chat;      // 对话转发
pub mod common;    // 公共辅助函数
pub mod crypto;    // 加密货币
pub mod metals;    // 贵金属
pub mod news;      // 新闻聚合
pub mod prices;    // 加密货币 + 贵金属
pub mod provider;  // 数据源抽象
pub mod stock;     // 越南股票
