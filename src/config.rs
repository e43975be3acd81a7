//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// 上游请求超时配置（秒）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// 主要行情源超时
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 次要数据源超时（代币价格、备用源）
    #[serde(default = "default_secondary_timeout")]
    pub secondary_timeout_secs: u64,
    /// 大模型接口超时
    #[serde(default = "default_chat_timeout")]
    pub chat_timeout_secs: u64,
    /// 连接超时时间
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// 逐个请求时的间隔（毫秒）
    #[serde(default = "default_batch_delay")]
    pub batch_delay_ms: u64,
}

/// 上游数据源地址
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Chat Completion 接口
    #[serde(default = "default_chat_url")]
    pub chat_url: String,
    /// 请求未指定模型时使用的模型
    #[serde(default = "default_model")]
    pub default_model: String,
    /// CafeF 实时行情表（HOSE）
    #[serde(default = "default_cafef_url")]
    pub cafef_url: String,
    /// SSI 全市场行情
    #[serde(default = "default_ssi_url")]
    pub ssi_url: String,
    /// TCBS 日K线
    #[serde(default = "default_tcbs_url")]
    pub tcbs_url: String,
    /// WiChart 单只报价
    #[serde(default = "default_wichart_url")]
    pub wichart_url: String,
    /// GoldPrice.org 现货金银
    #[serde(default = "default_goldprice_url")]
    pub goldprice_url: String,
    /// CoinGecko simple/price
    #[serde(default = "default_coingecko_url")]
    pub coingecko_url: String,
    /// Google News RSS 搜索
    #[serde(default = "default_google_news_url")]
    pub google_news_url: String,
    /// VnExpress 财经 RSS
    #[serde(default = "default_vnexpress_url")]
    pub vnexpress_rss_url: String,
}

/// 客户端（行情聚合与信号生成）配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// 代理服务地址
    #[serde(default = "default_proxy_base_url")]
    pub proxy_base_url: String,
    /// 分析使用的模型
    #[serde(default = "default_client_model")]
    pub model: String,
    /// 默认缓存时间（秒）
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    /// 贵金属缓存时间（秒）
    #[serde(default = "default_metal_ttl")]
    pub metal_ttl_secs: u64,
    /// 逐个查询报价时的间隔（毫秒）
    #[serde(default = "default_client_batch_delay")]
    pub batch_delay_ms: u64,
    /// 大模型调用超时（秒）
    #[serde(default = "default_chat_timeout")]
    pub chat_timeout_secs: u64,
    /// 本地存储文件
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
    /// 本地存储键前缀
    #[serde(default = "default_storage_prefix")]
    pub storage_prefix: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 超时配置
    #[serde(default)]
    pub api: ApiConfig,
    /// 上游地址
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// 客户端配置
    #[serde(default)]
    pub client: ClientConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_timeout() -> u64 { 15 }
fn default_secondary_timeout() -> u64 { 10 }
fn default_chat_timeout() -> u64 { 60 }
fn default_connect_timeout() -> u64 { 10 }
fn default_batch_delay() -> u64 { 100 }
fn default_chat_url() -> String { "https://api.openai.com/v1/chat/completions".to_string() }
fn default_model() -> String { "gpt-4o-mini".to_string() }
fn default_cafef_url() -> String { "https://banggia.cafef.vn/stockhandler.ashx?center=1".to_string() }
fn default_ssi_url() -> String { "https://iboard-api.ssi.com.vn/statistics/getliststockdata?market=".to_string() }
fn default_tcbs_url() -> String { "https://apipubaws.tcbs.com.vn/stock-insight/v2/stock/bars-long-term".to_string() }
fn default_wichart_url() -> String { "https://api.wichart.vn/vietnambiz/stock/quote".to_string() }
fn default_goldprice_url() -> String { "https://data-asg.goldprice.org/dbXRates/USD".to_string() }
fn default_coingecko_url() -> String { "https://api.coingecko.com/api/v3/simple/price".to_string() }
fn default_google_news_url() -> String { "https://news.google.com/rss/search".to_string() }
fn default_vnexpress_url() -> String { "https://vnexpress.net/rss/kinh-doanh.rss".to_string() }
fn default_proxy_base_url() -> String { "http://127.0.0.1:8080".to_string() }
fn default_client_model() -> String { "claude-sonnet-4-5-20250929".to_string() }
fn default_cache_ttl() -> u64 { 60 }
fn default_metal_ttl() -> u64 { 30 }
fn default_client_batch_delay() -> u64 { 150 }
fn default_storage_path() -> String { "finai_storage.json".to_string() }
fn default_storage_prefix() -> String { "finai_".to_string() }
fn default_log_level() -> String { "info".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            secondary_timeout_secs: default_secondary_timeout(),
            chat_timeout_secs: default_chat_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            batch_delay_ms: default_batch_delay(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            chat_url: default_chat_url(),
            default_model: default_model(),
            cafef_url: default_cafef_url(),
            ssi_url: default_ssi_url(),
            tcbs_url: default_tcbs_url(),
            wichart_url: default_wichart_url(),
            goldprice_url: default_goldprice_url(),
            coingecko_url: default_coingecko_url(),
            google_news_url: default_google_news_url(),
            vnexpress_rss_url: default_vnexpress_url(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            proxy_base_url: default_proxy_base_url(),
            model: default_client_model(),
            cache_ttl_secs: default_cache_ttl(),
            metal_ttl_secs: default_metal_ttl(),
            batch_delay_ms: default_client_batch_delay(),
            chat_timeout_secs: default_chat_timeout(),
            storage_path: default_storage_path(),
            storage_prefix: default_storage_prefix(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn secondary_timeout(&self) -> Duration {
        Duration::from_secs(self.secondary_timeout_secs)
    }

    pub fn chat_timeout(&self) -> Duration {
        Duration::from_secs(self.chat_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，优先从文件，失败则使用默认值
    pub fn load() -> Self {
        let config_paths = ["config.json", "config/config.json"];

        for path in config_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => {
                        log::info!("从 {} 加载配置成功", path);
                        return config;
                    }
                    Err(e) => {
                        log::warn!("加载配置文件 {} 失败: {}", path, e);
                    }
                }
            }
        }

        log::info!("使用默认配置");
        Self::default()
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{ "server": { "port": 9000 }, "client": { "model": "gpt-4o" } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.client.model, "gpt-4o");
        assert_eq!(config.client.cache_ttl_secs, 60);
        assert_eq!(config.client.metal_ttl_secs, 30);
        assert_eq!(config.api.chat_timeout(), Duration::from_secs(60));
        assert_eq!(config.upstream.default_model, "gpt-4o-mini");
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
    }
}
