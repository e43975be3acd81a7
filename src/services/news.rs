//! 财经新闻聚合（/api/news）
//!
//! Google News RSS、VnExpress 财经 RSS 与市场指标提示并发获取，
//! 单个来源失败不影响其他来源，最多返回 8 条

use async_trait::async_trait;
use chrono::Timelike;
use regex::Regex;
use reqwest::Client;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use url::Url;

use crate::config::AppConfig;
use crate::error::UpstreamError;
use crate::models::{get_vietnam_time, Article, Importance, NewsKind, NewsResponse};
use crate::services::common::get_text;

/// 单次返回的文章上限
pub const MAX_ARTICLES: usize = 8;
/// 合成的市场指标来源名称
pub const MARKET_CONTEXT: &str = "Market Context";

const GOOGLE_NEWS_TIMEOUT: Duration = Duration::from_secs(8);
const VNEXPRESS_TIMEOUT: Duration = Duration::from_secs(5);
const GOOGLE_NEWS_ITEMS: usize = 4;
const VNEXPRESS_ITEMS: usize = 2;
const SUMMARY_CHARS: usize = 150;

static ITEM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<item>(.*?)</item>").expect("valid regex"));
static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<title>(.*?)</title>").expect("valid regex"));
static PUB_DATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<pubDate>(.*?)</pubDate>").expect("valid regex"));
static DESCRIPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<description>(.*?)</description>").expect("valid regex"));
static CDATA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<!\[CDATA\[(.*?)\]\]>").expect("valid regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// 新闻来源
#[async_trait]
pub trait NewsSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(&self, query: &str, kind: NewsKind) -> Result<Vec<Article>, UpstreamError>;
}

/// Google News RSS 搜索
pub struct GoogleNews {
    client: Client,
    url: String,
}

impl GoogleNews {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self { client, url: url.into() }
    }
}

/// 按资产类别补充搜索关键词
pub fn search_terms(query: &str, kind: NewsKind) -> String {
    match kind {
        NewsKind::Stock => format!("{} cổ phiếu VNINDEX", query),
        NewsKind::Metal => format!("{} giá vàng gold price", query),
        NewsKind::General => query.to_string(),
    }
}

#[async_trait]
impl NewsSource for GoogleNews {
    fn name(&self) -> &'static str {
        "Google News"
    }

    async fn search(&self, query: &str, kind: NewsKind) -> Result<Vec<Article>, UpstreamError> {
        let url = Url::parse_with_params(
            &self.url,
            &[("q", search_terms(query, kind).as_str()), ("hl", "vi"), ("gl", "VN"), ("ceid", "VN:vi")],
        )
        .map_err(|e| UpstreamError::Transport(format!("invalid Google News url: {e}")))?;

        let xml = get_text(&self.client, url.as_str(), GOOGLE_NEWS_TIMEOUT).await?;
        Ok(parse_google_items(&xml))
    }
}

pub fn parse_google_items(xml: &str) -> Vec<Article> {
    rss_items(xml)
        .take(GOOGLE_NEWS_ITEMS)
        .map(|item| Article {
            title: decode_html_entities(capture(&TITLE_RE, item)),
            summary: None,
            date: capture(&PUB_DATE_RE, item).to_string(),
            source: "Google News".to_string(),
            importance: Some(Importance::High),
        })
        .collect()
}

/// VnExpress 财经 RSS，只保留提及查询词的条目
pub struct VnExpress {
    client: Client,
    url: String,
}

impl VnExpress {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self { client, url: url.into() }
    }
}

#[async_trait]
impl NewsSource for VnExpress {
    fn name(&self) -> &'static str {
        "VnExpress"
    }

    async fn search(&self, query: &str, _kind: NewsKind) -> Result<Vec<Article>, UpstreamError> {
        let xml = get_text(&self.client, &self.url, VNEXPRESS_TIMEOUT).await?;
        Ok(parse_vnexpress_items(&xml, query))
    }
}

pub fn parse_vnexpress_items(xml: &str, query: &str) -> Vec<Article> {
    let needle = query.to_lowercase();

    rss_items(xml)
        .filter(|item| item.to_lowercase().contains(&needle))
        .take(VNEXPRESS_ITEMS)
        .map(|item| {
            let summary: String = decode_html_entities(capture(&DESCRIPTION_RE, item))
                .chars()
                .take(SUMMARY_CHARS)
                .collect();
            Article {
                title: decode_html_entities(capture(&TITLE_RE, item)),
                summary: Some(summary),
                date: String::new(),
                source: "VnExpress".to_string(),
                importance: Some(Importance::Medium),
            }
        })
        .collect()
}

fn rss_items(xml: &str) -> impl Iterator<Item = &str> {
    ITEM_RE
        .captures_iter(xml)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
}

fn capture<'a>(re: &Regex, text: &'a str) -> &'a str {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or("")
}

/// 还原 HTML 实体，去掉 CDATA 包装和标签
pub fn decode_html_entities(text: &str) -> String {
    // `&amp;` 最后还原，避免二次解码
    let decoded = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    let unwrapped = CDATA_RE.replace_all(&decoded, "$1");
    TAG_RE.replace_all(&unwrapped, "").trim().to_string()
}

fn today() -> String {
    get_vietnam_time().format("%-d/%-m/%Y").to_string()
}

fn article(title: impl Into<String>, summary: &str, source: &str, importance: Importance) -> Article {
    Article {
        title: title.into(),
        summary: Some(summary.to_string()),
        date: today(),
        source: source.to_string(),
        importance: Some(importance),
    }
}

/// 市场指标提示，随外部新闻一起返回
pub fn market_indicators(query: &str, kind: NewsKind) -> Vec<Article> {
    match kind {
        NewsKind::Stock => vec![article(
            format!("📊 Phân tích kỹ thuật {}", query),
            "RSI, MACD, EMA20/50/200 - Xu hướng và điểm vào/ra dựa trên biến động giá",
            "Technical Analysis",
            Importance::Critical,
        )],
        NewsKind::Metal => vec![article(
            "📈 Chỉ báo vĩ mô ảnh hưởng giá vàng/bạc",
            "Fed Funds Rate, CPI lạm phát, DXY Index, US 10Y Yield - Các yếu tố quyết định xu hướng",
            "Macro Analysis",
            Importance::Critical,
        )],
        NewsKind::General => Vec::new(),
    }
}

/// 越南股市交易时段（9:00-15:00）
pub fn is_market_open(hour: u32) -> bool {
    (9..15).contains(&hour)
}

/// 没有任何新闻时返回的综合分析背景
pub fn comprehensive_context(query: &str, kind: NewsKind, market_open: bool) -> Vec<Article> {
    match kind {
        NewsKind::Stock => vec![
            article(
                format!("📊 Phân tích tổng hợp {}", query),
                "Kết hợp phân tích kỹ thuật (RSI, MACD, Bollinger Bands) và cơ bản (P/E, ROE, tăng trưởng doanh thu). Xem xét xu hướng ngành và vị thế cạnh tranh.",
                "Comprehensive Analysis",
                Importance::Critical,
            ),
            article(
                "📈 Xu hướng thị trường VN-Index",
                if market_open {
                    "Thị trường đang trong phiên giao dịch. Theo dõi volume, thanh khoản, và nhóm bluechip dẫn dắt."
                } else {
                    "Ngoài giờ giao dịch. Cần đánh giá xu hướng từ phiên trước và tin tức overnight."
                },
                MARKET_CONTEXT,
                Importance::High,
            ),
            article(
                "🌍 Yếu tố vĩ mô ảnh hưởng TTCK Việt Nam",
                "Tỷ giá USD/VND, lãi suất NHNN, dòng vốn ngoại, chính sách Fed và triển vọng kinh tế toàn cầu.",
                "Macro Context",
                Importance::Medium,
            ),
        ],
        NewsKind::Metal => vec![
            article(
                "🥇 Phân tích giá vàng/bạc thế giới",
                "Giá XAU/USD và XAG/USD phụ thuộc: (1) Chính sách Fed - lãi suất, (2) Lạm phát CPI Mỹ, (3) Chỉ số DXY (USD), (4) Căng thẳng địa chính trị.",
                "Gold Analysis",
                Importance::Critical,
            ),
            article(
                "📊 Chỉ báo kỹ thuật kim loại quý",
                "Các mức Fibonacci quan trọng, vùng hỗ trợ/kháng cự major, RSI overbought/oversold, và pattern chart dài hạn.",
                "Technical",
                Importance::High,
            ),
            article(
                "🏦 Yếu tố cung-cầu vật chất",
                "Nhu cầu từ NHTW (đặc biệt Trung Quốc, Ấn Độ), sản lượng khai thác, và xu hướng tích trữ tài sản an toàn.",
                "Fundamental",
                Importance::Medium,
            ),
        ],
        NewsKind::General => vec![article(
            format!("💼 Phân tích thị trường: {}", query),
            "Kết hợp phân tích kỹ thuật, tin tức và yếu tố vĩ mô để đưa ra khuyến nghị đầu tư.",
            "FinAI Analysis",
            Importance::High,
        )],
    }
}

/// 新闻聚合服务
pub struct NewsService {
    sources: Vec<Arc<dyn NewsSource>>,
}

impl NewsService {
    pub fn new(sources: Vec<Arc<dyn NewsSource>>) -> Self {
        Self { sources }
    }

    pub fn from_config(config: &AppConfig, client: Client) -> Self {
        let sources: Vec<Arc<dyn NewsSource>> = vec![
            Arc::new(GoogleNews::new(client.clone(), &config.upstream.google_news_url)),
            Arc::new(VnExpress::new(client, &config.upstream.vnexpress_rss_url)),
        ];
        Self::new(sources)
    }

    pub async fn search(&self, query: &str, kind: NewsKind) -> NewsResponse {
        let results = futures::future::join_all(self.sources.iter().map(|s| s.search(query, kind))).await;

        let mut articles = Vec::new();
        for (source, result) in self.sources.iter().zip(results) {
            match result {
                Ok(found) => {
                    log::debug!("📰 {} 返回 {} 条新闻", source.name(), found.len());
                    articles.extend(found);
                }
                Err(e) => log::warn!("⚠️ {} 新闻获取失败: {}", source.name(), e),
            }
        }
        articles.extend(market_indicators(query, kind));

        if articles.is_empty() {
            let hour = get_vietnam_time().hour();
            articles = comprehensive_context(query, kind, is_market_open(hour));
        }
        articles.truncate(MAX_ARTICLES);

        let mut sources: Vec<String> = self.sources.iter().map(|s| s.name().to_string()).collect();
        sources.push(MARKET_CONTEXT.to_string());

        log::info!("📰 新闻查询 \"{}\": {} 条", query, articles.len());
        NewsResponse::new(query.to_string(), articles, sources)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    pub struct StaticNews {
        pub name: &'static str,
        pub result: Result<Vec<Article>, UpstreamError>,
    }

    #[async_trait]
    impl NewsSource for StaticNews {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn search(&self, _query: &str, _kind: NewsKind) -> Result<Vec<Article>, UpstreamError> {
            self.result.clone()
        }
    }

    pub fn headline(title: &str) -> Article {
        Article {
            title: title.to_string(),
            summary: None,
            date: String::new(),
            source: "Google News".to_string(),
            importance: Some(Importance::High),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    const RSS: &str = r#"<rss><channel>
<item><title><![CDATA[Vinamilk &amp; FPT dẫn dắt VN-Index]]></title>
<description><![CDATA[<a href="x"><img src="y"></a>Cổ phiếu VNM tăng mạnh trong phiên sáng]]></description>
<pubDate>Thu, 15 Jan 2026 08:00:00 +0700</pubDate></item>
<item><title>Giá vàng lập đỉnh</title><description>Vàng SJC tăng</description></item>
</channel></rss>"#;

    #[test]
    fn test_decode_html_entities() {
        assert_eq!(decode_html_entities("<![CDATA[A &amp; B]]>"), "A & B");
        assert_eq!(decode_html_entities("AT&amp;T &amp;lt;3 &amp;quot;"), "AT&T &lt;3 &quot;");
        assert_eq!(decode_html_entities("&lt;b&gt;bold&lt;/b&gt; &quot;x&quot; &#39;y&#39;"), "bold \"x\" 'y'");
    }

    #[test]
    fn test_parse_google_items() {
        let articles = parse_google_items(RSS);

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Vinamilk & FPT dẫn dắt VN-Index");
        assert_eq!(articles[0].date, "Thu, 15 Jan 2026 08:00:00 +0700");
        assert_eq!(articles[1].title, "Giá vàng lập đỉnh");
    }

    #[test]
    fn test_vnexpress_filters_by_query() {
        let articles = parse_vnexpress_items(RSS, "vnm");

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].summary.as_deref(), Some("Cổ phiếu VNM tăng mạnh trong phiên sáng"));
        assert_eq!(articles[0].importance, Some(Importance::Medium));
    }

    #[test]
    fn test_search_terms() {
        assert_eq!(search_terms("VNM", NewsKind::Stock), "VNM cổ phiếu VNINDEX");
        assert_eq!(search_terms("XAU", NewsKind::Metal), "XAU giá vàng gold price");
        assert_eq!(search_terms("bitcoin", NewsKind::General), "bitcoin");
    }

    #[test]
    fn test_market_hours() {
        assert!(is_market_open(9));
        assert!(is_market_open(14));
        assert!(!is_market_open(15));
        assert!(!is_market_open(8));

        let open = comprehensive_context("VNM", NewsKind::Stock, true);
        let closed = comprehensive_context("VNM", NewsKind::Stock, false);
        assert_eq!(open.len(), 3);
        assert_ne!(open[1].summary, closed[1].summary);
    }

    #[tokio::test]
    async fn test_search_tolerates_failures_and_caps() {
        let many: Vec<Article> = (0..10).map(|i| headline(&format!("tin {}", i))).collect();
        let sources: Vec<Arc<dyn NewsSource>> = vec![
            Arc::new(StaticNews { name: "Google News", result: Ok(many) }),
            Arc::new(StaticNews { name: "VnExpress", result: Err(UpstreamError::Transport("timeout".to_string())) }),
        ];
        let service = NewsService::new(sources);

        let resp = service.search("VNM", NewsKind::Stock).await;
        assert_eq!(resp.count, MAX_ARTICLES);
        assert_eq!(resp.query, "VNM");
        assert_eq!(resp.sources, vec!["Google News", "VnExpress", "Market Context"]);
    }

    #[tokio::test]
    async fn test_empty_result_uses_context() {
        let source: Arc<dyn NewsSource> = Arc::new(StaticNews {
            name: "Google News",
            result: Err(UpstreamError::Status { status: 503, body: String::new() }),
        });
        let service = NewsService::new(vec![source]);

        let resp = service.search("bitcoin", NewsKind::General).await;
        assert_eq!(resp.count, 1);
        assert_eq!(resp.articles[0].source, "FinAI Analysis");
    }
}
