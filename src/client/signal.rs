//! 交易信号生成
//!
//! 每次分析依次经过 Prompting → AwaitingModel → Parsed / Fallback 几个阶段。
//! 模型调用失败、超时或回复无法解析时，按涨跌幅规则生成兜底信号

use anyhow::anyhow;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::json_extract::{extract_array, extract_object};
use super::prompt::{
    analysis_prompt, scan_prompt, ANALYSIS_SYSTEM_PROMPT, CONNECTION_SYSTEM_PROMPT, CONNECTION_USER_PROMPT,
    SCAN_SYSTEM_PROMPT,
};
use super::proxy::ChatBackend;
use crate::catalog;
use crate::config::AppConfig;
use crate::models::{
    vietnam_timestamp, Action, Asset, AssetType, ChatMessage, Reasoning, Signal, SignalOrigin, Timeframe,
    UpstreamChatRequest, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
};
use crate::services::common::number_field;

/// 默认风险收益比
pub const DEFAULT_RISK_REWARD: &str = "1:2";
/// 默认信心等级
pub const DEFAULT_CONFIDENCE: u8 = 3;

/// 扫描候选：当前资产、涨幅榜、跌幅榜各取的数量
const SCAN_CURRENT: usize = 10;
const SCAN_MOVERS: usize = 5;

/// 单次分析所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Prompting,
    AwaitingModel,
    Parsed,
    Fallback,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Prompting => "Prompting",
            Stage::AwaitingModel => "AwaitingModel",
            Stage::Parsed => "Parsed",
            Stage::Fallback => "Fallback",
        };
        write!(f, "{s}")
    }
}

pub struct SignalGenerator {
    backend: Arc<dyn ChatBackend>,
    model: String,
    timeout: Duration,
}

impl SignalGenerator {
    pub fn new(backend: Arc<dyn ChatBackend>, model: impl Into<String>, timeout: Duration) -> Self {
        Self { backend, model: model.into(), timeout }
    }

    pub fn from_config(config: &AppConfig, backend: Arc<dyn ChatBackend>) -> Self {
        Self::new(
            backend,
            config.client.model.clone(),
            Duration::from_secs(config.client.chat_timeout_secs),
        )
    }

    fn request(&self, system: &str, user: String) -> UpstreamChatRequest {
        UpstreamChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// 调用模型，超时视为失败
    async fn call(&self, request: &UpstreamChatRequest) -> anyhow::Result<String> {
        tokio::time::timeout(self.timeout, self.backend.complete(request))
            .await
            .map_err(|_| anyhow!("模型响应超时 ({}s)", self.timeout.as_secs_f64()))?
    }

    /// 分析单个资产，任何失败都返回兜底信号
    pub async fn analyze(&self, asset: &Asset, timeframe: Timeframe) -> Signal {
        log::info!("🤖 [{}] 分析 {} ({:?})", Stage::Prompting, asset.symbol, timeframe);
        let request = self.request(ANALYSIS_SYSTEM_PROMPT, analysis_prompt(asset, timeframe));

        log::debug!("[{}] model={}", Stage::AwaitingModel, request.model);
        let reply = match self.call(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                log::warn!("⚠️ [{}] {} 模型调用失败: {}", Stage::Fallback, asset.symbol, e);
                return fallback_signal(asset, timeframe);
            }
        };

        match extract_object(&reply) {
            Some(value) => {
                let signal = coerce_signal(&value, asset, timeframe, Action::Hold);
                log::info!(
                    "✅ [{}] {}: {} confidence={}",
                    Stage::Parsed,
                    asset.symbol,
                    signal.action,
                    signal.confidence
                );
                signal
            }
            None => {
                log::warn!("⚠️ [{}] {} 回复中没有 JSON", Stage::Fallback, asset.symbol);
                fallback_signal(asset, timeframe)
            }
        }
    }

    /// 扫描候选资产，找出值得买入的机会
    ///
    /// 回复无法解析时整个扫描失败，不生成兜底信号
    pub async fn scan_market(&self, candidates: &[Asset], timeframe: Timeframe) -> anyhow::Result<Vec<Signal>> {
        if candidates.is_empty() {
            anyhow::bail!("没有可扫描的资产");
        }
        log::info!("🤖 扫描 {} 个候选资产", candidates.len());

        let request = self.request(SCAN_SYSTEM_PROMPT, scan_prompt(candidates, timeframe));
        let reply = self.call(&request).await?;
        let items = extract_array(&reply).ok_or_else(|| anyhow!("Invalid AI response"))?;

        let signals: Vec<Signal> = items
            .iter()
            .filter_map(|item| {
                let symbol = item.get("symbol")?.as_str()?.trim().to_uppercase();
                let asset = candidates
                    .iter()
                    .find(|a| a.symbol == symbol)
                    .cloned()
                    .or_else(|| unlisted_asset(&symbol, item))?;
                Some(coerce_signal(item, &asset, timeframe, Action::Buy))
            })
            .collect();

        log::info!("✅ 扫描完成: {} 个机会", signals.len());
        Ok(signals)
    }

    /// 检查 API key 是否可用
    pub async fn test_connection(&self) -> bool {
        let request = self.request(CONNECTION_SYSTEM_PROMPT, CONNECTION_USER_PROMPT.to_string());
        match self.call(&request).await {
            Ok(reply) if !reply.trim().is_empty() => {
                log::info!("✅ 模型接口连接正常");
                true
            }
            Ok(_) => {
                log::warn!("❌ 模型接口无响应");
                false
            }
            Err(e) => {
                log::error!("❌ 连接测试失败: {}", e);
                false
            }
        }
    }
}

/// 扫描结果中不在候选列表里的代码，按股票处理，需要有入场价
fn unlisted_asset(symbol: &str, item: &Value) -> Option<Asset> {
    let entry = number_field(item, &["entry"]).filter(|p| *p > 0.0)?;
    Some(Asset::new(symbol, catalog::stock_name(symbol), AssetType::Stock, entry))
}

/// 扫描候选：当前资产前 10 个，加涨幅榜、跌幅榜各 5 个，按代码去重
pub fn build_scan_candidates(current: &[Asset], gainers: &[Asset], losers: &[Asset]) -> Vec<Asset> {
    let mut candidates: Vec<Asset> = current.iter().take(SCAN_CURRENT).cloned().collect();
    for asset in gainers.iter().take(SCAN_MOVERS).chain(losers.iter().take(SCAN_MOVERS)) {
        if !candidates.iter().any(|c| c.symbol == asset.symbol) {
            candidates.push(asset.clone());
        }
    }
    candidates
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
    .filter(|v: &f64| v.is_finite())
}

/// 信心等级：数值四舍五入后限制在 1-5，非数值取默认值
fn confidence_of(value: &Value) -> u8 {
    value
        .get("confidence")
        .and_then(as_number)
        .map(|c| c.round().clamp(1.0, 5.0) as u8)
        .unwrap_or(DEFAULT_CONFIDENCE)
}

/// 止损必须在亏损一侧：买入/持有在入场价下方，卖出在上方
fn stop_loss_of(value: &Value, action: Action, entry: f64) -> f64 {
    let valid = |stop: &f64| match action {
        Action::Sell => *stop > entry,
        Action::Buy | Action::Hold => *stop > 0.0 && *stop < entry,
    };
    number_field(value, &["stopLoss", "stop_loss"])
        .filter(valid)
        .unwrap_or(match action {
            Action::Sell => entry * 1.05,
            Action::Buy | Action::Hold => entry * 0.95,
        })
}

/// 三个止盈位，必须在盈利一侧；缺失或方向错误的按入场价 ±5/10/15% 补齐，并按预期收益排序
fn targets_of(value: &Value, action: Action, entry: f64) -> [f64; 3] {
    let profitable = |t: &f64| match action {
        Action::Sell => *t > 0.0 && *t < entry,
        Action::Buy | Action::Hold => *t > entry,
    };
    let given: Vec<f64> = value
        .get("targets")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(as_number).filter(profitable).collect())
        .unwrap_or_default();

    let step = |k: f64| match action {
        Action::Sell => entry * (1.0 - 0.05 * k),
        Action::Buy | Action::Hold => entry * (1.0 + 0.05 * k),
    };
    let mut targets = [step(1.0), step(2.0), step(3.0)];
    for (slot, target) in targets.iter_mut().zip(given) {
        *slot = target;
    }

    match action {
        Action::Sell => targets.sort_by(|a, b| b.total_cmp(a)),
        Action::Buy | Action::Hold => targets.sort_by(|a, b| a.total_cmp(b)),
    }
    targets
}

fn reasoning_of(value: &Value) -> Reasoning {
    match value.get("reasoning") {
        Some(Value::Object(_)) => serde_json::from_value(value["reasoning"].clone()).unwrap_or_default(),
        Some(Value::String(summary)) => Reasoning { summary: summary.clone(), ..Default::default() },
        _ => match value.get("reason").and_then(Value::as_str) {
            Some(reason) => Reasoning { summary: reason.to_string(), ..Default::default() },
            None => Reasoning::default(),
        },
    }
}

/// 把模型输出的 JSON 补全为完整信号
pub fn coerce_signal(value: &Value, asset: &Asset, timeframe: Timeframe, default_action: Action) -> Signal {
    let action = value
        .get("action")
        .and_then(Value::as_str)
        .and_then(Action::parse_loose)
        .unwrap_or(default_action);
    let entry = number_field(value, &["entry"]).filter(|p| *p > 0.0).unwrap_or(asset.price);
    let risk_reward = value
        .get("riskReward")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_RISK_REWARD)
        .to_string();

    Signal {
        symbol: asset.symbol.clone(),
        name: asset.name.clone(),
        asset_type: asset.asset_type,
        icon: asset.icon.clone().unwrap_or_else(|| asset.asset_type.default_icon().to_string()),
        action,
        entry,
        stop_loss: stop_loss_of(value, action, entry),
        targets: targets_of(value, action, entry),
        risk_reward,
        confidence: confidence_of(value),
        reasoning: reasoning_of(value),
        timeframe_label: timeframe,
        origin: SignalOrigin::Model,
        created_at: vietnam_timestamp(),
    }
}

/// 按涨跌幅生成的规则信号，同样的输入总是得到同样的价位
pub fn fallback_signal(asset: &Asset, timeframe: Timeframe) -> Signal {
    let change = if asset.change.is_finite() { asset.change } else { 0.0 };
    let price = asset.price;

    let (action, confidence, technical) = if change < -5.0 {
        (Action::Buy, 3, format!("Giảm mạnh {:.1}% - RSI có thể oversold. Xem xét tích lũy.", change.abs()))
    } else if change < -2.0 {
        (Action::Buy, 2, format!("Điều chỉnh {:.1}%. Cơ hội mua nếu xu hướng dài hạn tốt.", change.abs()))
    } else if change > 8.0 {
        (Action::Sell, 3, format!("Tăng mạnh {:.1}% - Có thể overbought. Xem xét chốt lời.", change))
    } else if change > 3.0 {
        (Action::Hold, 3, format!("Xu hướng tăng (+{:.1}%). Giữ và dời stop loss theo giá.", change))
    } else if change > 0.0 {
        (Action::Hold, 2, format!("Sideway (+{:.1}%). Chờ phá vỡ kháng cự.", change))
    } else {
        (Action::Hold, 2, format!("Trung tính ({:.1}%). Chờ tín hiệu rõ ràng.", change))
    };

    let multiplier = match asset.asset_type {
        AssetType::Stock => 0.03,
        AssetType::Crypto | AssetType::Metal => 0.05,
    };
    // 卖出信号的止损在上方，止盈在下方
    let side = if action == Action::Sell { -1.0 } else { 1.0 };
    let level = |k: f64| price * (1.0 + side * multiplier * k);

    let summary = match action {
        Action::Buy => "Tín hiệu mua",
        Action::Sell => "Xem xét chốt lời",
        Action::Hold => "Theo dõi thêm",
    };

    Signal {
        symbol: asset.symbol.clone(),
        name: asset.name.clone(),
        asset_type: asset.asset_type,
        icon: asset.icon.clone().unwrap_or_else(|| asset.asset_type.default_icon().to_string()),
        action,
        entry: price,
        stop_loss: level(-1.5),
        targets: [level(1.0), level(2.0), level(3.0)],
        risk_reward: DEFAULT_RISK_REWARD.to_string(),
        confidence,
        reasoning: Reasoning {
            technical,
            news: "⚠️ Cần API key để lấy phân tích AI đầy đủ.".to_string(),
            summary: format!("Phân tích offline: {}.", summary),
        },
        timeframe_label: timeframe,
        origin: SignalOrigin::Fallback,
        created_at: vietnam_timestamp(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::proxy::testing::ScriptedChat;
    use serde_json::json;

    fn vnm(change: f64) -> Asset {
        Asset::new("VNM", "Vinamilk", AssetType::Stock, 68.5).with_change(change).live("CafeF")
    }

    fn generator(chat: ScriptedChat) -> (SignalGenerator, Arc<ScriptedChat>) {
        let chat = Arc::new(chat);
        let backend: Arc<dyn ChatBackend> = chat.clone();
        (SignalGenerator::new(backend, "claude-sonnet-4-5-20250929", Duration::from_millis(50)), chat)
    }

    fn ascending(targets: &[f64; 3]) -> bool {
        targets[0] < targets[1] && targets[1] < targets[2]
    }

    #[tokio::test]
    async fn test_timeout_yields_fallback() {
        let (gen, _) = generator(ScriptedChat::slow(Duration::from_millis(500)));
        let asset = vnm(0.0);

        let signal = gen.analyze(&asset, Timeframe::Short).await;
        assert_eq!(signal.origin, SignalOrigin::Fallback);
        assert_eq!(signal.entry, asset.price);
        assert!(ascending(&signal.targets));
        assert!(signal.stop_loss < signal.entry);
    }

    #[tokio::test]
    async fn test_backend_error_yields_fallback() {
        let (gen, _) = generator(ScriptedChat::failing());
        let signal = gen.analyze(&vnm(-6.0), Timeframe::Short).await;

        assert_eq!(signal.origin, SignalOrigin::Fallback);
        assert_eq!(signal.action, Action::Buy);
        assert_eq!(signal.confidence, 3);
    }

    #[tokio::test]
    async fn test_reply_without_json_yields_fallback() {
        let (gen, _) = generator(ScriptedChat::replying("Xin lỗi, tôi không thể phân tích."));
        let signal = gen.analyze(&vnm(1.0), Timeframe::Long).await;
        assert_eq!(signal.origin, SignalOrigin::Fallback);
        assert_eq!(signal.timeframe_label, Timeframe::Long);
    }

    #[tokio::test]
    async fn test_parsed_reply() {
        let reply = r#"Kết quả:
```json
{"action": "buy", "entry": 68.0, "stopLoss": 65.5, "targets": [72, 70, "75.5"],
 "riskReward": "1:3", "confidence": 4,
 "reasoning": {"technical": "RSI 35", "news": "Lợi nhuận quý tăng", "summary": "Tích lũy"}}
```"#;
        let (gen, chat) = generator(ScriptedChat::replying(reply));
        let signal = gen.analyze(&vnm(-1.0), Timeframe::Medium).await;

        assert_eq!(signal.origin, SignalOrigin::Model);
        assert_eq!(signal.action, Action::Buy);
        assert_eq!(signal.entry, 68.0);
        assert_eq!(signal.stop_loss, 65.5);
        assert_eq!(signal.targets, [70.0, 72.0, 75.5]);
        assert_eq!(signal.risk_reward, "1:3");
        assert_eq!(signal.reasoning.technical, "RSI 35");

        let seen = chat.seen.lock().unwrap();
        assert_eq!(seen[0].temperature, 0.7);
        assert_eq!(seen[0].max_tokens, 2000);
        assert_eq!(seen[0].messages[0].role, "system");
        assert!(seen[0].messages[1].content.contains("Vinamilk (VNM)"));
    }

    #[test]
    fn test_confidence_is_clamped() {
        let asset = vnm(0.0);
        let cases = [(json!(0), 1), (json!(7), 5), (json!("N/A"), 3), (json!("4"), 4), (json!(2.6), 3)];

        for (raw, expected) in cases {
            let signal = coerce_signal(&json!({ "confidence": raw }), &asset, Timeframe::Short, Action::Hold);
            assert_eq!(signal.confidence, expected, "confidence {:?}", raw);
        }
    }

    #[test]
    fn test_missing_fields_are_filled() {
        let asset = vnm(0.0);
        let signal = coerce_signal(&json!({}), &asset, Timeframe::Short, Action::Hold);

        assert_eq!(signal.action, Action::Hold);
        assert_eq!(signal.entry, 68.5);
        assert!((signal.stop_loss - 65.075).abs() < 1e-9);
        assert!((signal.targets[2] - 78.775).abs() < 1e-9);
        assert_eq!(signal.risk_reward, "1:2");
        assert_eq!(signal.reasoning, Reasoning::default());
    }

    #[test]
    fn test_stop_loss_on_losing_side() {
        let asset = vnm(0.0);

        let buy = coerce_signal(&json!({ "action": "BUY", "stopLoss": 70.0 }), &asset, Timeframe::Short, Action::Hold);
        assert!(buy.stop_loss < buy.entry);

        let sell = coerce_signal(&json!({ "action": "SELL", "stopLoss": 60.0 }), &asset, Timeframe::Short, Action::Hold);
        assert!(sell.stop_loss > sell.entry);
        assert!(sell.targets[0] > sell.targets[1] && sell.targets[1] > sell.targets[2]);
        assert!(sell.targets[0] < sell.entry);
    }

    #[test]
    fn test_targets_on_profit_side() {
        let asset = vnm(0.0);

        let buy = coerce_signal(
            &json!({ "action": "BUY", "entry": 68.0, "targets": [60, 72, 66] }),
            &asset,
            Timeframe::Short,
            Action::Hold,
        );
        assert!(buy.targets.iter().all(|t| *t > buy.entry));
        assert!(buy.targets.contains(&72.0));
        assert!(ascending(&buy.targets));

        let sell = coerce_signal(
            &json!({ "action": "SELL", "entry": 68.0, "targets": [75, 64, 70] }),
            &asset,
            Timeframe::Short,
            Action::Hold,
        );
        assert!(sell.targets.iter().all(|t| *t < sell.entry));
        assert!(sell.targets.contains(&64.0));
        assert!(sell.targets[0] > sell.targets[1] && sell.targets[1] > sell.targets[2]);
    }

    #[test]
    fn test_fallback_table() {
        let cases = [
            (-7.0, Action::Buy, 3),
            (-3.0, Action::Buy, 2),
            (-5.0, Action::Buy, 2),
            (9.5, Action::Sell, 3),
            (8.0, Action::Hold, 3),
            (2.0, Action::Hold, 2),
            (0.0, Action::Hold, 2),
            (-1.0, Action::Hold, 2),
        ];
        for (change, action, confidence) in cases {
            let signal = fallback_signal(&vnm(change), Timeframe::Short);
            assert_eq!((signal.action, signal.confidence), (action, confidence), "change {}", change);
        }
    }

    #[test]
    fn test_fallback_levels_are_deterministic() {
        let gold = Asset::new("XAU/USD", "Vàng", AssetType::Metal, 4000.0);
        let first = fallback_signal(&gold, Timeframe::Long);
        let second = fallback_signal(&gold, Timeframe::Long);

        assert_eq!(first.targets, second.targets);
        assert_eq!(first.stop_loss, second.stop_loss);
        assert!((first.stop_loss - 3700.0).abs() < 1e-9);
        assert!((first.targets[0] - 4200.0).abs() < 1e-9);
        assert!((first.targets[2] - 4600.0).abs() < 1e-9);

        let stock = fallback_signal(&vnm(0.0), Timeframe::Short);
        assert!((stock.targets[0] - 68.5 * 1.03).abs() < 1e-9);
        assert!(stock.reasoning.news.contains("API key"));
    }

    #[tokio::test]
    async fn test_scan_market() {
        let reply = r#"[
            {"symbol": "vnm", "entry": 68.0, "stopLoss": 66.0, "targets": [70, 72, 74], "confidence": 4, "reason": "Gần hỗ trợ"},
            {"symbol": "ABC", "confidence": 3},
            {"symbol": "DGC", "entry": 95.0, "reason": "Đảo chiều"}
        ]"#;
        let (gen, _) = generator(ScriptedChat::replying(reply));
        let candidates = vec![vnm(-2.5), Asset::new("FPT", "FPT Corp", AssetType::Stock, 148.2)];

        let signals = gen.scan_market(&candidates, Timeframe::Short).await.unwrap();
        assert_eq!(signals.len(), 2);

        assert_eq!(signals[0].symbol, "VNM");
        assert_eq!(signals[0].name, "Vinamilk");
        assert_eq!(signals[0].action, Action::Buy);
        assert_eq!(signals[0].reasoning.summary, "Gần hỗ trợ");

        assert_eq!(signals[1].symbol, "DGC");
        assert_eq!(signals[1].entry, 95.0);
        assert_eq!(signals[1].confidence, 3);
    }

    #[tokio::test]
    async fn test_scan_fails_without_array() {
        let (gen, _) = generator(ScriptedChat::replying("{\"symbol\": \"VNM\"}"));
        assert!(gen.scan_market(&[vnm(0.0)], Timeframe::Short).await.is_err());

        let (gen, _) = generator(ScriptedChat::failing());
        assert!(gen.scan_market(&[vnm(0.0)], Timeframe::Short).await.is_err());
    }

    #[test]
    fn test_build_scan_candidates() {
        let current: Vec<Asset> = (0..12).map(|i| Asset::new(format!("S{i}"), "x", AssetType::Stock, 10.0)).collect();
        let gainers = vec![
            Asset::new("S1", "x", AssetType::Stock, 10.0),
            Asset::new("G1", "x", AssetType::Stock, 10.0),
        ];
        let losers = vec![Asset::new("L1", "x", AssetType::Stock, 10.0), Asset::new("G1", "x", AssetType::Stock, 10.0)];

        let candidates = build_scan_candidates(&current, &gainers, &losers);
        let symbols: Vec<&str> = candidates.iter().map(|a| a.symbol.as_str()).collect();
        assert_eq!(symbols.len(), 12);
        assert_eq!(&symbols[10..], &["G1", "L1"]);
    }

    #[tokio::test]
    async fn test_connection() {
        let (ok, _) = generator(ScriptedChat::replying("Xin chào"));
        assert!(ok.test_connection().await);

        let (bad, _) = generator(ScriptedChat::failing());
        assert!(!bad.test_connection().await);
    }
}
