//! 提示词
//!
//! 回复语言为越南语，要求模型只输出 JSON

use crate::client::format::{format_change, format_price, format_price_for_prompt};
use crate::models::{Asset, Timeframe};

/// 单个资产分析的系统提示词
pub const ANALYSIS_SYSTEM_PROMPT: &str = "Bạn là chuyên gia phân tích tài chính hàng đầu với 20+ năm kinh nghiệm.

Nhiệm vụ:
1. Phân tích kỹ thuật: RSI, MACD, Bollinger Bands, Support/Resistance
2. Đánh giá xu hướng và momentum
3. Đưa ra Entry, Stop Loss, và 3 mức Take Profit cụ thể
4. Giải thích rõ ràng bằng tiếng Việt

CHỈ trả về JSON hợp lệ, không có text khác.";

/// 扫描市场的系统提示词
pub const SCAN_SYSTEM_PROMPT: &str = "Bạn là chuyên gia tài chính. Chỉ trả về JSON hợp lệ.";

/// 连通性测试
pub const CONNECTION_SYSTEM_PROMPT: &str = "Trả lời ngắn gọn bằng tiếng Việt.";
pub const CONNECTION_USER_PROMPT: &str = "Nói \"Xin chào\" nếu bạn hoạt động bình thường.";

const ANALYSIS_FORMAT: &str = r#"{
  "action": "BUY" | "SELL" | "HOLD",
  "entry": <giá vào lệnh>,
  "stopLoss": <giá cắt lỗ>,
  "targets": [<TP1>, <TP2>, <TP3>],
  "riskReward": "1:X",
  "confidence": <1-5>,
  "reasoning": {
    "technical": "<phân tích kỹ thuật>",
    "news": "<tin tức ảnh hưởng>",
    "summary": "<tóm tắt lý do>"
  }
}"#;

const SCAN_FORMAT: &str = r#"[
  {
    "symbol": "...",
    "action": "BUY",
    "entry": <số>,
    "stopLoss": <số>,
    "targets": [<t1>, <t2>, <t3>],
    "confidence": <1-5>,
    "reason": "<lý do ngắn gọn>"
  }
]"#;

/// 周期说明：名称、持仓时间和分析侧重点
pub fn timeframe_brief(timeframe: Timeframe) -> String {
    let focus = match timeframe {
        Timeframe::Short => "ưu tiên momentum, khối lượng và vùng hỗ trợ/kháng cự gần",
        Timeframe::Medium => "kết hợp xu hướng MA20/MA50 với tin tức ngành",
        Timeframe::Long => "ưu tiên định giá, kết quả kinh doanh và xu hướng vĩ mô",
    };
    format!("{} ({}) - {}", timeframe.label(), timeframe.horizon(), focus)
}

/// 单个资产分析的用户提示词
pub fn analysis_prompt(asset: &Asset, timeframe: Timeframe) -> String {
    format!(
        "Phân tích chi tiết tài sản sau:

📊 Thông tin:
- Tài sản: {name} ({symbol})
- Loại: {label}
- Giá hiện tại: {price}
- Thay đổi 24h: {change}
- Khung thời gian: {timeframe}

🎯 Trả về JSON:
{format}",
        name = asset.name,
        symbol = asset.symbol,
        label = asset.asset_type.label(),
        price = format_price_for_prompt(asset.price, asset.asset_type),
        change = format_change(asset.change),
        timeframe = timeframe_brief(timeframe),
        format = ANALYSIS_FORMAT,
    )
}

/// 扫描提示词：候选列表 + 评估标准 + 输出格式
pub fn scan_prompt(candidates: &[Asset], timeframe: Timeframe) -> String {
    let lines: Vec<String> = candidates
        .iter()
        .map(|a| {
            format!(
                "- {} ({}): Giá {}, Thay đổi {:.2}%",
                a.symbol,
                a.name,
                format_price(a.price, a.asset_type),
                a.change
            )
        })
        .collect();

    format!(
        "Bạn là chuyên gia phân tích tài chính. Quét qua danh sách tài sản sau và tìm 3-5 tài sản có cơ hội MUA tốt nhất trong {horizon}:

{list}

Tiêu chí đánh giá:
1. Cổ phiếu đang oversold (RSI thấp)
2. Giá gần vùng hỗ trợ mạnh
3. Có tín hiệu đảo chiều tăng
4. Risk/Reward hấp dẫn (>1:2)

Trả về JSON array với format:
{format}

Chỉ trả về các tài sản đáng MUA nhất, không liệt kê tất cả.",
        horizon = timeframe.horizon(),
        list = lines.join("\n"),
        format = SCAN_FORMAT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssetType;

    #[test]
    fn test_analysis_prompt_fields() {
        let asset = Asset::new("VNM", "Vinamilk", AssetType::Stock, 68.5).with_change(-0.7);
        let prompt = analysis_prompt(&asset, Timeframe::Medium);

        assert!(prompt.contains("Vinamilk (VNM)"));
        assert!(prompt.contains("Cổ phiếu Việt Nam"));
        assert!(prompt.contains("68,500 VND"));
        assert!(prompt.contains("-0.70%"));
        assert!(prompt.contains("Trung hạn (1-4 tuần)"));
        assert!(prompt.contains("\"stopLoss\""));
    }

    #[test]
    fn test_timeframe_briefs_differ() {
        let briefs: Vec<String> = [Timeframe::Short, Timeframe::Medium, Timeframe::Long]
            .into_iter()
            .map(timeframe_brief)
            .collect();
        assert!(briefs[0].starts_with("Ngắn hạn (1-7 ngày)"));
        assert_ne!(briefs[0], briefs[1]);
        assert_ne!(briefs[1], briefs[2]);
    }

    #[test]
    fn test_scan_prompt_lists_candidates() {
        let candidates = vec![
            Asset::new("FPT", "FPT Corp", AssetType::Stock, 148.2).with_change(1.5),
            Asset::new("XAU/USD", "Vàng", AssetType::Metal, 4900.0),
        ];
        let prompt = scan_prompt(&candidates, Timeframe::Short);

        assert!(prompt.contains("- FPT (FPT Corp): Giá 148,200 đ, Thay đổi 1.50%"));
        assert!(prompt.contains("- XAU/USD (Vàng): Giá $4,900.00, Thay đổi 0.00%"));
        assert!(prompt.contains("trong 1-7 ngày"));
        assert!(prompt.contains(">1:2"));
    }
}
