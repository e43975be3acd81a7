//! 公共常量和辅助函数

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::error::UpstreamError;

/// 请求上游时使用的 User-Agent
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 FinAI/1.0";

/// 价格单位判断阈值：不小于该值视为越南盾，否则视为千越南盾
pub const VND_UNIT_THRESHOLD: f64 = 1000.0;

/// 创建共享 HTTP 客户端
pub fn build_client(api: &ApiConfig) -> reqwest::Result<Client> {
    Client::builder()
        .connect_timeout(api.connect_timeout())
        .user_agent(USER_AGENT)
        .gzip(true)
        .build()
}

/// GET 并解析 JSON，非 2xx 时保留状态码和响应体
pub async fn get_json(client: &Client, url: &str, timeout: Duration) -> Result<Value, UpstreamError> {
    let response = client
        .get(url)
        .header("Accept", "application/json")
        .timeout(timeout)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(UpstreamError::Status { status: status.as_u16(), body });
    }

    let text = response.text().await?;
    Ok(serde_json::from_str(&text)?)
}

/// GET 文本（RSS 等）
pub async fn get_text(client: &Client, url: &str, timeout: Duration) -> Result<String, UpstreamError> {
    let response = client.get(url).timeout(timeout).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(UpstreamError::Status { status: status.as_u16(), body });
    }

    Ok(response.text().await?)
}

/// 按候选字段名读取数值，兼容数字和数字字符串
pub fn number_field(item: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| match item.get(*key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    })
    .filter(|v| v.is_finite())
}

/// 按候选字段名读取字符串
pub fn string_field(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match item.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// 取出数组：本身是数组，或位于 `data` 字段中
pub fn data_array(value: &Value) -> Option<&Vec<Value>> {
    value
        .as_array()
        .or_else(|| value.get("data").and_then(Value::as_array))
}

/// 统一为千越南盾
pub fn to_thousand_vnd(price: f64) -> f64 {
    if price >= VND_UNIT_THRESHOLD {
        price / 1000.0
    } else {
        price
    }
}

/// 相对参考价的涨跌幅（百分比）
pub fn percent_change(price: f64, reference: f64) -> f64 {
    if reference > 0.0 {
        (price - reference) / reference * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_field_accepts_strings() {
        let item = json!({ "a": "12,500", "b": 3.5, "c": "n/a" });
        assert_eq!(number_field(&item, &["x", "a"]), Some(12500.0));
        assert_eq!(number_field(&item, &["b"]), Some(3.5));
        assert_eq!(number_field(&item, &["c"]), None);
    }

    #[test]
    fn test_to_thousand_vnd() {
        assert_eq!(to_thousand_vnd(38750.0), 38.75);
        assert_eq!(to_thousand_vnd(38.75), 38.75);
    }

    #[test]
    fn test_data_array() {
        assert_eq!(data_array(&json!([1, 2])).map(Vec::len), Some(2));
        assert_eq!(data_array(&json!({ "data": [1] })).map(Vec::len), Some(1));
        assert!(data_array(&json!({ "items": [] })).is_none());
    }
}
