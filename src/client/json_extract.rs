//! 从模型回复中提取 JSON
//!
//! 回复里常夹杂说明文字或 markdown 代码块。按出现顺序扫描每个 `{` / `[`，
//! 找到与之配对的括号（跳过字符串内的括号和转义字符），第一个能解析的片段即为结果

use serde::de::DeserializeOwned;
use serde_json::Value;

/// 从 `start` 开始找与 `text[start]` 配对的闭括号，返回闭括号位置
fn matching_close(text: &str, start: usize, open: u8, close: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            _ if b == open => depth += 1,
            _ if b == close => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// 依次产出以 `open` 开头的括号平衡片段
fn balanced_spans(text: &str, open: u8, close: u8) -> impl Iterator<Item = &str> {
    text.bytes()
        .enumerate()
        .filter(move |(_, b)| *b == open)
        .filter_map(move |(start, _)| {
            matching_close(text, start, open, close).map(|end| &text[start..=end])
        })
}

/// 第一个可解析的 JSON 对象
pub fn extract_object(text: &str) -> Option<Value> {
    balanced_spans(text, b'{', b'}')
        .filter_map(|span| serde_json::from_str::<Value>(span).ok())
        .find(Value::is_object)
}

/// 第一个可解析的 JSON 数组
pub fn extract_array(text: &str) -> Option<Vec<Value>> {
    balanced_spans(text, b'[', b']')
        .filter_map(|span| serde_json::from_str::<Value>(span).ok())
        .find_map(|v| match v {
            Value::Array(items) => Some(items),
            _ => None,
        })
}

/// 提取第一个对象并反序列化为 `T`
pub fn extract<T: DeserializeOwned>(text: &str) -> Option<T> {
    balanced_spans(text, b'{', b'}').find_map(|span| serde_json::from_str::<T>(span).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_object_inside_markdown() {
        let reply = "Đây là phân tích:\n```json\n{\"action\": \"BUY\", \"entry\": 68.5}\n```\nChúc may mắn!";
        let value = extract_object(reply).unwrap();

        assert_eq!(value["action"], "BUY");
        assert_eq!(value["entry"], 68.5);
    }

    #[test]
    fn test_braces_inside_strings() {
        let reply = r#"{"reasoning": {"summary": "vùng {hỗ trợ} \"mạnh\" }"}, "confidence": 4} trailing }"#;
        let value = extract_object(reply).unwrap();

        assert_eq!(value["confidence"], 4);
        assert_eq!(value["reasoning"]["summary"], "vùng {hỗ trợ} \"mạnh\" }");
    }

    #[test]
    fn test_skips_unparsable_candidates() {
        let reply = "Ghi chú {không phải json} rồi {\"action\": \"SELL\"}";
        assert_eq!(extract_object(reply).unwrap()["action"], "SELL");
    }

    #[test]
    fn test_first_balanced_object_wins() {
        let reply = r#"{"action": "HOLD"} và {"action": "BUY"}"#;
        assert_eq!(extract_object(reply).unwrap()["action"], "HOLD");
    }

    #[test]
    fn test_array() {
        let reply = "Kết quả [tham khảo]:\n[{\"symbol\": \"VNM\"}, {\"symbol\": \"FPT\", \"targets\": [1, 2, 3]}]";
        let items = extract_array(reply).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["symbol"], "FPT");
    }

    #[test]
    fn test_missing_or_unbalanced() {
        assert!(extract_object("không có JSON").is_none());
        assert!(extract_object("{\"action\": \"BUY\"").is_none());
        assert!(extract_array("[1, 2").is_none());
    }

    #[test]
    fn test_typed_extract() {
        #[derive(Deserialize)]
        struct Reply {
            action: String,
        }

        let reply: Reply = extract("ok: {\"action\": \"BUY\", \"extra\": 1}").unwrap();
        assert_eq!(reply.action, "BUY");
    }
}
