//! 命令行本地存储
//!
//! 所有键保存在一个 JSON 文件中，实际键名带统一前缀。
//! 每条记录为 `{"value": ..., "expiry": 毫秒时间戳}`，`expiry` 可省略

use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// API key 的存储键
pub const API_KEY: &str = "api_key";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredItem {
    value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expiry: Option<i64>,
}

impl StoredItem {
    fn is_expired(&self, now_ms: i64) -> bool {
        self.expiry.is_some_and(|expiry| now_ms > expiry)
    }
}

pub struct ClientStorage {
    path: PathBuf,
    prefix: String,
}

impl ClientStorage {
    pub fn new(path: impl AsRef<Path>, prefix: impl Into<String>) -> Self {
        Self { path: path.as_ref().to_path_buf(), prefix: prefix.into() }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    fn load(&self) -> anyhow::Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("读取存储文件失败: {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, map: &Map<String, Value>) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(map)?;
        fs::write(&self.path, content)
            .with_context(|| format!("写入存储文件失败: {}", self.path.display()))
    }

    /// 读取记录，过期记录在此处删除
    pub fn get(&self, key: &str) -> anyhow::Result<Option<Value>> {
        let full_key = self.full_key(key);
        let mut map = self.load()?;
        let Some(raw) = map.get(&full_key) else {
            return Ok(None);
        };

        let item = match serde_json::from_value::<StoredItem>(raw.clone()) {
            Ok(item) => item,
            // 没有包装的旧格式，原样返回
            Err(_) => return Ok(Some(raw.clone())),
        };

        if item.is_expired(Utc::now().timestamp_millis()) {
            log::debug!("存储项已过期: {}", full_key);
            map.remove(&full_key);
            self.save(&map)?;
            return Ok(None);
        }
        Ok(Some(item.value))
    }

    /// 读取字符串记录
    pub fn get_string(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.get(key)?.and_then(|v| v.as_str().map(str::to_string)))
    }

    pub fn set(&self, key: &str, value: impl Serialize, expiry: Option<Duration>) -> anyhow::Result<()> {
        let mut map = self.load()?;
        let item = StoredItem {
            value: serde_json::to_value(value)?,
            expiry: expiry.map(|ttl| Utc::now().timestamp_millis() + ttl.as_millis() as i64),
        };
        map.insert(self.full_key(key), serde_json::to_value(item)?);
        self.save(&map)
    }

    pub fn remove(&self, key: &str) -> anyhow::Result<()> {
        let mut map = self.load()?;
        if map.remove(&self.full_key(key)).is_some() {
            self.save(&map)?;
        }
        Ok(())
    }

    /// 只删除带本前缀的键
    pub fn clear(&self) -> anyhow::Result<()> {
        let mut map = self.load()?;
        map.retain(|k, _| !k.starts_with(&self.prefix));
        self.save(&map)
    }

    /// 是否存在（不检查过期）
    pub fn has(&self, key: &str) -> anyhow::Result<bool> {
        Ok(self.load()?.contains_key(&self.full_key(key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("finai_storage_{}_{}.json", name, std::process::id()));
        let _ = fs::remove_file(&path);
        path
    }

    #[test]
    fn test_set_get_remove() {
        let path = temp_path("basic");
        let storage = ClientStorage::new(&path, "finai_");

        storage.set(API_KEY, "sk-test", None).unwrap();
        assert!(storage.has(API_KEY).unwrap());
        assert_eq!(storage.get_string(API_KEY).unwrap().as_deref(), Some("sk-test"));

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["finai_api_key"]["value"], "sk-test");

        storage.remove(API_KEY).unwrap();
        assert!(storage.get(API_KEY).unwrap().is_none());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_expired_item_is_purged() {
        let path = temp_path("expiry");
        let storage = ClientStorage::new(&path, "finai_");

        storage.set("timeframe", "short", Some(Duration::ZERO)).unwrap();
        std::thread::sleep(Duration::from_millis(5));

        assert!(storage.get("timeframe").unwrap().is_none());
        assert!(!storage.has("timeframe").unwrap());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_clear_keeps_other_prefixes() {
        let path = temp_path("clear");
        let ours = ClientStorage::new(&path, "finai_");
        let theirs = ClientStorage::new(&path, "other_");

        ours.set(API_KEY, "sk-test", None).unwrap();
        theirs.set("theme", "dark", None).unwrap();
        ours.clear().unwrap();

        assert!(!ours.has(API_KEY).unwrap());
        assert_eq!(theirs.get_string("theme").unwrap().as_deref(), Some("dark"));
        let _ = fs::remove_file(&path);
    }
}
