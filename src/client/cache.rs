//! 键值缓存
//!
//! 每条记录带写入时间和过期时长，读取时惰性淘汰

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// 默认过期时长
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    pub timestamp: Instant,
    pub ttl: Duration,
}

impl<T> CacheEntry<T> {
    /// `now - timestamp < ttl` 时有效
    pub fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.timestamp) < self.ttl
    }
}

#[derive(Debug)]
pub struct Cache<T> {
    entries: HashMap<String, CacheEntry<T>>,
    default_ttl: Duration,
}

impl<T: Clone> Default for Cache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<T: Clone> Cache<T> {
    pub fn new(default_ttl: Duration) -> Self {
        Self { entries: HashMap::new(), default_ttl }
    }

    /// 读取未过期的记录，过期记录在此处删除
    pub fn get(&mut self, key: &str) -> Option<T> {
        let fresh = self.entries.get(key)?.is_fresh(Instant::now());
        if !fresh {
            self.entries.remove(key);
            log::debug!("缓存过期: {}", key);
            return None;
        }
        self.entries.get(key).map(|e| e.data.clone())
    }

    pub fn set(&mut self, key: impl Into<String>, data: T) {
        let ttl = self.default_ttl;
        self.set_with_ttl(key, data, ttl);
    }

    /// 覆盖写入并重置计时
    pub fn set_with_ttl(&mut self, key: impl Into<String>, data: T, ttl: Duration) {
        self.entries.insert(
            key.into(),
            CacheEntry { data, timestamp: Instant::now(), ttl },
        );
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// 当前记录数（含尚未淘汰的过期记录）
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
