//! 行情与信号状态
//!
//! 由命令行持有，通过 `&mut` 传给聚合器和信号生成

use std::time::Duration;

use super::cache::Cache;
use crate::models::{Asset, Signal};

/// 客户端状态
#[derive(Debug)]
pub struct MarketStore {
    /// 行情缓存
    pub cache: Cache<Vec<Asset>>,
    /// 最近一次完整加载的股票列表
    pub stocks: Vec<Asset>,
    /// 已生成的信号
    pub signals: SignalBoard,
}

impl MarketStore {
    pub fn new(cache_ttl: Duration) -> Self {
        Self {
            cache: Cache::new(cache_ttl),
            stocks: Vec::new(),
            signals: SignalBoard::default(),
        }
    }

    /// 已加载列表中的记录
    pub fn known_stock(&self, symbol: &str) -> Option<&Asset> {
        self.stocks.iter().find(|a| a.symbol == symbol)
    }
}

impl Default for MarketStore {
    fn default() -> Self {
        Self::new(super::cache::DEFAULT_TTL)
    }
}

/// 信号列表，新信号在前，每个代码只保留一条
#[derive(Debug, Default)]
pub struct SignalBoard {
    signals: Vec<Signal>,
}

impl SignalBoard {
    /// 同一代码原位替换，否则插到最前
    pub fn upsert(&mut self, signal: Signal) {
        match self.signals.iter_mut().find(|s| s.symbol == signal.symbol) {
            Some(existing) => *existing = signal,
            None => self.signals.insert(0, signal),
        }
    }

    /// 整体替换（扫描结果）
    pub fn replace_all(&mut self, signals: Vec<Signal>) {
        self.signals = signals;
    }

    pub fn list(&self) -> &[Signal] {
        &self.signals
    }

    pub fn get(&self, symbol: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.symbol == symbol)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn clear(&mut self) {
        self.signals.clear();
    }
}
