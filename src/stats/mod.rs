use std::fmt;

use serde::Serialize;

use crate::core::Offer;

/// store 占用统计（估算值，按容量计）
#[derive(Clone, Debug, Default, Serialize)]
pub struct StoreStats {
    pub store: &'static str,
    pub offer_count: usize,
    /// Offer 结构体 + payload 字符串
    pub offer_bytes: u64,
    /// region 桶数 / 位向量条数
    pub index_keys: usize,
    /// 桶内 slot 总数 / 位向量字数
    pub index_entries: usize,
    pub index_bytes: u64,
}

impl StoreStats {
    pub fn new(store: &'static str, offer_count: usize, offers: &[Offer]) -> Self {
        let payload: u64 = offers.iter().map(|o| o.data.capacity() as u64).sum();
        Self {
            store,
            offer_count,
            offer_bytes: (offers.len() * std::mem::size_of::<Offer>()) as u64 + payload,
            ..Default::default()
        }
    }

    pub fn with_index(mut self, keys: usize, entries: usize, bytes: u64) -> Self {
        self.index_keys = keys;
        self.index_entries = entries;
        self.index_bytes = bytes;
        self
    }

    pub fn estimated_bytes(&self) -> u64 {
        self.offer_bytes + self.index_bytes
    }
}

pub fn human_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;
    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "╔══════════════════════════════════════════════════╗")?;
        writeln!(f, "║           offer-search Store Report              ║")?;
        writeln!(f, "╠══════════════════════════════════════════════════╣")?;
        writeln!(f, "║ store:          {:>10}                       ║", self.store)?;
        writeln!(
            f,
            "║ offers:         {:>10}  ({:>10})          ║",
            self.offer_count,
            human_bytes(self.offer_bytes)
        )?;
        writeln!(f, "╠──────────────────────────────────────────────────╣")?;
        writeln!(f, "║   index keys:   {:>10}                       ║", self.index_keys)?;
        writeln!(
            f,
            "║   index entries:{:>10}  ({:>10})          ║",
            self.index_entries,
            human_bytes(self.index_bytes)
        )?;
        writeln!(
            f,
            "║   total:        {:>10}                       ║",
            human_bytes(self.estimated_bytes())
        )?;
        writeln!(f, "╚══════════════════════════════════════════════════╝")?;
        Ok(())
    }
}
