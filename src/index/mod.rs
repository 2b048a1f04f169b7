pub mod bitmask;
pub mod bitvec;
pub mod bucketed;
pub mod catalog;
pub mod scan;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::{Offer, RegionHierarchy, Result, SearchError};
use crate::query::{DurationPolicy, SearchQuery, SearchResponse};
use crate::stats::StoreStats;

/// Offer 存储抽象：所有实现共享同一契约。
///
/// ## 契约
/// - 查询走读锁，可任意并发；`ingest` / `clear` 走写锁，互斥。
/// - `ingest` 为每条 offer 分配稳定 slot，slot 不复用；不按 id 去重。
/// - `offers_in_region` 对内部节点返回所有后代叶子的并集，不在查询时遍历树。
/// - `clear` 之后所有已知 region 仍可查询（空结果），不会 NotFound。
pub trait OfferStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// 返回本批写入条数
    fn ingest(&self, offers: Vec<Offer>) -> Result<usize>;

    fn query(&self, query: &SearchQuery) -> Result<SearchResponse>;

    fn offers_in_region(&self, region_id: u64) -> Result<Vec<Offer>>;

    fn clear(&self);

    /// 按入库顺序返回全部 offer（诊断用）
    fn list_all(&self) -> Vec<Offer>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stats(&self) -> StoreStats;

    /// 持写锁时 panic，用于验证中毒策略
    #[cfg(test)]
    fn panic_while_writing(&self);
}

/// 启动时选择的存储策略（显式注入，不走全局单例）
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum StoreKind {
    /// region → slot 桶
    #[default]
    Bucketed,
    /// 每个谓词取值一条位向量
    Bitmask,
    /// 平铺列表 + 叶子集合过滤
    Scan,
}

impl StoreKind {
    pub fn build(self, hierarchy: Arc<RegionHierarchy>, policy: DurationPolicy) -> Box<dyn OfferStore> {
        match self {
            StoreKind::Bucketed => Box::new(bucketed::RegionBucketStore::new(hierarchy, policy)),
            StoreKind::Bitmask => Box::new(bitmask::BitmaskStore::new(hierarchy, policy)),
            StoreKind::Scan => Box::new(scan::ScanStore::new(hierarchy, policy)),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Bucketed => f.write_str("bucketed"),
            StoreKind::Bitmask => f.write_str("bitmask"),
            StoreKind::Scan => f.write_str("scan"),
        }
    }
}

/// 入库前的 region 校验：mostSpecificRegionId 必须是已知叶子
pub(crate) fn check_leaf(hierarchy: &RegionHierarchy, offer: &Offer) -> Result<()> {
    if hierarchy.is_leaf(offer.most_specific_region_id) {
        return Ok(());
    }
    Err(SearchError::invalid(format!(
        "offer {}: region {} is not a leaf region",
        offer.id, offer.most_specific_region_id
    )))
}

pub(crate) fn next_slot(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| SearchError::PreconditionFailed("offer slot space exhausted".into()))
}

/// 写路径 panic 标记。
///
/// parking_lot 的锁不会中毒；写锁持有期间若 panic，内部结构可能只改了一半，
/// 之后任何访问都直接 panic（进程级致命），不复用可疑状态。
#[derive(Debug, Default)]
pub(crate) struct Poison(AtomicBool);

impl Poison {
    pub fn check(&self, store: &str) {
        if self.0.load(Ordering::Acquire) {
            panic!("offer store '{}' was poisoned by a panic during mutation", store);
        }
    }

    /// 在写锁内持有；drop 时若线程正在 panic 则置位
    pub fn arm(&self) -> PoisonOnPanic<'_> {
        PoisonOnPanic(&self.0)
    }
}

pub(crate) struct PoisonOnPanic<'a>(&'a AtomicBool);

impl Drop for PoisonOnPanic<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.store(true, Ordering::Release);
        }
    }
}

pub use bitmask::BitmaskStore;
pub use bitvec::BitVec;
pub use bucketed::RegionBucketStore;
pub use catalog::OfferCatalog;
pub use scan::ScanStore;
