use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::{Offer, RegionHierarchy, Result, SearchError};
use crate::index::{check_leaf, next_slot, OfferStore, Poison};
use crate::query::{DurationPolicy, FacetAccumulator, MandatoryFilter, SearchQuery, SearchResponse};
use crate::stats::StoreStats;

#[derive(Debug, Default)]
struct Buckets {
    /// slot → offer（arena，只追加）
    offers: Vec<Offer>,
    /// region id → slot 列表；内部节点包含所有后代叶子的 slot
    by_region: HashMap<u64, Vec<u32>>,
}

impl Buckets {
    fn seeded(hierarchy: &RegionHierarchy) -> Self {
        let by_region = hierarchy
            .region_ids()
            .iter()
            .map(|&id| (id, Vec::new()))
            .collect();
        Self {
            offers: Vec::new(),
            by_region,
        }
    }
}

/// 按区域分桶的内存存储：入库时把 offer 写进每个祖先 region 的桶，
/// 查询时直接取桶，不在查询链路遍历区域树。
pub struct RegionBucketStore {
    hierarchy: Arc<RegionHierarchy>,
    policy: DurationPolicy,
    inner: RwLock<Buckets>,
    poison: Poison,
}

impl RegionBucketStore {
    pub fn new(hierarchy: Arc<RegionHierarchy>, policy: DurationPolicy) -> Self {
        let inner = RwLock::new(Buckets::seeded(&hierarchy));
        Self {
            hierarchy,
            policy,
            inner,
            poison: Poison::default(),
        }
    }

    fn bucket<'a>(&self, b: &'a Buckets, region_id: u64) -> Result<&'a [u32]> {
        // 未知 id 以区域树的 NotFound 为准
        self.hierarchy.leaves_under(region_id)?;
        b.by_region
            .get(&region_id)
            .map(Vec::as_slice)
            .ok_or_else(|| SearchError::region_not_found(region_id))
    }
}

impl OfferStore for RegionBucketStore {
    fn name(&self) -> &'static str {
        "bucketed"
    }

    fn ingest(&self, offers: Vec<Offer>) -> Result<usize> {
        for offer in &offers {
            check_leaf(&self.hierarchy, offer)?;
        }

        let mut b = self.inner.write();
        self.poison.check(self.name());
        let _armed = self.poison.arm();

        let n = offers.len();
        b.offers.reserve(n);
        for offer in offers {
            let slot = next_slot(b.offers.len())?;
            for &region in self.hierarchy.ancestors_of(offer.most_specific_region_id)? {
                b.by_region.entry(region).or_default().push(slot);
            }
            b.offers.push(offer);
        }

        tracing::debug!("bucketed store: ingested {} offers (total {})", n, b.offers.len());
        Ok(n)
    }

    fn query(&self, query: &SearchQuery) -> Result<SearchResponse> {
        let b = self.inner.read();
        self.poison.check(self.name());

        let slots = self.bucket(&b, query.region_id)?;
        let mandatory = MandatoryFilter::for_query(query, self.policy);

        let mut acc = FacetAccumulator::for_query(query)?;
        for &slot in slots {
            let offer = &b.offers[slot as usize];
            if mandatory.matches(offer) {
                acc.add(offer, query.filters.evaluate(offer));
            }
        }

        tracing::debug!(
            "bucketed query region={} bucket={} matched={}",
            query.region_id,
            slots.len(),
            acc.matched()
        );
        Ok(acc.finish(query))
    }

    fn offers_in_region(&self, region_id: u64) -> Result<Vec<Offer>> {
        let b = self.inner.read();
        self.poison.check(self.name());
        let slots = self.bucket(&b, region_id)?;
        Ok(slots.iter().map(|&s| b.offers[s as usize].clone()).collect())
    }

    fn clear(&self) {
        let mut b = self.inner.write();
        self.poison.check(self.name());
        let _armed = self.poison.arm();
        *b = Buckets::seeded(&self.hierarchy);
    }

    fn list_all(&self) -> Vec<Offer> {
        let b = self.inner.read();
        self.poison.check(self.name());
        b.offers.clone()
    }

    fn len(&self) -> usize {
        let b = self.inner.read();
        self.poison.check(self.name());
        b.offers.len()
    }

    fn stats(&self) -> StoreStats {
        let b = self.inner.read();
        self.poison.check(self.name());
        let entries: usize = b.by_region.values().map(Vec::len).sum();
        StoreStats::new(self.name(), b.offers.len(), &b.offers)
            .with_index(b.by_region.len(), entries, (entries * std::mem::size_of::<u32>()) as u64)
    }

    #[cfg(test)]
    fn panic_while_writing(&self) {
        let _guard = self.inner.write();
        let _armed = self.poison.arm();
        panic!("{}: injected panic under write lock", self.name());
    }
}
