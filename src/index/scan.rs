use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::{Offer, RegionHierarchy, Result};
use crate::index::{check_leaf, next_slot, OfferStore, Poison};
use crate::query::{DurationPolicy, FacetAccumulator, MandatoryFilter, SearchQuery, SearchResponse};
use crate::stats::StoreStats;

/// 平铺列表：查询时把 region 展开成叶子集合再全表过滤。
/// 没有派生索引，作为其它实现的对照基线。
pub struct ScanStore {
    hierarchy: Arc<RegionHierarchy>,
    policy: DurationPolicy,
    offers: RwLock<Vec<Offer>>,
    poison: Poison,
}

impl ScanStore {
    pub fn new(hierarchy: Arc<RegionHierarchy>, policy: DurationPolicy) -> Self {
        Self {
            hierarchy,
            policy,
            offers: RwLock::new(Vec::new()),
            poison: Poison::default(),
        }
    }

    fn leaf_set(&self, region_id: u64) -> Result<HashSet<u64>> {
        Ok(self.hierarchy.leaves_under(region_id)?.iter().copied().collect())
    }
}

impl OfferStore for ScanStore {
    fn name(&self) -> &'static str {
        "scan"
    }

    fn ingest(&self, offers: Vec<Offer>) -> Result<usize> {
        for offer in &offers {
            check_leaf(&self.hierarchy, offer)?;
        }

        let mut all = self.offers.write();
        self.poison.check(self.name());
        let _armed = self.poison.arm();

        let n = offers.len();
        next_slot(all.len() + n)?;
        all.extend(offers);
        tracing::debug!("scan store: ingested {} offers (total {})", n, all.len());
        Ok(n)
    }

    fn query(&self, query: &SearchQuery) -> Result<SearchResponse> {
        let leaves = self.leaf_set(query.region_id)?;
        let all = self.offers.read();
        self.poison.check(self.name());

        let mandatory = MandatoryFilter::for_query(query, self.policy);
        let mut acc = FacetAccumulator::for_query(query)?;
        for offer in all.iter() {
            if leaves.contains(&offer.most_specific_region_id) && mandatory.matches(offer) {
                acc.add(offer, query.filters.evaluate(offer));
            }
        }
        Ok(acc.finish(query))
    }

    fn offers_in_region(&self, region_id: u64) -> Result<Vec<Offer>> {
        let leaves = self.leaf_set(region_id)?;
        let all = self.offers.read();
        self.poison.check(self.name());
        Ok(all
            .iter()
            .filter(|o| leaves.contains(&o.most_specific_region_id))
            .cloned()
            .collect())
    }

    fn clear(&self) {
        let mut all = self.offers.write();
        self.poison.check(self.name());
        let _armed = self.poison.arm();
        all.clear();
    }

    fn list_all(&self) -> Vec<Offer> {
        let all = self.offers.read();
        self.poison.check(self.name());
        all.clone()
    }

    fn len(&self) -> usize {
        let all = self.offers.read();
        self.poison.check(self.name());
        all.len()
    }

    fn stats(&self) -> StoreStats {
        let all = self.offers.read();
        self.poison.check(self.name());
        StoreStats::new(self.name(), all.len(), &all)
    }

    #[cfg(test)]
    fn panic_while_writing(&self) {
        let _guard = self.offers.write();
        let _armed = self.poison.arm();
        panic!("{}: injected panic under write lock", self.name());
    }
}
