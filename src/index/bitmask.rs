use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::{CarType, Offer, RegionHierarchy, Result, SearchError};
use crate::index::bitvec::BitVec;
use crate::index::{check_leaf, next_slot, OfferStore, Poison};
use crate::query::{
    DurationPolicy, FacetAccumulator, MandatoryFilter, OptionalFilters, Predicate, PredicateMask,
    SearchQuery, SearchResponse,
};
use crate::stats::StoreStats;

/// 列式位图索引：每个 (谓词, 取值) 一条位向量，第 i 位对应 slot i。
///
/// 不变量：
/// - 每次 ingest 结束后，所有向量长度都等于 offer 数
/// - 同一谓词的向量两两互斥、并集覆盖全部 slot（region 除外：按祖先链多选）
#[derive(Debug, Default)]
struct Columns {
    offers: Vec<Offer>,
    regions: HashMap<u64, BitVec>,
    car_types: [BitVec; 4],
    seats: BTreeMap<u32, BitVec>,
    days: BTreeMap<u64, BitVec>,
    /// hasVollkasko == true；false 侧取 NOT
    vollkasko: BitVec,
}

impl Columns {
    fn seeded(hierarchy: &RegionHierarchy) -> Self {
        Self {
            regions: hierarchy
                .region_ids()
                .iter()
                .map(|&id| (id, BitVec::new()))
                .collect(),
            ..Default::default()
        }
    }

    fn len(&self) -> usize {
        self.offers.len()
    }

    fn vectors_mut(&mut self) -> impl Iterator<Item = &mut BitVec> {
        self.regions
            .values_mut()
            .chain(self.car_types.iter_mut())
            .chain(self.seats.values_mut())
            .chain(self.days.values_mut())
            .chain(std::iter::once(&mut self.vollkasko))
    }

    fn vectors(&self) -> impl Iterator<Item = &BitVec> {
        self.regions
            .values()
            .chain(self.car_types.iter())
            .chain(self.seats.values())
            .chain(self.days.values())
            .chain(std::iter::once(&self.vollkasko))
    }

    fn region(&self, region_id: u64) -> Result<&BitVec> {
        self.regions
            .get(&region_id)
            .ok_or_else(|| SearchError::region_not_found(region_id))
    }

    /// 必选过滤中可位图化的部分：时长
    fn days_mask(&self, required: u64, policy: DurationPolicy) -> BitVec {
        let mut mask = BitVec::zeros(self.len());
        match policy {
            DurationPolicy::Exact => {
                if let Some(v) = self.days.get(&required) {
                    mask.or_assign(v);
                }
            }
            DurationPolicy::AtLeast => {
                for v in self.days.range(required..).map(|(_, v)| v) {
                    mask.or_assign(v);
                }
            }
        }
        mask
    }
}

/// 离散维度（座位、车型、全险）的谓词向量；None 表示该谓词未设置（恒真）
struct DiscreteMasks {
    seats: Option<BitVec>,
    car_type: Option<BitVec>,
    vollkasko: Option<BitVec>,
}

impl DiscreteMasks {
    fn build(cols: &Columns, filters: &OptionalFilters) -> Self {
        let seats = filters.min_seats.map(|min| {
            let mut m = BitVec::zeros(cols.len());
            for (_, v) in cols.seats.range(min..) {
                m.or_assign(v);
            }
            m
        });
        let car_type = filters
            .car_type
            .map(|ct: CarType| cols.car_types[ct.index()].clone());
        let vollkasko = filters
            .requires_vollkasko()
            .then(|| cols.vollkasko.clone());

        Self {
            seats,
            car_type,
            vollkasko,
        }
    }

    #[inline]
    fn evaluate(&self, slot: usize, offer: &Offer, filters: &OptionalFilters) -> PredicateMask {
        let hit = |m: &Option<BitVec>| m.as_ref().map_or(true, |v| v.get(slot));

        let mut mask = 0;
        if hit(&self.seats) {
            mask |= Predicate::Seats.bit();
        }
        if hit(&self.car_type) {
            mask |= Predicate::CarType.bit();
        }
        if hit(&self.vollkasko) {
            mask |= Predicate::Vollkasko.bit();
        }
        // 连续维度没有位图，直接按字段判断
        if filters.price_ok(offer.price) {
            mask |= Predicate::Price.bit();
        }
        if filters.free_km_ok(offer.free_kilometers) {
            mask |= Predicate::FreeKm.bit();
        }
        mask
    }
}

pub struct BitmaskStore {
    hierarchy: Arc<RegionHierarchy>,
    policy: DurationPolicy,
    inner: RwLock<Columns>,
    poison: Poison,
}

impl BitmaskStore {
    pub fn new(hierarchy: Arc<RegionHierarchy>, policy: DurationPolicy) -> Self {
        let inner = RwLock::new(Columns::seeded(&hierarchy));
        Self {
            hierarchy,
            policy,
            inner,
            poison: Poison::default(),
        }
    }
}

impl OfferStore for BitmaskStore {
    fn name(&self) -> &'static str {
        "bitmask"
    }

    fn ingest(&self, offers: Vec<Offer>) -> Result<usize> {
        for offer in &offers {
            check_leaf(&self.hierarchy, offer)?;
        }

        let mut cols = self.inner.write();
        self.poison.check(self.name());
        let _armed = self.poison.arm();

        let n = offers.len();
        for offer in offers {
            let slot = next_slot(cols.len())? as usize;
            for &region in self.hierarchy.ancestors_of(offer.most_specific_region_id)? {
                cols.regions.entry(region).or_default().set(slot, true);
            }
            cols.car_types[offer.car_type.index()].set(slot, true);
            cols.seats.entry(offer.number_seats).or_default().set(slot, true);
            cols.days.entry(offer.number_days()).or_default().set(slot, true);
            cols.vollkasko.set(slot, offer.has_vollkasko);
            cols.offers.push(offer);
        }

        // 把所有向量补齐到同一长度（新值的向量可能在本批才出现）
        let len = cols.len();
        for v in cols.vectors_mut() {
            v.resize(len);
        }

        tracing::debug!("bitmask store: ingested {} offers (total {})", n, len);
        Ok(n)
    }

    fn query(&self, query: &SearchQuery) -> Result<SearchResponse> {
        self.hierarchy.leaves_under(query.region_id)?;
        let cols = self.inner.read();
        self.poison.check(self.name());

        let mut base = cols.days_mask(query.required_days, self.policy);
        base.and_assign(cols.region(query.region_id)?);

        let mandatory = MandatoryFilter::for_query(query, self.policy);
        let masks = DiscreteMasks::build(&cols, &query.filters);
        let mut acc = FacetAccumulator::for_query(query)?;
        for slot in base.iter_ones() {
            let offer = &cols.offers[slot];
            if mandatory.window_ok(offer) {
                acc.add(offer, masks.evaluate(slot, offer, &query.filters));
            }
        }

        tracing::debug!(
            "bitmask query region={} candidates={} matched={}",
            query.region_id,
            base.count_ones(),
            acc.matched()
        );
        Ok(acc.finish(query))
    }

    fn offers_in_region(&self, region_id: u64) -> Result<Vec<Offer>> {
        self.hierarchy.leaves_under(region_id)?;
        let cols = self.inner.read();
        self.poison.check(self.name());
        Ok(cols
            .region(region_id)?
            .iter_ones()
            .map(|slot| cols.offers[slot].clone())
            .collect())
    }

    fn clear(&self) {
        let mut cols = self.inner.write();
        self.poison.check(self.name());
        let _armed = self.poison.arm();
        *cols = Columns::seeded(&self.hierarchy);
    }

    fn list_all(&self) -> Vec<Offer> {
        let cols = self.inner.read();
        self.poison.check(self.name());
        cols.offers.clone()
    }

    fn len(&self) -> usize {
        let cols = self.inner.read();
        self.poison.check(self.name());
        cols.len()
    }

    fn stats(&self) -> StoreStats {
        let cols = self.inner.read();
        self.poison.check(self.name());
        let (count, words) = cols
            .vectors()
            .fold((0usize, 0usize), |(c, w), v| (c + 1, w + v.word_count()));
        StoreStats::new(self.name(), cols.len(), &cols.offers)
            .with_index(count, words, (words * std::mem::size_of::<u64>()) as u64)
    }

    #[cfg(test)]
    fn panic_while_writing(&self) {
        let _guard = self.inner.write();
        let _armed = self.poison.arm();
        panic!("{}: injected panic under write lock", self.name());
    }
}
