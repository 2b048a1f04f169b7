//! Leave-one-out 分面聚合。
//!
//! 五个可选谓词对每条 offer 只求值一次（压成 `PredicateMask`），
//! 然后按下表把 offer 路由到六个累加器：每个 facet 要求除自身维度外的全部谓词。
//!
//! | facet            | 排除的谓词 |
//! |------------------|-----------|
//! | price 直方图      | Price     |
//! | free-km 直方图    | FreeKm    |
//! | car type 计数     | CarType   |
//! | seats 计数        | Seats     |
//! | vollkasko 计数    | Vollkasko |
//! | 结果集            | (无)      |
//!
//! 六个累加器来自同一次遍历、同一个基集，计数彼此一致。

use std::collections::BTreeMap;

use crate::core::{Offer, Result};
use crate::query::bucketize::Bucketizer;
use crate::query::paginate::paginate;
use crate::query::request::SearchQuery;
use crate::query::response::{
    CarTypeCounts, OfferHit, SearchResponse, SeatsCount, VollkaskoCount,
};

pub type PredicateMask = u8;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Predicate {
    Seats,
    Price,
    CarType,
    Vollkasko,
    FreeKm,
}

impl Predicate {
    #[inline]
    pub const fn bit(self) -> PredicateMask {
        1 << (self as u8)
    }
}

pub const ALL_PREDICATES: PredicateMask = Predicate::Seats.bit()
    | Predicate::Price.bit()
    | Predicate::CarType.bit()
    | Predicate::Vollkasko.bit()
    | Predicate::FreeKm.bit();

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Facet {
    PriceRanges,
    FreeKmRanges,
    CarTypes,
    Seats,
    Vollkasko,
    Results,
}

impl Facet {
    pub const ALL: [Facet; 6] = [
        Facet::PriceRanges,
        Facet::FreeKmRanges,
        Facet::CarTypes,
        Facet::Seats,
        Facet::Vollkasko,
        Facet::Results,
    ];

    /// 该 facet 自身对应的维度（结果集没有）
    pub const fn own_dimension(self) -> Option<Predicate> {
        match self {
            Facet::PriceRanges => Some(Predicate::Price),
            Facet::FreeKmRanges => Some(Predicate::FreeKm),
            Facet::CarTypes => Some(Predicate::CarType),
            Facet::Seats => Some(Predicate::Seats),
            Facet::Vollkasko => Some(Predicate::Vollkasko),
            Facet::Results => None,
        }
    }

    pub const fn required(self) -> PredicateMask {
        match self.own_dimension() {
            Some(p) => ALL_PREDICATES & !p.bit(),
            None => ALL_PREDICATES,
        }
    }

    #[inline]
    pub const fn admits(self, satisfied: PredicateMask) -> bool {
        let req = self.required();
        satisfied & req == req
    }
}

/// 单遍聚合的六个累加器
#[derive(Debug)]
pub struct FacetAccumulator<'a> {
    prices: Bucketizer,
    free_km: Bucketizer,
    car_types: [u64; 4],
    seats: BTreeMap<u32, u64>,
    vollkasko: VollkaskoCount,
    results: Vec<&'a Offer>,
}

impl<'a> FacetAccumulator<'a> {
    /// 直方图宽度在这里校验：零宽直接失败，不做任何遍历
    pub fn new(price_bucket_width: u64, free_km_bucket_width: u64) -> Result<Self> {
        Ok(Self {
            prices: Bucketizer::new(price_bucket_width)?,
            free_km: Bucketizer::new(free_km_bucket_width)?,
            car_types: [0; 4],
            seats: BTreeMap::new(),
            vollkasko: VollkaskoCount::default(),
            results: Vec::new(),
        })
    }

    pub fn for_query(query: &SearchQuery) -> Result<Self> {
        Self::new(query.price_bucket_width, query.free_km_bucket_width)
    }

    /// 按掩码把一条 offer 路由到各累加器
    #[inline]
    pub fn add(&mut self, offer: &'a Offer, satisfied: PredicateMask) {
        if Facet::PriceRanges.admits(satisfied) {
            self.prices.add(offer.price);
        }
        if Facet::FreeKmRanges.admits(satisfied) {
            self.free_km.add(offer.free_kilometers);
        }
        if Facet::CarTypes.admits(satisfied) {
            self.car_types[offer.car_type.index()] += 1;
        }
        if Facet::Seats.admits(satisfied) {
            *self.seats.entry(offer.number_seats).or_insert(0) += 1;
        }
        if Facet::Vollkasko.admits(satisfied) {
            if offer.has_vollkasko {
                self.vollkasko.true_count += 1;
            } else {
                self.vollkasko.false_count += 1;
            }
        }
        if Facet::Results.admits(satisfied) {
            self.results.push(offer);
        }
    }

    pub fn matched(&self) -> usize {
        self.results.len()
    }

    pub fn finish(self, query: &SearchQuery) -> SearchResponse {
        let page = paginate(self.results, query.sort_order, query.page, query.page_size);

        SearchResponse {
            offers: page.into_iter().map(OfferHit::from).collect(),
            price_ranges: self.prices.finish(),
            car_type_counts: CarTypeCounts::from_tally(self.car_types),
            seats_count: self
                .seats
                .into_iter()
                .map(|(number_seats, count)| SeatsCount { number_seats, count })
                .collect(),
            free_kilometer_ranges: self.free_km.finish(),
            vollkasko_count: self.vollkasko,
        }
    }
}

/// 对必选过滤后的集合做完整聚合（谓词按 offer 字段直接求值）
#[cfg(test)]
pub fn aggregate<'a, I>(mandatory: I, query: &SearchQuery) -> Result<SearchResponse>
where
    I: IntoIterator<Item = &'a Offer>,
{
    let mut acc = FacetAccumulator::for_query(query)?;
    for offer in mandatory {
        acc.add(offer, query.filters.evaluate(offer));
    }
    Ok(acc.finish(query))
}
