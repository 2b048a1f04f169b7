use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{CarType, Offer, Result, SearchError};
use crate::query::facets::{Predicate, PredicateMask};

/// 结果排序：价格升/降序，同价按 id 升序
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "price-asc")]
    PriceAsc,
    #[serde(rename = "price-desc")]
    PriceDesc,
}

impl FromStr for SortOrder {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "price-asc" => Ok(SortOrder::PriceAsc),
            "price-desc" => Ok(SortOrder::PriceDesc),
            other => Err(SearchError::invalid(format!("unknown sort order '{}'", other))),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::PriceAsc => f.write_str("price-asc"),
            SortOrder::PriceDesc => f.write_str("price-desc"),
        }
    }
}

/// 可选过滤条件；None 视为恒真
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OptionalFilters {
    pub min_seats: Option<u32>,
    pub min_price: Option<u64>,
    /// 开区间上界：price < max_price
    pub max_price: Option<u64>,
    pub car_type: Option<CarType>,
    /// 仅 Some(true) 收窄结果；false/None 不过滤非全险 offer
    pub only_vollkasko: Option<bool>,
    pub min_free_km: Option<u64>,
}

impl OptionalFilters {
    pub fn seats_ok(&self, seats: u32) -> bool {
        self.min_seats.map_or(true, |min| seats >= min)
    }

    pub fn price_ok(&self, price: u64) -> bool {
        self.min_price.map_or(true, |min| price >= min)
            && self.max_price.map_or(true, |max| price < max)
    }

    pub fn car_type_ok(&self, car_type: CarType) -> bool {
        self.car_type.map_or(true, |wanted| car_type == wanted)
    }

    pub fn vollkasko_ok(&self, has_vollkasko: bool) -> bool {
        !self.requires_vollkasko() || has_vollkasko
    }

    pub fn free_km_ok(&self, free_km: u64) -> bool {
        self.min_free_km.map_or(true, |min| free_km >= min)
    }

    pub fn requires_vollkasko(&self) -> bool {
        self.only_vollkasko == Some(true)
    }

    /// 每条 offer 只求值一次五个谓词，结果压成位掩码
    pub fn evaluate(&self, offer: &Offer) -> PredicateMask {
        let mut mask = 0;
        if self.seats_ok(offer.number_seats) {
            mask |= Predicate::Seats.bit();
        }
        if self.price_ok(offer.price) {
            mask |= Predicate::Price.bit();
        }
        if self.car_type_ok(offer.car_type) {
            mask |= Predicate::CarType.bit();
        }
        if self.vollkasko_ok(offer.has_vollkasko) {
            mask |= Predicate::Vollkasko.bit();
        }
        if self.free_km_ok(offer.free_kilometers) {
            mask |= Predicate::FreeKm.bit();
        }
        mask
    }
}

/// 一次搜索请求（HTTP 层解析后交给引擎）
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchQuery {
    pub region_id: u64,
    pub window_start: u64,
    pub window_end: u64,
    pub required_days: u64,
    pub sort_order: SortOrder,
    pub page: u64,
    pub page_size: u64,
    pub price_bucket_width: u64,
    pub free_km_bucket_width: u64,
    pub filters: OptionalFilters,
}

impl SearchQuery {
    pub fn new(region_id: u64, window_start: u64, window_end: u64, required_days: u64) -> Self {
        Self {
            region_id,
            window_start,
            window_end,
            required_days,
            sort_order: SortOrder::PriceAsc,
            page: 0,
            page_size: 100,
            price_bucket_width: 1000,
            free_km_bucket_width: 100,
            filters: OptionalFilters::default(),
        }
    }

    pub fn sorted(mut self, order: SortOrder) -> Self {
        self.sort_order = order;
        self
    }

    pub fn paged(mut self, page: u64, page_size: u64) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    pub fn bucket_widths(mut self, price: u64, free_km: u64) -> Self {
        self.price_bucket_width = price;
        self.free_km_bucket_width = free_km;
        self
    }

    pub fn with_filters(mut self, filters: OptionalFilters) -> Self {
        self.filters = filters;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::{offer_a, offer_b};
    use crate::query::facets::ALL_PREDICATES;

    #[test]
    fn unset_filters_accept_everything() {
        let f = OptionalFilters::default();
        assert_eq!(f.evaluate(&offer_a()), ALL_PREDICATES);
        assert_eq!(f.evaluate(&offer_b()), ALL_PREDICATES);
    }

    #[test]
    fn price_range_is_half_open() {
        let f = OptionalFilters {
            min_price: Some(100),
            max_price: Some(200),
            ..Default::default()
        };
        assert!(f.price_ok(100));
        assert!(f.price_ok(199));
        assert!(!f.price_ok(200));
        assert!(!f.price_ok(99));
    }

    #[test]
    fn vollkasko_false_does_not_filter() {
        let f = OptionalFilters {
            only_vollkasko: Some(false),
            ..Default::default()
        };
        assert!(f.vollkasko_ok(false));
        assert!(f.vollkasko_ok(true));

        let f = OptionalFilters {
            only_vollkasko: Some(true),
            ..Default::default()
        };
        assert!(!f.vollkasko_ok(false));
        assert!(f.vollkasko_ok(true));
    }

    #[test]
    fn evaluate_sets_only_passing_bits() {
        let f = OptionalFilters {
            min_seats: Some(3),
            car_type: Some(CarType::Small),
            ..Default::default()
        };
        let mask = f.evaluate(&offer_b());
        assert_eq!(mask & Predicate::Seats.bit(), 0);
        assert_eq!(mask & Predicate::CarType.bit(), 0);
        assert_ne!(mask & Predicate::Price.bit(), 0);
        assert_eq!(f.evaluate(&offer_a()), ALL_PREDICATES);
    }

    #[test]
    fn sort_order_parses_wire_names() {
        assert_eq!("price-desc".parse::<SortOrder>().unwrap(), SortOrder::PriceDesc);
        assert!("cheapest".parse::<SortOrder>().is_err());
    }
}
