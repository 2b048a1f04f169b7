use serde::{Deserialize, Serialize};

use crate::core::{CarType, Offer};

/// 直方图桶 [start, end)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramRange {
    pub start: u64,
    pub end: u64,
    pub count: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarTypeCounts {
    pub small: u64,
    pub sports: u64,
    pub luxury: u64,
    pub family: u64,
}

impl CarTypeCounts {
    pub fn from_tally(tally: [u64; 4]) -> Self {
        Self {
            small: tally[CarType::Small.index()],
            sports: tally[CarType::Sports.index()],
            luxury: tally[CarType::Luxury.index()],
            family: tally[CarType::Family.index()],
        }
    }

    pub fn total(&self) -> u64 {
        self.small + self.sports + self.luxury + self.family
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatsCount {
    pub number_seats: u32,
    pub count: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VollkaskoCount {
    pub true_count: u64,
    pub false_count: u64,
}

/// 结果页中的一条 offer：只回传 id 与原始 payload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferHit {
    #[serde(rename = "ID")]
    pub id: String,
    pub data: String,
}

impl From<&Offer> for OfferHit {
    fn from(offer: &Offer) -> Self {
        Self {
            id: offer.id.hyphenated().to_string(),
            data: offer.data.clone(),
        }
    }
}

/// GET /api/offers 响应。每次查询新建，不缓存。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub offers: Vec<OfferHit>,
    pub price_ranges: Vec<HistogramRange>,
    pub car_type_counts: CarTypeCounts,
    pub seats_count: Vec<SeatsCount>,
    #[serde(rename = "freeKilometerRange")]
    pub free_kilometer_ranges: Vec<HistogramRange>,
    pub vollkasko_count: VollkaskoCount,
}

impl SearchResponse {
    pub fn offer_ids(&self) -> Vec<&str> {
        self.offers.iter().map(|o| o.id.as_str()).collect()
    }
}
