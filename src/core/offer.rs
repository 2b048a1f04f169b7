use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::{Result, SearchError};

pub const MILLIS_PER_DAY: u64 = 86_400_000;

/// 车型：封闭的四值域，未知值在入库时拒绝
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarType {
    Small,
    Sports,
    Luxury,
    Family,
}

impl CarType {
    pub const ALL: [CarType; 4] = [
        CarType::Small,
        CarType::Sports,
        CarType::Luxury,
        CarType::Family,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CarType::Small => "small",
            CarType::Sports => "sports",
            CarType::Luxury => "luxury",
            CarType::Family => "family",
        }
    }

    /// 稠密下标（用于计数数组 / bit vector 数组）
    pub fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for CarType {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "small" => Ok(CarType::Small),
            "sports" => Ok(CarType::Sports),
            "luxury" => Ok(CarType::Luxury),
            "family" => Ok(CarType::Family),
            other => Err(SearchError::invalid(format!("unknown car type '{}'", other))),
        }
    }
}

impl fmt::Display for CarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 入库请求里的原始 offer（字段名与线上 JSON 保持一致，尚未校验）
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOffer {
    #[serde(rename = "ID")]
    pub id: String,
    pub data: String,
    #[serde(rename = "mostSpecificRegionID")]
    pub most_specific_region_id: u64,
    pub start_date: u64,
    pub end_date: u64,
    pub number_seats: u32,
    pub price: u64,
    pub car_type: String,
    pub has_vollkasko: bool,
    pub free_kilometers: u64,
}

/// POST /api/offers 的请求体
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OfferBatch {
    pub offers: Vec<NewOffer>,
}

/// 已校验的 offer。入库后不可变；number_days 在构造时计算一次。
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    #[serde(rename = "ID")]
    pub id: Uuid,
    pub data: String,
    #[serde(rename = "mostSpecificRegionID")]
    pub most_specific_region_id: u64,
    pub start_date: u64,
    pub end_date: u64,
    pub number_seats: u32,
    pub price: u64,
    pub car_type: CarType,
    pub has_vollkasko: bool,
    pub free_kilometers: u64,
    #[serde(skip)]
    number_days: u64,
}

impl Offer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Uuid,
        data: impl Into<String>,
        most_specific_region_id: u64,
        start_date: u64,
        end_date: u64,
        number_seats: u32,
        price: u64,
        car_type: CarType,
        has_vollkasko: bool,
        free_kilometers: u64,
    ) -> Result<Self> {
        if end_date <= start_date {
            return Err(SearchError::invalid(format!(
                "offer {}: endDate {} must be after startDate {}",
                id, end_date, start_date
            )));
        }

        Ok(Self {
            id,
            data: data.into(),
            most_specific_region_id,
            start_date,
            end_date,
            number_seats,
            price,
            car_type,
            has_vollkasko,
            free_kilometers,
            number_days: (end_date - start_date) / MILLIS_PER_DAY,
        })
    }

    /// 整天数（入库时缓存，查询路径不重算）
    pub fn number_days(&self) -> u64 {
        self.number_days
    }
}

impl TryFrom<NewOffer> for Offer {
    type Error = SearchError;

    fn try_from(raw: NewOffer) -> Result<Self> {
        let id = Uuid::parse_str(&raw.id)
            .map_err(|e| SearchError::invalid(format!("malformed offer id '{}': {}", raw.id, e)))?;
        let car_type = raw.car_type.parse::<CarType>()?;

        Offer::new(
            id,
            raw.data,
            raw.most_specific_region_id,
            raw.start_date,
            raw.end_date,
            raw.number_seats,
            raw.price,
            car_type,
            raw.has_vollkasko,
            raw.free_kilometers,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, car_type: &str) -> NewOffer {
        NewOffer {
            id: id.to_string(),
            data: "payload".to_string(),
            most_specific_region_id: 7,
            start_date: 0,
            end_date: 3 * MILLIS_PER_DAY + 5,
            number_seats: 4,
            price: 1999,
            car_type: car_type.to_string(),
            has_vollkasko: true,
            free_kilometers: 120,
        }
    }

    #[test]
    fn number_days_is_floored_and_cached() {
        let offer = Offer::try_from(raw("7f9c24e8-3b12-4fef-91e0-0a6f7f5a7e11", "family")).unwrap();
        assert_eq!(offer.number_days(), 3);
        assert_eq!(offer.car_type, CarType::Family);
    }

    #[test]
    fn unknown_car_type_rejected() {
        let err = Offer::try_from(raw("7f9c24e8-3b12-4fef-91e0-0a6f7f5a7e11", "truck")).unwrap_err();
        assert!(matches!(err, SearchError::InvalidArgument(_)));
    }

    #[test]
    fn malformed_id_rejected() {
        let err = Offer::try_from(raw("not-a-uuid", "small")).unwrap_err();
        assert!(matches!(err, SearchError::InvalidArgument(_)));
    }

    #[test]
    fn end_before_start_rejected() {
        let mut r = raw("7f9c24e8-3b12-4fef-91e0-0a6f7f5a7e11", "small");
        r.end_date = r.start_date;
        assert!(Offer::try_from(r).is_err());
    }

    #[test]
    fn wire_names_match_api() {
        let json = r#"{
            "ID": "7f9c24e8-3b12-4fef-91e0-0a6f7f5a7e11",
            "data": "x",
            "mostSpecificRegionID": 5,
            "startDate": 0,
            "endDate": 86400000,
            "numberSeats": 5,
            "price": 100,
            "carType": "luxury",
            "hasVollkasko": false,
            "freeKilometers": 10
        }"#;
        let parsed: NewOffer = serde_json::from_str(json).unwrap();
        let offer = Offer::try_from(parsed).unwrap();
        assert_eq!(offer.most_specific_region_id, 5);
        assert_eq!(offer.car_type, CarType::Luxury);
        assert_eq!(offer.number_days(), 1);

        let out = serde_json::to_value(&offer).unwrap();
        assert_eq!(out["carType"], "luxury");
        assert_eq!(out["ID"], "7f9c24e8-3b12-4fef-91e0-0a6f7f5a7e11");
    }
}
