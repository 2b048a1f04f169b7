//! 测试夹具：固定区域树 + offer 构造器

use uuid::Uuid;

use crate::core::{CarType, Offer, Region, MILLIS_PER_DAY};

/// ```text
/// 0 root
/// ├── 1 north ── 3, 4
/// └── 2 south ── 5, 6
/// ```
pub fn sample_tree() -> Region {
    Region::inner(
        0,
        "root",
        vec![
            Region::inner(1, "north", vec![Region::leaf(3, "n-a"), Region::leaf(4, "n-b")]),
            Region::inner(2, "south", vec![Region::leaf(5, "s-a"), Region::leaf(6, "s-b")]),
        ],
    )
}

/// 以 u128 生成可读的确定性 UUID（方便断言排序）
pub fn uid(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

pub struct OfferSpec {
    pub id: u128,
    pub region: u64,
    pub start: u64,
    pub days: u64,
    pub seats: u32,
    pub price: u64,
    pub car_type: CarType,
    pub vollkasko: bool,
    pub free_km: u64,
}

impl Default for OfferSpec {
    fn default() -> Self {
        Self {
            id: 1,
            region: 3,
            start: 0,
            days: 1,
            seats: 4,
            price: 100,
            car_type: CarType::Small,
            vollkasko: false,
            free_km: 0,
        }
    }
}

impl OfferSpec {
    pub fn build(self) -> Offer {
        Offer::new(
            uid(self.id),
            format!("data-{}", self.id),
            self.region,
            self.start,
            self.start + self.days * MILLIS_PER_DAY,
            self.seats,
            self.price,
            self.car_type,
            self.vollkasko,
            self.free_km,
        )
        .unwrap()
    }
}

/// 两条基准 offer：A(small, 4 座, 全险, 100, 50km) 与 B(sports, 2 座, 无全险, 200, 10km)
pub fn offer_a() -> Offer {
    OfferSpec {
        id: 0xA,
        price: 100,
        car_type: CarType::Small,
        seats: 4,
        vollkasko: true,
        free_km: 50,
        ..Default::default()
    }
    .build()
}

pub fn offer_b() -> Offer {
    OfferSpec {
        id: 0xB,
        price: 200,
        car_type: CarType::Sports,
        seats: 2,
        vollkasko: false,
        free_km: 10,
        ..Default::default()
    }
    .build()
}
