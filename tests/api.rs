use std::sync::Arc;

use offer_search::core::{Region, RegionHierarchy};
use offer_search::index::{OfferCatalog, StoreKind};
use offer_search::query::{DurationPolicy, QueryServer, SearchResponse};
use serde_json::json;
use tokio::sync::oneshot;

const DAY: u64 = 86_400_000;
const A: &str = "00000000-0000-0000-0000-00000000000a";
const B: &str = "00000000-0000-0000-0000-00000000000b";

fn regions() -> Arc<RegionHierarchy> {
    let tree = Region::inner(
        0,
        "root",
        vec![
            Region::inner(1, "north", vec![Region::leaf(3, "n-a"), Region::leaf(4, "n-b")]),
            Region::leaf(2, "south"),
        ],
    );
    Arc::new(RegionHierarchy::new(&tree).unwrap())
}

struct Harness {
    base: String,
    client: reqwest::Client,
    stop: Option<oneshot::Sender<()>>,
}

impl Drop for Harness {
    fn drop(&mut self) {
        if let Some(tx) = self.stop.take() {
            let _ = tx.send(());
        }
    }
}

async fn start(catalog: Arc<OfferCatalog>) -> Harness {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(QueryServer::new(catalog).serve(listener, async move {
        let _ = rx.await;
    }));
    Harness {
        base: format!("http://{}", addr),
        client: reqwest::Client::new(),
        stop: Some(tx),
    }
}

fn offers_body() -> serde_json::Value {
    json!({
        "offers": [
            {
                "ID": A, "data": "offer-a", "mostSpecificRegionID": 3,
                "startDate": 0, "endDate": DAY, "numberSeats": 4, "price": 100,
                "carType": "small", "hasVollkasko": true, "freeKilometers": 50
            },
            {
                "ID": B, "data": "offer-b", "mostSpecificRegionID": 3,
                "startDate": 0, "endDate": DAY, "numberSeats": 2, "price": 200,
                "carType": "sports", "hasVollkasko": false, "freeKilometers": 10
            }
        ]
    })
}

fn search_params(extra: &[(&str, &str)]) -> Vec<(String, String)> {
    let day = DAY.to_string();
    let mut p: Vec<(String, String)> = [
        ("regionID", "1"),
        ("timeRangeStart", "0"),
        ("timeRangeEnd", day.as_str()),
        ("numberDays", "1"),
        ("sortOrder", "price-asc"),
        ("page", "0"),
        ("pageSize", "10"),
        ("priceRangeWidth", "100"),
        ("minFreeKilometerWidth", "50"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    p.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    p
}

#[tokio::test]
async fn create_search_and_delete_roundtrip() {
    let catalog = Arc::new(OfferCatalog::with_regions(
        StoreKind::Bucketed,
        DurationPolicy::Exact,
        regions(),
    ));
    let h = start(catalog).await;

    let resp = h
        .client
        .post(format!("{}/api/offers", h.base))
        .json(&offers_body())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp: SearchResponse = h
        .client
        .get(format!("{}/api/offers", h.base))
        .query(&search_params(&[]))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(resp.offer_ids(), vec![A, B]);
    assert_eq!(resp.offers[0].data, "offer-a");
    assert_eq!(resp.vollkasko_count.true_count, 1);
    assert_eq!(resp.vollkasko_count.false_count, 1);

    let resp: SearchResponse = h
        .client
        .get(format!("{}/api/offers", h.base))
        .query(&search_params(&[("onlyVollkasko", "true")]))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(resp.offer_ids(), vec![A]);
    assert_eq!(resp.car_type_counts.small, 1);
    assert_eq!(resp.car_type_counts.sports, 0);
    assert_eq!(resp.vollkasko_count.true_count, 1);
    assert_eq!(resp.vollkasko_count.false_count, 1);

    let all: serde_json::Value = h
        .client
        .get(format!("{}/api/offers/all", h.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.as_array().map(Vec::len), Some(2));

    let resp = h
        .client
        .delete(format!("{}/api/offers", h.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp: SearchResponse = h
        .client
        .get(format!("{}/api/offers", h.base))
        .query(&search_params(&[]))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(resp.offers.is_empty());
    assert!(resp.price_ranges.is_empty());
}

#[tokio::test]
async fn error_statuses() {
    let catalog = Arc::new(OfferCatalog::new(StoreKind::Bitmask, DurationPolicy::Exact));
    let h = start(catalog.clone()).await;

    // 区域树未挂载
    let resp = h
        .client
        .get(format!("{}/api/offers", h.base))
        .query(&search_params(&[]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);

    catalog.attach_regions(regions());

    let mut bad = offers_body();
    bad["offers"][1]["carType"] = json!("tractor");
    let resp = h
        .client
        .post(format!("{}/api/offers", h.base))
        .json(&bad)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let mut params = search_params(&[]);
    params[0].1 = "99".into();
    let resp = h
        .client
        .get(format!("{}/api/offers", h.base))
        .query(&params)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let mut params = search_params(&[]);
    params[8].1 = "0".into();
    let resp = h
        .client
        .get(format!("{}/api/offers", h.base))
        .query(&params)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // 缺少 regionID：axum 的 Query 提取失败
    let params = search_params(&[]);
    let resp = h
        .client
        .get(format!("{}/api/offers", h.base))
        .query(&params[1..])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let status: serde_json::Value = h
        .client
        .get(format!("{}/status", h.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["store"], "bitmask");
    assert_eq!(status["offer_count"], 0);
}
