use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::core::{CarType, Offer, OfferBatch, Result, SearchError};
use crate::index::OfferCatalog;
use crate::query::request::{OptionalFilters, SearchQuery, SortOrder};
use crate::query::response::SearchResponse;
use crate::stats::StoreStats;

/// GET /api/offers 的查询参数（名字与线上接口一致）
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    #[serde(rename = "regionID")]
    pub region_id: u64,
    pub time_range_start: u64,
    pub time_range_end: u64,
    pub number_days: u64,
    pub sort_order: String,
    pub page: u64,
    pub page_size: u64,
    pub price_range_width: u64,
    pub min_free_kilometer_width: u64,
    pub min_number_seats: Option<u32>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub car_type: Option<String>,
    pub only_vollkasko: Option<bool>,
    pub min_free_kilometer: Option<u64>,
}

impl TryFrom<SearchParams> for SearchQuery {
    type Error = SearchError;

    fn try_from(p: SearchParams) -> Result<Self> {
        let sort_order: SortOrder = p.sort_order.parse()?;
        let car_type = p.car_type.as_deref().map(str::parse::<CarType>).transpose()?;

        Ok(SearchQuery::new(p.region_id, p.time_range_start, p.time_range_end, p.number_days)
            .sorted(sort_order)
            .paged(p.page, p.page_size)
            .bucket_widths(p.price_range_width, p.min_free_kilometer_width)
            .with_filters(OptionalFilters {
                min_seats: p.min_number_seats,
                min_price: p.min_price,
                max_price: p.max_price,
                car_type,
                only_vollkasko: p.only_vollkasko,
                min_free_km: p.min_free_kilometer,
            }))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let status = match &self {
            SearchError::NotFound(_) => StatusCode::NOT_FOUND,
            SearchError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            SearchError::PreconditionFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

pub struct QueryServer {
    pub catalog: Arc<OfferCatalog>,
}

impl QueryServer {
    pub fn new(catalog: Arc<OfferCatalog>) -> Self {
        Self { catalog }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route(
                "/api/offers",
                get(search_handler).post(create_handler).delete(delete_handler),
            )
            .route("/api/offers/all", get(list_handler))
            .route("/status", get(status_handler))
            .with_state(self.catalog.clone())
    }

    pub async fn run(self, port: u16) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
        self.serve(listener, shutdown_signal()).await
    }

    pub async fn serve<F>(self, listener: tokio::net::TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!("HTTP Query Server listening on {}", listener.local_addr()?);
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down...");
}

async fn search_handler(
    Query(params): Query<SearchParams>,
    State(catalog): State<Arc<OfferCatalog>>,
) -> Result<Json<SearchResponse>> {
    let query = SearchQuery::try_from(params)?;
    let resp = catalog.query(&query)?;
    tracing::debug!(
        "search region={} page={} returned {} offers",
        query.region_id,
        query.page,
        resp.offers.len()
    );
    Ok(Json(resp))
}

async fn create_handler(
    State(catalog): State<Arc<OfferCatalog>>,
    Json(batch): Json<OfferBatch>,
) -> Result<&'static str> {
    catalog.ingest(batch.offers)?;
    Ok("Offer created")
}

async fn delete_handler(State(catalog): State<Arc<OfferCatalog>>) -> Result<&'static str> {
    catalog.clear()?;
    Ok("All offers deleted")
}

async fn list_handler(State(catalog): State<Arc<OfferCatalog>>) -> Result<Json<Vec<Offer>>> {
    Ok(Json(catalog.list_all()?))
}

async fn status_handler(State(catalog): State<Arc<OfferCatalog>>) -> Result<Json<StoreStats>> {
    let stats = catalog.stats()?;
    Ok(Json(stats))
}
