use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::core::{NewOffer, Offer, RegionHierarchy, Result, SearchError};
use crate::index::{OfferStore, StoreKind};
use crate::query::{DurationPolicy, SearchQuery, SearchResponse};
use crate::stats::StoreStats;

/// 已挂载区域树对应的 store
struct Attached {
    store: Box<dyn OfferStore>,
}

/// 服务入口：持有启动时注入的存储策略。
///
/// 区域树挂载之前（`attach_regions` 未调用）所有读写都返回 `PreconditionFailed`。
/// 挂载是一次原子指针切换，读路径不加锁。
pub struct OfferCatalog {
    kind: StoreKind,
    policy: DurationPolicy,
    attached: ArcSwapOption<Attached>,
}

impl OfferCatalog {
    pub fn new(kind: StoreKind, policy: DurationPolicy) -> Self {
        Self {
            kind,
            policy,
            attached: ArcSwapOption::empty(),
        }
    }

    pub fn with_regions(kind: StoreKind, policy: DurationPolicy, hierarchy: Arc<RegionHierarchy>) -> Self {
        let catalog = Self::new(kind, policy);
        catalog.attach_regions(hierarchy);
        catalog
    }

    /// 挂载（或替换）区域树；替换时旧 store 连同其 offer 一起丢弃
    pub fn attach_regions(&self, hierarchy: Arc<RegionHierarchy>) {
        let store = self.kind.build(hierarchy.clone(), self.policy);
        tracing::info!(
            "Catalog attached: store={} duration_policy={} regions={} root={}",
            self.kind,
            self.policy,
            hierarchy.len(),
            hierarchy.name_of(hierarchy.root_id()).unwrap_or("?")
        );
        self.attached.store(Some(Arc::new(Attached { store })));
    }

    pub fn is_ready(&self) -> bool {
        self.attached.load().is_some()
    }

    fn attached(&self) -> Result<Arc<Attached>> {
        self.attached.load_full().ok_or_else(|| {
            SearchError::PreconditionFailed("region hierarchy has not been loaded yet".into())
        })
    }

    /// 校验原始 offer（id / 车型 / 时间），全部合法后才写入
    pub fn ingest(&self, batch: Vec<NewOffer>) -> Result<usize> {
        let att = self.attached()?;
        let offers = batch
            .into_iter()
            .map(Offer::try_from)
            .collect::<Result<Vec<_>>>()?;
        let n = att.store.ingest(offers)?;
        tracing::info!("Ingested {} offers (store total {})", n, att.store.len());
        Ok(n)
    }

    pub fn query(&self, query: &SearchQuery) -> Result<SearchResponse> {
        self.attached()?.store.query(query)
    }

    pub fn clear(&self) -> Result<()> {
        let att = self.attached()?;
        att.store.clear();
        tracing::info!("All offers deleted");
        Ok(())
    }

    pub fn list_all(&self) -> Result<Vec<Offer>> {
        Ok(self.attached()?.store.list_all())
    }

    pub fn stats(&self) -> Result<StoreStats> {
        Ok(self.attached()?.store.stats())
    }

    /// 文本报告；区域树未挂载时为 None
    pub fn report(&self) -> Option<String> {
        self.stats().ok().map(|s| s.to_string())
    }

    /// 定期 store 报告循环
    pub async fn report_loop(self: Arc<Self>, interval_secs: u64) {
        let period = std::time::Duration::from_secs(interval_secs);
        loop {
            tokio::time::sleep(period).await;
            match self.report() {
                Some(report) => tracing::info!("\n{}", report),
                None => tracing::debug!("Store report skipped: regions not loaded"),
            }
        }
    }
}
