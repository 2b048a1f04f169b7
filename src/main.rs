use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use offer_search::config::{Cli, Config};
use offer_search::core::RegionHierarchy;
use offer_search::index::OfferCatalog;
use offer_search::query::QueryServer;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(&cli)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()?
        .block_on(run(config))
}

async fn run(config: Config) -> anyhow::Result<()> {
    info!(
        "Starting offer-search: store={} duration_policy={} workers={}",
        config.store, config.duration_policy, config.workers
    );

    // 先起服务，区域树加载完成前的请求返回 503
    let catalog = Arc::new(OfferCatalog::new(config.store, config.duration_policy));
    let server = tokio::spawn(QueryServer::new(catalog.clone()).run(config.port));

    let path = config.regions.clone();
    let hierarchy = tokio::task::spawn_blocking(move || RegionHierarchy::from_json_file(&path))
        .await
        .context("region loader panicked")??;
    info!(
        "Loaded {} regions from {:?} (root {})",
        hierarchy.len(),
        config.regions,
        hierarchy.root_id()
    );
    catalog.attach_regions(Arc::new(hierarchy));

    if config.report_interval_secs > 0 {
        tokio::spawn(catalog.clone().report_loop(config.report_interval_secs));
    }

    info!(
        "offer-search ready. Query via: http://localhost:{}/api/offers",
        config.port
    );

    server.await.context("server task panicked")?
}
