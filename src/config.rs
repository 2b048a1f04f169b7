use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;

use crate::index::StoreKind;
use crate::query::DurationPolicy;

/// 命令行参数；显式给出的参数覆盖配置文件
#[derive(Parser, Debug, Default)]
#[command(name = "offer-search", version, about = "In-memory faceted search for car-rental offers")]
pub struct Cli {
    /// TOML 配置文件
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub port: Option<u16>,

    /// 区域树 JSON
    #[arg(long)]
    pub regions: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub store: Option<StoreKind>,

    #[arg(long, value_enum)]
    pub duration_policy: Option<DurationPolicy>,

    /// tokio worker 线程数（默认 CPU 核数）
    #[arg(long)]
    pub workers: Option<usize>,

    /// tracing EnvFilter 表达式；RUST_LOG 优先
    #[arg(long)]
    pub log_filter: Option<String>,

    /// store 报告间隔（秒），0 关闭
    #[arg(long)]
    pub report_interval_secs: Option<u64>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    pub regions: PathBuf,
    pub store: StoreKind,
    pub duration_policy: DurationPolicy,
    pub workers: usize,
    pub log_filter: String,
    pub report_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            regions: PathBuf::from("regions.json"),
            store: StoreKind::default(),
            duration_policy: DurationPolicy::default(),
            workers: num_cpus::get(),
            log_filter: "info".to_string(),
            report_interval_secs: 60,
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid config")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {:?}", path))?;
        Self::from_toml_str(&text)
    }

    /// 默认值 ← 配置文件 ← 命令行
    pub fn resolve(cli: &Cli) -> anyhow::Result<Self> {
        let mut cfg = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        cfg.apply(cli);
        if cfg.workers == 0 {
            anyhow::bail!("workers must be at least 1");
        }
        Ok(cfg)
    }

    fn apply(&mut self, cli: &Cli) {
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(regions) = &cli.regions {
            self.regions = regions.clone();
        }
        if let Some(store) = cli.store {
            self.store = store;
        }
        if let Some(policy) = cli.duration_policy {
            self.duration_policy = policy;
        }
        if let Some(workers) = cli.workers {
            self.workers = workers;
        }
        if let Some(filter) = &cli.log_filter {
            self.log_filter = filter.clone();
        }
        if let Some(secs) = cli.report_interval_secs {
            self.report_interval_secs = secs;
        }
    }
}
