use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use marketx_rs::config::AggregatorConfig;
use marketx_rs::market_data::{MarketDataAggregator, MarketRecord, SourceId};
use marketx_rs::telemetry;

/// Poll exchange ticker feeds and keep an aggregated, reconciled view.
#[derive(Debug, Parser)]
#[command(name = "marketx", version)]
struct Args {
    /// Optional TOML config file (MARKETX_* env vars override it)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Only query one source (binance, bybit, bitget, hyperliquid)
    #[arg(long, short)]
    source: Option<String>,

    /// Fetch once and exit instead of running scheduled updates
    #[arg(long)]
    once: bool,

    /// Override the update interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// How many records (by quote volume) to log after each pass
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Prometheus listener, used when built with `metrics-exporter`
    #[arg(long, default_value = "0.0.0.0:9000")]
    metrics_addr: SocketAddr,
}

// Helper to log the most liquid records of a pass
fn log_top(records: &[MarketRecord], n: usize) {
    let mut by_volume: Vec<&MarketRecord> = records.iter().collect();
    by_volume.sort_by(|a, b| b.quote_volume.total_cmp(&a.quote_volume));
    for r in by_volume.into_iter().take(n) {
        info!(
            source = %r.source,
            symbol = %r.symbol,
            price = r.price,
            change_pct = r.percent_change,
            quote_volume = r.quote_volume,
            "top"
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok(); // load .env
    let args = Args::parse();

    telemetry::init_tracing("info,marketx_rs=info");
    telemetry::init_metrics(args.metrics_addr)?;

    let mut config = AggregatorConfig::load(args.config.as_deref()).context("loading config")?;
    if let Some(ms) = args.interval_ms {
        config.update_interval_ms = ms;
    }
    let only = match args.source.as_deref() {
        Some(name) => Some(SourceId::from_name(name).with_context(|| format!("unknown source {name:?}"))?),
        None => None,
    };

    let aggregator = MarketDataAggregator::with_default_sources(&config)?;
    info!(sources = ?aggregator.available_sources(), ttl_ms = config.cache_ttl_ms, "aggregator ready");

    let records = match only {
        Some(id) => aggregator.fetch_data_source(id).await?,
        None => aggregator.fetch_all_data().await?,
    };
    info!(records = records.len(), "initial fetch complete");
    log_top(&records, args.top);

    if args.once {
        return Ok(());
    }

    let mut interval = tokio::time::interval(config.update_interval().max(Duration::from_millis(100)));
    interval.tick().await; // first tick fires immediately
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let report = aggregator.update_prices().await;
                for (id, err) in &report.failed {
                    warn!(source = %id, error = %err, "update failed");
                }
                let view = aggregator.market_data_by_source(only);
                info!(refreshed = report.refreshed.len(), unchanged = report.unchanged.len(), failed = report.failed.len(), records = view.len(), "update pass");
                log_top(&view, args.top);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }
    Ok(())
}
