mod cli;

use crate::cli::{Command, LogFormatArg, CLI};
use anyhow::Context;
use clap::Parser;
use memecoin_cache::RedisScoreCache;
use memecoin_popularity::{BatchReconciler, WarmUpLoader};
use memecoin_storage::MySqlScoreStore;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    init_tracing(config.log_format);

    info!(
        redis_url = %config.redis_url,
        key_prefix = %config.key_prefix,
        "starting memecoin popularity tool"
    );

    let store = Arc::new(
        MySqlScoreStore::connect(&config.mysql_dsn)
            .await
            .context("failed to connect to MySQL")?,
    );
    let cache = Arc::new(
        RedisScoreCache::connect(&config.redis_url, config.key_prefix)
            .await
            .context("failed to connect to Redis")?,
    );

    match config.command {
        Command::WarmUp { page_size } => {
            let report = WarmUpLoader::new(cache, store, page_size).run().await?;
            info!(
                pages = report.pages,
                seeded = report.seeded,
                kept = report.kept,
                "warm-up finished"
            );
        }
        Command::Reconcile { ids } => {
            let ids: HashSet<_> = ids.into_iter().collect();
            let report = BatchReconciler::new(cache, store).reconcile(&ids).await?;
            info!(
                applied = report.applied.len(),
                skipped = ?report.skipped,
                failed = ?report.failed,
                "reconciliation finished"
            );
        }
    }

    Ok(())
}

fn init_tracing(format: LogFormatArg) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormatArg::Text => builder.init(),
        LogFormatArg::Json => builder.json().init(),
    }
}
