use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use marquee_config::{Config, ConfigSource, DEFAULT_LOG_DIRECTIVES, init_tracing};
use marquee_core::image::{
    DiskImageStore, HttpImageSource, ImageCache, ImageFetcher, Provenance,
};
use marquee_model::ImageSize;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "marquee-prefetch", about = "Warm the Marquee artwork cache")]
struct Cli {
    /// Config file (TOML or JSON). Without it the usual environment and
    /// default-file lookup applies.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Which artwork size the paths refer to
    #[arg(long, value_enum, default_value = "poster")]
    kind: ArtworkKind,
    /// Apply disk cache TTL and size limits afterwards
    #[arg(long)]
    enforce_limits: bool,
    /// Artwork paths as returned by the catalogue (`/abc.jpg`) or absolute URLs
    #[arg(required = true)]
    paths: Vec<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ArtworkKind {
    Poster,
    Still,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(DEFAULT_LOG_DIRECTIVES)?;
    let cli = Cli::parse();

    let (config, source) = match &cli.config {
        Some(path) => {
            let config = Config::load_from_file(path)?;
            config.validate()?;
            (config, ConfigSource::File(path.clone()))
        }
        None => Config::load_from_env()?,
    };
    info!("using configuration from {:?}", source);

    let resolver = config.resolver()?;
    let size = match cli.kind {
        ArtworkKind::Poster => ImageSize::Poster(config.artwork.poster_size),
        ArtworkKind::Still => ImageSize::Still(config.artwork.still_size),
    };
    let locators = cli
        .paths
        .iter()
        .map(|path| {
            resolver
                .locator_for_path(path, size)
                .with_context(|| format!("invalid artwork path {path:?}"))
        })
        .collect::<Result<Vec<_>>>()?;

    let limits = config.cache_limits();
    let cache = Arc::new(ImageCache::new(limits.memory_budget));
    let mut builder = ImageFetcher::builder(cache, Arc::new(HttpImageSource::default()))
        .policy(config.fetch_policy());
    let disk = match &limits.disk {
        Some((root, disk_limits)) => {
            let store = DiskImageStore::open(root, *disk_limits)
                .with_context(|| format!("failed to open disk cache at {}", root.display()))?;
            let store = Arc::new(store);
            builder = builder.disk(Arc::clone(&store));
            Some(store)
        }
        None => None,
    };
    let fetcher = builder.build();

    let outcomes = fetcher.prefetch(locators).await;
    let mut failed = 0usize;
    for (locator, outcome) in &outcomes {
        match outcome {
            Ok(Provenance::Cache) => println!("cached   {locator}"),
            Ok(Provenance::Network) => println!("fetched  {locator}"),
            Err(e) => {
                failed += 1;
                println!("failed   {locator}: {e}");
            }
        }
    }

    let stats = fetcher.stats();
    info!(
        "prefetch done: {} network, {} disk hits, {} failures, {} resident",
        stats.network_retrievals,
        stats.disk_hits,
        stats.failures,
        fetcher.cache().resident_bytes()
    );

    if cli.enforce_limits {
        match &disk {
            Some(store) => {
                let report = store.enforce_limits().await?;
                info!(
                    "disk cache maintenance: scanned {}, removed {} expired and {} over cap, {} remain",
                    report.scanned, report.removed_ttl, report.removed_size, report.bytes_after
                );
            }
            None => warn!("--enforce-limits given but no disk cache is configured"),
        }
    }

    if failed > 0 {
        bail!("{failed} of {} artworks unavailable", outcomes.len());
    }
    Ok(())
}
