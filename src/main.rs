//! objbench CLI entry point

use anyhow::{Context, Result};
use objbench::config::cli::Cli;
use objbench::config::toml::load_config;
use objbench::config::validator::validate_config;
use objbench::coordinator::Coordinator;
use objbench::output::{text::print_results, write_outputs};
use objbench::store::mock::MemoryStore;
use objbench::store::s3::S3Store;
use objbench::store::ObjectStore;
use objbench::util::time::{format_duration, wall_clock};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    println!("objbench v{}", env!("CARGO_PKG_VERSION"));
    println!("S3 object storage benchmark");
    println!();

    let cli = Cli::parse_args();
    let config = load_config(&cli)?;
    init_logging(config.runtime.verbose);

    validate_config(&config).context("Configuration validation failed")?;
    println!("{}", config);

    if config.runtime.dry_run {
        println!("Dry run mode - configuration validated successfully");
        return Ok(());
    }

    let store = build_store(&config)?;
    info!("Starting benchmark against {} store at {}", store.name(), wall_clock());

    let started = Instant::now();
    let config = Arc::new(config);
    let coordinator = Coordinator::new(Arc::clone(&config), store);
    let summaries = coordinator.run()?;
    info!("Benchmark complete in {}", format_duration(started.elapsed()));

    print_results(&summaries);
    write_outputs(&config.output, &summaries)?;
    Ok(())
}

/// Install the global subscriber; `RUST_LOG` overrides `-v`
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,objbench={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .init();
}

fn build_store(config: &objbench::Config) -> Result<Arc<dyn ObjectStore>> {
    if config.target.is_memory() {
        return Ok(Arc::new(MemoryStore::new()));
    }
    let store = S3Store::connect(&config.target, config.workload.threads)
        .with_context(|| format!("Failed to connect to {}", config.target.url))?;
    Ok(Arc::new(store))
}
