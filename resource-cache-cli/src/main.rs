use std::time::Duration;

use clap::Parser;
use resource_cache::{
    CacheEngine, CacheRequest, EngineConfig, ResourceList, ResourceManifest, ResourceSet,
};
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod cli;
mod error;

use cli::CliArgs;
use error::AppError;

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        error!(error = ?e, "Application failed");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn bootstrap() -> Result<(), AppError> {
    let args = CliArgs::parse();

    // RUST_LOG wins over --verbose when set
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Initialization(e.to_string()))?;

    if args.manifest.is_none() && args.uris.is_empty() {
        return Err(AppError::InvalidInput(
            "Nothing to cache: pass a manifest file or at least one --uri".to_string(),
        ));
    }

    let mut builder = EngineConfig::builder()
        .with_timeout(Duration::from_secs(args.timeout))
        .with_connect_timeout(Duration::from_secs(args.connect_timeout))
        .with_max_retries(args.retries);
    if let Some(base_url) = &args.base_url {
        builder = builder.with_base_url(base_url);
    }
    let engine = CacheEngine::from_config(builder.build())?;

    let mut failures = 0usize;

    if let Some(path) = &args.manifest {
        let json = std::fs::read_to_string(path)?;
        let mut manifest = ResourceManifest::from_json(&json)?;
        if let Some(platform) = args.platform {
            manifest.platform = platform.into();
        }
        if let Some(id) = args.game_instance_id {
            manifest.game_instance_id = Some(id);
        }
        debug!(
            platform = ?manifest.platform,
            game_instance_id = ?manifest.game_instance_id,
            "Loaded manifest from {}",
            path.display()
        );

        let lists = manifest.resource_lists();
        let sets: Vec<&dyn ResourceSet> = lists.iter().map(|l| l as &dyn ResourceSet).collect();

        match engine.cache_all_resources(&sets).await {
            Ok(()) => info!(groups = engine.group_count(), "All resources cached"),
            Err(e) => {
                failures += 1;
                warn!(error = %e, "Caching pass finished with failures");
            }
        }

        for list in &lists {
            print_list(&engine, list);
        }
    }

    for uri in &args.uris {
        match engine.cache_resource(CacheRequest::new(uri.clone())).await {
            Ok(resolution) => {
                let size = resolution
                    .handle()
                    .and_then(|h| engine.handle_bytes(h))
                    .map(|b| b.len());
                match size {
                    Some(size) => println!("{uri} -> {} ({size} bytes)", resolution.uri()),
                    None => println!("{uri} -> {} (direct)", resolution.uri()),
                }
            }
            Err(e) => {
                failures += 1;
                println!("{uri} -> failed: {e}");
            }
        }
    }

    engine.revoke_cache();

    if failures > 0 {
        return Err(AppError::Incomplete(failures));
    }
    Ok(())
}

fn print_list(engine: &CacheEngine, list: &ResourceList) {
    if list.is_empty() {
        return;
    }
    println!("[{}]", list.name());
    for (key, uri) in list.assets() {
        let cached = list
            .descriptor(&key)
            .and_then(|d| d.cache_handle())
            .and_then(|h| engine.handle_bytes(&h))
            .map(|b| b.len());
        match cached {
            Some(size) => println!("  {key} -> {uri} ({size} bytes)"),
            None => println!("  {key} -> {uri}"),
        }
    }
}
