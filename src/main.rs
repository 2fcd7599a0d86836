//! Basemap Server - serves ArcGIS compact caches over the ArcGIS REST API.
//!
//! This binary loads the configuration, opens every configured cache and
//! starts the HTTP server.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use basemap_server::{
    cache::{CacheReader, ServiceRegistry},
    config::{Cli, Config},
    server::{create_router, RouterConfig},
    tile::TileService,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    let config = match Config::load(cli) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    print_banner();

    // Open every cache up front so a broken service fails start-up
    let registry = match ServiceRegistry::from_services(&config.services) {
        Ok(registry) => registry,
        Err(e) => {
            error!("Failed to open caches: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Services:");
    for (name, cache) in registry.iter() {
        info!(
            "  {} -> {} ({}, {} levels)",
            name,
            cache.root().display(),
            cache.metadata().tile_format,
            cache.metadata().lods.len()
        );
    }

    let tile_service = TileService::new(registry);
    let router = create_router(tile_service, build_router_config(&config));

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}/rest/services?f=pjson", addr);
    info!("    curl http://{}/rest/services/<name>/MapServer?f=pjson", addr);
    info!("    curl http://{}/rest/services/<name>/MapServer/tile/0/0/0", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Print the startup banner.
fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    info!("");
    info!("basemap-server v{}", version);
    info!("ArcGIS compact cache tile server");
    info!("");
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "basemap_server=debug,tower_http=debug"
    } else {
        "basemap_server=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the resolved configuration.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_cache_max_age(config.cache_max_age)
        .with_tracing(!config.no_tracing);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    if let Some(ref dir) = config.static_dir {
        router_config = router_config.with_static_dir(dir);
    }

    router_config
}
