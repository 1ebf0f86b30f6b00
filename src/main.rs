// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User Service API Server
//!
//! Stores user profiles in Elasticsearch and serves location map tiles
//! through a Redis (or in-process) tile cache.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use user_service::{
    config::{AppEnv, Config},
    db::ElasticRepository,
    routes::create_router,
    services::{CacheStore, MemoryCache, OsmTileClient, RedisCache, UserService},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from environment
    let config = Config::from_env()?;

    init_logging(config.env);
    tracing::info!(port = config.port, env = ?config.env, "Starting User Service");

    // Document store (creates the index on first start)
    let repo = ElasticRepository::connect(&config.elasticsearch_url, &config.elasticsearch_index)
        .await?;

    // Tile cache
    let cache: Arc<dyn CacheStore> = match &config.redis_url {
        Some(url) => Arc::new(RedisCache::connect(url, config.cache_ttl).await?),
        None => {
            tracing::info!("REDIS_URL not set, using in-process tile cache");
            Arc::new(MemoryCache::new(config.cache_ttl))
        }
    };

    // Tile provider
    let tiles = OsmTileClient::new(
        &config.osm_base_url,
        &config.osm_user_agent,
        config.osm_timeout,
    )?;
    tracing::info!(base_url = %config.osm_base_url, "Tile provider initialized");

    let user_service = UserService::new(Arc::new(repo), cache, Arc::new(tiles));

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        user_service,
    });

    // Build router
    let app = create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Initialize logging. JSON for production and staging, human-readable for
/// development. `RUST_LOG` overrides the environment's default level.
fn init_logging(env: AppEnv) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(env.default_log_level()));

    match env {
        AppEnv::Production | AppEnv::Staging => {
            let format = tracing_subscriber::fmt::layer()
                .json()
                .with_target(false)
                .with_current_span(true)
                .flatten_event(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(format)
                .init();
        }
        AppEnv::Development => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
