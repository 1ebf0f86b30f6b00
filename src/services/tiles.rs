// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Map tile provider.
//!
//! Downloads PNG tiles from an OpenStreetMap-compatible tile server
//! (`{base}/{zoom}/{x}/{y}.png`). The server's usage policy requires an
//! identifying User-Agent on every request.

use crate::error::{AppError, Result};
use crate::models::Location;
use crate::services::projection;
use async_trait::async_trait;
use std::time::Duration;

/// Source of raster tiles for a coordinate.
#[async_trait]
pub trait TileProvider: Send + Sync {
    /// Fetch the PNG tile containing (`lat`, `lon`) at `zoom`.
    async fn fetch_tile(&self, lat: f64, lon: f64, zoom: u8) -> Result<Vec<u8>>;
}

/// HTTP tile client.
#[derive(Clone)]
pub struct OsmTileClient {
    http: reqwest::Client,
    base_url: String,
}

impl OsmTileClient {
    /// Create a client for `base_url` sending `user_agent` on every request.
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build tile HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TileProvider for OsmTileClient {
    async fn fetch_tile(&self, lat: f64, lon: f64, zoom: u8) -> Result<Vec<u8>> {
        let tile = projection::project(Location { lat, lon }.into(), zoom).map_err(|e| {
            tracing::warn!(lat, lon, zoom, error = %e, "Rejected tile request");
            AppError::from(e)
        })?;

        let url = format!("{}/{}/{}/{}.png", self.base_url, tile.zoom, tile.x, tile.y);
        tracing::debug!(url = %url, "Fetching map tile");

        let response = self.http.get(&url).send().await.map_err(|e| {
            tracing::error!(url = %url, error = %e, "Tile request failed");
            AppError::internal(format!("Failed to fetch tile: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(url = %url, status = status.as_u16(), "Tile server returned an error");
            return Err(AppError::internal(format!(
                "Tile server returned HTTP {}",
                status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::internal(format!("Failed to read tile data: {}", e)))?;

        tracing::info!(x = tile.x, y = tile.y, zoom, size = bytes.len(), "Fetched map tile");
        Ok(bytes.to_vec())
    }
}
