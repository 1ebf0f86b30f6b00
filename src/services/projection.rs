// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Web Mercator (slippy map) tile projection.

use crate::error::AppError;
use geo::Point;
use std::f64::consts::PI;

pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 19;

/// Address of a raster tile in the slippy map grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

/// Input outside the projectable range. Inputs are never clamped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProjectionError {
    #[error("invalid latitude: {0} (must be between -90 and 90)")]
    InvalidLatitude(f64),

    #[error("invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),

    #[error("invalid zoom level: {0} (must be between 0 and 19)")]
    InvalidZoom(u8),
}

impl From<ProjectionError> for AppError {
    fn from(err: ProjectionError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

/// Check a zoom level without projecting anything.
pub fn check_zoom(zoom: u8) -> Result<(), ProjectionError> {
    if (MIN_ZOOM..=MAX_ZOOM).contains(&zoom) {
        Ok(())
    } else {
        Err(ProjectionError::InvalidZoom(zoom))
    }
}

/// Project a WGS84 point (x = longitude, y = latitude) to the tile containing
/// it at `zoom`.
pub fn project(point: Point<f64>, zoom: u8) -> Result<TileCoord, ProjectionError> {
    let (lon, lat) = point.x_y();

    if !(-90.0..=90.0).contains(&lat) {
        return Err(ProjectionError::InvalidLatitude(lat));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(ProjectionError::InvalidLongitude(lon));
    }
    check_zoom(zoom)?;

    let n = f64::from(1u32 << zoom);
    let lat_rad = lat.to_radians();

    let x = ((lon + 180.0) / 360.0 * n).floor();
    let y = ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n).floor();

    // The grid edges (lon = 180, lat = ±90) land one step outside it.
    let max_index = n - 1.0;
    Ok(TileCoord {
        x: x.clamp(0.0, max_index) as u32,
        y: y.clamp(0.0, max_index) as u32,
        zoom,
    })
}
