// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User service: validation, persistence and map tiles.
//!
//! Handles:
//! - Normalizing, validating and hashing incoming user records
//! - Forwarding CRUD and search to the repository
//! - Stripping passwords from everything returned to callers
//! - Cache-aside map tile lookup for a user's stored location

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::models::{Location, User, UserFilter};
use crate::services::cache::CacheStore;
use crate::services::password::hash_password;
use crate::services::projection;
use crate::services::tiles::TileProvider;
use crate::services::validation::{
    clamp_page_size, normalize_user, validate_filter, validate_id, validate_user,
};
use chrono::Utc;
use std::sync::Arc;

/// Clear the password before a record leaves the service.
pub fn redact(mut user: User) -> User {
    user.password = None;
    user
}

/// Cache key for a tile. Fixed precision so equal coordinates always
/// produce the same key.
pub fn tile_cache_key(location: Location, zoom: u8) -> String {
    format!("tile_{:.6}_{:.6}_{}", location.lat, location.lon, zoom)
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("User {} not found", id))
}

/// User operations over injected, already-connected collaborators.
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    cache: Arc<dyn CacheStore>,
    tiles: Arc<dyn TileProvider>,
}

impl UserService {
    pub fn new(
        repo: Arc<dyn UserRepository>,
        cache: Arc<dyn CacheStore>,
        tiles: Arc<dyn TileProvider>,
    ) -> Self {
        Self { repo, cache, tiles }
    }

    /// Validate the present fields and replace the plaintext password with
    /// its hash.
    async fn prepare(&self, user: &mut User) -> Result<()> {
        validate_user(user)?;

        if let Some(plain) = user.password.take() {
            user.password = Some(hash_password(&plain).await?);
        }
        Ok(())
    }

    // ─── CRUD ────────────────────────────────────────────────────

    /// Create a user. Assigns an identifier and registration date when absent.
    ///
    /// Returns the stored record without its password.
    pub async fn create_user(&self, mut user: User) -> Result<User> {
        normalize_user(&mut user);
        self.prepare(&mut user).await?;

        user.id
            .get_or_insert_with(|| uuid::Uuid::new_v4().to_string());
        user.reg_date.get_or_insert_with(Utc::now);

        self.repo.create(&user).await?;

        Ok(redact(user))
    }

    pub async fn get_user(&self, id: &str) -> Result<User> {
        validate_id(id)?;

        let user = self.repo.get_by_id(id).await?.ok_or_else(|| not_found(id))?;
        Ok(redact(user))
    }

    /// Search users. Out-of-range page sizes fall back to the default.
    pub async fn search_users(&self, mut filter: UserFilter) -> Result<Vec<User>> {
        clamp_page_size(&mut filter);
        validate_filter(&filter)?;

        tracing::debug!(filter = ?filter, "Searching users");
        let users = self.repo.search(&filter).await?;

        Ok(users.into_iter().map(redact).collect())
    }

    /// Replace the whole record.
    pub async fn replace_user(&self, mut user: User) -> Result<User> {
        normalize_user(&mut user);
        if user.id.is_none() {
            return Err(AppError::InvalidInput("User ID is required".to_string()));
        }
        self.prepare(&mut user).await?;

        self.repo.replace(&user).await?;

        Ok(redact(user))
    }

    /// Merge the present fields into the stored record. The registration
    /// date is immutable.
    pub async fn update_user_partial(&self, mut user: User) -> Result<User> {
        if user.reg_date.is_some() {
            return Err(AppError::InvalidInput(
                "Cannot update protected fields (reg_date)".to_string(),
            ));
        }

        normalize_user(&mut user);
        if user.id.is_none() {
            return Err(AppError::InvalidInput("User ID is required".to_string()));
        }
        if user.has_no_fields() {
            return Err(AppError::InvalidInput("No fields to update".to_string()));
        }
        self.prepare(&mut user).await?;

        self.repo.update_partial(&user).await?;

        Ok(redact(user))
    }

    pub async fn delete_user(&self, id: &str) -> Result<()> {
        validate_id(id)?;

        self.repo.delete(id).await?;
        Ok(())
    }

    // ─── Map Tiles ───────────────────────────────────────────────

    /// PNG tile for the user's stored location.
    ///
    /// The cache is consulted first. Cache read errors count as a miss and
    /// cache write errors are logged, so an unavailable cache never fails a
    /// tile request.
    pub async fn get_map_tile(&self, id: &str, zoom: u8) -> Result<Vec<u8>> {
        validate_id(id)?;
        projection::check_zoom(zoom)?;

        let user = self.repo.get_by_id(id).await?.ok_or_else(|| not_found(id))?;
        let location = user
            .location
            .ok_or_else(|| AppError::InvalidInput("User location is required".to_string()))?;

        let key = tile_cache_key(location, zoom);

        match self.cache.get(&key).await {
            Ok(Some(tile)) => {
                tracing::debug!(cache_key = %key, "Tile cache hit");
                return Ok(tile);
            }
            Ok(None) => tracing::debug!(cache_key = %key, "Tile cache miss"),
            Err(e) => tracing::warn!(cache_key = %key, error = %e, "Tile cache read failed"),
        }

        let tile = self
            .tiles
            .fetch_tile(location.lat, location.lon, zoom)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %id, error = %e, "Tile provider failed");
                AppError::internal("Failed to get map tile from map service")
            })?;

        if let Err(e) = self.cache.set(&key, &tile).await {
            tracing::warn!(cache_key = %key, error = %e, "Tile cache write failed");
        }

        Ok(tile)
    }
}
