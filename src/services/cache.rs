// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tile byte cache.
//!
//! Two backends share the [`CacheStore`] contract:
//! - [`RedisCache`] for deployments with a Redis server
//! - [`MemoryCache`], an in-process map used when no Redis URL is configured
//!
//! Both enforce [`MIN_CACHE_TTL`] regardless of the configured value, and both
//! refresh an entry's expiry when it is read.

use crate::error::{AppError, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use redis::aio::ConnectionManager;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Minimum retention for cached tiles.
pub const MIN_CACHE_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Key-value byte cache.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up a key. `Ok(None)` is a miss.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store a value under the store's TTL.
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;
}

/// Apply the TTL floor.
pub fn effective_ttl(requested: Duration) -> Duration {
    if requested < MIN_CACHE_TTL {
        tracing::warn!(
            requested_secs = requested.as_secs(),
            floor_secs = MIN_CACHE_TTL.as_secs(),
            "Cache TTL is below the minimum, using the minimum instead"
        );
        MIN_CACHE_TTL
    } else {
        requested
    }
}

// ─── Redis ───────────────────────────────────────────────────

/// Redis-backed cache.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    ttl: Duration,
}

impl RedisCache {
    /// Connect to Redis and verify the connection with a PING.
    ///
    /// Accepts either a full `redis://` URL or a bare `host:port`.
    pub async fn connect(url: &str, ttl: Duration) -> Result<Self> {
        let url = if url.contains("://") {
            url.to_string()
        } else {
            format!("redis://{}", url)
        };

        let client = redis::Client::open(url.as_str())
            .map_err(|e| AppError::internal(format!("Invalid Redis URL: {}", e)))?;

        let mut conn = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::internal(format!("Failed to connect to Redis: {}", e)))?;

        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::internal(format!("Redis PING failed: {}", e)))?;

        let ttl = effective_ttl(ttl);
        tracing::info!(ttl_secs = ttl.as_secs(), "Connected to Redis");

        Ok(Self { conn, ttl })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        // GETEX refreshes the expiry on every hit.
        let value: Option<Vec<u8>> = redis::cmd("GETEX")
            .arg(key)
            .arg("EX")
            .arg(self.ttl.as_secs())
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::internal(format!("Redis GETEX failed: {}", e)))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(self.ttl.as_secs())
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::internal(format!("Redis SET failed: {}", e)))?;
        Ok(())
    }
}

// ─── In-process ──────────────────────────────────────────────

struct MemoryEntry {
    data: Vec<u8>,
    expires_at: Instant,
}

/// Writes between sweeps of expired [`MemoryCache`] entries.
pub const SWEEP_INTERVAL: usize = 128;

/// In-process cache with the same expiry semantics as [`RedisCache`].
///
/// Expired entries are dropped when read, and every [`SWEEP_INTERVAL`] writes
/// a sweep removes the ones nobody reads again.
pub struct MemoryCache {
    entries: DashMap<String, MemoryEntry>,
    ttl: Duration,
    writes: AtomicUsize,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: effective_ttl(ttl),
            writes: AtomicUsize::new(0),
        }
    }

    /// Remove every expired entry. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::debug!(removed, "Purged expired tile cache entries");
        }
        removed
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = Instant::now();

        if let Some(mut entry) = self.entries.get_mut(key) {
            if entry.expires_at > now {
                entry.expires_at = now + self.ttl;
                return Ok(Some(entry.data.clone()));
            }
        } else {
            return Ok(None);
        }

        // Expired: drop it once the entry guard above is released, unless a
        // concurrent set has refreshed it in the meantime.
        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        Ok(None)
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            MemoryEntry {
                data: value.to_vec(),
                expires_at: Instant::now() + self.ttl,
            },
        );

        if (self.writes.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_INTERVAL == 0 {
            self.purge_expired();
        }
        Ok(())
    }
}
