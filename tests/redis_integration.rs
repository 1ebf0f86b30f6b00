// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Redis tile cache integration tests.
//!
//! These tests require a running Redis server.
//! Run with: REDIS_URL=redis://localhost:6379 cargo test --test redis_integration

use std::time::Duration;
use user_service::services::cache::MIN_CACHE_TTL;
use user_service::services::{CacheStore, RedisCache};

mod common;

async fn test_cache() -> RedisCache {
    let url = std::env::var("REDIS_URL").unwrap();
    RedisCache::connect(&url, Duration::from_secs(60))
        .await
        .expect("Failed to connect to Redis")
}

fn unique_key() -> String {
    format!("tile_test_{}", uuid::Uuid::new_v4().simple())
}

#[tokio::test]
async fn test_round_trip_and_miss() {
    require_redis!();

    let cache = test_cache().await;
    let key = unique_key();

    assert_eq!(cache.get(&key).await.unwrap(), None);

    cache.set(&key, common::FAKE_TILE).await.unwrap();
    assert_eq!(cache.get(&key).await.unwrap(), Some(common::FAKE_TILE.to_vec()));
}

#[tokio::test]
async fn test_ttl_floor_applied() {
    require_redis!();

    let cache = test_cache().await;
    assert_eq!(cache.ttl(), MIN_CACHE_TTL);
}
