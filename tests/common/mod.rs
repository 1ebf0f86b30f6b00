// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use user_service::config::Config;
use user_service::db::UserRepository;
use user_service::error::{AppError, Result};
use user_service::models::{User, UserFilter};
use user_service::routes::create_router;
use user_service::services::query::compile_search;
use user_service::services::{CacheStore, MemoryCache, TileProvider, UserService};
use user_service::AppState;

/// Bytes returned by [`CountingTileProvider`]: the PNG signature.
#[allow(dead_code)]
pub const FAKE_TILE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// Check if a live Elasticsearch is available via environment variable.
#[allow(dead_code)]
pub fn elasticsearch_available() -> bool {
    std::env::var("ELASTICSEARCH_URL").is_ok()
}

/// Check if a live Redis is available via environment variable.
#[allow(dead_code)]
pub fn redis_available() -> bool {
    std::env::var("REDIS_URL").is_ok()
}

/// Skip test with message if Elasticsearch is not available.
#[macro_export]
macro_rules! require_elasticsearch {
    () => {
        if !crate::common::elasticsearch_available() {
            eprintln!("⚠️  Skipping: ELASTICSEARCH_URL not set");
            return;
        }
    };
}

/// Skip test with message if Redis is not available.
#[macro_export]
macro_rules! require_redis {
    () => {
        if !crate::common::redis_available() {
            eprintln!("⚠️  Skipping: REDIS_URL not set");
            return;
        }
    };
}

/// In-memory repository. Search applies the text and social network
/// clauses and the compiled pagination; other clauses are ignored.
#[derive(Default)]
#[allow(dead_code)]
pub struct InMemoryRepository {
    users: Mutex<BTreeMap<String, User>>,
}

#[allow(dead_code)]
impl InMemoryRepository {
    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn stored(&self, id: &str) -> Option<User> {
        self.users.lock().unwrap().get(id).cloned()
    }
}

#[allow(dead_code)]
fn matches_text(user: &User, text: &str) -> bool {
    let text = text.to_lowercase();
    [&user.username, &user.login, &user.comment, &user.description]
        .iter()
        .filter_map(|f| f.as_deref())
        .any(|v| v.to_lowercase().contains(&text))
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn create(&self, user: &User) -> Result<()> {
        let id = user.id.clone().ok_or_else(|| AppError::internal("no id"))?;
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&id) {
            return Err(AppError::AlreadyExists(format!("User {} already exists", id)));
        }
        users.insert(id, user.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.lock().unwrap().get(id).cloned())
    }

    async fn search(&self, filter: &UserFilter) -> Result<Vec<User>> {
        let request = compile_search(filter);
        let users = self.users.lock().unwrap();

        Ok(users
            .values()
            .filter(|u| filter.search.as_deref().map_or(true, |t| matches_text(u, t)))
            .filter(|u| {
                filter
                    .social_net
                    .as_deref()
                    .map_or(true, |s| u.social_net.as_deref() == Some(s))
            })
            .skip(request.from as usize)
            .take(request.size as usize)
            .cloned()
            .collect())
    }

    async fn replace(&self, user: &User) -> Result<()> {
        let id = user.id.clone().ok_or_else(|| AppError::internal("no id"))?;
        let mut users = self.users.lock().unwrap();
        match users.get_mut(&id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("User {} not found", id))),
        }
    }

    async fn update_partial(&self, user: &User) -> Result<()> {
        let id = user.id.clone().ok_or_else(|| AppError::internal("no id"))?;
        let mut users = self.users.lock().unwrap();
        let existing = users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        macro_rules! merge {
            ($($field:ident),*) => {
                $(if user.$field.is_some() {
                    existing.$field = user.$field.clone();
                })*
            };
        }
        merge!(login, username, password, description, comment, location, social_net);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        match self.users.lock().unwrap().remove(id) {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("User {} not found", id))),
        }
    }
}

/// Tile provider that counts calls and returns [`FAKE_TILE`].
#[derive(Default)]
#[allow(dead_code)]
pub struct CountingTileProvider {
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl CountingTileProvider {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TileProvider for CountingTileProvider {
    async fn fetch_tile(&self, _lat: f64, _lon: f64, _zoom: u8) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(FAKE_TILE.to_vec())
    }
}

/// Tile provider that always fails.
#[allow(dead_code)]
pub struct FailingTileProvider;

#[async_trait]
impl TileProvider for FailingTileProvider {
    async fn fetch_tile(&self, _lat: f64, _lon: f64, _zoom: u8) -> Result<Vec<u8>> {
        Err(AppError::internal("tile server returned HTTP 503"))
    }
}

/// Cache whose every operation fails, standing in for an unreachable Redis.
#[allow(dead_code)]
pub struct FailingCache;

#[async_trait]
impl CacheStore for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Err(AppError::internal("connection refused"))
    }

    async fn set(&self, _key: &str, _value: &[u8]) -> Result<()> {
        Err(AppError::internal("connection refused"))
    }
}

/// In-memory collaborators behind a test app, kept for assertions.
#[allow(dead_code)]
pub struct TestDeps {
    pub repo: Arc<InMemoryRepository>,
    pub cache: Arc<MemoryCache>,
    pub tiles: Arc<CountingTileProvider>,
}

/// Build a user service over in-memory collaborators.
#[allow(dead_code)]
pub fn test_service() -> (UserService, TestDeps) {
    let deps = TestDeps {
        repo: Arc::new(InMemoryRepository::default()),
        cache: Arc::new(MemoryCache::new(Config::default().cache_ttl)),
        tiles: Arc::new(CountingTileProvider::default()),
    };
    let service = UserService::new(deps.repo.clone(), deps.cache.clone(), deps.tiles.clone());
    (service, deps)
}

/// Create a test app with in-memory dependencies.
/// Returns the router, the shared state and the collaborators.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, TestDeps) {
    let (user_service, deps) = test_service();
    let state = Arc::new(AppState {
        config: Config::default(),
        user_service,
    });

    (create_router(state.clone()), state, deps)
}

/// A valid user as a JSON request body.
#[allow(dead_code)]
pub fn sample_user_json() -> serde_json::Value {
    serde_json::json!({
        "login": "john_doe",
        "username": "John Doe",
        "password": "secret-pass",
        "description": "Loves maps",
        "comment": "First user",
        "location": {"lat": 59.93428, "lon": 30.335098},
        "social_net": "telegram"
    })
}
