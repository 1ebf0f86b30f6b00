// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod cache;
pub mod password;
pub mod projection;
pub mod query;
pub mod tiles;
pub mod users;
pub mod validation;

pub use cache::{CacheStore, MemoryCache, RedisCache};
pub use tiles::{OsmTileClient, TileProvider};
pub use users::UserService;
