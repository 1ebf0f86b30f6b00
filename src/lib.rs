// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User Service: user records with search and location map tiles
//!
//! This crate provides the backend API for storing user profiles in
//! Elasticsearch, searching them by text, date, location and social network,
//! and serving a cached map tile for each user's location.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::UserService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub user_service: UserService,
}
