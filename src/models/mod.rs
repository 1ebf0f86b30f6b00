// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod filter;
pub mod user;

pub use filter::{SortField, SortOrder, UserFilter};
pub use user::{Location, SocialNetwork, User};
