// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Elasticsearch).

pub mod elastic;

pub use elastic::ElasticRepository;

use crate::error::Result;
use crate::models::{User, UserFilter};
use async_trait::async_trait;

/// Document field names shared by the index mapping and compiled queries.
pub mod fields {
    pub const LOGIN: &str = "login";
    pub const USERNAME: &str = "username";
    pub const PASSWORD: &str = "password";
    pub const DESCRIPTION: &str = "description";
    pub const COMMENT: &str = "comment";
    pub const REG_DATE: &str = "reg_date";
    pub const LOCATION: &str = "location";
    pub const SOCIAL_NET: &str = "social_net";
}

/// Persistent storage for user records.
///
/// Implementations report a missing record as `Ok(None)` from
/// [`get_by_id`](Self::get_by_id) and as `AppError::NotFound` from the
/// mutating operations, and a duplicate identifier on create as
/// `AppError::AlreadyExists`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. The user must carry an identifier.
    async fn create(&self, user: &User) -> Result<()>;

    async fn get_by_id(&self, id: &str) -> Result<Option<User>>;

    async fn search(&self, filter: &UserFilter) -> Result<Vec<User>>;

    /// Overwrite the whole document. A missing document is reported as
    /// `AppError::NotFound`, never created.
    async fn replace(&self, user: &User) -> Result<()>;

    /// Merge the present fields into the stored document.
    async fn update_partial(&self, user: &User) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<()>;
}
