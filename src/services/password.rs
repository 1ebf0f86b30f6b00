// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! One-way password hashing.

use crate::error::{AppError, Result};

/// Bcrypt cost factor. Fixed so hashes stay comparable across deployments.
pub const PASSWORD_HASH_COST: u32 = 10;

/// Hash a password with bcrypt on the blocking thread pool.
///
/// Failure is an internal error, never a validation error.
pub async fn hash_password(password: &str) -> Result<String> {
    let password = password.to_string();

    tokio::task::spawn_blocking(move || bcrypt::hash(password, PASSWORD_HASH_COST))
        .await
        .map_err(|e| AppError::internal(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| AppError::internal(format!("Failed to hash password: {}", e)))
}

/// Check a plaintext password against a stored bcrypt hash.
#[cfg(test)]
async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_string();
    let hash = hash.to_string();

    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::internal(format!("Password verification task failed: {}", e)))?
        .map_err(|e| AppError::internal(format!("Failed to verify password: {}", e)))
}
