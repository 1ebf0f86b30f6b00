// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Field normalization and validation for users and search filters.
//!
//! Rules are independent per field. Every violated rule is collected and the
//! messages are joined into one `InvalidInput` error, so a caller sees all
//! problems in a single round trip.

use crate::error::{AppError, Result};
use crate::models::{SocialNetwork, User, UserFilter};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;
use validator::ValidateLength;

pub const MAX_ID_LEN: u64 = 36;
pub const MIN_LOGIN_LEN: u64 = 5;
pub const MAX_LOGIN_LEN: u64 = 20;
pub const MAX_USERNAME_LEN: u64 = 50;
pub const MIN_PASSWORD_LEN: u64 = 8;
pub const MAX_PASSWORD_LEN: u64 = 64;
pub const MAX_DESCRIPTION_LEN: u64 = 500;
pub const MAX_COMMENT_LEN: u64 = 300;

/// Page size used when the requested one is outside `(0, MAX_PAGE_SIZE]`.
pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 100;

const MSG_INVALID_CHARACTERS: &str = "contains invalid characters (allowed: a-z, A-Z, 0-9, _, -)";

/// Shared charset for identifiers, logins and passwords.
static SAFE_CHARSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("valid charset pattern"));

/// Geo distance: a number with an optional Elasticsearch distance unit.
static DISTANCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(\.\d+)?(mm|cm|m|km|mi|yd|ft|in|nmi|NM)?$").expect("valid distance pattern")
});

/// Fold empty strings into "absent" so later stages never see `Some("")`.
pub fn normalize_user(user: &mut User) {
    for field in [
        &mut user.id,
        &mut user.login,
        &mut user.username,
        &mut user.password,
        &mut user.description,
        &mut user.comment,
        &mut user.social_net,
    ] {
        if field.as_deref() == Some("") {
            *field = None;
        }
    }
}

/// Validate a standalone identifier (path parameter).
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(AppError::InvalidInput("ID is required".to_string()));
    }

    let errors = id_errors(id);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::InvalidInput(errors.join("; ")))
    }
}

fn id_errors(id: &str) -> Vec<String> {
    let mut errs = Vec::new();
    if !id.validate_length(None, Some(MAX_ID_LEN), None) {
        errs.push(format!("ID must be at most {} characters", MAX_ID_LEN));
    }
    if !SAFE_CHARSET.is_match(id) {
        errs.push(format!("ID {}", MSG_INVALID_CHARACTERS));
    }
    errs
}

/// Validate every present field of a user against the current time.
pub fn validate_user(user: &User) -> Result<()> {
    validate_user_at(user, Utc::now())
}

/// Validate every present field of a user. `now` bounds the registration date.
pub fn validate_user_at(user: &User, now: DateTime<Utc>) -> Result<()> {
    let mut errs: Vec<String> = Vec::new();

    if let Some(id) = &user.id {
        errs.extend(id_errors(id));
    }

    if let Some(login) = &user.login {
        if !login.validate_length(Some(MIN_LOGIN_LEN), Some(MAX_LOGIN_LEN), None) {
            errs.push(format!(
                "login must be {}-{} characters",
                MIN_LOGIN_LEN, MAX_LOGIN_LEN
            ));
        }
        if !SAFE_CHARSET.is_match(login) {
            errs.push(format!("login {}", MSG_INVALID_CHARACTERS));
        }
    }

    if let Some(username) = &user.username {
        if !username.validate_length(None, Some(MAX_USERNAME_LEN), None) {
            errs.push(format!(
                "username exceeds {} character limit",
                MAX_USERNAME_LEN
            ));
        }
    }

    if let Some(password) = &user.password {
        if !password.validate_length(Some(MIN_PASSWORD_LEN), Some(MAX_PASSWORD_LEN), None) {
            errs.push(format!(
                "password must be {}-{} characters",
                MIN_PASSWORD_LEN, MAX_PASSWORD_LEN
            ));
        }
        if !SAFE_CHARSET.is_match(password) {
            errs.push(format!("password {}", MSG_INVALID_CHARACTERS));
        }
    }

    if let Some(description) = &user.description {
        if !description.validate_length(None, Some(MAX_DESCRIPTION_LEN), None) {
            errs.push(format!(
                "description exceeds {} character limit",
                MAX_DESCRIPTION_LEN
            ));
        }
    }

    if let Some(comment) = &user.comment {
        if !comment.validate_length(None, Some(MAX_COMMENT_LEN), None) {
            errs.push(format!("comment exceeds {} character limit", MAX_COMMENT_LEN));
        }
    }

    if let Some(reg_date) = user.reg_date {
        if reg_date > now {
            errs.push("reg_date (registration date) cannot be in the future".to_string());
        }
    }

    if let Some(location) = &user.location {
        errs.extend(coordinate_errors(location.lat, location.lon));
    }

    if let Some(social) = &user.social_net {
        if let Err(e) = social.parse::<SocialNetwork>() {
            errs.push(format!("social_net: {}", e));
        }
    }

    if errs.is_empty() {
        Ok(())
    } else {
        Err(AppError::InvalidInput(errs.join("; ")))
    }
}

fn coordinate_errors(lat: f64, lon: f64) -> Vec<String> {
    let mut errs = Vec::new();
    if !(-90.0..=90.0).contains(&lat) {
        errs.push("latitude must be between -90 and 90".to_string());
    }
    if !(-180.0..=180.0).contains(&lon) {
        errs.push("longitude must be between -180 and 180".to_string());
    }
    errs
}

/// Validate the search filter fields that carry free-form values.
///
/// A geo center without a distance (or vice versa) is not an error here: the
/// compiler drops incomplete geo filters.
pub fn validate_filter(filter: &UserFilter) -> Result<()> {
    let mut errs: Vec<String> = Vec::new();

    if let Some(lat) = filter.lat {
        if !(-90.0..=90.0).contains(&lat) {
            errs.push("lat must be between -90 and 90".to_string());
        }
    }
    if let Some(lon) = filter.lon {
        if !(-180.0..=180.0).contains(&lon) {
            errs.push("lon must be between -180 and 180".to_string());
        }
    }

    if let Some(distance) = &filter.distance {
        if !DISTANCE.is_match(distance) {
            errs.push(format!(
                "radius '{}' must be a number with an optional unit (e.g. 500m, 5km)",
                distance
            ));
        }
    }

    if let (Some(from), Some(to)) = (filter.date_from, filter.date_to) {
        if from > to {
            errs.push("date_from must not be after date_to".to_string());
        }
    }

    if errs.is_empty() {
        Ok(())
    } else {
        Err(AppError::InvalidInput(errs.join("; ")))
    }
}

/// Replace an out-of-range page size with [`DEFAULT_PAGE_SIZE`].
pub fn clamp_page_size(filter: &mut UserFilter) {
    if let Some(size) = filter.size.as_mut() {
        if *size <= 0 || *size > MAX_PAGE_SIZE {
            *size = DEFAULT_PAGE_SIZE;
        }
    }
}
