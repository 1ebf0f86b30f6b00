// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User document stored in Elasticsearch.
///
/// Every field is optional so the same shape serves creation, full replace,
/// partial update and read paths. `None` always means "not provided / do not
/// touch"; empty strings are folded into `None` before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Opaque identifier (also used as document ID)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Login name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Plaintext on input, bcrypt hash once stored. Never returned to callers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Free-form profile description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Admin note about the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Registration timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reg_date: Option<DateTime<Utc>>,
    /// Last known position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Social network tag, one of [`SocialNetwork`] (any casing)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_net: Option<String>,
}

impl User {
    /// True when no field other than the identifier is set.
    pub fn has_no_fields(&self) -> bool {
        self.login.is_none()
            && self.username.is_none()
            && self.password.is_none()
            && self.description.is_none()
            && self.comment.is_none()
            && self.reg_date.is_none()
            && self.location.is_none()
            && self.social_net.is_none()
    }
}

/// Geographic position in WGS84 degrees. Serializes as an Elasticsearch
/// `geo_point` object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl From<Location> for geo::Point<f64> {
    fn from(loc: Location) -> Self {
        geo::Point::new(loc.lon, loc.lat)
    }
}

/// Closed set of accepted social network tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialNetwork {
    Facebook,
    Twitter,
    Instagram,
    Max,
    Vk,
    Telegram,
}

impl SocialNetwork {
    pub const ALL: [SocialNetwork; 6] = [
        SocialNetwork::Facebook,
        SocialNetwork::Twitter,
        SocialNetwork::Instagram,
        SocialNetwork::Max,
        SocialNetwork::Vk,
        SocialNetwork::Telegram,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SocialNetwork::Facebook => "facebook",
            SocialNetwork::Twitter => "twitter",
            SocialNetwork::Instagram => "instagram",
            SocialNetwork::Max => "max",
            SocialNetwork::Vk => "vk",
            SocialNetwork::Telegram => "telegram",
        }
    }
}

impl fmt::Display for SocialNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a tag outside the accepted set. Keeps the caller's casing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown social network '{0}'")]
pub struct UnknownSocialNetwork(pub String);

impl FromStr for SocialNetwork {
    type Err = UnknownSocialNetwork;

    /// Case-insensitive lookup.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SocialNetwork::ALL
            .into_iter()
            .find(|net| net.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownSocialNetwork(s.to_string()))
    }
}
