// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Search filter model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Search parameters for the user listing. Every field is optional; an
/// absent field does not constrain the result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserFilter {
    /// Full-text term matched against username, login, comment and description
    pub search: Option<String>,
    /// Registration date lower bound (inclusive)
    pub date_from: Option<DateTime<Utc>>,
    /// Registration date upper bound (inclusive)
    pub date_to: Option<DateTime<Utc>>,
    /// Geo-radius center latitude
    pub lat: Option<f64>,
    /// Geo-radius center longitude
    pub lon: Option<f64>,
    /// Geo-radius distance, e.g. `500m` or `5km`
    pub distance: Option<String>,
    /// Exact social network tag
    pub social_net: Option<String>,
    pub sort_by: Option<SortField>,
    pub sort_order: Option<SortOrder>,
    /// 1-based page number
    pub page: Option<i64>,
    /// Page size
    pub size: Option<i64>,
}

/// Fields a search can be sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Login,
    RegDate,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_enums_parse_wire_names() {
        let field: SortField = serde_json::from_str("\"reg_date\"").unwrap();
        assert_eq!(field, SortField::RegDate);
        let order: SortOrder = serde_json::from_str("\"desc\"").unwrap();
        assert_eq!(order, SortOrder::Desc);
        assert!(serde_json::from_str::<SortField>("\"password\"").is_err());
    }
}
