// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Compiles a [`UserFilter`] into an Elasticsearch search request body.
//!
//! The output is a typed structure rather than loose JSON so tests can compare
//! compiled queries structurally. Compilation is deterministic: the same filter
//! always yields the same request.

use crate::db::fields;
use crate::error::{AppError, Result};
use crate::models::{Location, SortField, SortOrder, UserFilter};
use crate::time_utils::format_utc_rfc3339;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Page size used when the filter does not carry a positive one.
pub const DEFAULT_SEARCH_SIZE: i64 = 10;

/// Fields scored by the full-text clause.
pub const TEXT_FIELDS: [&str; 4] = [
    fields::USERNAME,
    fields::LOGIN,
    fields::COMMENT,
    fields::DESCRIPTION,
];

/// Complete search request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub query: Query,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortClause>,
    pub from: u64,
    pub size: u64,
}

impl SearchRequest {
    /// Serialize to the JSON body sent to the search endpoint.
    pub fn to_body(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| AppError::internal(format!("Failed to serialize search query: {}", e)))
    }
}

/// Top-level query: either match everything or a conjunction of clauses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    MatchAll(MatchAll),
    Bool(BoolQuery),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchAll {}

/// Conjunctive query; never built with an empty `must` list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoolQuery {
    pub must: Vec<Clause>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Clause {
    MultiMatch(MultiMatch),
    Range(RegDateRange),
    GeoDistance(GeoDistance),
    Term(SocialTerm),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiMatch {
    pub query: String,
    pub fields: Vec<&'static str>,
    #[serde(rename = "type")]
    pub match_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegDateRange {
    pub reg_date: DateBounds,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateBounds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gte: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lte: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoDistance {
    pub distance: String,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SocialTerm {
    pub social_net: String,
}

/// One sort key. Serializes as `{"<field>": {"order": "<asc|desc>"}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct SortClause {
    pub field: &'static str,
    pub order: SortOrder,
}

impl Serialize for SortClause {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Order {
            order: SortOrder,
        }

        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.field, &Order { order: self.order })?;
        map.end()
    }
}

/// Document field a sort key resolves to. `login` is analyzed text, so it
/// sorts on its keyword sub-field.
fn sort_key(field: SortField) -> &'static str {
    match field {
        SortField::Login => "login.keyword",
        SortField::RegDate => fields::REG_DATE,
    }
}

/// Build the search request for a validated filter.
pub fn compile_search(filter: &UserFilter) -> SearchRequest {
    let mut must = Vec::new();

    if let Some(text) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        must.push(Clause::MultiMatch(MultiMatch {
            query: text.to_string(),
            fields: TEXT_FIELDS.to_vec(),
            match_type: "best_fields",
        }));
    }

    if filter.date_from.is_some() || filter.date_to.is_some() {
        must.push(Clause::Range(RegDateRange {
            reg_date: DateBounds {
                gte: filter.date_from.map(format_utc_rfc3339),
                lte: filter.date_to.map(format_utc_rfc3339),
            },
        }));
    }

    // Incomplete geo filters are dropped rather than rejected.
    if let (Some(lat), Some(lon), Some(distance)) = (filter.lat, filter.lon, &filter.distance) {
        must.push(Clause::GeoDistance(GeoDistance {
            distance: distance.clone(),
            location: Location { lat, lon },
        }));
    }

    if let Some(social) = filter.social_net.as_deref().filter(|s| !s.is_empty()) {
        must.push(Clause::Term(SocialTerm {
            social_net: social.to_string(),
        }));
    }

    let query = if must.is_empty() {
        Query::MatchAll(MatchAll {})
    } else {
        Query::Bool(BoolQuery { must })
    };

    let sort = filter
        .sort_by
        .map(|field| SortClause {
            field: sort_key(field),
            order: filter.sort_order.unwrap_or_default(),
        })
        .into_iter()
        .collect();

    let size = filter
        .size
        .filter(|s| *s > 0)
        .unwrap_or(DEFAULT_SEARCH_SIZE);
    let from = match filter.page {
        Some(page) if page > 0 => (page - 1).saturating_mul(size),
        _ => 0,
    };

    SearchRequest {
        query,
        sort,
        from: from as u64,
        size: size as u64,
    }
}
