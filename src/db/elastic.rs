// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Elasticsearch repository over the REST API.
//!
//! Provides:
//! - Index bootstrap with explicit mappings
//! - Document CRUD with `refresh=wait_for` so writes are visible to the
//!   next search
//! - Search using the compiled filter query

use crate::db::{fields, UserRepository};
use crate::error::{AppError, Result};
use crate::models::{User, UserFilter};
use crate::services::query::compile_search;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Per-request timeout for calls to the cluster.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Swap the stored source for the new document. Runs as an update so a
/// missing document is reported instead of created.
const REPLACE_SCRIPT: &str = "ctx._source.clear(); ctx._source.putAll(params.doc)";

/// Elasticsearch-backed user repository.
#[derive(Clone)]
pub struct ElasticRepository {
    http: reqwest::Client,
    base_url: String,
    index: String,
}

impl ElasticRepository {
    /// Connect to the cluster and make sure the index exists.
    pub async fn connect(base_url: &str, index: &str) -> Result<Self> {
        let repo = Self::new(base_url, index)?;

        let response = repo
            .http
            .get(&repo.base_url)
            .send()
            .await
            .map_err(|e| AppError::internal(format!("Failed to reach Elasticsearch: {}", e)))?;
        if !response.status().is_success() {
            return Err(error_from_response(response, "cluster info").await);
        }
        tracing::debug!(url = %repo.base_url, "Elasticsearch cluster reachable");

        repo.ensure_index().await?;
        tracing::info!(index = %repo.index, "Elasticsearch initialized");
        Ok(repo)
    }

    /// Create a repository without touching the network.
    pub fn new(base_url: &str, index: &str) -> Result<Self> {
        Self::with_timeout(base_url, index, DEFAULT_HTTP_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, index: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::internal(format!("Failed to build Elasticsearch HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            index: index.to_string(),
        })
    }

    /// Create the index with its mappings if it does not exist yet.
    pub async fn ensure_index(&self) -> Result<()> {
        let url = self.index_url();

        let exists = self
            .http
            .head(&url)
            .send()
            .await
            .map_err(|e| AppError::internal(format!("Index check failed: {}", e)))?;

        match exists.status() {
            StatusCode::OK => {
                tracing::debug!(index = %self.index, "Index exists");
                Ok(())
            }
            StatusCode::NOT_FOUND => {
                tracing::info!(index = %self.index, "Index not found, creating");
                let response = self
                    .http
                    .put(&url)
                    .json(&index_mappings())
                    .send()
                    .await
                    .map_err(|e| AppError::internal(format!("Index creation failed: {}", e)))?;
                if !response.status().is_success() {
                    return Err(error_from_response(response, "create index").await);
                }
                tracing::info!(index = %self.index, "Index created");
                Ok(())
            }
            status => Err(AppError::internal(format!(
                "Unexpected status {} checking index {}",
                status, self.index
            ))),
        }
    }

    fn index_url(&self) -> String {
        format!("{}/{}", self.base_url, self.index)
    }

    fn endpoint(&self, api: &str, id: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url,
            self.index,
            api,
            urlencoding::encode(id)
        )
    }
}

/// Index mappings. Text fields keep a `keyword` sub-field for exact sorting.
pub fn index_mappings() -> serde_json::Value {
    let text_with_keyword = serde_json::json!({
        "type": "text",
        "fields": {"keyword": {"type": "keyword"}}
    });
    let typed = |ty: &str| serde_json::json!({ "type": ty });

    let mut properties = serde_json::Map::new();
    for field in [fields::LOGIN, fields::USERNAME, fields::DESCRIPTION, fields::COMMENT] {
        properties.insert(field.to_string(), text_with_keyword.clone());
    }
    properties.insert(fields::PASSWORD.to_string(), typed("keyword"));
    properties.insert(fields::REG_DATE.to_string(), typed("date"));
    properties.insert(fields::LOCATION.to_string(), typed("geo_point"));
    properties.insert(fields::SOCIAL_NET.to_string(), typed("keyword"));

    serde_json::json!({ "mappings": { "properties": properties } })
}

/// Body of the scripted update used by `replace`. The identifier lives in
/// `_id`, so it is left out of the source.
fn replace_body(user: &User) -> serde_json::Value {
    let doc = User {
        id: None,
        ..user.clone()
    };
    serde_json::json!({
        "script": {
            "source": REPLACE_SCRIPT,
            "lang": "painless",
            "params": { "doc": doc }
        }
    })
}

/// `GET /{index}/_doc/{id}` response.
#[derive(Deserialize)]
struct GetResponse {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source")]
    source: User,
}

/// `POST /{index}/_search` response.
#[derive(Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Deserialize)]
struct HitsEnvelope {
    hits: Vec<Hit>,
}

#[derive(Deserialize)]
struct Hit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source")]
    source: User,
}

/// Stored documents carry their identifier in `_id`; make it authoritative.
fn with_document_id(mut user: User, id: String) -> User {
    user.id = Some(id);
    user
}

/// Build an internal error from a failed response, logging the body.
async fn error_from_response(response: reqwest::Response, operation: &str) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    tracing::error!(
        operation,
        status = status.as_u16(),
        response = %body,
        "Elasticsearch request failed"
    );
    AppError::internal(format!("Elasticsearch {} failed with HTTP {}", operation, status))
}

fn request_error(operation: &str, err: reqwest::Error) -> AppError {
    tracing::error!(operation, error = %err, "Elasticsearch request error");
    AppError::internal(format!("Elasticsearch {} request failed: {}", operation, err))
}

fn require_id(user: &User) -> Result<&str> {
    user.id
        .as_deref()
        .ok_or_else(|| AppError::internal("User document has no identifier"))
}

#[async_trait]
impl UserRepository for ElasticRepository {
    async fn create(&self, user: &User) -> Result<()> {
        let id = require_id(user)?;
        let start = Instant::now();

        let response = self
            .http
            .put(self.endpoint("_create", id))
            .query(&[("refresh", "wait_for")])
            .json(user)
            .send()
            .await
            .map_err(|e| request_error("create", e))?;

        match response.status() {
            StatusCode::CONFLICT => Err(AppError::AlreadyExists(format!(
                "User {} already exists",
                id
            ))),
            s if s.is_success() => {
                tracing::info!(
                    user_id = id,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "User created"
                );
                Ok(())
            }
            _ => Err(error_from_response(response, "create").await),
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<User>> {
        let response = self
            .http
            .get(self.endpoint("_doc", id))
            .send()
            .await
            .map_err(|e| request_error("get", e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let doc: GetResponse = response.json().await.map_err(|e| {
                    AppError::internal(format!("Failed to decode user document: {}", e))
                })?;
                Ok(Some(with_document_id(doc.source, doc.id)))
            }
            _ => Err(error_from_response(response, "get").await),
        }
    }

    async fn search(&self, filter: &UserFilter) -> Result<Vec<User>> {
        let body = compile_search(filter).to_body()?;
        let start = Instant::now();

        let response = self
            .http
            .post(format!("{}/_search", self.index_url()))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| request_error("search", e))?;

        if !response.status().is_success() {
            return Err(error_from_response(response, "search").await);
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::internal(format!("Failed to decode search response: {}", e)))?;

        let users: Vec<User> = parsed
            .hits
            .hits
            .into_iter()
            .map(|hit| with_document_id(hit.source, hit.id))
            .collect();

        tracing::info!(
            result_count = users.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Search completed"
        );
        Ok(users)
    }

    async fn replace(&self, user: &User) -> Result<()> {
        let id = require_id(user)?;

        let response = self
            .http
            .post(self.endpoint("_update", id))
            .query(&[("refresh", "wait_for")])
            .json(&replace_body(user))
            .send()
            .await
            .map_err(|e| request_error("replace", e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(AppError::NotFound(format!("User {} not found", id))),
            s if s.is_success() => {
                tracing::info!(user_id = id, "User replaced");
                Ok(())
            }
            _ => Err(error_from_response(response, "replace").await),
        }
    }

    async fn update_partial(&self, user: &User) -> Result<()> {
        let id = require_id(user)?;
        let doc = User {
            id: None,
            ..user.clone()
        };

        let response = self
            .http
            .post(self.endpoint("_update", id))
            .query(&[("refresh", "wait_for")])
            .json(&serde_json::json!({ "doc": doc }))
            .send()
            .await
            .map_err(|e| request_error("update", e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(AppError::NotFound(format!("User {} not found", id))),
            s if s.is_success() => {
                tracing::info!(user_id = id, "User updated");
                Ok(())
            }
            _ => Err(error_from_response(response, "update").await),
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.endpoint("_doc", id))
            .query(&[("refresh", "wait_for")])
            .send()
            .await
            .map_err(|e| request_error("delete", e))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                tracing::warn!(user_id = id, "User not found for deletion");
                Err(AppError::NotFound(format!("User {} not found", id)))
            }
            s if s.is_success() => {
                tracing::info!(user_id = id, "User deleted");
                Ok(())
            }
            _ => Err(error_from_response(response, "delete").await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, http::StatusCode as AxumStatus, routing::get, routing::post, Router};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_mappings_cover_queried_fields() {
        let mappings = index_mappings();
        let props = &mappings["mappings"]["properties"];

        assert_eq!(props["location"]["type"], "geo_point");
        assert_eq!(props["reg_date"]["type"], "date");
        assert_eq!(props["social_net"]["type"], "keyword");
        assert_eq!(props["login"]["fields"]["keyword"]["type"], "keyword");
    }

    #[test]
    fn test_endpoint_encodes_id() {
        let repo = ElasticRepository::new("http://localhost:9200/", "users").unwrap();
        assert_eq!(
            repo.endpoint("_doc", "abc-123"),
            "http://localhost:9200/users/_doc/abc-123"
        );
        assert_eq!(
            repo.endpoint("_doc", "a/b"),
            "http://localhost:9200/users/_doc/a%2Fb"
        );
    }

    #[test]
    fn test_search_hits_take_id_from_envelope() {
        let raw = serde_json::json!({
            "took": 3,
            "hits": {"total": {"value": 1}, "hits": [
                {"_id": "u1", "_source": {"login": "john_doe", "password": "$2b$10$hash"}}
            ]}
        });

        let parsed: SearchResponse = serde_json::from_value(raw).unwrap();
        let users: Vec<User> = parsed
            .hits
            .hits
            .into_iter()
            .map(|hit| with_document_id(hit.source, hit.id))
            .collect();

        assert_eq!(users[0].id.as_deref(), Some("u1"));
        assert_eq!(users[0].login.as_deref(), Some("john_doe"));
    }

    #[test]
    fn test_replace_body_swaps_source_without_id() {
        let user = User {
            id: Some("u1".to_string()),
            login: Some("jane_doe".to_string()),
            ..Default::default()
        };

        let body = replace_body(&user);
        assert_eq!(body["script"]["source"], REPLACE_SCRIPT);
        assert_eq!(body["script"]["params"]["doc"], serde_json::json!({"login": "jane_doe"}));
    }

    // ─── Against a local fake cluster ────────────────────────────

    async fn spawn_cluster(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_replace_missing_document_is_not_found() {
        let paths = Arc::new(Mutex::new(Vec::new()));
        let recorder = paths.clone();
        let app = Router::new().route(
            "/users/_update/{id}",
            post(move |Path(id): Path<String>| {
                let recorder = recorder.clone();
                async move {
                    recorder.lock().unwrap().push(id);
                    (
                        AxumStatus::NOT_FOUND,
                        r#"{"error":{"type":"document_missing_exception"},"status":404}"#,
                    )
                }
            }),
        );
        let repo = ElasticRepository::new(&spawn_cluster(app).await, "users").unwrap();

        let ghost = User {
            id: Some("ghost".to_string()),
            login: Some("ghost_user".to_string()),
            ..Default::default()
        };
        let err = repo.replace(&ghost).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(paths.lock().unwrap().as_slice(), ["ghost"]);
    }

    #[tokio::test]
    async fn test_slow_cluster_times_out() {
        let app = Router::new().route(
            "/users/_doc/{id}",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "{}"
            }),
        );
        let base = spawn_cluster(app).await;
        let repo =
            ElasticRepository::with_timeout(&base, "users", Duration::from_millis(100)).unwrap();

        let start = Instant::now();
        let err = repo.get_by_id("u1").await.unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
        assert!(start.elapsed() < Duration::from_secs(2));
    }
}
