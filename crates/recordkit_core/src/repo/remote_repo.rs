//! Repository over a JSON REST resource (`GET/POST/PUT/DELETE`).
//!
//! # Responsibility
//! - Map repository operations to one generic `request` helper and four verbs.
//! - Keep create-time validation and update merge semantics identical to the
//!   local repository by doing both client-side.
//!
//! # Invariants
//! - Any non-success status becomes `RepoError::Transport { status }`, except
//!   404 on by-id reads, updates and deletes, which map to absent/`false`.
//! - `DELETE` responses are treated as a success signal only.

use crate::config::RemoteConfig;
use crate::model::patch::RecordPatch;
use crate::model::record::{now_timestamp, Record, RecordId};
use crate::model::schema::RecordSchema;
use crate::repo::{RecordFilter, RecordRepository, RepoError, RepoResult};
use log::{debug, warn};
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Instant;

/// REST-backed record repository for one resource collection.
pub struct RemoteRecordRepository {
    client: Client,
    base_url: String,
    resource: String,
    schema: RecordSchema,
}

impl RemoteRecordRepository {
    /// Builds an HTTP client honoring the configured timeout.
    ///
    /// # Errors
    /// - Returns `RepoError::Http` when the client cannot be constructed.
    pub fn new(config: &RemoteConfig, schema: RecordSchema) -> RepoResult<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            resource: config.resource.trim_matches('/').to_string(),
            schema,
        })
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    fn collection_path(&self) -> String {
        format!("/{}", self.resource)
    }

    fn item_path(&self, id: &RecordId) -> String {
        format!("/{}/{}", self.resource, id)
    }

    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, &str)],
        body: Option<&Record>,
    ) -> RepoResult<Response> {
        let started_at = Instant::now();
        let mut builder = self
            .client
            .request(method.clone(), format!("{}{endpoint}", self.base_url))
            .header(ACCEPT, "application/json");
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        debug!(
            "event=remote_request module=remote method={} path={} status={} duration_ms={}",
            method,
            endpoint,
            status.as_u16(),
            started_at.elapsed().as_millis()
        );

        if !status.is_success() {
            if status != StatusCode::NOT_FOUND {
                warn!(
                    "event=remote_request module=remote method={} path={} status=error http_status={}",
                    method,
                    endpoint,
                    status.as_u16()
                );
            }
            return Err(RepoError::Transport {
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, &str)]) -> RepoResult<T> {
        let response = self.request(Method::GET, endpoint, query, None).await?;
        Ok(response.json().await?)
    }

    async fn post(&self, endpoint: &str, record: &Record) -> RepoResult<Record> {
        let response = self
            .request(Method::POST, endpoint, &[], Some(record))
            .await?;
        Ok(response.json().await?)
    }

    async fn put(&self, endpoint: &str, record: &Record) -> RepoResult<Record> {
        let response = self.request(Method::PUT, endpoint, &[], Some(record)).await?;
        Ok(response.json().await?)
    }

    async fn del(&self, endpoint: &str) -> RepoResult<bool> {
        self.request(Method::DELETE, endpoint, &[], None).await?;
        Ok(true)
    }
}

impl RecordRepository for RemoteRecordRepository {
    async fn list(&self) -> RepoResult<Vec<Record>> {
        self.get(&self.collection_path(), &[]).await
    }

    async fn get_by_id(&self, id: &RecordId) -> RepoResult<Option<Record>> {
        absent_on_not_found(self.get(&self.item_path(id), &[]).await)
    }

    async fn create(&self, payload: &Value) -> RepoResult<Record> {
        let record = self.schema.build_record(payload)?;
        self.post(&self.collection_path(), &record).await
    }

    async fn update(&self, id: &RecordId, patch: &RecordPatch) -> RepoResult<Option<Record>> {
        let Some(mut record) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        patch.apply_to(&mut record);
        record.updated_at = Some(now_timestamp());
        absent_on_not_found(self.put(&self.item_path(id), &record).await)
    }

    async fn delete(&self, id: &RecordId) -> RepoResult<bool> {
        Ok(absent_on_not_found(self.del(&self.item_path(id)).await)?.unwrap_or(false))
    }

    async fn filter(&self, filter: &RecordFilter) -> RepoResult<Vec<Record>> {
        let Some(normalized) = filter.normalized_query() else {
            return Ok(Vec::new());
        };
        // Field values are matched verbatim by the server, so keep their case.
        let (key, value) = match filter {
            RecordFilter::FieldEquals { field, value } => (field.as_str(), value.trim()),
            RecordFilter::Search(_) => ("q", normalized.as_str()),
        };
        self.get(&self.collection_path(), &[(key, value)]).await
    }
}

fn absent_on_not_found<T>(result: RepoResult<T>) -> RepoResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(RepoError::Transport { status }) if status == StatusCode::NOT_FOUND.as_u16() => {
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
