//! Remote store client for rollcall.
//!
//! All authoritative data lives in a hosted relational store exposed over a
//! PostgREST-style HTTP interface. This module defines the store contract the
//! rest of the crate depends on, and the HTTP implementation of it.

pub mod schema;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calendar::day_bounds;
use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::record::{AttendanceRecord, LogEntry, Teacher};
use schema::{RawAttendanceRow, SchemaVersion};

/// An authenticated backend session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Backend user identifier.
    pub id: String,
    /// Email of the signed-in user, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// The contract the attendance board depends on.
///
/// Writes are gated on [`RemoteStore::session`]: a `None` session must abort
/// the write path with a logged error.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch all attendance rows logically on the given day.
    async fn fetch_attendance(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>>;

    /// Fetch activity log entries, newest first.
    async fn fetch_logs(&self, limit: usize) -> Result<Vec<LogEntry>>;

    /// Fetch the full teacher list.
    async fn fetch_teachers(&self) -> Result<Vec<Teacher>>;

    /// Insert-or-update an attendance row by its declared conflict target.
    async fn upsert_attendance(&self, record: &AttendanceRecord) -> Result<()>;

    /// Delete the attendance row for (student, subject, day).
    async fn delete_attendance(
        &self,
        lrn: &str,
        subject: Option<&str>,
        date: NaiveDate,
    ) -> Result<()>;

    /// Introspect the current auth session.
    async fn session(&self) -> Result<Option<Session>>;
}

/// HTTP implementation of [`RemoteStore`] against a PostgREST-style backend.
#[derive(Debug)]
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
    version: SchemaVersion,
}

impl RestStore {
    /// Create a client from backend configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            access_token: config.access_token.clone(),
            version: config.schema,
        })
    }

    /// The table shape this client speaks.
    #[must_use]
    pub fn schema_version(&self) -> SchemaVersion {
        self.version
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.api_key)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer())
    }

    async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(Error::remote_api(status, body))
        }
    }
}

#[async_trait]
impl RemoteStore for RestStore {
    async fn fetch_attendance(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>> {
        let (start, end) = day_bounds(date);
        debug!("Fetching {} rows for {}", self.version, date);

        let response = self
            .authed(self.client.get(self.rest_url(self.version.table())))
            .query(&[
                ("select", self.version.select_clause().to_string()),
                ("date", format!("gte.{}", start.to_rfc3339())),
                ("date", format!("lte.{}", end.to_rfc3339())),
            ])
            .send()
            .await?;

        let rows: Vec<RawAttendanceRow> = Self::expect_success(response).await?.json().await?;

        // Malformed rows are dropped, not fatal; a bad row must not
        // poison the rest of the day's fetch.
        let records = rows
            .into_iter()
            .filter_map(|row| match row.decode(self.version) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Dropping malformed attendance row: {}", e);
                    None
                }
            })
            .collect();
        Ok(records)
    }

    async fn fetch_logs(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let response = self
            .authed(self.client.get(self.rest_url("logs")))
            .query(&[
                ("select", "*".to_string()),
                ("order", "datetime.desc".to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?;

        Ok(Self::expect_success(response).await?.json().await?)
    }

    async fn fetch_teachers(&self) -> Result<Vec<Teacher>> {
        let response = self
            .authed(self.client.get(self.rest_url("teachers")))
            .query(&[("select", "*")])
            .send()
            .await?;

        Ok(Self::expect_success(response).await?.json().await?)
    }

    async fn upsert_attendance(&self, record: &AttendanceRecord) -> Result<()> {
        let payload = schema::encode_upsert(record, self.version);
        debug!(
            "Upserting {} {:?} on {}",
            record.student_lrn, record.subject, record.date
        );

        let response = self
            .authed(self.client.post(self.rest_url(self.version.table())))
            .query(&[("on_conflict", self.version.conflict_target())])
            .header("Prefer", "resolution=merge-duplicates")
            .json(&vec![payload])
            .send()
            .await?;

        Self::expect_success(response).await?;
        Ok(())
    }

    async fn delete_attendance(
        &self,
        lrn: &str,
        subject: Option<&str>,
        date: NaiveDate,
    ) -> Result<()> {
        let (start, end) = day_bounds(date);
        let mut query = vec![
            ("student_lrn".to_string(), format!("eq.{lrn}")),
            ("date".to_string(), format!("gte.{}", start.to_rfc3339())),
            ("date".to_string(), format!("lte.{}", end.to_rfc3339())),
        ];
        if self.version.has_subject() {
            if let Some(subject) = subject {
                query.push(("subject".to_string(), format!("eq.{subject}")));
            }
        }

        let response = self
            .authed(self.client.delete(self.rest_url(self.version.table())))
            .query(&query)
            .send()
            .await?;

        Self::expect_success(response).await?;
        Ok(())
    }

    async fn session(&self) -> Result<Option<Session>> {
        // Without a session token there is nothing to introspect.
        let Some(token) = self.access_token.as_deref() else {
            return Ok(None);
        };

        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await?;

        if response.status().as_u16() == 401 {
            return Ok(None);
        }

        let session: Session = Self::expect_success(response).await?.json().await?;
        Ok(Some(session))
    }
}
