//! # Record Store
//!
//! Client for the hosted relational store that owns the records table.
//!
//! The store exposes a REST query surface (one endpoint per table, filters as
//! query parameters) and a password-grant auth endpoint. Everything this
//! server does is a thin awaited HTTP call against those two surfaces; no
//! persistence lives in this process.
//!
//! ## Endpoints
//! - `GET  {url}/rest/v1/cemetery_records?select=..&order=..&<filters>`
//! - `PATCH {url}/rest/v1/cemetery_records?memorial_id=eq.{id}` with a JSON
//!   body of changed columns and `Prefer: return=representation` so a zero-row
//!   match is observable
//! - `POST {url}/auth/v1/token?grant_type=password` for the credential check
//!
//! Failures are never retried; each request either resolves or surfaces a
//! [`StoreError`] to that request's caller.
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
    records::{ID_COLUMN, Record, TABLE},
    search::SearchFilters,
};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Store returned status {0}")]
    BadStatus(u16),
}

/// Outcome of a keyed update. Zero rows matched is not a failure, the caller
/// renders it as "no update occurred".
#[derive(Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    NoMatch,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn search(&self, filters: &SearchFilters) -> Result<Vec<Record>, StoreError>;

    async fn fetch(&self, memorial_id: &str) -> Result<Option<Record>, StoreError>;

    async fn update(
        &self,
        memorial_id: &str,
        fields: &Map<String, Value>,
    ) -> Result<UpdateOutcome, StoreError>;

    /// Checks a username/password pair and returns the verified identity.
    /// `Ok(None)` covers every rejection uniformly so a caller cannot learn
    /// whether the username existed.
    async fn check_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<String>, StoreError>;
}

pub struct PostgrestStore {
    http: Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    user: TokenUser,
}

#[derive(Deserialize)]
struct TokenUser {
    email: String,
}

impl PostgrestStore {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{TABLE}", self.base_url)
    }

    async fn select(&self, params: &[(String, String)]) -> Result<Vec<Record>, StoreError> {
        let response = self
            .http
            .get(self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::BadStatus(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl RecordStore for PostgrestStore {
    async fn search(&self, filters: &SearchFilters) -> Result<Vec<Record>, StoreError> {
        self.select(&filters.to_query_params()).await
    }

    async fn fetch(&self, memorial_id: &str) -> Result<Option<Record>, StoreError> {
        let params = vec![
            ("select".to_string(), "*".to_string()),
            (ID_COLUMN.to_string(), format!("eq.{memorial_id}")),
            ("limit".to_string(), "1".to_string()),
        ];

        let rows = self.select(&params).await?;

        Ok(rows.into_iter().next())
    }

    async fn update(
        &self,
        memorial_id: &str,
        fields: &Map<String, Value>,
    ) -> Result<UpdateOutcome, StoreError> {
        let response = self
            .http
            .patch(self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
            .query(&[(ID_COLUMN, format!("eq.{memorial_id}"))])
            .json(fields)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::BadStatus(response.status().as_u16()));
        }

        let rows: Vec<Value> = response.json().await?;

        #[cfg(feature = "verbose")]
        println!("Update matched {} row(s)", rows.len());

        if rows.is_empty() {
            Ok(UpdateOutcome::NoMatch)
        } else {
            Ok(UpdateOutcome::Updated)
        }
    }

    async fn check_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<String>, StoreError> {
        let response = self
            .http
            .post(format!(
                "{}/auth/v1/token?grant_type=password",
                self.base_url
            ))
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({
                "email": username,
                "password": password,
            }))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let token: TokenResponse = response.json().await?;
                Ok(Some(token.user.email))
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status => Err(StoreError::BadStatus(status.as_u16())),
        }
    }
}
