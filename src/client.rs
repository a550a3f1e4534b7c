//! Query dispatch from the client store to the query endpoint.
//!
//! [`QueryClient::dispatch`] runs one round trip: guard, concatenate the
//! stored documents, POST `{query, documents}`, interpret the returned text,
//! and append the resulting [`QueryRecord`] to the store's history.
//!
//! Nothing is retried. A failed round trip leaves the history untouched.
//! Concurrent dispatches are not coordinated; each appends its own record.

use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{ClientConfig, Config};
use crate::decision::interpret;
use crate::models::QueryRecord;
use crate::store::{self, ClientStore};
use crate::view;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Please enter a query")]
    EmptyQuery,
    #[error("Please upload at least one document before querying")]
    NoDocuments,
    #[error("request to query endpoint failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("query endpoint returned {status}: {message}")]
    Server { status: u16, message: String },
    #[error("failed to record query: {0:#}")]
    Store(anyhow::Error),
}

/// Success envelope of the query endpoint.
#[derive(Deserialize)]
struct TextEnvelope {
    #[serde(default)]
    text: Option<String>,
}

/// HTTP client for the query endpoint.
pub struct QueryClient {
    http: reqwest::Client,
    endpoint: String,
}

impl QueryClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            http: builder.build()?,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Send one query with the given document block and return the
    /// endpoint's `text` field, which may be absent.
    pub async fn send(&self, query: &str, documents: &str) -> Result<Option<String>, DispatchError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "query": query, "documents": documents }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body_text)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(body_text);
            return Err(DispatchError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: TextEnvelope = response.json().await?;
        Ok(envelope.text)
    }

    /// Run one query against everything in `store`.
    ///
    /// Refuses without a network call when the query is blank or the store
    /// holds no documents.
    pub async fn dispatch(
        &self,
        store: &mut ClientStore,
        query: &str,
    ) -> Result<QueryRecord, DispatchError> {
        if query.trim().is_empty() {
            return Err(DispatchError::EmptyQuery);
        }
        if store.documents().is_empty() {
            return Err(DispatchError::NoDocuments);
        }

        let documents = store.corpus();
        let started = Instant::now();
        let text = self.send(query, &documents).await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let outcome = interpret(text.as_deref());
        if outcome.is_fallback() {
            warn!(elapsed_ms, "model output was not a JSON object; using fallback result");
        } else {
            info!(elapsed_ms, "query answered");
        }

        let record = QueryRecord {
            id: Uuid::new_v4().to_string(),
            query: query.to_string(),
            timestamp: Utc::now(),
            elapsed_ms,
            outcome,
        };
        store
            .record_query(record.clone())
            .await
            .map_err(DispatchError::Store)?;
        Ok(record)
    }
}

/// `plens ask` entry point.
pub async fn run_ask(config: &Config, query: &str) -> Result<()> {
    let client = QueryClient::new(&config.client)?;
    let mut store = store::open(config).await?;

    let record = client.dispatch(&mut store, query).await?;
    view::print_record(&record);
    Ok(())
}
