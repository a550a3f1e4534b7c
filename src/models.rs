//! Core data models used throughout Policy Lens.
//!
//! These types represent the uploaded documents and the query history that
//! the client store persists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decision::QueryOutcome;

/// Raw file handed to ingestion before decoding.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Processed,
}

/// An uploaded document held by the client store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub name: String,
    pub content: String,
    /// Human-readable size, e.g. `"1.5 KB"`.
    pub size: String,
    pub size_bytes: u64,
    pub media_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub chunks: usize,
    pub clauses: usize,
    pub status: DocumentStatus,
}

/// One completed query round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub id: String,
    pub query: String,
    pub timestamp: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub outcome: QueryOutcome,
}
