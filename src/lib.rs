//! # Policy Lens
//!
//! Upload policy documents, ask natural-language coverage questions, and get
//! a structured decision back from a hosted LLM.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐  POST /api/query  ┌──────────────┐   ┌─────────┐
//! │   ingest   │──▶│ ClientStore  │──────────────────▶│    server    │──▶│   LLM   │
//! │ files→docs │   │ docs+history │◀──────────────────│ prompt+call  │◀──│provider │
//! └────────────┘   └──────┬───────┘      {text}       └──────────────┘   └─────────┘
//!                         │
//!                    ┌────▼─────┐
//!                    │    kv    │  memory / SQLite
//!                    └──────────┘
//! ```
//!
//! The whole document corpus travels with every query; there is no retrieval
//! step. The model's text is interpreted by [`decision::interpret`] into a
//! [`decision::QueryOutcome`], either the parsed JSON object or a fallback.
//!
//! ## Quick Start
//!
//! ```bash
//! plens serve &                           # start the query endpoint
//! plens upload ./policies                 # ingest files
//! plens ask "46-year-old male, knee surgery, 3-month policy"
//! plens history
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Document and query record types |
//! | [`ingest`] | File decoding and batch upload |
//! | [`chunk`] | Chunk and clause counters |
//! | [`kv`] | Key-value storage interface |
//! | [`store`] | Client document/history store |
//! | [`client`] | Query dispatch |
//! | [`decision`] | Parse-or-fallback interpretation of model output |
//! | [`prompt`] | System and user prompts |
//! | [`llm`] | LLM provider abstraction |
//! | [`server`] | Query endpoint HTTP server |
//! | [`view`] | Terminal rendering |

pub mod chunk;
pub mod client;
pub mod config;
pub mod db;
pub mod decision;
pub mod ingest;
pub mod kv;
pub mod llm;
pub mod migrate;
pub mod models;
pub mod prompt;
pub mod server;
pub mod store;
pub mod view;
