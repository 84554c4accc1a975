//! Rust SDK for the Tessera gateway GraphQL API.
//!
//! This SDK wraps a gateway's indexing endpoint with a fluent, typed search
//! API. Queries are composed through chained setters, rendered to GraphQL
//! text, and executed over HTTP with retry; results come back as read-only
//! views over the returned records. A document layer on top stores
//! versioned, schema-validated records as plain entries.
//!
//! # Features
//!
//! - **Typed search sessions**: transaction and block shapes, scoped at
//!   compile time so a block query cannot take a tag filter
//! - **Cursor pagination**: resumable [`next`](Search::next) and exhaustive
//!   [`find_all`](Search::find_all) over the gateway's page envelope
//! - **Field projection**: catalog-checked selections with `only` and
//!   `exclude`
//! - **Document collections**: schema-validated, append-only versioned
//!   records over ordinary entries
//! - **Resilient transport**: exponential backoff with jitter over plain
//!   HTTP
//! - **Structural mock**: in-memory gateway for tests, with failure
//!   injection
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tessera_gateway_sdk::{GatewayClient, SortOrder};
//!
//! #[tokio::main]
//! async fn main() -> tessera_gateway_sdk::Result<()> {
//!     let client = GatewayClient::connect("https://gateway.tessera.dev")?;
//!
//!     // Ten newest entries posted by an app.
//!     let entries = client
//!         .transactions()
//!         .app_name("tessera-notes")
//!         .limit(10)
//!         .sort(SortOrder::HeightDescending)
//!         .find()
//!         .await?;
//!
//!     for entry in &entries {
//!         println!("{:?} in block {:?}", entry.id(), entry.block().and_then(|b| b.height));
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │              Document collections (schema)                 │
//! │   create │ find │ update │ history │ payload recovery      │
//! ├────────────────────────────────────────────────────────────┤
//! │              GatewayClient (public API)                    │
//! │  .transactions() │ .transaction() │ .blocks() │ .block()   │
//! ├────────────────────────────────────────────────────────────┤
//! │              Search sessions (typed)                       │
//! │   find │ find_one │ find_all │ next │ cursor tracking      │
//! ├────────────────────────────────────────────────────────────┤
//! │              Query builder + field catalog                 │
//! │   argument scoping │ projection │ GraphQL rendering        │
//! ├────────────────────────────────────────────────────────────┤
//! │              Resilience layer (backon)                     │
//! │   retry middleware │ exponential backoff │ jitter          │
//! ├────────────────────────────────────────────────────────────┤
//! │              HTTP transport (reqwest)                      │
//! │   POST graphql │ GET payload │ POST entries                │
//! └────────────────────────────────────────────────────────────┘
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod client;
mod config;
mod error;
mod gateway;
pub mod mock;
mod models;
mod query;
mod retry;
pub mod schema;
mod search;

// Public API exports
pub use catalog::{Field, FieldSelection};
pub use client::GatewayClient;
pub use config::{GatewayConfig, GatewayConfigBuilder, RetryPolicy, RetryPolicyBuilder};
pub use error::{Result, SdkError};
pub use gateway::{HttpGateway, NewEntry, ReadGateway, WriteGateway};
pub use models::{BlockView, TransactionView};
pub use query::{GqlQuery, QueryArgs, QueryKind};
pub use retry::with_retry;
pub use search::{
    BlockList, ListKind, Projectable, Search, SearchKind, SingleBlock, SingleKind,
    SingleTransaction, TransactionList,
};

// Re-export the wire model shared with the gateway.
pub use tessera_gateway_types::{
    Amount, BlockRecord, DataMeta, HeightRange, Owner, PageInfo, Parent, QueryData, SortOrder, Tag,
    TagFilter, TransactionRecord,
};
