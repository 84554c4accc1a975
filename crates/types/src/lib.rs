//! Wire model for the Tessera gateway GraphQL API.
//!
//! This crate defines the plain-data shapes exchanged with a gateway's
//! indexing endpoint:
//! - Entry records (`TransactionRecord`, `BlockRecord`) and their nested
//!   projections (`Owner`, `Amount`, `DataMeta`, `Parent`, `Tag`)
//! - The cursor-pagination envelope (`PageInfo`, edges, connections)
//! - The shape-polymorphic response body (`QueryData`, `QueryResponse`)
//! - Query-side primitives (`TagFilter`, `SortOrder`, `HeightRange`)
//!
//! Everything here is serde-serializable and free of I/O; the client crate
//! owns query rendering and transport.

pub mod types;

pub use types::*;
