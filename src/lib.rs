#![warn(missing_docs)]

//! # CouchRest: design documents and streaming queries for CouchDB
//!
//! A client for CouchDB-style document databases over HTTP. It covers two jobs:
//!
//! 1. **Design documents** - define views, lists and shows in Rust, persist
//!    them, and query them by logical name with per-view stored defaults.
//! 2. **Streaming queries** - read views, lists and shows line by line as the
//!    server writes them, so millions of rows need constant memory.
//!
//! ## Defining and Querying a View
//!
//! ```ignore
//! use couchrest::{CouchClient, QueryOptions};
//! use couchrest::design::{Design, ViewOptions};
//!
//! #[tokio::main]
//! async fn main() -> couchrest::Result<()> {
//!     let db = CouchClient::new().database("people");
//!
//!     let mut design = Design::named("people");
//!     design.set_database(db.clone());
//!     design.view_by(&["name", "age"], ViewOptions::new())?;
//!     design.save().await?;
//!
//!     let res = design.view("by_name_and_age", &QueryOptions::new().with("limit", 10)).await?;
//!     println!("{}", res["rows"]);
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming a View
//!
//! ```ignore
//! use couchrest::{CouchClient, QueryOptions, Record};
//!
//! #[tokio::main]
//! async fn main() -> couchrest::Result<()> {
//!     let db = CouchClient::new().database("people");
//!     let mut streamer = db.streamer();
//!
//!     let header = streamer
//!         .view("people/by_name", &QueryOptions::new(), |row| {
//!             if let Record::Json(row) = row {
//!                 println!("{}", row["key"]);
//!             }
//!         })
//!         .await?;
//!     println!("total_rows: {:?}", header.map(|h| h["total_rows"].clone()));
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - **[types]** - Query options, function kinds, streamed records
//! - **[error]** - Error types and result handling
//! - **[client]** - HTTP transport, parsers and the streaming engine
//! - **[database]** - Database handle with buffered queries
//! - **[design]** - Design documents and function dispatch
//! - **[protocol]** - Protocol constants and URL construction

pub mod client;
pub mod database;
pub mod design;
pub mod error;
pub mod protocol;
pub mod types;

pub use client::{ClientConfig, CouchClient, Streamer, Transport};
pub use database::Database;
pub use design::{Design, ViewOptions};
pub use error::{CouchError, Result};
pub use types::{FunctionKind, QueryOptions, Record};
