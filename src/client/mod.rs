//! CouchDB HTTP client and streaming query engine.
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── config   - Client configuration
//! ├── fetch    - Transport trait and the reqwest-backed CouchClient
//! ├── parser   - Line and record parsers for streamed output
//! ├── stream   - Line streams handed out by a transport
//! └── streamer - Streaming view/list/show engine
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Transport`] | JSON verbs plus a raw line stream |
//! | [`CouchClient`] | `reqwest` implementation of [`Transport`] |
//! | [`ClientConfig`] | Client configuration options |
//! | [`LineParser`] | Splits byte chunks into lines |
//! | [`RecordParser`] | Turns lines into header and records |
//! | [`Streamer`] | Runs one streaming query at a time |
//!
//! # Examples
//!
//! ## Creating a Client
//!
//! ```
//! use couchrest::client::{ClientConfig, CouchClient};
//!
//! // Default configuration
//! let client = CouchClient::new();
//!
//! // Custom configuration
//! let config = ClientConfig {
//!     server_url: "http://db.internal:5984".to_string(),
//!     debug: true,
//!     ..Default::default()
//! };
//! let client = CouchClient::with_config(config);
//! let db = client.database("people");
//! assert_eq!(db.root(), "http://db.internal:5984/people");
//! ```
//!
//! ## Parsing Lines
//!
//! ```
//! use couchrest::client::LineParser;
//!
//! let mut parser = LineParser::new();
//! assert!(parser.feed(b"The value is:").is_empty());
//! assert_eq!(parser.feed(b"\n1"), vec!["The value is:\n".to_string()]);
//! assert_eq!(parser.finish(), Some("1".to_string()));
//! ```

mod config;
mod fetch;
mod parser;
mod stream;
mod streamer;

pub use config::ClientConfig;
pub use fetch::{CouchClient, Transport};
pub use parser::{parse_header, parse_line, LineParser, ParseState, RecordParser};
pub use stream::LineStream;
pub use streamer::{StreamSession, Streamer};
