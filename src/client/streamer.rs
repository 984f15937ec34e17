//! Streaming query engine for views, lists and shows.
//!
//! A [`Streamer`] runs one long read at a time against a database and hands
//! every record to a callback as soon as its line arrives, so result sets of
//! any size are processed with constant memory.
//!
//! # Name Formats
//!
//! | Call | Accepted names |
//! |------|----------------|
//! | [`Streamer::view`] | full URL under the database root (used as-is, options ignored), `_`-prefixed path relative to the root (`_all_docs`, `_design/d/_view/v`), or `"<doc>/<view>"` |
//! | [`Streamer::list`] | `"<doc>/<list>/<view-path>"` |
//! | [`Streamer::show`] | `"<doc>/<show>/<doc-id>"` |
//!
//! # Examples
//!
//! ```ignore
//! use couchrest::{CouchClient, QueryOptions};
//!
//! #[tokio::main]
//! async fn main() -> couchrest::Result<()> {
//!     let db = CouchClient::new().database("mydb");
//!     let mut streamer = db.streamer();
//!
//!     let mut count = 0;
//!     let header = streamer
//!         .view("_all_docs", &QueryOptions::new(), |_row| count += 1)
//!         .await?;
//!     println!("{} rows, header {:?}", count, header);
//!     Ok(())
//! }
//! ```

use crate::client::{RecordParser, Transport};
use crate::error::Result;
use crate::protocol::{resolve_list_url, resolve_show_url, resolve_view_url, Framing};
use crate::types::{QueryOptions, Record};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// State of one streaming call.
///
/// Built fresh for every call and consumed by it; never reused.
#[derive(Debug)]
pub struct StreamSession {
    url: String,
    parser: RecordParser,
    records: usize,
}

impl StreamSession {
    /// Prepare a session for a resolved URL
    pub fn new(url: String) -> Self {
        let parser = RecordParser::new(Framing::for_url(&url));
        StreamSession {
            url,
            parser,
            records: 0,
        }
    }

    /// Resolved URL of this session
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Framing of the target endpoint
    pub fn framing(&self) -> Framing {
        self.parser.framing()
    }

    /// Records delivered so far
    pub fn records(&self) -> usize {
        self.records
    }

    /// Header of an array-framed response, once read
    pub fn header(&self) -> Option<&Value> {
        self.parser.header()
    }

    /// Open the stream, deliver every record, and return the header.
    ///
    /// The line stream is owned by this call and dropped on every exit path,
    /// including transport errors, which releases the connection.
    pub async fn run<F>(mut self, transport: &dyn Transport, mut on_record: F) -> Result<Option<Value>>
    where
        F: FnMut(Record),
    {
        let mut lines = transport.open_stream(&self.url).await?;

        while let Some(line) = lines.next().await {
            if let Some(record) = self.parser.feed_line(&line?) {
                self.records += 1;
                on_record(record);
            }
        }

        tracing::debug!(url = %self.url, records = self.records, "stream closed");
        Ok(self.parser.into_header())
    }
}

/// Streams query output from one database, one call at a time.
///
/// Every method takes `&mut self`, so a streamer never has two transport
/// streams open at once.
#[derive(Clone)]
pub struct Streamer {
    transport: Arc<dyn Transport>,
    root: String,
}

impl Streamer {
    /// Create a streamer for the database at `root`
    pub fn new(transport: Arc<dyn Transport>, root: impl Into<String>) -> Self {
        Streamer {
            transport,
            root: root.into(),
        }
    }

    /// Database root URL
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Stream a view, calling `on_row` once per row. Returns the view header
    /// (`total_rows`, `offset`) when it could be parsed.
    pub async fn view<F>(&mut self, name: &str, options: &QueryOptions, on_row: F) -> Result<Option<Value>>
    where
        F: FnMut(Record),
    {
        let url = resolve_view_url(&self.root, name, options);
        self.query(url, on_row).await
    }

    /// Stream a list, calling `on_line` once per emitted line.
    ///
    /// Lines that are JSON objects arrive decoded; anything else arrives as
    /// [`Record::Raw`].
    pub async fn list<F>(&mut self, name: &str, options: &QueryOptions, on_line: F) -> Result<Option<Value>>
    where
        F: FnMut(Record),
    {
        let url = resolve_list_url(&self.root, name, options);
        self.query(url, on_line).await
    }

    /// Stream a show, calling `on_line` once per emitted line.
    pub async fn show<F>(&mut self, name: &str, options: &QueryOptions, on_line: F) -> Result<Option<Value>>
    where
        F: FnMut(Record),
    {
        let url = resolve_show_url(&self.root, name, options);
        self.query(url, on_line).await
    }

    async fn query<F>(&mut self, url: String, on_record: F) -> Result<Option<Value>>
    where
        F: FnMut(Record),
    {
        let session = StreamSession::new(url);
        tracing::debug!(url = session.url(), framing = ?session.framing(), "streaming query");
        session.run(self.transport.as_ref(), on_record).await
    }
}

impl fmt::Debug for Streamer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Streamer").field("root", &self.root).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_framing() {
        let session = StreamSession::new("http://h/db/_design/d/_view/v".to_string());
        assert_eq!(session.framing(), Framing::Array);
        assert_eq!(session.records(), 0);
        assert!(session.header().is_none());

        let session = StreamSession::new("http://h/db/_all_docs?limit=1".to_string());
        assert_eq!(session.framing(), Framing::Array);

        let session = StreamSession::new("http://h/db/_design/d/_list/l/v".to_string());
        assert_eq!(session.framing(), Framing::Line);
        assert_eq!(session.url(), "http://h/db/_design/d/_list/l/v");
    }
}
