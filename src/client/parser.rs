//! Incremental parsers for streamed CouchDB output.
//!
//! Two layers turn a raw byte stream into records:
//!
//! 1. [`LineParser`] buffers arbitrary byte chunks and yields complete lines.
//! 2. [`RecordParser`] classifies each line as header, row, raw output or
//!    structural noise, depending on the endpoint's [`Framing`].
//!
//! # Array Framing
//!
//! Views and `_all_docs` stream a single JSON object spread over lines:
//!
//! ```text
//! {"total_rows":2,"offset":0,"rows":[
//! {"id":"a","key":"x","value":null},
//! {"id":"b","key":"y","value":null}
//! ]}
//! ```
//!
//! The first line is the header: everything before its last `,` is closed with
//! `}` and parsed (`{"total_rows":2,"offset":0}`). Each later line has its
//! `{...}` span extracted and parsed as a row; lines that do not parse (`]}`)
//! are dropped.
//!
//! # Line Framing
//!
//! Lists and shows emit free-form lines. Lines containing a JSON object are
//! decoded; any other line is passed through verbatim as [`Record::Raw`].
//!
//! Row extraction is best-effort: the `{...}` span runs from the first `{` to
//! the last `}` of the line, which relies on the server writing exactly one row
//! object per line.
//!
//! # Examples
//!
//! ```
//! use couchrest::client::{LineParser, RecordParser};
//! use couchrest::protocol::Framing;
//!
//! let mut lines = LineParser::new();
//! let mut records = RecordParser::new(Framing::Array);
//!
//! let mut rows = Vec::new();
//! for chunk in [&b"{\"total_rows\":1,\"offset\":0,\"ro"[..], b"ws\":[\n{\"key\":1}\n]}\n"] {
//!     for line in lines.feed(chunk) {
//!         rows.extend(records.feed_line(&line));
//!     }
//! }
//!
//! assert_eq!(rows.len(), 1);
//! assert_eq!(records.header().unwrap()["total_rows"], 1);
//! ```

use crate::protocol::Framing;
use crate::types::Record;
use bytes::BytesMut;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static OBJECT_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{.*\}").expect("static pattern"));

/// Splits a byte stream into lines.
///
/// Lines are returned verbatim, including their `\n` (and any `\r`). Bytes are
/// only decoded once a full line is available, so multi-byte characters split
/// across chunks are preserved.
#[derive(Debug)]
pub struct LineParser {
    /// Bytes received but not yet terminated by a newline
    buffer: BytesMut,
}

impl LineParser {
    /// Create an empty line parser
    pub fn new() -> Self {
        LineParser {
            buffer: BytesMut::with_capacity(8192),
        }
    }

    /// Feed a chunk, returning every line it completes
    pub fn feed(&mut self, data: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(data);
        let mut lines = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line = self.buffer.split_to(pos + 1);
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }

        lines
    }

    /// Flush the unterminated tail once the stream has ended
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let tail = self.buffer.split();
        Some(String::from_utf8_lossy(&tail).into_owned())
    }

    /// Bytes waiting for a newline
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse state of a [`RecordParser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// The next line is the header of an array-framed response
    AwaitingHeader,
    /// Every further line is a row or raw output
    Rows,
}

/// Turns lines into [`Record`]s for one streamed response.
#[derive(Debug)]
pub struct RecordParser {
    framing: Framing,
    state: ParseState,
    header: Option<Value>,
}

impl RecordParser {
    /// Create a parser for an endpoint with the given framing
    pub fn new(framing: Framing) -> Self {
        let state = match framing {
            Framing::Array => ParseState::AwaitingHeader,
            Framing::Line => ParseState::Rows,
        };
        RecordParser {
            framing,
            state,
            header: None,
        }
    }

    /// Feed one line. Returns the record it carries, if any.
    pub fn feed_line(&mut self, line: &str) -> Option<Record> {
        match self.state {
            ParseState::AwaitingHeader => {
                self.header = parse_header(line);
                if self.header.is_none() {
                    tracing::warn!(line = line.trim_end(), "unparseable view header");
                }
                self.state = ParseState::Rows;
                None
            }
            ParseState::Rows => parse_line(line, self.framing),
        }
    }

    /// Current parse state
    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Framing this parser was created for
    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Parsed header, once the first line of an array-framed response was seen
    pub fn header(&self) -> Option<&Value> {
        self.header.as_ref()
    }

    /// Consume the parser, returning the header
    pub fn into_header(self) -> Option<Value> {
        self.header
    }
}

/// Parse the header fragment of an array-framed response.
///
/// Drops everything from the last `,` on and closes the object. Returns
/// `None` when the line has no `,` or the fragment is not JSON.
pub fn parse_header(line: &str) -> Option<Value> {
    let (head, _) = line.rsplit_once(',')?;
    serde_json::from_str(&format!("{}}}", head)).ok()
}

/// Parse one line after the header.
pub fn parse_line(line: &str, framing: Framing) -> Option<Record> {
    if line.trim_end_matches(['\r', '\n']).is_empty() {
        return None;
    }

    let span = OBJECT_SPAN.find(line).map(|m| m.as_str()).unwrap_or_default();
    match serde_json::from_str::<Value>(span) {
        Ok(value) => Some(Record::Json(value)),
        Err(_) => match framing {
            Framing::Line => Some(Record::Raw(line.to_string())),
            Framing::Array => {
                tracing::trace!(line = line.trim_end(), "skipping structural line");
                None
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_line_parser_split_chunks() {
        let mut parser = LineParser::new();
        assert!(parser.feed(b"{\"a\":").is_empty());
        assert_eq!(parser.pending(), 5);

        let lines = parser.feed(b"1}\n{\"b\":2}\r\n{\"c\"");
        assert_eq!(lines, vec!["{\"a\":1}\n".to_string(), "{\"b\":2}\r\n".to_string()]);
        assert_eq!(parser.finish(), Some("{\"c\"".to_string()));
        assert_eq!(parser.finish(), None);
    }

    #[test]
    fn test_line_parser_multibyte_boundary() {
        let mut parser = LineParser::new();
        let bytes = "é\n".as_bytes();
        assert!(parser.feed(&bytes[..1]).is_empty());
        assert_eq!(parser.feed(&bytes[1..]), vec!["é\n".to_string()]);
    }

    #[test]
    fn test_parse_header() {
        let header = parse_header("{\"total_rows\":3,\"offset\":0,\"rows\":[\r\n").unwrap();
        assert_eq!(header, json!({"total_rows": 3, "offset": 0}));
    }

    #[test]
    fn test_parse_header_failures() {
        assert_eq!(parse_header("{\"rows\":[\n"), None);
        assert_eq!(parse_header("not json, at all"), None);
    }

    #[test]
    fn test_parse_line_row_with_trailing_comma() {
        let record = parse_line("{\"id\":\"a\",\"key\":\"x\",\"value\":null},\r\n", Framing::Array);
        assert_eq!(record, Some(Record::Json(json!({"id": "a", "key": "x", "value": null}))));
    }

    #[test]
    fn test_parse_line_structural_dropped() {
        assert_eq!(parse_line("]}\n", Framing::Array), None);
        assert_eq!(parse_line("\r\n", Framing::Array), None);
    }

    #[test]
    fn test_parse_line_raw_passthrough() {
        assert_eq!(
            parse_line("The value is:\n", Framing::Line),
            Some(Record::Raw("The value is:\n".to_string()))
        );
        assert_eq!(parse_line("\n", Framing::Line), None);
    }

    #[test]
    fn test_parse_line_json_in_line_framing() {
        let record = parse_line("{\"json\":{\"n\":1}}\n", Framing::Line);
        assert_eq!(record, Some(Record::Json(json!({"json": {"n": 1}}))));
    }

    #[test]
    fn test_record_parser_array() {
        let mut parser = RecordParser::new(Framing::Array);
        assert_eq!(parser.state(), ParseState::AwaitingHeader);
        assert_eq!(parser.feed_line("{\"total_rows\":2,\"offset\":0,\"rows\":[\n"), None);
        assert_eq!(parser.state(), ParseState::Rows);

        let rows: Vec<Record> = [
            "{\"key\":\"x\"},\n",
            "{\"key\":\"y\"}\n",
            "]}\n",
        ]
        .iter()
        .filter_map(|line| parser.feed_line(line))
        .collect();

        assert_eq!(rows.len(), 2);
        assert_eq!(parser.into_header(), Some(json!({"total_rows": 2, "offset": 0})));
    }

    #[test]
    fn test_record_parser_line_has_no_header() {
        let mut parser = RecordParser::new(Framing::Line);
        assert_eq!(parser.state(), ParseState::Rows);
        assert_eq!(parser.feed_line("hi"), Some(Record::Raw("hi".to_string())));
        assert_eq!(parser.header(), None);
    }
}
