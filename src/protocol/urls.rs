//! URL resolution for documents, views, lists and shows.
//!
//! Logical names are the slash-separated forms callers use
//! (`"<doc>/<view>"`, `"<doc>/<list>/<view-path>"`, `"<doc>/<show>/<doc-id>"`);
//! this module turns them into concrete endpoint URLs under a database root.
//!
//! # Examples
//!
//! ```
//! use couchrest::protocol::{resolve_view_url, Framing};
//! use couchrest::QueryOptions;
//!
//! let root = "http://localhost:5984/db";
//! let opts = QueryOptions::new().with("limit", 5);
//!
//! let url = resolve_view_url(root, "people/by_name", &opts);
//! assert_eq!(url, "http://localhost:5984/db/_design/people/_view/by_name?limit=5");
//! assert_eq!(Framing::for_url(&url), Framing::Array);
//! ```

use super::constants::{ALL_DOCS_MARKER, DESIGN_PREFIX, VIEW_MARKER};
use crate::types::{FunctionKind, QueryOptions};

/// How an endpoint frames its streamed output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// One JSON object: a header line, one row per line, then `]}`
    Array,
    /// Every line is already an independent unit of output
    Line,
}

impl Framing {
    /// Array-framed iff the URL targets a view or `_all_docs`.
    pub fn for_url(url: &str) -> Framing {
        if url.contains(VIEW_MARKER) || url.contains(ALL_DOCS_MARKER) {
            Framing::Array
        } else {
            Framing::Line
        }
    }
}

/// Append options to a URL as a query string. No `?` is added for an empty set.
pub fn paramify_url(url: &str, options: &QueryOptions) -> String {
    if options.is_empty() {
        url.to_string()
    } else {
        format!("{}?{}", url, options.to_query_string())
    }
}

/// `"_design/<name>"`
pub fn design_id(name: &str) -> String {
    format!("{}{}", DESIGN_PREFIX, name)
}

/// The name part of a design document id, or the id itself when unprefixed.
pub fn design_name(id: &str) -> &str {
    id.strip_prefix(DESIGN_PREFIX).unwrap_or(id)
}

/// Escape a document id for use as a URL path segment.
///
/// Design document ids keep their literal `_design/` prefix; only the
/// remainder is escaped.
pub fn escape_docid(id: &str) -> String {
    match id.strip_prefix(DESIGN_PREFIX) {
        Some(rest) => format!("{}{}", DESIGN_PREFIX, escape(rest)),
        None => escape(id),
    }
}

fn escape(segment: &str) -> String {
    // form encoding writes spaces as `+`, which a path does not decode
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// `<root>/_design/<doc>/<segment>/<path>`, without options.
pub fn design_url(root: &str, doc: &str, kind: FunctionKind, path: &str) -> String {
    format!("{}/{}{}/{}/{}", root, DESIGN_PREFIX, doc, kind.segment(), path)
}

/// Resolve a view name.
///
/// 1. a name that already contains `root` is used as-is, without options;
/// 2. a name starting with `_` (`_all_docs`, `_design/x/_view/y`) is relative to `root`;
/// 3. anything else is `"<doc>/<view>"`.
pub fn resolve_view_url(root: &str, name: &str, options: &QueryOptions) -> String {
    if name.contains(root) {
        return name.to_string();
    }
    if name.starts_with('_') {
        return paramify_url(&format!("{}/{}", root, name), options);
    }
    let (doc, view) = name.split_once('/').unwrap_or((name, ""));
    paramify_url(&design_url(root, doc, FunctionKind::View, view), options)
}

/// Resolve `"<doc>/<list>/<view-path...>"`.
pub fn resolve_list_url(root: &str, name: &str, options: &QueryOptions) -> String {
    resolve_function_url(root, name, FunctionKind::List, options)
}

/// Resolve `"<doc>/<show>/<doc-path...>"`.
pub fn resolve_show_url(root: &str, name: &str, options: &QueryOptions) -> String {
    resolve_function_url(root, name, FunctionKind::Show, options)
}

fn resolve_function_url(root: &str, name: &str, kind: FunctionKind, options: &QueryOptions) -> String {
    let mut parts = name.splitn(3, '/');
    let doc = parts.next().unwrap_or_default();
    let function = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or_default();
    let path = format!("{}/{}", function, rest);
    paramify_url(&design_url(root, doc, kind, &path), options)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "http://127.0.0.1:5984/testdb";

    #[test]
    fn test_view_url_full() {
        let url = format!("{}/_design/a/_view/b?limit=1", ROOT);
        let opts = QueryOptions::new().with("skip", 3);
        assert_eq!(resolve_view_url(ROOT, &url, &opts), url);
    }

    #[test]
    fn test_view_url_reserved() {
        let opts = QueryOptions::new().with("include_docs", true);
        assert_eq!(
            resolve_view_url(ROOT, "_all_docs", &opts),
            format!("{}/_all_docs?include_docs=true", ROOT)
        );
        assert_eq!(
            resolve_view_url(ROOT, "_design/first/_view/test", &QueryOptions::new()),
            format!("{}/_design/first/_view/test", ROOT)
        );
    }

    #[test]
    fn test_view_url_logical() {
        let opts = QueryOptions::new().with("descending", true);
        assert_eq!(
            resolve_view_url(ROOT, "first/test", &opts),
            format!("{}/_design/first/_view/test?descending=true", ROOT)
        );
    }

    #[test]
    fn test_list_url() {
        assert_eq!(
            resolve_list_url(ROOT, "first/keystring/test", &QueryOptions::new()),
            format!("{}/_design/first/_list/keystring/test", ROOT)
        );
        assert_eq!(
            resolve_list_url(ROOT, "test/echo/other/by_age", &QueryOptions::new()),
            format!("{}/_design/test/_list/echo/other/by_age", ROOT)
        );
    }

    #[test]
    fn test_show_url() {
        let opts = QueryOptions::new().with("format", "text");
        assert_eq!(
            resolve_show_url(ROOT, "first/valuestring/abc123", &opts),
            format!("{}/_design/first/_show/valuestring/abc123?format=text", ROOT)
        );
    }

    #[test]
    fn test_framing() {
        assert_eq!(Framing::for_url(&format!("{}/_all_docs", ROOT)), Framing::Array);
        assert_eq!(Framing::for_url(&format!("{}/_design/a/_view/b", ROOT)), Framing::Array);
        assert_eq!(Framing::for_url(&format!("{}/_design/a/_show/b/c", ROOT)), Framing::Line);
        assert_eq!(Framing::for_url(&format!("{}/_design/a/_list/b/c", ROOT)), Framing::Line);
    }

    #[test]
    fn test_design_ids() {
        assert_eq!(design_id("mytest"), "_design/mytest");
        assert_eq!(design_name("_design/mytest"), "mytest");
        assert_eq!(escape_docid("_design/my test"), "_design/my%20test");
        assert_eq!(escape_docid("a/b"), "a%2Fb");
    }
}
