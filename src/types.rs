//! Core value types shared by the client, the streaming engine and design documents.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`QueryOptions`] | Option-name → JSON value mapping sent as a query string |
//! | [`FunctionKind`] | Closed set of design-document function kinds |
//! | [`Record`] | One unit of streamed output |

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Option names whose values are JSON-encoded before being put in a URL.
const JSON_ENCODED_OPTIONS: [&str; 4] = ["key", "startkey", "endkey", "keys"];

/// Query options for a view, list or show request.
///
/// Options are an unordered mapping from option name to a JSON value
/// (`descending`, `startkey`, `limit`, ...). They are kept sorted by name so
/// that generated URLs are deterministic.
///
/// # Examples
///
/// ```
/// use couchrest::QueryOptions;
///
/// let stored = QueryOptions::new().with("descending", true).with("limit", 10);
/// let call = QueryOptions::new().with("descending", false);
///
/// let merged = stored.merged(&call);
/// assert_eq!(merged.get("descending"), Some(&false.into()));
/// assert_eq!(merged.get("limit"), Some(&10.into()));
/// // the stored defaults are untouched
/// assert_eq!(stored.get("descending"), Some(&true.into()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryOptions(BTreeMap<String, Value>);

impl QueryOptions {
    /// Create an empty option set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace an option, returning the previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    /// Get an option value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Remove an option, returning its value
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    /// Whether the option is set
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of options
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no option is set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate options in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Merge `overrides` on top of `self` without mutating either.
    ///
    /// Every key present in `overrides` replaces the value in `self` wholesale
    /// (no deep merge); keys only present in `self` are kept as they are.
    pub fn merged(&self, overrides: &QueryOptions) -> QueryOptions {
        let mut merged = self.0.clone();
        for (name, value) in &overrides.0 {
            merged.insert(name.clone(), value.clone());
        }
        QueryOptions(merged)
    }

    /// Encode the options as a form-urlencoded query string (without `?`).
    ///
    /// `key`, `startkey`, `endkey` and `keys` are JSON-encoded; every other
    /// value is sent as its plain text.
    ///
    /// ```
    /// use couchrest::QueryOptions;
    ///
    /// let opts = QueryOptions::new().with("startkey", "a").with("limit", 5);
    /// assert_eq!(opts.to_query_string(), "limit=5&startkey=%22a%22");
    /// ```
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in &self.0 {
            serializer.append_pair(name, &option_text(name, value));
        }
        serializer.finish()
    }
}

fn option_text(name: &str, value: &Value) -> String {
    match value {
        Value::String(s) if !JSON_ENCODED_OPTIONS.contains(&name) => s.clone(),
        other => other.to_string(),
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for QueryOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        QueryOptions(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<serde_json::Map<String, Value>> for QueryOptions {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        QueryOptions(map.into_iter().collect())
    }
}

/// Kind of design-document function a query targets.
///
/// Selected once at the call boundary; carries both the namespace key inside
/// the design document and the URL segment of the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// Map/reduce view (`_view`)
    View,
    /// List transform over a view (`_list`)
    List,
    /// Show transform over one document (`_show`)
    Show,
}

impl FunctionKind {
    /// Key of this kind's mapping inside a design document
    pub fn namespace(&self) -> &'static str {
        match self {
            FunctionKind::View => "views",
            FunctionKind::List => "lists",
            FunctionKind::Show => "shows",
        }
    }

    /// Path segment of this kind's endpoint under `_design/<name>/`
    pub fn segment(&self) -> &'static str {
        match self {
            FunctionKind::View => "_view",
            FunctionKind::List => "_list",
            FunctionKind::Show => "_show",
        }
    }
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionKind::View => write!(f, "view"),
            FunctionKind::List => write!(f, "list"),
            FunctionKind::Show => write!(f, "show"),
        }
    }
}

/// One unit of streamed output.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// A line that decoded as JSON (a view row, or a JSON line of a list/show)
    Json(Value),
    /// A line of a list/show that is not JSON, passed through verbatim
    Raw(String),
}

impl Record {
    /// The decoded value, if any
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Record::Json(v) => Some(v),
            Record::Raw(_) => None,
        }
    }

    /// The raw line, if decoding failed
    pub fn as_raw(&self) -> Option<&str> {
        match self {
            Record::Json(_) => None,
            Record::Raw(s) => Some(s),
        }
    }

    /// Consume into the decoded value
    pub fn into_json(self) -> Option<Value> {
        match self {
            Record::Json(v) => Some(v),
            Record::Raw(_) => None,
        }
    }
}
