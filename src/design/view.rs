//! View definitions and the declarative `view_by` shorthand.

use crate::types::QueryOptions;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One view of a design document, as persisted.
///
/// Entries without a map function (such as the CommonJS `lib` entry) decode
/// with an empty `map`; keys not modelled here are kept in `extra` and
/// written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDefinition {
    /// Map function source
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub map: String,
    /// Reduce function source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduce: Option<String>,
    /// Query options applied unless overridden per call
    #[serde(rename = "couchrest-defaults", default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<QueryOptions>,
    /// Other keys of the persisted entry
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ViewDefinition {
    /// A view with only a map function
    pub fn new(map: impl Into<String>) -> Self {
        ViewDefinition {
            map: map.into(),
            reduce: None,
            defaults: None,
            extra: Map::new(),
        }
    }

    /// Stored defaults, empty when none were persisted
    pub fn defaults(&self) -> QueryOptions {
        self.defaults.clone().unwrap_or_default()
    }
}

/// Options for [`Design::view_by`](super::Design::view_by).
///
/// `map`/`reduce` replace the synthesized map function; `guards` are extra
/// conditions ANDed in front of the null checks; everything set through
/// [`with_default`](Self::with_default) is persisted as the view's stored defaults.
///
/// # Examples
///
/// ```
/// use couchrest::design::ViewOptions;
///
/// let opts = ViewOptions::new()
///     .guard("doc['type'] == 'person'")
///     .with_default("descending", true);
/// assert_eq!(opts.guards().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ViewOptions {
    map: Option<String>,
    reduce: Option<String>,
    guards: Vec<String>,
    defaults: QueryOptions,
}

impl ViewOptions {
    /// No options
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this map function verbatim
    pub fn map(mut self, source: impl Into<String>) -> Self {
        self.map = Some(source.into());
        self
    }

    /// Use this reduce function verbatim (only with an explicit map)
    pub fn reduce(mut self, source: impl Into<String>) -> Self {
        self.reduce = Some(source.into());
        self
    }

    /// Add a raw guard expression to the synthesized map function
    pub fn guard(mut self, expression: impl Into<String>) -> Self {
        self.guards.push(expression.into());
        self
    }

    /// Add a stored query default
    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(name, value);
        self
    }

    /// Guard expressions added so far
    pub fn guards(&self) -> &[String] {
        &self.guards
    }

    /// Build the definition for `fields`.
    ///
    /// Returns `None` when there is neither an explicit map nor a field to
    /// synthesize one from.
    pub(crate) fn into_definition(self, fields: &[&str]) -> Option<ViewDefinition> {
        let mut defaults = self.defaults;

        let (map, reduce) = match self.map {
            Some(map) => {
                if self.reduce.is_some() {
                    defaults.insert("reduce", false);
                }
                (map, self.reduce)
            }
            None if fields.is_empty() => return None,
            None => (map_function(fields, &self.guards), None),
        };

        Some(ViewDefinition {
            map,
            reduce,
            defaults: (!defaults.is_empty()).then_some(defaults),
            extra: Map::new(),
        })
    }
}

/// `"by_" + fields.join("_and_")`
pub fn view_name(fields: &[&str]) -> String {
    format!("by_{}", fields.join("_and_"))
}

/// Synthesize a map function emitting `fields` as the key when every field is non-null.
///
/// ```
/// use couchrest::design::map_function;
///
/// assert_eq!(
///     map_function(&["name"], &[]),
///     "function(doc) {\n  if ((doc['name'] != null)) {\n    emit(doc['name'], null);\n  }\n}\n"
/// );
/// ```
pub fn map_function(fields: &[&str], guards: &[String]) -> String {
    let doc_keys: Vec<String> = fields.iter().map(|f| format!("doc['{}']", escape_js(f))).collect();

    let key_emit = match doc_keys.as_slice() {
        [single] => single.clone(),
        many => format!("[{}]", many.join(", ")),
    };

    let conditions: Vec<String> = guards
        .iter()
        .cloned()
        .chain(doc_keys.iter().map(|k| format!("({} != null)", k)))
        .collect();

    format!(
        "function(doc) {{\n  if ({}) {{\n    emit({}, null);\n  }}\n}}\n",
        conditions.join(" && "),
        key_emit
    )
}

fn escape_js(field: &str) -> String {
    field.replace('\\', "\\\\").replace('\'', "\\'")
}
