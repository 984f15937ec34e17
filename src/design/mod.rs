//! Design documents: named view, list and show functions stored on the server.
//!
//! A [`Design`] is built in memory with the declarative builders, saved to a
//! database, and then queried by logical function name. Function bodies are
//! opaque strings: they are stored and sent verbatim, never parsed.
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Design`] | One `_design/<name>` document |
//! | [`ViewDefinition`] | A persisted view (map, reduce, stored defaults) |
//! | [`ViewOptions`] | Options for the `view_by` shorthand |
//!
//! # Examples
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
//!     design.set_database(db);
//!     let view = design.view_by(&["name"], ViewOptions::new().with_default("descending", true))?;
//!     design.save().await?;
//!
//!     // descending=true from the stored defaults
//!     let rows = design.view(&view, &QueryOptions::new()).await?;
//!     // explicitly ascending
//!     let rows = design.view(&view, &QueryOptions::new().with("descending", false)).await?;
//!     Ok(())
//! }
//! ```

mod dispatch;
pub mod view;

pub use view::{map_function, view_name, ViewDefinition, ViewOptions};

use crate::database::Database;
use crate::error::{CouchError, Result};
use crate::protocol::constants::ECHO;
use crate::protocol::{design_id, design_name};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// List function used when `list_using` is given no body: re-emits every row
/// as one JSON array.
pub const ECHO_LIST: &str = r#"function(head,req) {
  var row;
  start({"headers":{"Content-Type":"application/json"}});
  send('[');
  row = getRow()
  while(true) {
    if(row) {
      send(JSON.stringify(row));
    }
    row = getRow();
    if(row) {
      send(',');
    } else {
      break;
    }
  }
  send(']');
}
"#;

/// Show function used when `show_using` is given no body: returns the
/// document unchanged.
pub const ECHO_SHOW: &str = r#"function(doc,req) {
  return { 'json' : doc };
}
"#;

/// A design document.
///
/// Serializes to the persisted layout:
///
/// ```text
/// { "_id": "_design/<name>", "_rev": "...",
///   "views": { "<view>": { "map": "...", "reduce": "...", "couchrest-defaults": {...} } },
///   "lists": { "<name>": "..." },
///   "shows": { "<name>": "..." } }
/// ```
///
/// Fields the crate does not model (`language`, `validate_doc_update`, ...)
/// are kept and written back on save.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Design {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    rev: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    views: BTreeMap<String, ViewDefinition>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    lists: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    shows: BTreeMap<String, String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
    #[serde(skip)]
    database: Option<Database>,
}

impl Design {
    /// An unnamed, unsaved design document
    pub fn new() -> Self {
        Self::default()
    }

    /// An unsaved design document called `name`
    pub fn named(name: &str) -> Self {
        let mut design = Self::new();
        design.set_name(name);
        design
    }

    /// Decode a fetched design document
    pub fn from_value(doc: Value) -> Result<Self> {
        Ok(serde_json::from_value(doc)?)
    }

    /// Encode to the persisted layout
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Name without the `_design/` prefix
    pub fn name(&self) -> Option<&str> {
        self.id.as_deref().map(design_name)
    }

    /// Rename; the id becomes `_design/<name>`
    pub fn set_name(&mut self, name: &str) {
        self.id = Some(design_id(name));
    }

    /// Full document id
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Revision of the last save or fetch
    pub fn rev(&self) -> Option<&str> {
        self.rev.as_deref()
    }

    /// Database this document is bound to
    pub fn database(&self) -> Option<&Database> {
        self.database.as_ref()
    }

    /// Bind to a database; used by `save` and the `view`/`list`/`show` calls
    pub fn set_database(&mut self, database: Database) {
        self.database = Some(database);
    }

    /// Unbind from its database
    pub fn clear_database(&mut self) -> Option<Database> {
        self.database.take()
    }

    /// Views by name
    pub fn views(&self) -> &BTreeMap<String, ViewDefinition> {
        &self.views
    }

    /// List functions by name
    pub fn lists(&self) -> &BTreeMap<String, String> {
        &self.lists
    }

    /// Show functions by name
    pub fn shows(&self) -> &BTreeMap<String, String> {
        &self.shows
    }

    /// Define a view keyed on `fields` and return its name (`by_<f1>_and_<f2>...`).
    ///
    /// Without an explicit map, the generated map emits the field value (or an
    /// array of values for several fields) for every document where all the
    /// fields are non-null. A field holding `0`, `false` or `""` still emits.
    ///
    /// # Errors
    ///
    /// [`CouchError::InvalidArgument`] when `fields` is empty and no map
    /// function was supplied.
    pub fn view_by(&mut self, fields: &[&str], options: ViewOptions) -> Result<String> {
        let name = view_name(fields);
        let definition = options
            .into_definition(fields)
            .ok_or_else(|| CouchError::invalid("view_by needs at least one field or a map function"))?;
        self.views.insert(name.clone(), definition);
        Ok(name)
    }

    /// Store a list function under `name`.
    ///
    /// Returns `name`, or `"echo"` when no body is given and the default
    /// echo list was stored instead.
    pub fn list_using(&mut self, name: &str, body: Option<&str>) -> Result<String> {
        if name.is_empty() {
            return Err(CouchError::invalid("_list functions must supply a name"));
        }
        Ok(store_function(&mut self.lists, name, body, ECHO_LIST))
    }

    /// Store a show function under `name`.
    ///
    /// Returns `name`, or `"echo"` when no body is given and the default
    /// echo show was stored instead.
    pub fn show_using(&mut self, name: &str, body: Option<&str>) -> Result<String> {
        if name.is_empty() {
            return Err(CouchError::invalid("_show functions must supply a name"));
        }
        Ok(store_function(&mut self.shows, name, body, ECHO_SHOW))
    }

    /// Save to the bound database, updating the revision.
    ///
    /// # Errors
    ///
    /// [`CouchError::InvalidArgument`] when the document has no name or is not
    /// bound to a database; transport errors as returned by the server.
    pub async fn save(&mut self) -> Result<()> {
        if self.name().map_or(true, str::is_empty) {
            return Err(CouchError::invalid("_design docs require a name"));
        }
        let database = self
            .database
            .clone()
            .ok_or_else(|| CouchError::invalid("_design doc is not bound to a database"))?;

        let mut doc = self.to_value()?;
        database.save_doc(&mut doc).await?;
        self.rev = doc.get("_rev").and_then(Value::as_str).map(str::to_string);

        tracing::debug!(id = self.id.as_deref(), rev = self.rev.as_deref(), "saved design document");
        Ok(())
    }
}

fn store_function(
    functions: &mut BTreeMap<String, String>,
    name: &str,
    body: Option<&str>,
    echo: &str,
) -> String {
    match body {
        Some(body) => {
            functions.insert(name.to_string(), body.to_string());
            name.to_string()
        }
        None => {
            functions.insert(name.to_string(), echo.to_string());
            ECHO.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_view_by_adds_view() {
        let mut design = Design::new();
        let name = design.view_by(&["name"], ViewOptions::new()).unwrap();
        assert_eq!(name, "by_name");
        assert!(design.views().contains_key("by_name"));
        assert_eq!(design.rev(), None);
    }

    #[test]
    fn test_view_by_without_fields() {
        let mut design = Design::new();
        assert!(matches!(
            design.view_by(&[], ViewOptions::new()),
            Err(CouchError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_name_round_trip() {
        let mut design = Design::new();
        assert_eq!(design.name(), None);
        design.set_name("mytest");
        assert_eq!(design.name(), Some("mytest"));
        assert_eq!(design.id(), Some("_design/mytest"));
    }

    #[test]
    fn test_list_using() {
        let mut design = Design::named("test");
        assert_eq!(design.list_using("echo", None).unwrap(), "echo");
        assert_eq!(design.list_using("rows", None).unwrap(), "echo");
        assert_eq!(design.lists()["rows"], ECHO_LIST);
        assert_eq!(
            design.list_using("the_word_hi", Some("function(head,req) { send('hi'); }")).unwrap(),
            "the_word_hi"
        );
        assert_eq!(design.lists()["the_word_hi"], "function(head,req) { send('hi'); }");
    }

    #[test]
    fn test_show_using() {
        let mut design = Design::named("test");
        assert_eq!(design.show_using("doc", None).unwrap(), "echo");
        assert_eq!(design.shows()["doc"], ECHO_SHOW);
        assert_eq!(design.show_using("hi", Some("function(doc,req) { return 'hi'; }")).unwrap(), "hi");
    }

    #[test]
    fn test_builders_require_name() {
        let mut design = Design::new();
        assert!(matches!(design.list_using("", None), Err(CouchError::InvalidArgument(_))));
        assert!(matches!(design.show_using("", Some("x")), Err(CouchError::InvalidArgument(_))));
    }

    #[test]
    fn test_persisted_layout() {
        let mut design = Design::named("test");
        design
            .view_by(&["name"], ViewOptions::new().with_default("descending", true))
            .unwrap();
        design.show_using("hi", Some("function(doc,req){return 'hi'}")).unwrap();

        let doc = design.to_value().unwrap();
        assert_eq!(doc["_id"], "_design/test");
        assert!(doc.get("_rev").is_none());
        assert!(doc.get("lists").is_none());
        assert_eq!(doc["views"]["by_name"]["couchrest-defaults"], json!({"descending": true}));
        assert_eq!(doc["shows"]["hi"], "function(doc,req){return 'hi'}");
    }

    #[test]
    fn test_from_value_keeps_unknown_fields() {
        let design = Design::from_value(json!({
            "_id": "_design/test",
            "_rev": "1-abc",
            "language": "javascript",
            "views": {"by_name": {"map": "function(doc){if (doc.name) emit(doc.name, null)}"}}
        }))
        .unwrap();

        assert_eq!(design.name(), Some("test"));
        assert_eq!(design.rev(), Some("1-abc"));
        assert_eq!(design.views()["by_name"].defaults, None);
        assert_eq!(design.to_value().unwrap()["language"], "javascript");
    }

    #[test]
    fn test_from_value_with_commonjs_lib() {
        let doc = json!({
            "_id": "_design/test",
            "_rev": "2-b",
            "views": {
                "lib": {"utils": "exports.upper = function(s) { return s.toUpperCase(); };"},
                "by_name": {"map": "function(doc){ emit(require('views/lib/utils').upper(doc.name), null) }"}
            }
        });
        let design = Design::from_value(doc.clone()).unwrap();

        assert!(design.views()["lib"].map.is_empty());
        assert_eq!(design.to_value().unwrap(), doc);
    }

    #[tokio::test]
    async fn test_save_requires_name() {
        let mut design = Design::new();
        design.view_by(&["name"], ViewOptions::new()).unwrap();
        assert!(matches!(design.save().await, Err(CouchError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_save_requires_database() {
        let mut design = Design::named("myview");
        assert!(matches!(design.save().await, Err(CouchError::InvalidArgument(_))));
    }
}
