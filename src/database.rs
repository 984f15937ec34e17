//! Database handle: buffered queries and the document calls design documents need.
//!
//! A [`Database`] pairs a [`Transport`] with a database root URL
//! (`http://host:5984/<name>`). Queries through it are buffered: the whole
//! response is decoded before returning. For large results use
//! [`Database::streamer`].

use crate::client::{Streamer, Transport};
use crate::design::Design;
use crate::error::{CouchError, Result};
use crate::protocol::{
    design_id, escape_docid, paramify_url, resolve_list_url, resolve_show_url, resolve_view_url,
};
use crate::types::{FunctionKind, QueryOptions};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;

/// A database on a CouchDB server.
#[derive(Clone)]
pub struct Database {
    transport: Arc<dyn Transport>,
    root: String,
}

impl Database {
    /// Handle on the database at `root`
    pub fn new(transport: Arc<dyn Transport>, root: impl Into<String>) -> Self {
        Database {
            transport,
            root: root.into().trim_end_matches('/').to_string(),
        }
    }

    /// Root URL of the database
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Database name (last path segment of the root)
    pub fn name(&self) -> &str {
        self.root.rsplit('/').next().unwrap_or_default()
    }

    /// Transport this handle sends requests through
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// A fresh streaming engine over this database
    pub fn streamer(&self) -> Streamer {
        Streamer::new(self.transport.clone(), self.root.clone())
    }

    /// Query a view named `"<doc>/<view>"`.
    ///
    /// A `keys` option is sent as a POST body instead of a URL parameter.
    pub async fn view(&self, name: &str, options: &QueryOptions) -> Result<Value> {
        let mut options = options.clone();
        let keys = options.remove("keys");
        let url = resolve_view_url(&self.root, name, &options);
        match keys {
            Some(keys) => self.transport.post(&url, &json!({ "keys": keys })).await,
            None => self.transport.get(&url).await,
        }
    }

    /// Run a list named `"<doc>/<list>/<view-path>"`. Non-JSON output comes
    /// back as a JSON string.
    pub async fn list(&self, name: &str, options: &QueryOptions) -> Result<Value> {
        let url = resolve_list_url(&self.root, name, options);
        self.transport.get_raw(&url).await
    }

    /// Run a show named `"<doc>/<show>/<doc-id>"`. Non-JSON output comes
    /// back as a JSON string.
    pub async fn show(&self, name: &str, options: &QueryOptions) -> Result<Value> {
        let url = resolve_show_url(&self.root, name, options);
        self.transport.get_raw(&url).await
    }

    /// Dispatch to [`view`](Self::view), [`list`](Self::list) or [`show`](Self::show)
    pub async fn query(&self, kind: FunctionKind, name: &str, options: &QueryOptions) -> Result<Value> {
        match kind {
            FunctionKind::View => self.view(name, options).await,
            FunctionKind::List => self.list(name, options).await,
            FunctionKind::Show => self.show(name, options).await,
        }
    }

    /// Fetch a document by id
    pub async fn get(&self, id: &str) -> Result<Value> {
        self.transport.get(&self.doc_url(id)).await
    }

    /// Fetch the design document `_design/<name>` bound to this database
    pub async fn get_design(&self, name: &str) -> Result<Design> {
        let doc = self.get(&design_id(name)).await?;
        let mut design = Design::from_value(doc)?;
        design.set_database(self.clone());
        Ok(design)
    }

    /// Save a document.
    ///
    /// PUTs to its `_id` when it has one, POSTs to the database otherwise.
    /// The assigned `_id` and new `_rev` are written back into `doc`.
    pub async fn save_doc(&self, doc: &mut Value) -> Result<Value> {
        let id = doc.get("_id").and_then(Value::as_str).map(str::to_string);
        let response = match id {
            Some(id) => self.transport.put(&self.doc_url(&id), doc).await?,
            None => self.transport.post(&self.root, doc).await?,
        };

        let fields = doc
            .as_object_mut()
            .ok_or_else(|| CouchError::invalid("documents must be JSON objects"))?;
        if let Some(id) = response.get("id") {
            fields.insert("_id".to_string(), id.clone());
        }
        if let Some(rev) = response.get("rev") {
            fields.insert("_rev".to_string(), rev.clone());
        }
        Ok(response)
    }

    /// Delete a document at a given revision
    pub async fn delete_doc(&self, id: &str, rev: &str) -> Result<Value> {
        let options = QueryOptions::new().with("rev", rev);
        self.transport.delete(&paramify_url(&self.doc_url(id), &options)).await
    }

    /// Copy a document to `destination` (an id, optionally `id?rev=...`)
    pub async fn copy_doc(&self, id: &str, destination: &str) -> Result<Value> {
        self.transport.copy(&self.doc_url(id), destination).await
    }

    fn doc_url(&self, id: &str) -> String {
        format!("{}/{}", self.root, escape_docid(id))
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database").field("root", &self.root).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::CouchClient;

    fn db(root: &str) -> Database {
        Database::new(Arc::new(CouchClient::new()), root)
    }

    #[test]
    fn test_root_and_name() {
        let db = db("http://127.0.0.1:5984/people/");
        assert_eq!(db.root(), "http://127.0.0.1:5984/people");
        assert_eq!(db.name(), "people");
        assert_eq!(db.streamer().root(), "http://127.0.0.1:5984/people");
    }

    #[test]
    fn test_doc_url_escaping() {
        let db = db("http://127.0.0.1:5984/people");
        assert_eq!(db.doc_url("_design/test"), "http://127.0.0.1:5984/people/_design/test");
        assert_eq!(db.doc_url("a b/c"), "http://127.0.0.1:5984/people/a%20b%2Fc");
    }

    #[tokio::test]
    async fn test_save_doc_rejects_non_objects() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/people")
            .with_status(201)
            .with_body(r#"{"ok":true,"id":"x","rev":"1-a"}"#)
            .create_async()
            .await;

        let db = db(&format!("{}/people", server.url()));
        let mut doc = serde_json::json!([1, 2]);
        assert!(matches!(db.save_doc(&mut doc).await, Err(CouchError::InvalidArgument(_))));
    }
}
