//! Routing logical function names to the server.
//!
//! Every query goes through the same steps:
//!
//! 1. the design document must be named and persisted;
//! 2. a list name of the form `<list>/<other-doc>/<view>` must not point back
//!    at this document;
//! 3. stored defaults for the name are merged with the caller's options,
//!    caller winning per key;
//! 4. `"<design-name>/<function-name>"` is sent to the target database.
//!
//! The target database is an argument, so one design document's functions can
//! be run against any database that holds a copy of it.

use super::Design;
use crate::database::Database;
use crate::error::{CouchError, Result};
use crate::types::{FunctionKind, QueryOptions, Record};
use serde_json::Value;

impl Design {
    /// Query a view on the bound database
    pub async fn view(&self, name: &str, options: &QueryOptions) -> Result<Value> {
        self.query_on(self.bound_database()?, name, FunctionKind::View, options).await
    }

    /// Run a list on the bound database.
    ///
    /// `name` is `<list>/<view>` for a view of this document, or
    /// `<list>/<other-doc>/<view>` for a view of another design document.
    pub async fn list(&self, name: &str, options: &QueryOptions) -> Result<Value> {
        self.query_on(self.bound_database()?, name, FunctionKind::List, options).await
    }

    /// Run a show (`<show>/<doc-id>`) on the bound database
    pub async fn show(&self, name: &str, options: &QueryOptions) -> Result<Value> {
        self.query_on(self.bound_database()?, name, FunctionKind::Show, options).await
    }

    /// Query a view on `db`
    pub async fn view_on(&self, db: &Database, name: &str, options: &QueryOptions) -> Result<Value> {
        self.query_on(db, name, FunctionKind::View, options).await
    }

    /// Run a list on `db`
    pub async fn list_on(&self, db: &Database, name: &str, options: &QueryOptions) -> Result<Value> {
        self.query_on(db, name, FunctionKind::List, options).await
    }

    /// Run any function of this document against `db`, buffered.
    pub async fn query_on(
        &self,
        db: &Database,
        name: &str,
        kind: FunctionKind,
        options: &QueryOptions,
    ) -> Result<Value> {
        let (slug, options) = self.resolve(name, kind, options)?;
        tracing::debug!(%kind, slug = %slug, db = db.root(), "dispatching design function");
        db.query(kind, &slug, &options).await
    }

    /// Run any function of this document against `db`, streaming each record
    /// to `on_record`. Returns the view header when there is one.
    pub async fn stream_on<F>(
        &self,
        db: &Database,
        name: &str,
        kind: FunctionKind,
        options: &QueryOptions,
        on_record: F,
    ) -> Result<Option<Value>>
    where
        F: FnMut(Record),
    {
        let (slug, options) = self.resolve(name, kind, options)?;
        let mut streamer = db.streamer();
        match kind {
            FunctionKind::View => streamer.view(&slug, &options, on_record).await,
            FunctionKind::List => streamer.list(&slug, &options, on_record).await,
            FunctionKind::Show => streamer.show(&slug, &options, on_record).await,
        }
    }

    /// Stored defaults for `name` under `kind`; only views carry any.
    pub fn stored_defaults(&self, kind: FunctionKind, name: &str) -> QueryOptions {
        match kind {
            FunctionKind::View => self
                .views
                .get(name)
                .map(|view| view.defaults())
                .unwrap_or_default(),
            FunctionKind::List | FunctionKind::Show => QueryOptions::new(),
        }
    }

    /// Validate and build the `"<design>/<function>"` slug and final options.
    fn resolve(&self, name: &str, kind: FunctionKind, options: &QueryOptions) -> Result<(String, QueryOptions)> {
        let design = self.persisted_name()?;

        if kind == FunctionKind::List {
            let segments: Vec<&str> = name.split('/').collect();
            if segments.len() == 3 && segments[1] == design {
                return Err(CouchError::invalid(
                    "external _design doc specified is same as primary _design doc",
                ));
            }
        }

        let merged = self.stored_defaults(kind, name).merged(options);
        Ok((format!("{}/{}", design, name), merged))
    }

    fn persisted_name(&self) -> Result<&str> {
        let name = self
            .name()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| CouchError::invalid("_design doc has no name"))?;
        if self.rev.is_none() {
            return Err(CouchError::invalid(format!(
                "_design/{} has not been saved",
                name
            )));
        }
        Ok(name)
    }

    fn bound_database(&self) -> Result<&Database> {
        self.database
            .as_ref()
            .ok_or_else(|| CouchError::invalid("_design doc is not bound to a database"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::ViewOptions;
    use serde_json::json;

    fn saved(name: &str) -> Design {
        let mut design = Design::named(name);
        design.rev = Some("1-abc".to_string());
        design
    }

    #[test]
    fn test_resolve_merges_defaults() {
        let mut design = saved("test");
        design
            .view_by(&["name"], ViewOptions::new().with_default("descending", true).with_default("limit", 10))
            .unwrap();

        let (slug, opts) = design
            .resolve("by_name", FunctionKind::View, &QueryOptions::new().with("descending", false))
            .unwrap();
        assert_eq!(slug, "test/by_name");
        assert_eq!(opts.get("descending"), Some(&json!(false)));
        assert_eq!(opts.get("limit"), Some(&json!(10)));
        // stored defaults are untouched
        assert_eq!(design.stored_defaults(FunctionKind::View, "by_name").get("descending"), Some(&json!(true)));
    }

    #[test]
    fn test_resolve_unknown_view_has_no_defaults() {
        let design = saved("test");
        let (_, opts) = design
            .resolve("by_nothing", FunctionKind::View, &QueryOptions::new().with("limit", 1))
            .unwrap();
        assert_eq!(opts, QueryOptions::new().with("limit", 1));
    }

    #[test]
    fn test_resolve_rejects_self_referencing_list() {
        let design = saved("test");
        let err = design
            .resolve("echo/test/by_name", FunctionKind::List, &QueryOptions::new())
            .unwrap_err();
        assert!(matches!(err, CouchError::InvalidArgument(_)));
    }

    #[test]
    fn test_resolve_allows_foreign_list() {
        let design = saved("test");
        let (slug, _) = design
            .resolve("echo/other/by_age", FunctionKind::List, &QueryOptions::new())
            .unwrap();
        assert_eq!(slug, "test/echo/other/by_age");

        let (slug, _) = design.resolve("echo/by_name", FunctionKind::List, &QueryOptions::new()).unwrap();
        assert_eq!(slug, "test/echo/by_name");
    }

    #[test]
    fn test_resolve_requires_persisted_document() {
        let mut design = Design::new();
        design.view_by(&["name"], ViewOptions::new()).unwrap();
        assert!(matches!(
            design.resolve("by_name", FunctionKind::View, &QueryOptions::new()),
            Err(CouchError::InvalidArgument(_))
        ));

        design.set_name("unsaved");
        assert!(matches!(
            design.resolve("by_name", FunctionKind::View, &QueryOptions::new()),
            Err(CouchError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_view_requires_bound_database() {
        let design = saved("test");
        assert!(matches!(
            design.view("by_name", &QueryOptions::new()).await,
            Err(CouchError::InvalidArgument(_))
        ));
    }
}
