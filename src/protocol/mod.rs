//! Protocol constants and URL construction for the CouchDB HTTP API.
//!
//! # Endpoint Layout
//!
//! | Function | Path |
//! |----------|------|
//! | View | `<root>/_design/<doc>/_view/<view>` |
//! | List | `<root>/_design/<doc>/_list/<list>/<view-path>` |
//! | Show | `<root>/_design/<doc>/_show/<show>/<doc-id>` |
//! | All docs | `<root>/_all_docs` |
//!
//! `<root>` is the database URL (`http://host:5984/<db>`).

pub mod urls;

pub use urls::{
    design_id, design_name, design_url, escape_docid, paramify_url, resolve_list_url,
    resolve_show_url, resolve_view_url, Framing,
};

/// Protocol constants
pub mod constants {
    /// Id prefix of design documents
    pub const DESIGN_PREFIX: &str = "_design/";

    /// Key under which a view's stored query defaults are persisted
    pub const DEFAULTS_KEY: &str = "couchrest-defaults";

    /// URL marker of view endpoints
    pub const VIEW_MARKER: &str = "_view";

    /// URL marker of the built-in all-documents endpoint
    pub const ALL_DOCS_MARKER: &str = "_all_docs";

    /// Name reported for the default list/show implementations
    pub const ECHO: &str = "echo";

    /// Default server URL
    pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5984";
}
