//! HTTP transport for CouchDB.
//!
//! [`Transport`] is the seam between the query layer and the network: JSON
//! verbs for buffered requests plus a raw line stream for long reads.
//! [`CouchClient`] implements it over `reqwest`.
//!
//! # Examples
//!
//! ## Buffered request
//!
//! ```ignore
//! use couchrest::client::{CouchClient, Transport};
//!
//! #[tokio::main]
//! async fn main() -> couchrest::Result<()> {
//!     let client = CouchClient::new();
//!     let info = client.get("http://127.0.0.1:5984/mydb").await?;
//!     println!("doc_count: {}", info["doc_count"]);
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming read
//!
//! ```ignore
//! use couchrest::client::{CouchClient, Transport};
//!
//! #[tokio::main]
//! async fn main() -> couchrest::Result<()> {
//!     let client = CouchClient::new();
//!     let mut lines = client.open_stream("http://127.0.0.1:5984/mydb/_all_docs").await?;
//!     while let Some(line) = lines.next().await {
//!         print!("{}", line?);
//!     }
//!     Ok(())
//! }
//! ```

use crate::client::{config::ClientConfig, LineParser, LineStream};
use crate::database::Database;
use crate::error::{CouchError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Operations the query layer needs from the network.
///
/// Every buffered verb fails with [`CouchError::Transport`] on a non-2xx
/// response. Nothing is retried.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET and decode JSON
    async fn get(&self, url: &str) -> Result<Value>;

    /// GET, decoding JSON when possible and otherwise returning the body as a
    /// JSON string (list and show functions may emit plain text)
    async fn get_raw(&self, url: &str) -> Result<Value>;

    /// PUT a JSON body
    async fn put(&self, url: &str, body: &Value) -> Result<Value>;

    /// POST a JSON body
    async fn post(&self, url: &str, body: &Value) -> Result<Value>;

    /// DELETE
    async fn delete(&self, url: &str) -> Result<Value>;

    /// COPY to the document id in `destination`
    async fn copy(&self, url: &str, destination: &str) -> Result<Value>;

    /// Open a streaming GET whose body is delivered line by line
    async fn open_stream(&self, url: &str) -> Result<LineStream>;
}

/// The CouchDB HTTP client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct CouchClient {
    client: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl CouchClient {
    /// Create a client with default configuration
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: ClientConfig) -> Self {
        let mut builder = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(90));

        if !config.proxy_url.is_empty() {
            if let Ok(proxy) = reqwest::Proxy::all(&config.proxy_url) {
                builder = builder.proxy(proxy);
            }
        }

        let client = builder.build().unwrap_or_default();

        CouchClient {
            client,
            config: Arc::new(config),
        }
    }

    /// Handle on the database `name` of the configured server
    pub fn database(&self, name: &str) -> Database {
        let root = format!("{}/{}", self.config.server_url.trim_end_matches('/'), name);
        Database::new(Arc::new(self.clone()), root)
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.request_timeout_ms)
    }

    /// Send a buffered request and return the response body of a 2xx answer.
    ///
    /// Adds no content negotiation headers; list and show functions pick
    /// their output format from `Accept`.
    async fn send(
        &self,
        verb: &str,
        url: &str,
        request: reqwest::RequestBuilder,
        payload: Option<&Value>,
    ) -> Result<String> {
        if self.config.enable_logging {
            tracing::debug!(verb, url, "sending request");
        }

        let response = request
            .timeout(self.timeout())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(self.transport_error(verb, url, payload, status.as_u16(), body));
        }
        Ok(body)
    }

    fn transport_error(
        &self,
        verb: &str,
        url: &str,
        payload: Option<&Value>,
        status: u16,
        body: String,
    ) -> CouchError {
        let context = self.config.debug.then(|| {
            let mut context = format!("Error while sending a {} request {}", verb, url);
            if let Some(payload) = payload {
                context.push_str(&format!("\npayload: {}", payload));
            }
            context
        });
        if self.config.enable_logging {
            tracing::debug!(verb, url, status, "request failed");
        }
        CouchError::Transport {
            status,
            body,
            context,
        }
    }

    async fn send_json(
        &self,
        verb: &str,
        url: &str,
        request: reqwest::RequestBuilder,
        payload: Option<&Value>,
    ) -> Result<Value> {
        let request = request
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, "application/json");
        let body = self.send(verb, url, request, payload).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl Default for CouchClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for CouchClient {
    async fn get(&self, url: &str) -> Result<Value> {
        self.send_json("GET", url, self.client.get(url), None).await
    }

    async fn get_raw(&self, url: &str) -> Result<Value> {
        let body = self.send("GET", url, self.client.get(url), None).await?;
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }

    async fn put(&self, url: &str, body: &Value) -> Result<Value> {
        let request = self.client.put(url).body(body.to_string());
        self.send_json("PUT", url, request, Some(body)).await
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value> {
        let request = self.client.post(url).body(body.to_string());
        self.send_json("POST", url, request, Some(body)).await
    }

    async fn delete(&self, url: &str) -> Result<Value> {
        self.send_json("DELETE", url, self.client.delete(url), None).await
    }

    async fn copy(&self, url: &str, destination: &str) -> Result<Value> {
        let method = reqwest::Method::from_bytes(b"COPY")
            .map_err(|e| CouchError::Http(e.to_string()))?;
        let request = self.client.request(method, url).header("Destination", destination);
        self.send_json("COPY", url, request, None).await
    }

    async fn open_stream(&self, url: &str) -> Result<LineStream> {
        if self.config.enable_logging {
            tracing::debug!(url, "opening stream");
        }

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.transport_error("GET", url, None, status.as_u16(), body));
        }

        let (tx, rx) = mpsc::channel(self.config.stream_buffer.max(1));
        let mut stream = response.bytes_stream();

        tokio::spawn(async move {
            use futures::StreamExt;
            let mut parser = LineParser::new();

            loop {
                let chunk_res = tokio::select! {
                    _ = tx.closed() => return, // Receiver dropped while the server is idle
                    next = stream.next() => match next {
                        Some(chunk_res) => chunk_res,
                        None => break,
                    },
                };
                match chunk_res {
                    Ok(chunk) => {
                        for line in parser.feed(&chunk) {
                            if tx.send(Ok(line)).await.is_err() {
                                return; // Receiver dropped
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(CouchError::Http(e.to_string()))).await;
                        return;
                    }
                }
            }

            if let Some(tail) = parser.finish() {
                let _ = tx.send(Ok(tail)).await;
            }
        });

        Ok(LineStream::from_receiver(rx))
    }
}
