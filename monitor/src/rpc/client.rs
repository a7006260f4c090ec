//! HTTP JSON-RPC client for rippled.
//!
//! Requests are JSON-RPC 2.0 envelopes posted to the node URL:
//!
//! ```json
//! POST <node-url>
//! { "jsonrpc": "2.0", "method": "server_info", "params": {} }
//! ```
//!
//! rippled reports failures in two shapes, both mapped to [`RpcError::Rpc`]:
//!
//! ```json
//! { "error": { "code": -32601, "message": "Method not found." } }
//! { "result": { "error": "noNetwork", "error_code": 17, "error_message": "Not synced to the network." } }
//! ```
//!
//! On success the `result` object is returned untouched; callers decide
//! which fields they care about.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::Serialize;
use serde_json::Value;

/// Errors that can occur while calling a node.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The HTTP client itself could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// Transport-level error (DNS, connect, timeout, truncated body).
    #[error("HTTP POST {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The response body was not valid JSON.
    #[error("invalid JSON from {url}: {source}")]
    InvalidJson {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    /// Well-formed JSON without a `result` or `error` member.
    #[error("response from {url} has no result")]
    MissingResult { url: String },
    /// The node answered with an application-level error.
    #[error("RPC error for {url} (code: {code}): {message}")]
    Rpc {
        url: String,
        code: String,
        message: String,
    },
}

/// Abstract JSON-RPC transport used by the reconciler.
#[async_trait]
pub trait NodeRpc: Send + Sync {
    /// Calls `method` on the node at `url` and returns its `result` object.
    async fn call(&self, url: &str, method: &str, params: Value) -> Result<Value, RpcError>;
}

/// Request envelope posted to the node.
#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
}

/// `reqwest`-backed [`NodeRpc`] implementation.
///
/// The inner client pools connections, so one instance is shared by every
/// monitored node.
#[derive(Clone, Debug)]
pub struct HttpRpcClient {
    client: Client,
}

impl HttpRpcClient {
    /// Builds a client. `timeout` of `None` keeps reqwest's defaults.
    pub fn new(timeout: Option<Duration>) -> Result<Self, RpcError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(RpcError::ClientBuild)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl NodeRpc for HttpRpcClient {
    async fn call(&self, url: &str, method: &str, params: Value) -> Result<Value, RpcError> {
        let req_body = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
        };

        let transport = |source| RpcError::Transport {
            url: url.to_string(),
            source,
        };

        // `.json()` sets `Content-Type: application/json`.
        let resp = self
            .client
            .post(url)
            .header(header::ACCEPT, "application/json")
            .json(&req_body)
            .send()
            .await
            .map_err(transport)?;

        // The HTTP status is not checked: rippled reports errors in the body.
        let bytes = resp.bytes().await.map_err(transport)?;
        let body: Value =
            serde_json::from_slice(&bytes).map_err(|source| RpcError::InvalidJson {
                url: url.to_string(),
                source,
            })?;

        extract_result(url, body)
    }
}

/// Splits a decoded response into its `result` or a typed RPC error.
pub(crate) fn extract_result(url: &str, mut body: Value) -> Result<Value, RpcError> {
    if let Some(err) = body.get("error").filter(|e| is_truthy(e)) {
        let (code, message) = match err {
            Value::Object(_) => (text_of(err.get("code")), text_of(err.get("message"))),
            other => ("unknown".to_string(), text_of(Some(other))),
        };
        return Err(RpcError::Rpc {
            url: url.to_string(),
            code,
            message,
        });
    }

    let result = match body.get_mut("result") {
        Some(result) if !result.is_null() => result.take(),
        _ => {
            return Err(RpcError::MissingResult {
                url: url.to_string(),
            });
        }
    };

    if let Some(err) = result.get("error").filter(|e| is_truthy(e)) {
        let message = result
            .get("error_message")
            .filter(|m| !m.is_null())
            .unwrap_or(err);
        return Err(RpcError::Rpc {
            url: url.to_string(),
            code: text_of(result.get("error_code")),
            message: text_of(Some(message)),
        });
    }

    Ok(result)
}

fn is_truthy(v: &Value) -> bool {
    !matches!(v, Value::Null | Value::Bool(false))
}

fn text_of(v: Option<&Value>) -> String {
    match v {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => "unknown".to_string(),
        Some(other) => other.to_string(),
    }
}
