//! JSON-RPC 2.0 wire client.
//!
//! [`JsonRpcClient`] serialises requests over one pooled HTTP connection, numbers them with a
//! monotonically increasing id starting at 0, and turns the response envelope into either the
//! `result` value or a [`NodeProtocolError`]. Typed wrappers for every node method the session
//! layer needs live in the `methods` submodule.

use core::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};
use std::{sync::Arc, time::Duration};

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::{ChainError, ConfigError, NodeProtocolError, Result};

mod methods;

pub use alloy_rpc_types_eth::{AccessListResult, Block, TransactionReceipt};

/// Diagnostic sink receiving every request and every raw response.
pub trait RpcObserver: Send + Sync + fmt::Debug {
    /// Called right before a request is written to the wire.
    fn on_request(&self, id: u64, request: &Value);

    /// Called with the raw response body, before it is parsed.
    fn on_response(&self, id: u64, response: &str);
}

/// JSON-RPC client bound to a single node URL.
#[derive(Debug)]
pub struct JsonRpcClient {
    http: reqwest::Client,
    url: Url,
    next_id: AtomicU64,
    observer: Option<Arc<dyn RpcObserver>>,
}

impl JsonRpcClient {
    /// Creates a client for `url` with a fresh connection pool.
    pub fn new(url: &str) -> Result<Self> {
        Self::with_timeout(url, None)
    }

    /// Creates a client whose requests fail after `timeout`.
    pub fn with_timeout(url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self::with_client(builder.build()?, url)
    }

    /// Creates a client reusing an existing `reqwest` client.
    pub fn with_client(http: reqwest::Client, url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|err| ConfigError::InvalidUrl {
            url: url.to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self { http, url, next_id: AtomicU64::new(0), observer: None })
    }

    /// Attaches a diagnostic sink.
    pub fn with_observer(mut self, observer: Arc<dyn RpcObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The node URL.
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Sends `method` with positional `params` and returns the `result` member.
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });

        debug!(target: "devchain::rpc", id, method, "Sending request");
        trace!(target: "devchain::rpc", id, %request, "Request body");
        if let Some(observer) = &self.observer {
            observer.on_request(id, &request);
        }

        let response = self.http.post(self.url.clone()).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        trace!(target: "devchain::rpc", id, %status, body = %body, "Received response");
        if let Some(observer) = &self.observer {
            observer.on_response(id, &body);
        }

        process_response(method, &body)
    }

    /// Like [`Self::call`], deserialising the result into `T`.
    pub async fn request<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> Result<T> {
        let result = self.call(method, params).await?;
        serde_json::from_value(result).map_err(|err| {
            ChainError::MalformedResponse(format!("unexpected result for {method}: {err}"))
        })
    }
}

fn process_response(method: &str, body: &str) -> Result<Value> {
    let mut response: Value = serde_json::from_str(body).map_err(|err| {
        ChainError::MalformedResponse(format!("{method} returned a non-JSON body: {err}"))
    })?;

    match response.get_mut("error").map(Value::take) {
        Some(Value::Null) | None => {}
        Some(error) => {
            let error: NodeProtocolError = serde_json::from_value(error).map_err(|err| {
                ChainError::MalformedResponse(format!("{method} returned an invalid error: {err}"))
            })?;
            debug!(target: "devchain::rpc", method, code = error.code, message = %error.message, "Node returned an error");
            return Err(error.into());
        }
    }

    response
        .get_mut("result")
        .map(Value::take)
        .ok_or_else(|| ChainError::MalformedResponse(format!("{method} response has no result")))
}

/// Formats an integer as a `0x`-prefixed, unpadded hex quantity.
pub(crate) fn quantity<T: fmt::LowerHex>(value: T) -> Value {
    Value::String(format!("{value:#x}"))
}

#[cfg(test)]
mod tests {
    use alloy_primitives::U256;

    use super::*;

    #[test]
    fn quantities_are_unpadded() {
        assert_eq!(quantity(0u64), json!("0x0"));
        assert_eq!(quantity(1000u64), json!("0x3e8"));
        assert_eq!(quantity(u128::MAX), json!("0xffffffffffffffffffffffffffffffff"));
        assert_eq!(serde_json::to_value(U256::from(255)).unwrap(), json!("0xff"));
    }

    #[test]
    fn result_is_extracted() {
        let result = process_response("eth_chainId", r#"{"jsonrpc":"2.0","id":0,"result":"0x1"}"#);
        assert_eq!(result.unwrap(), json!("0x1"));

        let result =
            process_response("eth_getTransactionReceipt", r#"{"jsonrpc":"2.0","id":1,"result":null}"#);
        assert_eq!(result.unwrap(), Value::Null);
    }

    #[test]
    fn error_member_wins() {
        let body = r#"{"jsonrpc":"2.0","id":0,"error":{"code":-32601,"message":"Method not found"}}"#;
        match process_response("foo_bar", body) {
            Err(ChainError::Protocol(err)) => {
                assert_eq!(err.code, -32601);
                assert_eq!(err.message, "Method not found");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn malformed_bodies_are_rejected() {
        assert!(matches!(
            process_response("eth_chainId", "<html>bad gateway</html>"),
            Err(ChainError::MalformedResponse(_))
        ));
        assert!(matches!(
            process_response("eth_chainId", r#"{"jsonrpc":"2.0","id":0}"#),
            Err(ChainError::MalformedResponse(_))
        ));
    }

    #[test]
    fn rejects_invalid_urls() {
        assert!(matches!(
            JsonRpcClient::new("not a url"),
            Err(ChainError::Config(ConfigError::InvalidUrl { .. }))
        ));
    }
}
