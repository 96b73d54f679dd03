//! JSON-RPC trace provider (`debug_traceTransaction` with geth's `callTracer`).

use super::{DataSourceError, Trace, TraceProvider};
use crate::domain::TxHash;
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Trace provider backed by an archive node's debug namespace.
#[derive(Debug, Clone)]
pub struct RpcTraceProvider {
    client: Client,
    rpc_url: String,
}

impl RpcTraceProvider {
    pub fn new(rpc_url: String) -> Self {
        Self {
            client: Client::new(),
            rpc_url,
        }
    }

    async fn post_rpc(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, DataSourceError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .post(&self.rpc_url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| {
                    backoff::Error::transient(DataSourceError::NetworkError(e.to_string()))
                })?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(DataSourceError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(DataSourceError::ParseError(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl TraceProvider for RpcTraceProvider {
    async fn fetch_trace(&self, tx_hash: &TxHash) -> Result<Option<Trace>, DataSourceError> {
        debug!(tx_hash = %tx_hash, "Fetching call trace");

        let params = serde_json::json!([tx_hash.to_string(), { "tracer": "callTracer" }]);
        let response = self.post_rpc("debug_traceTransaction", params).await?;
        parse_trace_response(response)
    }
}

fn parse_trace_response(response: serde_json::Value) -> Result<Option<Trace>, DataSourceError> {
    if let Some(error) = response.get("error") {
        let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or_default();
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or_default()
            .to_string();
        if message.to_ascii_lowercase().contains("not found") {
            return Ok(None);
        }
        return Err(DataSourceError::RpcError { code, message });
    }

    match response.get("result") {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(result) => serde_json::from_value(result.clone())
            .map(Some)
            .map_err(|e| DataSourceError::ParseError(format!("Invalid call trace: {}", e))),
    }
}
