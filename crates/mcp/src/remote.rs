// Client for the remote chart rendering service

use chart_core::{ChartError, ChartResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tag sent with every remote request
pub const REQUEST_SOURCE: &str = "mcp-server-chart";

/// `{success, errorMessage, resultObj}` reply from the remote service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub result_obj: Value,
}

impl RemoteEnvelope {
    /// The result object, or the remote-supplied failure message verbatim
    pub fn into_result(self) -> ChartResult<Value> {
        if self.success {
            Ok(self.result_obj)
        } else {
            Err(ChartError::Remote(
                self.error_message
                    .unwrap_or_else(|| "Remote chart service reported a failure".to_string()),
            ))
        }
    }
}

#[async_trait::async_trait]
pub trait RemoteClient: Send + Sync {
    async fn post(&self, url: &str, body: &Value) -> ChartResult<RemoteEnvelope>;
}

/// JSON-over-HTTP client backed by reqwest
pub struct HttpRemote {
    client: reqwest::Client,
}

impl HttpRemote {
    pub fn new() -> ChartResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("chart-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ChartError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl RemoteClient for HttpRemote {
    async fn post(&self, url: &str, body: &Value) -> ChartResult<RemoteEnvelope> {
        tracing::info!(url, "Requesting chart from remote service");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ChartError::Http(e.to_string()))?;

        response
            .json::<RemoteEnvelope>()
            .await
            .map_err(|e| ChartError::Http(format!("Invalid response from remote service: {}", e)))
    }
}
