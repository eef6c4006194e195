// Geographic map tools, delegated to the remote service

use crate::generate::ChartGenerator;
use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::charts::{description, properties};
use crate::tools::{json_schema_object, Tool};
use anyhow::{Context, Result};
use chart_core::ChartType;
use serde_json::Value;
use std::sync::Arc;

pub struct MapTool {
    chart_type: ChartType,
    generator: Arc<ChartGenerator>,
}

impl MapTool {
    pub fn new(chart_type: ChartType, generator: Arc<ChartGenerator>) -> Self {
        Self {
            chart_type,
            generator,
        }
    }
}

#[async_trait::async_trait]
impl Tool for MapTool {
    fn schema(&self) -> ToolSchema {
        let (properties, required) = properties(self.chart_type);
        ToolSchema {
            name: self.chart_type.tool_name(),
            description: description(self.chart_type).to_string(),
            input_schema: json_schema_object(properties, required),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let tool = self.chart_type.tool_name();
        match self.generator.generate_map(&tool, &arguments).await {
            Ok(result) => into_tool_result(result)
                .with_context(|| format!("Unexpected result from remote service for {}", tool)),
            Err(e) => {
                tracing::error!(%tool, "Map generation failed: {}", e);
                Ok(CallToolResult::error(e.to_string()))
            }
        }
    }
}

/// Pass tool-shaped results through, wrap anything else as text
fn into_tool_result(result: Value) -> Result<CallToolResult> {
    if result.get("content").is_some_and(Value::is_array) {
        return Ok(serde_json::from_value(result)?);
    }
    match result {
        Value::String(text) => Ok(CallToolResult::text(text)),
        other => Ok(CallToolResult::text(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::tests::{harness, FakeRemote};
    use chart_core::{ChartConfig, RenderMode};
    use serde_json::json;

    fn remote_config() -> ChartConfig {
        ChartConfig {
            render_mode: RenderMode::Remote,
            vis_request_server: Some("https://maps.example.com".to_string()),
            ..ChartConfig::default()
        }
    }

    #[tokio::test]
    async fn test_tool_shaped_result_passes_through() {
        let reply = json!({
            "content": [{ "type": "text", "text": "https://maps.example.com/a.png" }],
            "metadata": { "kind": "pin" }
        });
        let h = harness(remote_config(), FakeRemote::replying(reply));
        let tool = MapTool::new(ChartType::PinMap, Arc::new(h.generator));

        let result = tool.execute(json!({ "title": "Stores", "data": ["A"] })).await.unwrap();
        assert!(!result.is_error());
        assert_eq!(result.first_text(), Some("https://maps.example.com/a.png"));
    }

    #[tokio::test]
    async fn test_plain_result_is_wrapped() {
        let h = harness(remote_config(), FakeRemote::replying(json!("https://maps.example.com/b.png")));
        let tool = MapTool::new(ChartType::PathMap, Arc::new(h.generator));

        let result = tool.execute(json!({ "title": "Route", "data": [] })).await.unwrap();
        assert_eq!(result.first_text(), Some("https://maps.example.com/b.png"));
    }

    #[tokio::test]
    async fn test_missing_endpoint_is_error_result() {
        let h = harness(ChartConfig::default(), FakeRemote::replying(Value::Null));
        let tool = MapTool::new(ChartType::DistrictMap, Arc::new(h.generator));

        let result = tool.execute(json!({ "title": "Provinces", "data": {} })).await.unwrap();
        assert!(result.is_error());
        assert!(result.first_text().unwrap().contains("VIS_REQUEST_SERVER"));
        assert_eq!(tool.schema().name, "generate_district_map");
    }
}
