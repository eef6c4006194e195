// MCP server: chart tools behind list/call entry points

use crate::generate::ChartGenerator;
use crate::protocol::{CallToolResult, ListToolsResult};
use crate::tools::{register_chart_tools, ToolRegistry};
use chart_core::{ChartConfig, ChartResult};
use serde_json::Value;
use std::sync::Arc;

pub const SERVER_NAME: &str = "mcp-server-chart";

pub struct McpServer {
    registry: ToolRegistry,
    generator: Arc<ChartGenerator>,
}

impl McpServer {
    /// Server exposing every chart tool not listed in `DISABLED_TOOLS`
    pub fn new(generator: Arc<ChartGenerator>) -> Self {
        let mut registry = ToolRegistry::with_disabled(generator.config().disabled_tools.clone());
        register_chart_tools(&mut registry, &generator);
        tracing::info!("Registered {} tools", registry.len());
        Self {
            registry,
            generator,
        }
    }

    pub fn from_config(config: ChartConfig) -> ChartResult<Self> {
        Ok(Self::new(Arc::new(ChartGenerator::from_config(config)?)))
    }

    pub fn generator(&self) -> &Arc<ChartGenerator> {
        &self.generator
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn list_tools(&self) -> ListToolsResult {
        ListToolsResult {
            tools: self.registry.list_schemas(),
        }
    }

    /// Run a tool. Every failure comes back as an error result.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> CallToolResult {
        tracing::info!(tool = name, "Calling tool");
        match self.registry.call(name, arguments).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(tool = name, "Tool failed: {:#}", e);
                CallToolResult::error(format!("{:#}", e))
            }
        }
    }
}
