// Tool trait, registry and schema helpers

use crate::protocol::{CallToolResult, ToolSchema};
use anyhow::Result;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Tool executor trait
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool schema for MCP
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments
    async fn execute(&self, arguments: Value) -> Result<CallToolResult>;
}

/// Tool registry for managing available tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    disabled: HashSet<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            disabled: HashSet::new(),
        }
    }

    /// Registry that silently skips the named tools on registration
    pub fn with_disabled<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tools: HashMap::new(),
            disabled: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Register a tool. Returns false when the tool is disabled.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> bool {
        let schema = tool.schema();
        if self.disabled.contains(&schema.name) {
            tracing::debug!(tool = %schema.name, "Tool disabled, not registering");
            return false;
        }
        self.tools.insert(schema.name, tool);
        true
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// List all tool schemas, sorted by name
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self.tools.values().map(|t| t.schema()).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate required arguments and run the named tool.
    ///
    /// Unknown tools and missing required fields become error results; an
    /// `Err` only comes from the tool itself.
    pub async fn call(&self, name: &str, arguments: Value) -> Result<CallToolResult> {
        let Some(tool) = self.get(name) else {
            return Ok(CallToolResult::error(format!("Unknown tool: {}", name)));
        };

        let missing = missing_required(&tool.schema(), &arguments);
        if !missing.is_empty() {
            return Ok(CallToolResult::error(format!(
                "Invalid arguments for {}: missing required field(s) {}",
                name,
                missing.join(", ")
            )));
        }

        tool.execute(arguments).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Required fields of `schema` absent (or null) in `arguments`
pub fn missing_required(schema: &ToolSchema, arguments: &Value) -> Vec<String> {
    schema
        .required_fields()
        .into_iter()
        .filter(|field| arguments.get(*field).map_or(true, Value::is_null))
        .map(str::to_string)
        .collect()
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: Value, required: Vec<&str>) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_number(description: &str) -> Value {
    serde_json::json!({
        "type": "number",
        "description": description
    })
}

pub fn json_schema_boolean(description: &str) -> Value {
    serde_json::json!({
        "type": "boolean",
        "description": description
    })
}

pub fn json_schema_array(items: Value, description: &str) -> Value {
    serde_json::json!({
        "type": "array",
        "items": items,
        "description": description
    })
}

pub fn json_schema_enum(values: &[&str], description: &str) -> Value {
    serde_json::json!({
        "type": "string",
        "enum": values,
        "description": description
    })
}
