// MCP tool-call payloads exchanged at the protocol boundary

use serde::{Deserialize, Serialize};

/// Tool definition for MCP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

impl ToolSchema {
    /// Names listed under `inputSchema.required`
    pub fn required_fields(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(|r| r.as_array())
            .map(|r| r.iter().filter_map(|f| f.as_str()).collect())
            .unwrap_or_default()
    }
}

/// List tools response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListToolsResult {
    pub tools: Vec<ToolSchema>,
}

/// Call tool response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
    /// `{description, spec}` for chart results
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl CallToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::text(text)],
            is_error: None,
            meta: None,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::error(text)],
            is_error: Some(true),
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }

    /// Text of the first text item
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|c| match c {
            ToolContent::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image")]
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    #[serde(rename = "resource")]
    Resource {
        uri: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

impl ToolContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::Text { text: format!("Error: {}", text.into()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_wire_shape() {
        let result = CallToolResult::text("data:image/png;base64,AAAA")
            .with_meta(json!({ "description": "d", "spec": { "type": "pie" } }));
        let wire = serde_json::to_value(&result).unwrap();
        assert_eq!(wire["content"][0], json!({ "type": "text", "text": "data:image/png;base64,AAAA" }));
        assert_eq!(wire["_meta"]["spec"]["type"], json!("pie"));
        assert!(wire.get("isError").is_none());
    }

    #[test]
    fn test_error_result() {
        let result = CallToolResult::error("boom");
        assert!(result.is_error());
        assert_eq!(result.first_text(), Some("Error: boom"));
        assert_eq!(serde_json::to_value(&result).unwrap()["isError"], json!(true));
    }

    #[test]
    fn test_required_fields() {
        let schema = ToolSchema {
            name: "t".into(),
            description: String::new(),
            input_schema: json!({ "type": "object", "required": ["data", "title"] }),
        };
        assert_eq!(schema.required_fields(), vec!["data", "title"]);
    }
}
