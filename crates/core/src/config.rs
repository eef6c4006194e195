// Runtime configuration consumed by the chart pipeline

use crate::error::{ChartError, ChartResult};
use crate::types::{ImageDelivery, RenderMode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_IMAGE_SERVER_HOST: &str = "localhost";
pub const DEFAULT_IMAGE_SERVER_PORT: u16 = 18900;
pub const DEFAULT_OUTPUT_DIR_NAME: &str = "mcp-chart-images";

/// Configuration resolved once at process start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    pub render_mode: RenderMode,

    /// Remote rendering endpoint (`VIS_REQUEST_SERVER`)
    #[serde(default)]
    pub vis_request_server: Option<String>,

    #[serde(default)]
    pub service_id: Option<String>,

    /// Override for the output directory; `None` means the temp default
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    #[serde(default = "default_host")]
    pub image_server_host: String,

    #[serde(default = "default_port")]
    pub image_server_port: u16,

    #[serde(default)]
    pub image_delivery: ImageDelivery,

    #[serde(default)]
    pub disabled_tools: Vec<String>,
}

fn default_host() -> String {
    DEFAULT_IMAGE_SERVER_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_IMAGE_SERVER_PORT
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            render_mode: RenderMode::Local,
            vis_request_server: None,
            service_id: None,
            output_dir: None,
            image_server_host: default_host(),
            image_server_port: default_port(),
            image_delivery: ImageDelivery::Inline,
            disabled_tools: Vec::new(),
        }
    }
}

impl ChartConfig {
    /// Build from process environment variables
    pub fn from_env() -> ChartResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> ChartResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vis_request_server = non_empty(lookup("VIS_REQUEST_SERVER"));
        if let Some(endpoint) = &vis_request_server {
            url::Url::parse(endpoint).map_err(|e| {
                ChartError::config(format!("VIS_REQUEST_SERVER is not a valid URL ({}): {}", endpoint, e))
            })?;
        }

        let render_mode = match non_empty(lookup("RENDER_MODE")) {
            Some(mode) => parse_render_mode(&mode)?,
            // Local rendering unless a remote service is configured
            None if vis_request_server.is_some() => RenderMode::Remote,
            None => RenderMode::Local,
        };

        let image_server_port = match non_empty(lookup("IMAGE_SERVER_PORT")) {
            Some(port) => parse_port(&port)?,
            None => DEFAULT_IMAGE_SERVER_PORT,
        };

        let image_delivery = match non_empty(lookup("IMAGE_DELIVERY")) {
            Some(delivery) => parse_delivery(&delivery)?,
            None => ImageDelivery::Inline,
        };

        Ok(Self {
            render_mode,
            vis_request_server,
            service_id: non_empty(lookup("SERVICE_ID")),
            output_dir: non_empty(lookup("CHART_IMAGE_DIR")).map(PathBuf::from),
            image_server_host: non_empty(lookup("IMAGE_SERVER_HOST")).unwrap_or_else(default_host),
            image_server_port,
            image_delivery,
            disabled_tools: parse_disabled_tools(lookup("DISABLED_TOOLS").as_deref()),
        })
    }

    pub fn is_local(&self) -> bool {
        self.render_mode == RenderMode::Local
    }

    /// The remote endpoint, or a configuration error naming the setting
    pub fn require_remote_endpoint(&self) -> ChartResult<&str> {
        self.vis_request_server.as_deref().ok_or_else(|| {
            ChartError::config(
                "VIS_REQUEST_SERVER is not configured. Set the VIS_REQUEST_SERVER environment variable to use the remote chart service.",
            )
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

pub fn parse_render_mode(value: &str) -> ChartResult<RenderMode> {
    match value.to_ascii_lowercase().as_str() {
        "local" => Ok(RenderMode::Local),
        "remote" => Ok(RenderMode::Remote),
        other => Err(ChartError::config(format!(
            "RENDER_MODE must be 'local' or 'remote', got '{}'",
            other
        ))),
    }
}

pub fn parse_delivery(value: &str) -> ChartResult<ImageDelivery> {
    match value.to_ascii_lowercase().as_str() {
        "inline" => Ok(ImageDelivery::Inline),
        "url" => Ok(ImageDelivery::Url),
        other => Err(ChartError::config(format!(
            "IMAGE_DELIVERY must be 'inline' or 'url', got '{}'",
            other
        ))),
    }
}

/// Parse an image server port, accepting 1-65535 only
pub fn parse_port(value: &str) -> ChartResult<u16> {
    match value.trim().parse::<u32>() {
        Ok(port) if (1..=65535).contains(&port) => Ok(port as u16),
        _ => Err(ChartError::config(format!(
            "IMAGE_SERVER_PORT must be between 1 and 65535, got '{}'",
            value
        ))),
    }
}

/// Split the disabled-operation list. Unset, empty and `undefined` yield nothing.
pub fn parse_disabled_tools(value: Option<&str>) -> Vec<String> {
    match value {
        None | Some("") | Some("undefined") => Vec::new(),
        Some(list) => list.split(',').map(str::to_string).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ChartResult<ChartConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ChartConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_to_local_mode() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.render_mode, RenderMode::Local);
        assert!(config.vis_request_server.is_none());
        assert_eq!(config.image_server_port, 18900);
        assert_eq!(config.image_server_host, "localhost");
        assert_eq!(config.image_delivery, ImageDelivery::Inline);
        assert!(config.disabled_tools.is_empty());
    }

    #[test]
    fn test_remote_server_switches_mode() {
        let config = config_from(&[("VIS_REQUEST_SERVER", "https://example.com/api/gpt-vis")]).unwrap();
        assert_eq!(config.render_mode, RenderMode::Remote);
        assert_eq!(
            config.require_remote_endpoint().unwrap(),
            "https://example.com/api/gpt-vis"
        );
    }

    #[test]
    fn test_explicit_mode_wins() {
        let config = config_from(&[
            ("VIS_REQUEST_SERVER", "https://example.com/api/gpt-vis"),
            ("RENDER_MODE", "local"),
        ])
        .unwrap();
        assert!(config.is_local());
    }

    #[test]
    fn test_invalid_settings_are_named() {
        let err = config_from(&[("IMAGE_SERVER_PORT", "70000")]).unwrap_err();
        assert!(err.to_string().contains("IMAGE_SERVER_PORT"));

        let err = config_from(&[("IMAGE_SERVER_PORT", "0")]).unwrap_err();
        assert!(err.to_string().contains("IMAGE_SERVER_PORT"));

        let err = config_from(&[("RENDER_MODE", "cloud")]).unwrap_err();
        assert!(err.to_string().contains("RENDER_MODE"));

        let err = config_from(&[("VIS_REQUEST_SERVER", "not a url")]).unwrap_err();
        assert!(err.to_string().contains("VIS_REQUEST_SERVER"));
    }

    #[test]
    fn test_missing_endpoint_is_configuration_error() {
        let config = ChartConfig::default();
        let err = config.require_remote_endpoint().unwrap_err();
        assert!(matches!(err, ChartError::Configuration(_)));
        assert!(err.to_string().contains("VIS_REQUEST_SERVER"));
    }

    #[test]
    fn test_parse_disabled_tools() {
        assert!(parse_disabled_tools(None).is_empty());
        assert!(parse_disabled_tools(Some("")).is_empty());
        assert!(parse_disabled_tools(Some("undefined")).is_empty());
        assert_eq!(
            parse_disabled_tools(Some("generate_fishbone_diagram,generate_mind_map")),
            vec!["generate_fishbone_diagram", "generate_mind_map"]
        );
    }

    #[test]
    fn test_output_dir_override() {
        let config = config_from(&[("CHART_IMAGE_DIR", "/srv/charts")]).unwrap();
        assert_eq!(config.output_dir, Some(PathBuf::from("/srv/charts")));
    }
}
