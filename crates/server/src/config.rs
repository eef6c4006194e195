use anyhow::{Context, Result};
use chart_core::{ChartConfig, ImageDelivery, RenderMode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Optional TOML file; every value set here overrides the environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub render_mode: Option<RenderMode>,
    pub vis_request_server: Option<String>,
    pub service_id: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub image_server_host: Option<String>,
    pub image_server_port: Option<u32>,
    pub image_delivery: Option<ImageDelivery>,
    pub disabled_tools: Option<Vec<String>>,
}

impl ServerConfig {
    /// Load the config file if it exists, otherwise use defaults
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            tracing::info!("Configuration file {} not found, using environment only", config_path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .context("Failed to read configuration file")?;
        toml::from_str(&content).context("Failed to parse configuration file")
    }

    /// Overlay the file onto an environment lookup and validate the result
    pub fn resolve<F>(&self, env: F) -> Result<ChartConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let overrides = self.as_variables();
        let config = ChartConfig::from_lookup(|key| overrides.get(key).cloned().or_else(|| env(key)))?;
        Ok(config)
    }

    /// The file's values under their environment variable names
    fn as_variables(&self) -> HashMap<&'static str, String> {
        let mut vars = HashMap::new();
        let mut set = |key: &'static str, value: Option<String>| {
            if let Some(value) = value {
                vars.insert(key, value);
            }
        };

        set(
            "RENDER_MODE",
            self.render_mode.map(|m| match m {
                RenderMode::Local => "local".to_string(),
                RenderMode::Remote => "remote".to_string(),
            }),
        );
        set("VIS_REQUEST_SERVER", self.vis_request_server.clone());
        set("SERVICE_ID", self.service_id.clone());
        set("CHART_IMAGE_DIR", self.output_dir.as_ref().map(|p| p.display().to_string()));
        set("IMAGE_SERVER_HOST", self.image_server_host.clone());
        set("IMAGE_SERVER_PORT", self.image_server_port.map(|p| p.to_string()));
        set(
            "IMAGE_DELIVERY",
            self.image_delivery.map(|d| match d {
                ImageDelivery::Inline => "inline".to_string(),
                ImageDelivery::Url => "url".to_string(),
            }),
        );
        set("DISABLED_TOOLS", self.disabled_tools.as_ref().map(|t| t.join(",")));
        vars
    }
}
