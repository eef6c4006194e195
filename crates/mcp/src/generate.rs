//! Chart generation: local rendering with remote fallback.
//!
//! A request for a locally renderable chart type in local mode is translated
//! and rendered in-process. Types without a translation rule fall back to the
//! remote service, as does everything in remote mode. Geographic maps always
//! go to the remote service. There is no retry anywhere: the first failure is
//! the answer.

use crate::remote::{HttpRemote, RemoteClient, REQUEST_SOURCE};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chart_core::render::{DEFAULT_HEIGHT, DEFAULT_WIDTH, MAX_DIMENSION};
use chart_core::{
    translate_chart, ChartConfig, ChartError, ChartResult, ChartType, ImageDelivery, ImageServer,
    LocalRenderer, OutputDir,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where a request is sent first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Local,
    Remote,
}

pub struct ChartGenerator {
    config: ChartConfig,
    renderer: Arc<LocalRenderer>,
    image_server: Arc<ImageServer>,
    remote: Arc<dyn RemoteClient>,
}

impl ChartGenerator {
    pub fn new(
        config: ChartConfig,
        renderer: Arc<LocalRenderer>,
        image_server: Arc<ImageServer>,
        remote: Arc<dyn RemoteClient>,
    ) -> Self {
        Self {
            config,
            renderer,
            image_server,
            remote,
        }
    }

    /// Wire up the resvg renderer, image server and HTTP remote client
    pub fn from_config(config: ChartConfig) -> ChartResult<Self> {
        let output_dir = Arc::new(OutputDir::from_config(&config));
        let renderer = Arc::new(LocalRenderer::new(output_dir.clone()));
        let image_server = Arc::new(ImageServer::new(output_dir));
        let remote: Arc<dyn RemoteClient> = Arc::new(HttpRemote::new()?);
        Ok(Self::new(config, renderer, image_server, remote))
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn image_server(&self) -> &Arc<ImageServer> {
        &self.image_server
    }

    /// Start the image server when running locally. No-op in remote mode.
    pub async fn init_local_rendering(&self) -> ChartResult<()> {
        if !self.config.is_local() {
            return Ok(());
        }
        self.image_server
            .ensure_started(&self.config.image_server_host, self.config.image_server_port)
            .await?;
        info!(
            port = self.config.image_server_port,
            "Local rendering mode enabled"
        );
        Ok(())
    }

    pub fn route(&self, chart_type: ChartType) -> Route {
        if self.config.is_local() && chart_type.is_locally_renderable() {
            Route::Local
        } else {
            Route::Remote
        }
    }

    /// Generate a chart and return its data URI or URL
    pub async fn generate(&self, chart_type: ChartType, args: &Value) -> ChartResult<String> {
        if self.route(chart_type) == Route::Local {
            match self.render_locally(chart_type, args).await {
                Err(e) if e.is_unsupported() => {
                    debug!(%chart_type, "No local rule, falling back to remote service");
                }
                result => return result,
            }
        }
        self.generate_remotely(chart_type, args).await
    }

    async fn render_locally(&self, chart_type: ChartType, args: &Value) -> ChartResult<String> {
        let spec = translate_chart(chart_type, args)
            .ok_or_else(|| ChartError::UnsupportedType(chart_type.to_string()))?;
        let (width, height) = dimensions(args);

        match self.config.image_delivery {
            ImageDelivery::Inline => {
                let bytes = self.renderer.render_to_buffer(&spec, width, height).await?;
                Ok(format!("data:image/png;base64,{}", STANDARD.encode(bytes)))
            }
            ImageDelivery::Url => {
                self.image_server
                    .ensure_started(&self.config.image_server_host, self.config.image_server_port)
                    .await?;
                let artifact = self.renderer.render_to_file(&spec, width, height).await?;
                Ok(self.image_server.to_url(&artifact.path))
            }
        }
    }

    async fn generate_remotely(&self, chart_type: ChartType, args: &Value) -> ChartResult<String> {
        let url = self.config.require_remote_endpoint()?;
        let result = self
            .remote
            .post(url, &chart_request_body(chart_type, args))
            .await?
            .into_result()
            .inspect_err(|e| warn!(%chart_type, "Remote chart generation failed: {}", e))?;

        Ok(match result {
            Value::String(url) => url,
            other => other.to_string(),
        })
    }

    /// Geographic map operations, always served remotely
    pub async fn generate_map(&self, tool: &str, input: &Value) -> ChartResult<Value> {
        let url = self.config.require_remote_endpoint()?;
        let body = json!({
            "serviceId": self.config.service_id,
            "tool": tool,
            "input": input,
            "source": REQUEST_SOURCE,
        });
        self.remote.post(url, &body).await?.into_result()
    }
}

/// `{type, ...args, source}`
fn chart_request_body(chart_type: ChartType, args: &Value) -> Value {
    let mut body = Map::new();
    body.insert("type".to_string(), json!(chart_type.as_str()));
    if let Some(args) = args.as_object() {
        body.extend(args.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    body.insert("source".to_string(), json!(REQUEST_SOURCE));
    Value::Object(body)
}

/// Canvas size from `width`/`height` arguments, else the defaults.
/// Oversized requests are clamped to [`MAX_DIMENSION`].
fn dimensions(args: &Value) -> (u32, u32) {
    let pick = |name: &str, default: u32| {
        args.get(name)
            .and_then(Value::as_u64)
            .filter(|v| *v > 0)
            .map(|v| v.min(u64::from(MAX_DIMENSION)) as u32)
            .unwrap_or(default)
    };
    (pick("width", DEFAULT_WIDTH), pick("height", DEFAULT_HEIGHT))
}
