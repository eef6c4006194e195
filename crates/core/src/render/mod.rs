//! Local rendering of declarative specs into PNG images.
//!
//! [`LocalRenderer`] owns the engine handle (resolved on first use and
//! reused for the life of the process) and the managed [`OutputDir`].
//! Rendering is CPU bound and runs on the blocking pool.

mod marks;
mod output;
mod scene;
mod shapes;
mod svg;

pub use output::{artifact_filename, OutputDir};
pub use scene::compose;
pub use svg::SvgEngine;

use crate::error::{ChartError, ChartResult};
use crate::translate::VisSpec;
use crate::types::RenderedArtifact;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

/// Default canvas size in pixels
pub const DEFAULT_WIDTH: u32 = 600;
pub const DEFAULT_HEIGHT: u32 = 400;

/// Largest accepted canvas side in pixels
pub const MAX_DIMENSION: u32 = 4096;

/// Opaque rendering engine: spec in, PNG bytes out
pub trait RenderEngine: Send + Sync {
    fn render(&self, spec: &Value, width: u32, height: u32) -> ChartResult<Vec<u8>>;
}

type EngineLoader = Arc<dyn Fn() -> ChartResult<Arc<dyn RenderEngine>> + Send + Sync>;

pub struct LocalRenderer {
    engine: OnceCell<Arc<dyn RenderEngine>>,
    loader: EngineLoader,
    output_dir: Arc<OutputDir>,
}

impl LocalRenderer {
    /// Renderer backed by [`SvgEngine`], loaded on first render
    pub fn new(output_dir: Arc<OutputDir>) -> Self {
        Self::with_loader(output_dir, || {
            let engine: Arc<dyn RenderEngine> = Arc::new(SvgEngine::load()?);
            Ok(engine)
        })
    }

    /// Renderer with an already resolved engine
    pub fn with_engine(output_dir: Arc<OutputDir>, engine: Arc<dyn RenderEngine>) -> Self {
        Self {
            engine: OnceCell::new_with(Some(engine)),
            loader: Arc::new(|| Err(ChartError::render("engine already resolved"))),
            output_dir,
        }
    }

    pub fn with_loader<F>(output_dir: Arc<OutputDir>, loader: F) -> Self
    where
        F: Fn() -> ChartResult<Arc<dyn RenderEngine>> + Send + Sync + 'static,
    {
        Self {
            engine: OnceCell::new(),
            loader: Arc::new(loader),
            output_dir,
        }
    }

    pub fn output_dir(&self) -> &Arc<OutputDir> {
        &self.output_dir
    }

    /// Resolve the engine handle. A failed load is not cached; the next
    /// call tries again.
    async fn engine(&self) -> ChartResult<Arc<dyn RenderEngine>> {
        let engine = self
            .engine
            .get_or_try_init(|| async {
                let loader = self.loader.clone();
                info!("Loading chart rendering engine");
                tokio::task::spawn_blocking(move || loader())
                    .await
                    .map_err(ChartError::render)?
            })
            .await?;
        Ok(engine.clone())
    }

    /// Render `spec` to an in-memory PNG
    pub async fn render_to_buffer(&self, spec: &VisSpec, width: u32, height: u32) -> ChartResult<Vec<u8>> {
        check_dimensions(width, height)?;
        let engine = self.engine().await?;
        let options = render_options(spec, width, height);

        tokio::task::spawn_blocking(move || engine.render(&options, width, height))
            .await
            .map_err(ChartError::render)?
    }

    /// Render `spec` to a fresh file under the output directory
    pub async fn render_to_file(&self, spec: &VisSpec, width: u32, height: u32) -> ChartResult<RenderedArtifact> {
        let dir = self.output_dir.resolve().await?;
        let bytes = self.render_to_buffer(spec, width, height).await?;

        let filename = artifact_filename();
        let path = dir.join(&filename);
        tokio::fs::write(&path, &bytes).await?;
        info!(path = %path.display(), bytes = bytes.len(), "Rendered chart to file");

        Ok(RenderedArtifact { path, filename })
    }
}

fn check_dimensions(width: u32, height: u32) -> ChartResult<()> {
    let valid = 1..=MAX_DIMENSION;
    if valid.contains(&width) && valid.contains(&height) {
        Ok(())
    } else {
        Err(ChartError::render(format!(
            "canvas {}x{} outside 1..={} pixels",
            width, height, MAX_DIMENSION
        )))
    }
}

/// Spec merged with the canvas size and output format
fn render_options(spec: &VisSpec, width: u32, height: u32) -> Value {
    let mut options = spec.as_map().clone();
    options.insert("width".to_string(), json!(width));
    options.insert("height".to_string(), json!(height));
    options.insert("imageType".to_string(), json!("png"));
    Value::Object(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::translate;
    use crate::types::PNG_SIGNATURE;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct FixedEngine;

    impl RenderEngine for FixedEngine {
        fn render(&self, spec: &Value, width: u32, height: u32) -> ChartResult<Vec<u8>> {
            assert_eq!(spec["imageType"], json!("png"));
            assert_eq!(spec["width"], json!(width));
            assert_eq!(spec["height"], json!(height));
            let mut bytes = PNG_SIGNATURE.to_vec();
            bytes.extend(std::iter::repeat(0u8).take(200));
            Ok(bytes)
        }
    }

    struct FailingEngine;

    impl RenderEngine for FailingEngine {
        fn render(&self, _spec: &Value, _width: u32, _height: u32) -> ChartResult<Vec<u8>> {
            Err(ChartError::render("engine exploded"))
        }
    }

    fn line_spec() -> VisSpec {
        translate(
            "line",
            &json!({
                "data": [
                    { "time": "2020", "value": 100 },
                    { "time": "2021", "value": 140 },
                    { "time": "2022", "value": 120 }
                ],
                "title": "Sales"
            }),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_svg_engine_buffer_is_png() {
        let temp = TempDir::new().unwrap();
        let renderer = LocalRenderer::new(Arc::new(OutputDir::new(temp.path())));

        let bytes = renderer.render_to_buffer(&line_spec(), 600, 400).await.unwrap();
        assert_eq!(bytes[..4], PNG_SIGNATURE);
        assert!(bytes.len() > 100);
    }

    #[tokio::test]
    async fn test_svg_engine_file_is_png() {
        let temp = TempDir::new().unwrap();
        let renderer = LocalRenderer::new(Arc::new(OutputDir::new(temp.path().join("out"))));

        let artifact = renderer.render_to_file(&line_spec(), 600, 400).await.unwrap();
        assert!(artifact.path.starts_with(temp.path()));
        assert_eq!(artifact.path.file_name().unwrap(), artifact.filename.as_str());

        let bytes = std::fs::read(&artifact.path).unwrap();
        assert_eq!(bytes[..4], PNG_SIGNATURE);
        assert!(bytes.len() > 100);
    }

    #[tokio::test]
    async fn test_every_translated_spec_renders() {
        let temp = TempDir::new().unwrap();
        let renderer = LocalRenderer::new(Arc::new(OutputDir::new(temp.path())));
        let cases = [
            ("pie", json!({ "data": [{ "category": "A", "value": 3 }, { "category": "B", "value": 1 }], "innerRadius": 0.5 })),
            ("column", json!({ "data": [
                { "category": "A", "value": 3, "group": "x" },
                { "category": "A", "value": 2, "group": "y" }
            ], "group": true })),
            ("histogram", json!({ "data": [1, 2, 2, 3, 3, 3, 4, 5], "binNumber": 4 })),
            ("waterfall", json!({ "data": [{ "category": "a", "value": 10 }, { "category": "b", "value": -4 }, { "category": "t", "isTotal": true }] })),
            ("radar", json!({ "data": [{ "name": "a", "value": 3 }, { "name": "b", "value": 4 }, { "name": "c", "value": 5 }] })),
            ("dual-axes", json!({ "categories": ["x", "y"], "series": [{ "type": "column", "data": [1, 2] }, { "type": "line", "data": [3, 1] }] })),
            ("liquid", json!({ "percent": 0.4 })),
            ("treemap", json!({ "data": [{ "name": "a", "value": 1 }, { "name": "b", "value": 2 }] })),
            ("sankey", json!({ "data": [{ "source": "a", "target": "b", "value": 2 }] })),
            ("mind-map", json!({ "data": { "name": "root", "children": [{ "name": "leaf" }] } })),
            ("venn", json!({ "data": [{ "sets": ["A"], "value": 4 }, { "sets": ["B"], "value": 2 }] })),
            ("word-cloud", json!({ "data": [{ "text": "rust", "value": 9 }] })),
            ("boxplot", json!({ "data": [{ "category": "a", "value": 1 }, { "category": "a", "value": 5 }] })),
        ];

        for (chart_type, args) in cases {
            let spec = translate(chart_type, &args).unwrap();
            let bytes = renderer
                .render_to_buffer(&spec, 400, 300)
                .await
                .unwrap_or_else(|e| panic!("{} failed: {}", chart_type, e));
            assert_eq!(bytes[..4], PNG_SIGNATURE, "{}", chart_type);
        }
    }

    #[tokio::test]
    async fn test_huge_bin_number_renders() {
        let temp = TempDir::new().unwrap();
        let renderer = LocalRenderer::new(Arc::new(OutputDir::new(temp.path())));

        let spec = translate("histogram", &json!({ "data": [1, 2, 3], "binNumber": 1e13 })).unwrap();
        let bytes = renderer.render_to_buffer(&spec, 400, 300).await.unwrap();
        assert_eq!(bytes[..4], PNG_SIGNATURE);
    }

    #[tokio::test]
    async fn test_canvas_size_is_bounded() {
        let temp = TempDir::new().unwrap();
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = loads.clone();
        let renderer = LocalRenderer::with_loader(Arc::new(OutputDir::new(temp.path())), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let engine: Arc<dyn RenderEngine> = Arc::new(FixedEngine);
            Ok(engine)
        });

        for (width, height) in [(0, 400), (600, 0), (MAX_DIMENSION + 1, 400), (600, u32::MAX)] {
            let err = renderer.render_to_buffer(&line_spec(), width, height).await.unwrap_err();
            assert!(matches!(err, ChartError::Render(_)), "{}x{}", width, height);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 0);

        renderer.render_to_buffer(&line_spec(), MAX_DIMENSION, 1).await.unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_engine_loaded_once() {
        let temp = TempDir::new().unwrap();
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = loads.clone();
        let renderer = LocalRenderer::with_loader(Arc::new(OutputDir::new(temp.path())), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let engine: Arc<dyn RenderEngine> = Arc::new(FixedEngine);
            Ok(engine)
        });

        renderer.render_to_buffer(&line_spec(), 10, 10).await.unwrap();
        renderer.render_to_file(&line_spec(), 10, 10).await.unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_engine_failure_is_render_error() {
        let temp = TempDir::new().unwrap();
        let renderer = LocalRenderer::with_engine(Arc::new(OutputDir::new(temp.path())), Arc::new(FailingEngine));

        let err = renderer.render_to_buffer(&line_spec(), 10, 10).await.unwrap_err();
        assert!(matches!(err, ChartError::Render(_)));
        assert!(err.to_string().contains("engine exploded"));
    }

    #[tokio::test]
    async fn test_file_mode_surfaces_directory_error() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let renderer = LocalRenderer::with_engine(Arc::new(OutputDir::new(blocker.join("dir"))), Arc::new(FixedEngine));
        let err = renderer.render_to_file(&line_spec(), 10, 10).await.unwrap_err();
        assert!(matches!(err, ChartError::Configuration(_)));
    }
}
