// resvg-backed engine: spec -> SVG -> PNG

use super::{scene, RenderEngine};
use crate::error::{ChartError, ChartResult};
use resvg::{tiny_skia, usvg};
use serde_json::Value;
use std::sync::Arc;

/// Rasterizes composed SVG scenes with resvg.
///
/// Font discovery is the expensive part, so it happens once in
/// [`SvgEngine::load`] and the database is shared by every render.
pub struct SvgEngine {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl SvgEngine {
    pub fn load() -> ChartResult<Self> {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();
        tracing::debug!(faces = fontdb.len(), "Loaded system fonts for chart rendering");
        Ok(Self {
            fontdb: Arc::new(fontdb),
        })
    }
}

impl RenderEngine for SvgEngine {
    fn render(&self, spec: &Value, width: u32, height: u32) -> ChartResult<Vec<u8>> {
        let svg = scene::compose(spec, width, height)?;
        let options = usvg::Options {
            fontdb: self.fontdb.clone(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(&svg, &options).map_err(ChartError::render)?;

        let size = tree.size().to_int_size();
        let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
            .ok_or_else(|| ChartError::render(format!("invalid canvas size {}x{}", width, height)))?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        pixmap.encode_png().map_err(ChartError::render)
    }
}

impl std::fmt::Debug for SvgEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgEngine").finish_non_exhaustive()
    }
}
