// Managed output directory for rendered files

use crate::config::{ChartConfig, DEFAULT_OUTPUT_DIR_NAME};
use crate::error::{ChartError, ChartResult};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Directory rendered charts are written to (and served from).
///
/// Created lazily on first [`resolve`](Self::resolve). The path may be
/// overridden with [`set`](Self::set), normally once during start-up.
#[derive(Debug)]
pub struct OutputDir {
    path: RwLock<PathBuf>,
}

impl OutputDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: RwLock::new(path.into()),
        }
    }

    pub fn from_config(config: &ChartConfig) -> Self {
        Self::new(config.output_dir.clone().unwrap_or_else(Self::default_path))
    }

    /// `<tmp>/mcp-chart-images`
    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join(DEFAULT_OUTPUT_DIR_NAME)
    }

    pub fn set(&self, path: impl Into<PathBuf>) {
        let mut guard = self.path.write().unwrap_or_else(|e| e.into_inner());
        *guard = path.into();
    }

    /// Configured path, without touching the filesystem
    pub fn path(&self) -> PathBuf {
        self.path.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Configured path, created on demand
    pub async fn resolve(&self) -> ChartResult<PathBuf> {
        let path = self.path();
        create(&path).await?;
        Ok(path)
    }
}

impl Default for OutputDir {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

async fn create(path: &Path) -> ChartResult<()> {
    tokio::fs::create_dir_all(path).await.map_err(|e| {
        ChartError::config(format!(
            "Cannot create chart image directory '{}' (CHART_IMAGE_DIR): {}",
            path.display(),
            e
        ))
    })
}

/// `chart-<unix millis>-<8 hex chars>.png`
pub fn artifact_filename() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "chart-{}-{}.png",
        chrono::Utc::now().timestamp_millis(),
        &suffix[..8]
    )
}
