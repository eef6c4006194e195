// Core types and functionality for chart generation

pub mod config;
pub mod error;
pub mod render;
pub mod serving;
pub mod translate;
pub mod types;

pub use config::ChartConfig;
pub use error::{ChartError, ChartResult};
pub use render::{LocalRenderer, OutputDir, RenderEngine, SvgEngine};
pub use serving::ImageServer;
pub use translate::{translate, translate_chart, VisSpec};
pub use types::*;
