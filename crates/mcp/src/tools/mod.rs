pub mod charts;
pub mod maps;
mod registry;

pub use charts::ChartTool;
pub use maps::MapTool;
pub use registry::{
    json_schema_array, json_schema_boolean, json_schema_enum, json_schema_number,
    json_schema_object, json_schema_string, missing_required, Tool, ToolRegistry,
};

use crate::generate::ChartGenerator;
use chart_core::ChartType;
use std::sync::Arc;

/// Register one tool per chart type; disabled names are skipped by the registry
pub fn register_chart_tools(registry: &mut ToolRegistry, generator: &Arc<ChartGenerator>) {
    for chart_type in ChartType::ALL {
        let tool: Arc<dyn Tool> = if chart_type.is_geographic() {
            Arc::new(MapTool::new(chart_type, generator.clone()))
        } else {
            Arc::new(ChartTool::new(chart_type, generator.clone()))
        };
        registry.register(tool);
    }
}
