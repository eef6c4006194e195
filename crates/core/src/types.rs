use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Every chart kind exposed as an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartType {
    Line,
    Area,
    Bar,
    Column,
    Scatter,
    Pie,
    Funnel,
    Radar,
    Histogram,
    Boxplot,
    Violin,
    Waterfall,
    Liquid,
    WordCloud,
    Venn,
    Treemap,
    Sankey,
    DualAxes,
    NetworkGraph,
    MindMap,
    OrganizationChart,
    FlowDiagram,
    FishboneDiagram,
    Spreadsheet,
    DistrictMap,
    PathMap,
    PinMap,
}

impl ChartType {
    pub const ALL: [ChartType; 27] = [
        ChartType::Line,
        ChartType::Area,
        ChartType::Bar,
        ChartType::Column,
        ChartType::Scatter,
        ChartType::Pie,
        ChartType::Funnel,
        ChartType::Radar,
        ChartType::Histogram,
        ChartType::Boxplot,
        ChartType::Violin,
        ChartType::Waterfall,
        ChartType::Liquid,
        ChartType::WordCloud,
        ChartType::Venn,
        ChartType::Treemap,
        ChartType::Sankey,
        ChartType::DualAxes,
        ChartType::NetworkGraph,
        ChartType::MindMap,
        ChartType::OrganizationChart,
        ChartType::FlowDiagram,
        ChartType::FishboneDiagram,
        ChartType::Spreadsheet,
        ChartType::DistrictMap,
        ChartType::PathMap,
        ChartType::PinMap,
    ];

    /// Identifier used on the wire (`type` field of requests)
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Line => "line",
            ChartType::Area => "area",
            ChartType::Bar => "bar",
            ChartType::Column => "column",
            ChartType::Scatter => "scatter",
            ChartType::Pie => "pie",
            ChartType::Funnel => "funnel",
            ChartType::Radar => "radar",
            ChartType::Histogram => "histogram",
            ChartType::Boxplot => "boxplot",
            ChartType::Violin => "violin",
            ChartType::Waterfall => "waterfall",
            ChartType::Liquid => "liquid",
            ChartType::WordCloud => "word-cloud",
            ChartType::Venn => "venn",
            ChartType::Treemap => "treemap",
            ChartType::Sankey => "sankey",
            ChartType::DualAxes => "dual-axes",
            ChartType::NetworkGraph => "network-graph",
            ChartType::MindMap => "mind-map",
            ChartType::OrganizationChart => "organization-chart",
            ChartType::FlowDiagram => "flow-diagram",
            ChartType::FishboneDiagram => "fishbone-diagram",
            ChartType::Spreadsheet => "spreadsheet",
            ChartType::DistrictMap => "district-map",
            ChartType::PathMap => "path-map",
            ChartType::PinMap => "pin-map",
        }
    }

    /// Name of the operation that produces this chart
    pub fn tool_name(&self) -> String {
        let snake = self.as_str().replace('-', "_");
        match self {
            ChartType::NetworkGraph
            | ChartType::MindMap
            | ChartType::OrganizationChart
            | ChartType::FlowDiagram
            | ChartType::FishboneDiagram
            | ChartType::Spreadsheet
            | ChartType::DistrictMap
            | ChartType::PathMap
            | ChartType::PinMap => format!("generate_{}", snake),
            _ => format!("generate_{}_chart", snake),
        }
    }

    /// Maps depend on an external mapping service
    pub fn is_geographic(&self) -> bool {
        matches!(
            self,
            ChartType::DistrictMap | ChartType::PathMap | ChartType::PinMap
        )
    }

    pub fn is_locally_renderable(&self) -> bool {
        !self.is_geographic()
    }

    /// Cartesian charts accept `axisXTitle` / `axisYTitle`
    pub fn is_cartesian(&self) -> bool {
        matches!(
            self,
            ChartType::Line
                | ChartType::Area
                | ChartType::Bar
                | ChartType::Column
                | ChartType::Scatter
                | ChartType::Histogram
                | ChartType::Boxplot
                | ChartType::Violin
                | ChartType::Waterfall
        )
    }
}

impl std::fmt::Display for ChartType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = crate::error::ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChartType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| crate::error::ChartError::UnsupportedType(s.to_string()))
    }
}

/// Where a chart gets rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    Local,
    Remote,
}

/// How a locally rendered image is handed back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageDelivery {
    /// `data:image/png;base64,...`
    #[default]
    Inline,
    /// File under the output directory, served by the image server
    Url,
}

/// A PNG persisted under the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub path: PathBuf,
    pub filename: String,
}

/// Leading bytes of every PNG file
pub const PNG_SIGNATURE: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_type_round_trip_names() {
        for chart_type in ChartType::ALL {
            let parsed: ChartType = chart_type.as_str().parse().unwrap();
            assert_eq!(parsed, chart_type);
        }
        assert!("unknown-type".parse::<ChartType>().is_err());
    }

    #[test]
    fn test_tool_names() {
        assert_eq!(ChartType::Line.tool_name(), "generate_line_chart");
        assert_eq!(ChartType::WordCloud.tool_name(), "generate_word_cloud_chart");
        assert_eq!(ChartType::DualAxes.tool_name(), "generate_dual_axes_chart");
        assert_eq!(ChartType::MindMap.tool_name(), "generate_mind_map");
        assert_eq!(ChartType::DistrictMap.tool_name(), "generate_district_map");
        assert_eq!(ChartType::Spreadsheet.tool_name(), "generate_spreadsheet");
    }

    #[test]
    fn test_locally_renderable() {
        assert!(ChartType::Line.is_locally_renderable());
        assert!(ChartType::Pie.is_locally_renderable());
        assert!(ChartType::Spreadsheet.is_locally_renderable());
        assert!(!ChartType::DistrictMap.is_locally_renderable());
        assert!(!ChartType::PathMap.is_locally_renderable());
        assert!(!ChartType::PinMap.is_locally_renderable());
    }
}
