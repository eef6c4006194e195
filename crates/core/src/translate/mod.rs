//! Translation of chart operation arguments into a declarative
//! visualization spec.
//!
//! Every chart kind has one rule mapping its loosely-typed arguments onto a
//! uniform spec (geometry `type`, `data`, `encode`, `transform`,
//! `coordinate`, `scale`, `axis`, `legend`, `labels`, `style`). Rules are
//! pure: the same `(chart_type, args)` always yields the same spec. Missing or
//! malformed arguments produce an empty-but-valid spec; problems surface when
//! the renderer runs, never here.

mod cartesian;
mod composite;
mod graph;
mod proportion;
mod style;

pub use graph::{flatten_tree, GraphLink, GraphNode};

use crate::types::ChartType;
use serde::Serialize;
use serde_json::{Map, Value};

/// Arguments of a chart operation, shaped per chart kind
pub type Args = Value;

/// A declarative visualization spec. Immutable once translated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VisSpec(Map<String, Value>);

impl VisSpec {
    /// Geometry (mark) kind, e.g. `interval`, `line`, `view`
    pub fn geometry(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Translate a chart request into a spec.
///
/// Returns `None` when the chart type is unknown or has no local rule
/// (geographic maps, spreadsheet).
pub fn translate(chart_type: &str, args: &Args) -> Option<VisSpec> {
    let chart_type: ChartType = chart_type.parse().ok()?;
    translate_chart(chart_type, args)
}

pub fn translate_chart(chart_type: ChartType, args: &Args) -> Option<VisSpec> {
    let mut spec = match chart_type {
        ChartType::Line => cartesian::line(args),
        ChartType::Area => cartesian::area(args),
        ChartType::Bar => cartesian::bar(args),
        ChartType::Column => cartesian::column(args),
        ChartType::Scatter => cartesian::scatter(args),
        ChartType::Histogram => cartesian::histogram(args),
        ChartType::Boxplot => cartesian::boxplot(args, false),
        ChartType::Violin => cartesian::boxplot(args, true),
        ChartType::Waterfall => cartesian::waterfall(args),
        ChartType::Pie => proportion::pie(args),
        ChartType::Funnel => proportion::funnel(args),
        ChartType::Liquid => proportion::liquid(args),
        ChartType::WordCloud => proportion::word_cloud(args),
        ChartType::Venn => proportion::venn(args),
        ChartType::Treemap => proportion::treemap(args),
        ChartType::Sankey => proportion::sankey(args),
        ChartType::Radar => composite::radar(args),
        ChartType::DualAxes => composite::dual_axes(args),
        ChartType::NetworkGraph | ChartType::FlowDiagram => graph::node_edge_graph(args),
        ChartType::MindMap | ChartType::OrganizationChart | ChartType::FishboneDiagram => {
            graph::tree_graph(args)
        }
        ChartType::Spreadsheet
        | ChartType::DistrictMap
        | ChartType::PathMap
        | ChartType::PinMap => return None,
    };

    style::apply_common_style(&mut spec, args);
    if chart_type.is_cartesian() {
        style::apply_axis_titles(&mut spec, args);
    }

    Some(VisSpec(spec))
}

/// `args.data` as a row slice; anything else is treated as no rows
fn rows(args: &Args) -> &[Value] {
    args.get("data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// `args.data` verbatim, or an empty row list
fn data_or_empty(args: &Args) -> Value {
    match args.get("data") {
        Some(data) if !data.is_null() => data.clone(),
        _ => Value::Array(Vec::new()),
    }
}

/// True when any row carries a non-empty `group`
fn has_group(args: &Args) -> bool {
    rows(args).iter().any(|row| truthy(row.get("group")))
}

/// Truthiness of a loosely-typed flag
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// `args.style.<key>` when set
fn style_option<'a>(args: &'a Args, key: &str) -> Option<&'a Value> {
    args.get("style")
        .and_then(|style| style.get(key))
        .filter(|v| !v.is_null())
}

/// `{ lineWidth }` when `args.style.lineWidth` is set
fn line_width(args: &Args) -> Map<String, Value> {
    let mut style = Map::new();
    if let Some(width) = style_option(args, "lineWidth").filter(|w| truthy(Some(w))) {
        style.insert("lineWidth".to_string(), width.clone());
    }
    style
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mock_args(chart_type: ChartType) -> Value {
        match chart_type {
            ChartType::Line | ChartType::Area => json!({
                "data": [{ "time": "2020", "value": 100 }, { "time": "2021", "value": 120 }]
            }),
            ChartType::Bar | ChartType::Column => json!({
                "data": [{ "category": "A", "value": 10 }, { "category": "B", "value": 20 }]
            }),
            ChartType::Scatter => json!({ "data": [{ "x": 1, "y": 2 }, { "x": 3, "y": 4 }] }),
            ChartType::Pie => json!({
                "data": [{ "category": "A", "value": 30 }, { "category": "B", "value": 70 }]
            }),
            ChartType::Funnel => json!({
                "data": [{ "category": "Step 1", "value": 100 }, { "category": "Step 2", "value": 80 }]
            }),
            ChartType::Radar => json!({
                "data": [
                    { "name": "Design", "value": 70 },
                    { "name": "Dev", "value": 80 },
                    { "name": "QA", "value": 60 }
                ]
            }),
            ChartType::Histogram => json!({ "data": [10, 20, 30, 40, 50, 60, 70, 80] }),
            ChartType::Boxplot | ChartType::Violin => json!({
                "data": [
                    { "category": "A", "value": 10 },
                    { "category": "A", "value": 20 },
                    { "category": "B", "value": 15 }
                ]
            }),
            ChartType::Waterfall => json!({
                "data": [
                    { "category": "Start", "value": 100 },
                    { "category": "Add", "value": 50 },
                    { "category": "Total", "isTotal": true }
                ]
            }),
            ChartType::Liquid => json!({ "percent": 0.75 }),
            ChartType::WordCloud => json!({
                "data": [{ "text": "Hello", "value": 100 }, { "text": "World", "value": 50 }]
            }),
            ChartType::Venn => json!({
                "data": [
                    { "sets": ["A"], "value": 10 },
                    { "sets": ["B"], "value": 10 },
                    { "sets": ["A", "B"], "value": 5 }
                ]
            }),
            ChartType::Treemap => json!({
                "data": [{ "name": "root", "value": 100, "children": [
                    { "name": "A", "value": 60 }, { "name": "B", "value": 40 }
                ]}]
            }),
            ChartType::Sankey => json!({
                "data": [
                    { "source": "A", "target": "B", "value": 10 },
                    { "source": "B", "target": "C", "value": 8 }
                ]
            }),
            ChartType::DualAxes => json!({
                "categories": ["2020", "2021", "2022"],
                "series": [
                    { "type": "column", "data": [100, 120, 140] },
                    { "type": "line", "data": [0.5, 0.6, 0.7] }
                ]
            }),
            ChartType::NetworkGraph | ChartType::FlowDiagram => json!({
                "data": {
                    "nodes": [{ "name": "A" }, { "name": "B" }],
                    "edges": [{ "source": "A", "target": "B" }]
                }
            }),
            ChartType::MindMap | ChartType::FishboneDiagram | ChartType::OrganizationChart => json!({
                "data": { "name": "Root", "children": [{ "name": "Child 1" }, { "name": "Child 2" }] }
            }),
            ChartType::Spreadsheet
            | ChartType::DistrictMap
            | ChartType::PathMap
            | ChartType::PinMap => json!({}),
        }
    }

    fn expected_geometry(chart_type: ChartType) -> Option<&'static str> {
        Some(match chart_type {
            ChartType::Line => "line",
            ChartType::Area => "area",
            ChartType::Bar
            | ChartType::Column
            | ChartType::Pie
            | ChartType::Funnel
            | ChartType::Waterfall => "interval",
            ChartType::Scatter => "point",
            ChartType::Histogram => "rect",
            ChartType::Boxplot | ChartType::Violin => "boxplot",
            ChartType::Radar | ChartType::DualAxes => "view",
            ChartType::Liquid => "liquid",
            ChartType::WordCloud => "wordCloud",
            ChartType::Venn => "path",
            ChartType::Treemap => "treemap",
            ChartType::Sankey => "sankey",
            ChartType::NetworkGraph
            | ChartType::FlowDiagram
            | ChartType::MindMap
            | ChartType::OrganizationChart
            | ChartType::FishboneDiagram => "forceGraph",
            ChartType::Spreadsheet
            | ChartType::DistrictMap
            | ChartType::PathMap
            | ChartType::PinMap => return None,
        })
    }

    #[test]
    fn test_every_chart_type_has_documented_geometry() {
        for chart_type in ChartType::ALL {
            let spec = translate(chart_type.as_str(), &mock_args(chart_type));
            match expected_geometry(chart_type) {
                Some(geometry) => {
                    let spec = spec.unwrap_or_else(|| panic!("no spec for {}", chart_type));
                    assert_eq!(spec.geometry(), Some(geometry), "{}", chart_type);
                }
                None => assert!(spec.is_none(), "{} should be unsupported", chart_type),
            }
        }
    }

    #[test]
    fn test_unknown_type_is_unsupported() {
        assert!(translate("unknown-type", &json!({})).is_none());
        assert!(translate("unknown-type", &json!({})).is_none());
    }

    #[test]
    fn test_translation_is_deterministic() {
        let args = mock_args(ChartType::Waterfall);
        assert_eq!(translate("waterfall", &args), translate("waterfall", &args));
    }

    #[test]
    fn test_missing_data_yields_empty_spec() {
        for chart_type in ChartType::ALL {
            if let Some(spec) = translate(chart_type.as_str(), &json!({})) {
                assert!(spec.geometry().is_some(), "{}", chart_type);
            }
        }
        let spec = translate("line", &json!({})).unwrap();
        assert_eq!(spec.get("data"), Some(&json!([])));
    }

    #[test]
    fn test_truthy() {
        assert!(!truthy(None));
        assert!(!truthy(Some(&json!(""))));
        assert!(!truthy(Some(&json!(0))));
        assert!(!truthy(Some(&json!(false))));
        assert!(truthy(Some(&json!("a"))));
        assert!(truthy(Some(&json!(true))));
    }
}
