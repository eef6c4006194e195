// One tool per chart type, backed by the chart generator

use crate::generate::ChartGenerator;
use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::{
    json_schema_array, json_schema_boolean, json_schema_enum, json_schema_number,
    json_schema_object, json_schema_string, Tool,
};
use anyhow::{bail, Result};
use chart_core::ChartType;
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub const META_DESCRIPTION: &str = "The chart's spec and configuration. A client with a compatible visualization runtime can render it to reproduce the chart.";

pub struct ChartTool {
    chart_type: ChartType,
    generator: Arc<ChartGenerator>,
}

impl ChartTool {
    pub fn new(chart_type: ChartType, generator: Arc<ChartGenerator>) -> Self {
        Self {
            chart_type,
            generator,
        }
    }
}

#[async_trait::async_trait]
impl Tool for ChartTool {
    fn schema(&self) -> ToolSchema {
        let (properties, required) = properties(self.chart_type);
        ToolSchema {
            name: self.chart_type.tool_name(),
            description: description(self.chart_type).to_string(),
            input_schema: json_schema_object(properties, required),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args = match arguments {
            Value::Null => json!({}),
            Value::Object(_) => arguments,
            _ => bail!("Invalid arguments for {}: expected an object", self.chart_type.tool_name()),
        };

        match self.generator.generate(self.chart_type, &args).await {
            Ok(output) => Ok(CallToolResult::text(output).with_meta(json!({
                "description": META_DESCRIPTION,
                "spec": spec_record(self.chart_type, &args),
            }))),
            Err(e) => {
                tracing::error!(chart_type = %self.chart_type, "Chart generation failed: {}", e);
                Ok(CallToolResult::error(e.to_string()))
            }
        }
    }
}

/// `{type, ...args}` as requested
pub fn spec_record(chart_type: ChartType, args: &Value) -> Value {
    let mut spec = Map::new();
    spec.insert("type".to_string(), json!(chart_type.as_str()));
    if let Some(args) = args.as_object() {
        spec.extend(args.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    Value::Object(spec)
}

pub fn description(chart_type: ChartType) -> &'static str {
    match chart_type {
        ChartType::Line => "Generate a line chart to show trends over time, such as the ratio of Apple computer sales to Apple's profits from 2000 to 2016.",
        ChartType::Area => "Generate an area chart to show data trends under a continuous independent variable and observe the overall trend, such as displacement = velocity (average or instantaneous) x time.",
        ChartType::Bar => "Generate a horizontal bar chart to show data for numerical comparisons among different categories, such as comparing categorical data and horizontal comparisons.",
        ChartType::Column => "Generate a column chart, which is best for comparing categorical data, such as when values are close and differences are hard to see in a pie chart.",
        ChartType::Scatter => "Generate a scatter chart to show the relationship between two variables, helps discover their relationship or trends, such as the strength of correlation and data distribution patterns.",
        ChartType::Pie => "Generate a pie chart to show the proportion of parts, such as market share and budget allocation.",
        ChartType::Funnel => "Generate a funnel chart to visualize the progressive reduction of data as it passes through stages, such as the conversion rates of users from visiting a website to completing a purchase.",
        ChartType::Radar => "Generate a radar chart to display multidimensional data (four dimensions or more), such as evaluating products across price, quality, features and service.",
        ChartType::Histogram => "Generate a histogram chart to show the frequency of data points within a certain range. It can observe data distribution, such as the distribution of exam scores.",
        ChartType::Boxplot => "Generate a boxplot chart to show data distribution, including median, quartiles and outliers, such as comparing the distribution of test scores between classes.",
        ChartType::Violin => "Generate a violin chart to show data distribution, combining features of boxplots and density plots, such as the distribution of response times by service.",
        ChartType::Waterfall => "Generate a waterfall chart to visualize the cumulative effect of sequential positive or negative values, such as a company's profit changes from revenue through costs.",
        ChartType::Liquid => "Generate a liquid chart to visualize a single value as a percentage, such as the current occupancy rate of a reservoir or the completion of a project.",
        ChartType::WordCloud => "Generate a word cloud chart to show word frequency or weight through text size, such as analyzing common words in social media or reviews.",
        ChartType::Venn => "Generate a Venn diagram to visualize the relationships between different sets, showing how they intersect and overlap.",
        ChartType::Treemap => "Generate a treemap chart to display hierarchical data and visually compare sizes between levels, such as disk space usage by directory.",
        ChartType::Sankey => "Generate a sankey chart to visualize the flow of data between different stages or categories, such as user journeys from landing page to purchase.",
        ChartType::DualAxes => "Generate a dual axes chart, which combines two chart types (typically column and line) sharing the x axis with independent y axes, such as sales volume against profit margin.",
        ChartType::NetworkGraph => "Generate a network graph chart to show relationships (edges) between entities (nodes), such as relationships between people in social networks.",
        ChartType::MindMap => "Generate a mind map chart to organize and present information in a hierarchical structure with branches radiating from a central topic.",
        ChartType::OrganizationChart => "Generate an organization chart to visualize the hierarchical structure of an organization, such as a company's reporting lines.",
        ChartType::FlowDiagram => "Generate a flow diagram chart to show the steps and decision points of a process or system, such as a scientific research workflow.",
        ChartType::FishboneDiagram => "Generate a fishbone diagram chart to visualize cause and effect, showing the potential causes of a problem.",
        ChartType::Spreadsheet => "Generate a spreadsheet or pivot table to display tabular data, such as sales records by region and product.",
        ChartType::DistrictMap => "Generate a district map to show administrative divisions and data distribution. Only locations within China are supported.",
        ChartType::PathMap => "Generate a route map to display route planning results for points of interest. Only locations within China are supported.",
        ChartType::PinMap => "Generate a point map to display the location and distribution of points of interest. Only locations within China are supported.",
    }
}

/// `(properties, required)` of a tool's input schema
pub fn properties(chart_type: ChartType) -> (Value, Vec<&'static str>) {
    let mut props = match chart_type {
        ChartType::Line | ChartType::Area => json!({
            "data": rows(json!({
                "time": json_schema_string("Point on the x axis"),
                "value": json_schema_number("Value on the y axis"),
                "group": json_schema_string("Series name, for multiple series"),
            }), &["time", "value"], "Data for the chart, such as [{ time: '2015', value: 23 }]."),
            "stack": json_schema_boolean("Whether stacking is enabled. Requires a 'group' field in the data."),
        }),
        ChartType::Bar | ChartType::Column => json!({
            "data": rows(json!({
                "category": json_schema_string("Category"),
                "value": json_schema_number("Value"),
                "group": json_schema_string("Group name, for grouped or stacked bars"),
            }), &["category", "value"], "Data for the chart, such as [{ category: 'A', value: 10 }]."),
            "group": json_schema_boolean("Whether grouping is enabled. Requires a 'group' field in the data; when true, stacking is off."),
            "stack": json_schema_boolean("Whether stacking is enabled. Requires a 'group' field in the data; when true, grouping is off."),
        }),
        ChartType::Scatter => json!({
            "data": rows(json!({
                "x": json_schema_number("Position on the x axis"),
                "y": json_schema_number("Position on the y axis"),
                "group": json_schema_string("Series name"),
            }), &["x", "y"], "Data for the chart, such as [{ x: 10, y: 15 }]."),
        }),
        ChartType::Pie => json!({
            "data": rows(json!({
                "category": json_schema_string("Slice name"),
                "value": json_schema_number("Slice value"),
            }), &["category", "value"], "Data for the chart, such as [{ category: 'A', value: 27 }]."),
            "innerRadius": json_schema_number("Inner radius between 0 and 1. Set to 0.6 or similar for a donut chart."),
        }),
        ChartType::Funnel => json!({
            "data": rows(json!({
                "category": json_schema_string("Stage name"),
                "value": json_schema_number("Stage value"),
            }), &["category", "value"], "Data for the chart, such as [{ category: 'Visit', value: 1000 }]."),
        }),
        ChartType::Radar => json!({
            "data": rows(json!({
                "name": json_schema_string("Dimension name"),
                "value": json_schema_number("Dimension value"),
                "group": json_schema_string("Series name"),
            }), &["name", "value"], "Data for the chart, such as [{ name: 'Design', value: 70 }]."),
        }),
        ChartType::Histogram => json!({
            "data": json_schema_array(json_schema_number("Sample"), "Numeric samples, such as [78, 88, 60, 100, 95]."),
            "binNumber": json_schema_number("Number of intervals (bins). Chosen automatically when omitted."),
        }),
        ChartType::Boxplot | ChartType::Violin => json!({
            "data": rows(json!({
                "category": json_schema_string("Category of the sample"),
                "value": json_schema_number("Sample value"),
                "group": json_schema_string("Group name"),
            }), &["category", "value"], "Samples, such as [{ category: 'A', value: 10 }]."),
        }),
        ChartType::Waterfall => json!({
            "data": rows(json!({
                "category": json_schema_string("Step name"),
                "value": json_schema_number("Change applied by this step. Not needed for total rows."),
                "isTotal": json_schema_boolean("Whether this row shows the running total"),
                "isIntermediateTotal": json_schema_boolean("Whether this row shows an intermediate total"),
            }), &["category"], "Data for the chart, such as [{ category: 'Revenue', value: 1000 }, { category: 'Total', isTotal: true }]."),
        }),
        ChartType::Liquid => json!({
            "percent": json_schema_number("Value between 0 and 1, such as 0.75."),
            "shape": json_schema_enum(&["circle", "rect", "pin", "triangle"], "Shape of the liquid container."),
        }),
        ChartType::WordCloud => json!({
            "data": rows(json!({
                "text": json_schema_string("Word"),
                "value": json_schema_number("Frequency or weight"),
            }), &["text", "value"], "Data for the chart, such as [{ text: 'rust', value: 42 }]."),
        }),
        ChartType::Venn => json!({
            "data": rows(json!({
                "sets": json_schema_array(json_schema_string("Set name"), "Sets this region belongs to"),
                "value": json_schema_number("Size of the region"),
                "label": json_schema_string("Label of the region"),
            }), &["sets", "value"], "Data for the chart, such as [{ sets: ['A'], value: 20 }, { sets: ['A', 'B'], value: 5 }]."),
        }),
        ChartType::Treemap => json!({
            "data": json_schema_array(tree_node("Node value; leaf values are summed for parents"), "Tree nodes, such as [{ name: 'Design', value: 70, children: [...] }]."),
        }),
        ChartType::Sankey => json!({
            "data": rows(json!({
                "source": json_schema_string("Source node"),
                "target": json_schema_string("Target node"),
                "value": json_schema_number("Flow size"),
            }), &["source", "target", "value"], "Links of the chart, such as [{ source: 'Landing', target: 'Signup', value: 50 }]."),
            "nodeAlign": json_schema_enum(&["left", "right", "justify", "center"], "Alignment of the nodes. Defaults to 'center'."),
        }),
        ChartType::DualAxes => json!({
            "categories": json_schema_array(json_schema_string("Category"), "Shared x axis categories, such as ['2015', '2016', '2017']."),
            "series": json_schema_array(json_schema_object(json!({
                "type": json_schema_enum(&["column", "line"], "Chart type of the series"),
                "data": json_schema_array(json_schema_number("Value"), "One value per category"),
                "axisYTitle": json_schema_string("Title of this series' y axis"),
            }), vec!["type", "data"]), "Series drawn against the categories."),
        }),
        ChartType::NetworkGraph | ChartType::FlowDiagram => json!({
            "data": json_schema_object(json!({
                "nodes": json_schema_array(json_schema_object(json!({
                    "name": json_schema_string("Unique node name"),
                }), vec!["name"]), "Nodes"),
                "edges": json_schema_array(json_schema_object(json!({
                    "source": json_schema_string("Source node name"),
                    "target": json_schema_string("Target node name"),
                    "name": json_schema_string("Edge label"),
                }), vec!["source", "target"]), "Edges"),
            }), vec!["nodes", "edges"]),
        }),
        ChartType::MindMap | ChartType::OrganizationChart | ChartType::FishboneDiagram => json!({
            "data": tree_node("Node weight"),
        }),
        ChartType::Spreadsheet => json!({
            "data": json_schema_array(json!({ "type": "object" }), "Rows of the table, such as [{ region: 'North', sales: 100 }]."),
            "rows": json_schema_array(json_schema_string("Field"), "Fields used as pivot rows."),
            "columns": json_schema_array(json_schema_string("Field"), "Fields used as pivot columns."),
            "values": json_schema_array(json_schema_string("Field"), "Fields aggregated in the pivot cells."),
        }),
        ChartType::DistrictMap => json!({
            "title": json_schema_string("Map title, no more than 16 characters."),
            "data": json_schema_object(json!({
                "name": json_schema_string("Administrative region, such as 'Shanghai'."),
                "style": json!({ "type": "object", "description": "Fill style of the region" }),
                "colors": json_schema_array(json_schema_string("Color"), "Color ramp for the data."),
                "dataType": json_schema_enum(&["number", "enum"], "Type of the region values."),
                "dataLabel": json_schema_string("Label of the region values."),
                "dataValue": json_schema_string("Value of the region."),
                "subdistricts": json_schema_array(json!({ "type": "object" }), "Sub regions with their own values."),
            }), vec!["name"]),
        }),
        ChartType::PathMap => json!({
            "title": json_schema_string("Map title, no more than 16 characters."),
            "data": json_schema_array(json_schema_object(json!({
                "data": json_schema_array(json_schema_string("Point of interest"), "Stops of one route, in order."),
            }), vec!["data"]), "Routes, such as [{ data: ['West Lake', 'Lingyin Temple'] }]."),
        }),
        ChartType::PinMap => json!({
            "title": json_schema_string("Map title, no more than 16 characters."),
            "data": json_schema_array(json_schema_string("Point of interest"), "Points of interest, such as ['West Lake', 'Lingyin Temple']."),
            "markerPopup": json!({ "type": "object", "description": "Popup shown for each marker" }),
        }),
    };

    if let Some(props) = props.as_object_mut() {
        if !chart_type.is_geographic() {
            props.insert("title".to_string(), json_schema_string("Title of the chart."));
            props.insert("style".to_string(), style_schema(chart_type));
        }
        props.insert("width".to_string(), json_schema_number("Width of the image in pixels. Default is 600."));
        props.insert("height".to_string(), json_schema_number("Height of the image in pixels. Default is 400."));
        if chart_type.is_cartesian() {
            props.insert("axisXTitle".to_string(), json_schema_string("Title of the x axis."));
            props.insert("axisYTitle".to_string(), json_schema_string("Title of the y axis."));
        }
        if chart_type == ChartType::DualAxes {
            props.insert("axisXTitle".to_string(), json_schema_string("Title of the x axis."));
        }
    }

    let required = match chart_type {
        ChartType::Liquid => vec!["percent"],
        ChartType::DualAxes => vec!["categories", "series"],
        ChartType::DistrictMap | ChartType::PathMap | ChartType::PinMap => vec!["title", "data"],
        _ => vec!["data"],
    };
    (props, required)
}

fn rows(fields: Value, required: &[&str], description: &str) -> Value {
    json_schema_array(json_schema_object(fields, required.to_vec()), description)
}

fn tree_node(value_description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": json_schema_string("Node name"),
            "value": json_schema_number(value_description),
            "children": { "type": "array", "items": { "type": "object" }, "description": "Child nodes with the same shape" },
        },
        "required": ["name"],
        "description": "Tree node, such as { name: 'Root', children: [{ name: 'Child' }] }.",
    })
}

fn style_schema(chart_type: ChartType) -> Value {
    let mut style = json!({
        "backgroundColor": json_schema_string("Background color, such as '#fff'."),
        "palette": json_schema_array(json_schema_string("Color"), "Colors used for the series, such as ['#5B8FF9', '#5AD8A6']."),
    });
    match chart_type {
        ChartType::Line | ChartType::Radar => {
            style["lineWidth"] = json_schema_number("Line width.");
        }
        ChartType::Waterfall => {
            style["palette"] = json_schema_object(
                json!({
                    "positiveColor": json_schema_string("Color of increases"),
                    "negativeColor": json_schema_string("Color of decreases"),
                    "totalColor": json_schema_string("Color of total bars"),
                }),
                vec![],
            );
        }
        ChartType::Liquid => {
            style["color"] = json_schema_string("Color of the liquid, such as '#5B8FF9'.");
        }
        _ => {}
    }
    json!({ "type": "object", "properties": style, "description": "Custom style of the chart." })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::tests::{harness, FakeRemote};
    use chart_core::ChartConfig;

    #[test]
    fn test_every_type_has_schema() {
        for chart_type in ChartType::ALL {
            let (props, required) = properties(chart_type);
            for field in required {
                assert!(props.get(field).is_some(), "{} requires undeclared {}", chart_type, field);
            }
            assert!(!description(chart_type).is_empty());
        }
    }

    #[test]
    fn test_spec_record_keeps_arguments() {
        let args = json!({ "data": [1, 2], "title": "T" });
        assert_eq!(
            spec_record(ChartType::Histogram, &args),
            json!({ "type": "histogram", "data": [1, 2], "title": "T" })
        );
    }

    #[tokio::test]
    async fn test_execute_attaches_meta() {
        let h = harness(ChartConfig::default(), FakeRemote::replying(Value::Null));
        let tool = ChartTool::new(ChartType::Pie, Arc::new(h.generator));

        let args = json!({ "data": [{ "category": "A", "value": 1 }] });
        let result = tool.execute(args.clone()).await.unwrap();
        assert!(!result.is_error());
        assert!(result.first_text().unwrap().starts_with("data:image/png;base64,"));

        let meta = result.meta.unwrap();
        assert_eq!(meta["description"], json!(META_DESCRIPTION));
        assert_eq!(meta["spec"]["type"], json!("pie"));
        assert_eq!(meta["spec"]["data"], args["data"]);
    }

    #[tokio::test]
    async fn test_execute_reports_failure_as_error_result() {
        let h = harness(ChartConfig::default(), FakeRemote::replying(Value::Null));
        let tool = ChartTool::new(ChartType::Spreadsheet, Arc::new(h.generator));

        let result = tool.execute(json!({ "data": [] })).await.unwrap();
        assert!(result.is_error());
        assert!(result.first_text().unwrap().contains("VIS_REQUEST_SERVER"));
        assert!(result.meta.is_none());
    }

    #[tokio::test]
    async fn test_execute_rejects_non_object_arguments() {
        let h = harness(ChartConfig::default(), FakeRemote::replying(Value::Null));
        let tool = ChartTool::new(ChartType::Line, Arc::new(h.generator));
        assert!(tool.execute(json!([1, 2])).await.is_err());
    }
}
