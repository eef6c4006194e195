// Part-of-whole and free-layout charts. One fixed structure per kind.

use super::{data_or_empty, object, rows, style_option, truthy, Args};
use serde_json::{json, Map, Value};

pub(super) fn pie(args: &Args) -> Map<String, Value> {
    let mut coordinate = json!({ "type": "theta" });
    if let Some(inner) = args.get("innerRadius").filter(|r| truthy(Some(r))) {
        coordinate["innerRadius"] = inner.clone();
    }

    object(json!({
        "type": "interval",
        "data": data_or_empty(args),
        "encode": { "y": "value", "color": "category" },
        "transform": [{ "type": "stackY" }],
        "coordinate": coordinate,
        "legend": { "color": { "position": "right" } },
        "labels": [{ "text": "value" }],
    }))
}

pub(super) fn funnel(args: &Args) -> Map<String, Value> {
    let data: Vec<Value> = rows(args)
        .iter()
        .map(|row| {
            let mut row = row.clone();
            if let Some(fields) = row.as_object_mut() {
                let label = format!(
                    "{} {}",
                    display(fields.get("category")),
                    display(fields.get("value"))
                );
                fields.insert("label".to_string(), json!(label));
            }
            row
        })
        .collect();

    object(json!({
        "type": "interval",
        "data": data,
        "encode": { "x": "category", "y": "value", "color": "category", "shape": "funnel" },
        "transform": [{ "type": "symmetryY" }],
        "coordinate": { "transform": [{ "type": "transpose" }] },
        "scale": { "x": { "padding": 0 } },
        "axis": false,
        "legend": { "color": { "position": "bottom" } },
        "labels": [{ "text": "label", "position": "inside" }],
    }))
}

pub(super) fn liquid(args: &Args) -> Map<String, Value> {
    let mut style = json!({
        "shape": args.get("shape").and_then(Value::as_str).unwrap_or("circle"),
    });
    if let Some(color) = style_option(args, "color") {
        style["fill"] = color.clone();
    }

    object(json!({
        "type": "liquid",
        "data": args.get("percent").cloned().unwrap_or(Value::Null),
        "style": style,
    }))
}

pub(super) fn word_cloud(args: &Args) -> Map<String, Value> {
    object(json!({
        "type": "wordCloud",
        "data": data_or_empty(args),
        "layout": { "spiral": "rectangular" },
        "encode": { "color": "text" },
        "axis": false,
    }))
}

pub(super) fn venn(args: &Args) -> Map<String, Value> {
    object(json!({
        "type": "path",
        "data": {
            "type": "inline",
            "value": data_or_empty(args),
            "transform": [{ "type": "venn" }],
        },
        "encode": { "d": "path", "color": "key" },
        "style": { "fillOpacity": 0.6 },
        "labels": [{ "text": "label", "position": "inside" }],
    }))
}

/// A single tree is used as the root; several are wrapped under `root`
pub(super) fn treemap(args: &Args) -> Map<String, Value> {
    let nodes = rows(args);
    let tree = match nodes {
        [single] => single.clone(),
        many => json!({ "name": "root", "children": many }),
    };

    object(json!({
        "type": "treemap",
        "data": { "type": "inline", "value": tree },
        "layout": { "tile": "treemapBinary" },
        "encode": { "value": "value", "color": "name" },
        "style": { "labelText": "name", "labelFill": "#000", "labelFontSize": 12 },
    }))
}

pub(super) fn sankey(args: &Args) -> Map<String, Value> {
    let node_align = args
        .get("nodeAlign")
        .and_then(Value::as_str)
        .unwrap_or("center");

    object(json!({
        "type": "sankey",
        "data": { "type": "inline", "value": { "links": data_or_empty(args) } },
        "layout": { "nodeAlign": node_align, "nodePadding": 0.03 },
        "style": {
            "labelSpacing": 3,
            "labelFontWeight": "bold",
            "nodeStrokeWidth": 1.2,
            "linkFillOpacity": 0.4,
        },
    }))
}

fn display(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
