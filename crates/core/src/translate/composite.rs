// Multi-geometry views: radar and dual axes

use super::{data_or_empty, has_group, line_width, object, truthy, Args};
use serde_json::{json, Map, Value};

pub(super) fn radar(args: &Args) -> Map<String, Value> {
    let children = if has_group(args) {
        let encode = json!({ "x": "name", "y": "value", "color": "group" });
        vec![
            json!({ "type": "area", "encode": encode, "style": { "fillOpacity": 0.3 } }),
            json!({ "type": "line", "encode": encode, "style": line_width(args) }),
            json!({ "type": "point", "encode": encode }),
        ]
    } else {
        let encode = json!({ "x": "name", "y": "value" });
        let mut area_style = line_width(args);
        area_style.insert("fillOpacity".to_string(), json!(0.5));
        vec![
            json!({ "type": "area", "encode": encode, "style": area_style }),
            json!({ "type": "line", "encode": encode }),
        ]
    };

    object(json!({
        "type": "view",
        "data": data_or_empty(args),
        "coordinate": { "type": "polar" },
        "scale": { "x": { "padding": 0.5, "align": 0 } },
        "axis": { "y": { "title": false } },
        "children": children,
    }))
}

/// Synthetic field name holding series `index` in transposed rows
pub(super) fn series_field(index: usize) -> String {
    format!("series_{}", index)
}

/// Columnar series (categories x named series) to one row per category
pub(super) fn transpose_series(categories: &[Value], series: &[Value]) -> Vec<Value> {
    categories
        .iter()
        .enumerate()
        .map(|(i, category)| {
            let mut row = Map::new();
            row.insert("category".to_string(), category.clone());
            for (j, s) in series.iter().enumerate() {
                let value = s
                    .get("data")
                    .and_then(|d| d.get(i))
                    .cloned()
                    .unwrap_or(Value::Null);
                row.insert(series_field(j), value);
            }
            Value::Object(row)
        })
        .collect()
}

pub(super) fn dual_axes(args: &Args) -> Map<String, Value> {
    let categories = array(args, "categories");
    let series = array(args, "series");

    let children: Vec<Value> = series
        .iter()
        .enumerate()
        .map(|(idx, s)| {
            let kind = s.get("type").and_then(Value::as_str).unwrap_or("line");
            let mut child = json!({
                "type": if kind == "column" { "interval" } else { "line" },
                "encode": { "x": "category", "y": series_field(idx) },
                "scale": { "y": { "independent": true } },
                "axis": {
                    "y": {
                        "title": s.get("axisYTitle").and_then(Value::as_str).unwrap_or(""),
                        "position": if idx == 0 { "left" } else { "right" },
                    }
                },
            });
            if kind == "line" {
                child["style"] = json!({ "lineWidth": 2 });
            }
            child
        })
        .collect();

    let mut spec = object(json!({
        "type": "view",
        "data": transpose_series(categories, series),
        "children": children,
    }));
    if let Some(title) = args.get("axisXTitle").filter(|t| truthy(Some(t))) {
        spec.insert("axis".to_string(), json!({ "x": { "title": title } }));
    }
    spec
}

fn array<'a>(args: &'a Args, key: &str) -> &'a [Value] {
    args.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
