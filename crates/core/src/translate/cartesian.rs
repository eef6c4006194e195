// Rules for charts drawn on x/y axes

use super::{data_or_empty, has_group, line_width, object, rows, style_option, truthy, Args};
use serde_json::{json, Map, Value};

const POSITIVE_COLOR: &str = "#FF4D4F";
const NEGATIVE_COLOR: &str = "#2EBB59";
const TOTAL_COLOR: &str = "#1783FF";

fn encode_xy(x: &str, y: &str, grouped: bool) -> Value {
    let mut encode = json!({ "x": x, "y": y });
    if grouped {
        encode["color"] = json!("group");
    }
    encode
}

fn start_at_zero(spec: &mut Map<String, Value>, args: &Args) {
    if truthy(style_option(args, "startAtZero")) {
        spec.insert("scale".to_string(), json!({ "y": { "domainMin": 0 } }));
    }
}

pub(super) fn line(args: &Args) -> Map<String, Value> {
    let mut spec = object(json!({
        "type": "line",
        "data": data_or_empty(args),
        "encode": encode_xy("time", "value", has_group(args)),
        "style": line_width(args),
    }));
    start_at_zero(&mut spec, args);
    spec
}

pub(super) fn area(args: &Args) -> Map<String, Value> {
    let grouped = has_group(args);
    let mut style = line_width(args);
    style.insert("fillOpacity".to_string(), json!(0.5));

    let mut spec = object(json!({
        "type": "area",
        "data": data_or_empty(args),
        "encode": encode_xy("time", "value", grouped),
        "style": style,
    }));
    if grouped && truthy(args.get("stack")) {
        spec.insert("transform".to_string(), json!([{ "type": "stackY" }]));
    }
    spec
}

/// Horizontal bars: stacked unless `group` asks for dodging or `stack` is false
pub(super) fn bar(args: &Args) -> Map<String, Value> {
    let grouped = has_group(args);
    let mut spec = object(json!({
        "type": "interval",
        "data": data_or_empty(args),
        "encode": encode_xy("category", "value", grouped),
        "coordinate": { "transform": [{ "type": "transpose" }] },
    }));
    if grouped {
        if truthy(args.get("group")) {
            spec.insert("transform".to_string(), json!([{ "type": "dodgeX" }]));
        } else if args.get("stack") != Some(&Value::Bool(false)) {
            spec.insert("transform".to_string(), json!([{ "type": "stackY" }]));
        }
    }
    spec
}

/// Vertical bars: dodged unless `stack` is set or `group` is false
pub(super) fn column(args: &Args) -> Map<String, Value> {
    let grouped = has_group(args);
    let mut spec = object(json!({
        "type": "interval",
        "data": data_or_empty(args),
        "encode": encode_xy("category", "value", grouped),
    }));
    if grouped {
        if truthy(args.get("stack")) {
            spec.insert("transform".to_string(), json!([{ "type": "stackY" }]));
        } else if args.get("group") != Some(&Value::Bool(false)) {
            spec.insert("transform".to_string(), json!([{ "type": "dodgeX" }]));
        }
    }
    spec
}

pub(super) fn scatter(args: &Args) -> Map<String, Value> {
    object(json!({
        "type": "point",
        "data": data_or_empty(args),
        "encode": encode_xy("x", "y", has_group(args)),
    }))
}

pub(super) fn histogram(args: &Args) -> Map<String, Value> {
    let data: Vec<Value> = rows(args).iter().map(|v| json!({ "value": v })).collect();

    let mut bin = json!({ "type": "binX", "y": "count" });
    if let Some(thresholds) = args.get("binNumber").filter(|b| truthy(Some(b))) {
        bin["thresholds"] = thresholds.clone();
    }

    object(json!({
        "type": "rect",
        "data": data,
        "encode": { "x": "value" },
        "transform": [bin],
    }))
}

/// Box plot and violin share the geometry; violin switches the shape
pub(super) fn boxplot(args: &Args, violin: bool) -> Map<String, Value> {
    let color = if has_group(args) { "group" } else { "category" };
    let mut encode = json!({ "x": "category", "y": "value", "color": color });

    let mut spec = Map::new();
    spec.insert("type".to_string(), json!("boxplot"));
    spec.insert("data".to_string(), data_or_empty(args));
    if violin {
        encode["shape"] = json!("violin");
        spec.insert(
            "style".to_string(),
            json!({ "opacity": 0.5, "strokeOpacity": 0.5, "point": false }),
        );
    }
    spec.insert("encode".to_string(), encode);
    start_at_zero(&mut spec, args);
    spec
}

/// One bar of a waterfall, positioned by the running total
#[derive(Debug, Clone, PartialEq)]
pub(super) struct WaterfallBar {
    pub category: Value,
    pub start: f64,
    pub end: f64,
    pub value: f64,
    pub kind: &'static str,
}

/// Fold the input rows into floating bars
pub(super) fn waterfall_bars(rows: &[Value]) -> Vec<WaterfallBar> {
    rows.iter()
        .scan(0.0_f64, |cumulative, row| {
            let category = row.get("category").cloned().unwrap_or(Value::Null);
            let bar = if truthy(row.get("isTotal")) || truthy(row.get("isIntermediateTotal")) {
                WaterfallBar {
                    category,
                    start: 0.0,
                    end: *cumulative,
                    value: *cumulative,
                    kind: "total",
                }
            } else {
                let delta = row.get("value").and_then(Value::as_f64).unwrap_or(0.0);
                let start = *cumulative;
                *cumulative += delta;
                WaterfallBar {
                    category,
                    start,
                    end: *cumulative,
                    value: delta,
                    kind: if delta >= 0.0 { "positive" } else { "negative" },
                }
            };
            Some(bar)
        })
        .collect()
}

pub(super) fn waterfall(args: &Args) -> Map<String, Value> {
    let data: Vec<Value> = waterfall_bars(rows(args))
        .into_iter()
        .map(|bar| {
            json!({
                "category": bar.category,
                "start": bar.start,
                "end": bar.end,
                "value": bar.value,
                "type": bar.kind,
            })
        })
        .collect();

    let palette = style_option(args, "palette");
    let color = |key: &str, fallback: &str| {
        palette
            .and_then(|p| p.get(key))
            .and_then(Value::as_str)
            .unwrap_or(fallback)
            .to_string()
    };

    object(json!({
        "type": "interval",
        "data": data,
        "encode": { "x": "category", "y": ["start", "end"], "color": "type" },
        "scale": {
            "color": {
                "domain": ["positive", "negative", "total"],
                "range": [
                    color("positiveColor", POSITIVE_COLOR),
                    color("negativeColor", NEGATIVE_COLOR),
                    color("totalColor", TOTAL_COLOR),
                ],
            }
        },
        "labels": [{ "text": "value" }],
    }))
}
