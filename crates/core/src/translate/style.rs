// Shared post-processing. Only fills gaps; a key a rule already set is kept.

use super::{style_option, truthy, Args};
use serde_json::{json, Map, Value};

pub(super) fn apply_common_style(spec: &mut Map<String, Value>, args: &Args) {
    if truthy(args.get("title")) {
        fill(spec, "title", json!({ "title": args["title"] }));
    }

    if let Some(palette) = style_option(args, "palette").filter(|p| p.is_array()) {
        if let Some(scale) = nested(spec, "scale") {
            fill(scale, "color", json!({ "range": palette }));
        }
    }

    if let Some(background) = style_option(args, "backgroundColor") {
        if let Some(view_style) = nested(spec, "viewStyle") {
            fill(view_style, "viewFill", background.clone());
        }
    }
}

pub(super) fn apply_axis_titles(spec: &mut Map<String, Value>, args: &Args) {
    for (arg, channel) in [("axisXTitle", "x"), ("axisYTitle", "y")] {
        if !truthy(args.get(arg)) {
            continue;
        }
        let Some(axis) = nested(spec, "axis") else {
            // `axis: false` hides axes altogether
            return;
        };
        if let Some(channel) = nested(axis, channel) {
            fill(channel, "title", args[arg].clone());
        }
    }
}

fn fill(map: &mut Map<String, Value>, key: &str, value: Value) {
    map.entry(key.to_string()).or_insert(value);
}

/// Object under `key`, created when absent. `None` if the key holds a non-object.
fn nested<'a>(map: &'a mut Map<String, Value>, key: &str) -> Option<&'a mut Map<String, Value>> {
    map.entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_title_palette_background() {
        let mut s = spec(json!({ "type": "line" }));
        apply_common_style(
            &mut s,
            &json!({
                "title": "Sales",
                "style": { "palette": ["#f00", "#0f0"], "backgroundColor": "#000" }
            }),
        );
        assert_eq!(s["title"], json!({ "title": "Sales" }));
        assert_eq!(s["scale"]["color"]["range"], json!(["#f00", "#0f0"]));
        assert_eq!(s["viewStyle"]["viewFill"], json!("#000"));
    }

    #[test]
    fn test_existing_fields_survive() {
        let mut s = spec(json!({
            "type": "interval",
            "scale": { "y": { "domainMin": 0 }, "color": { "domain": ["positive"] } }
        }));
        apply_common_style(&mut s, &json!({ "style": { "palette": ["#f00"] } }));
        assert_eq!(s["scale"]["y"], json!({ "domainMin": 0 }));
        assert_eq!(s["scale"]["color"], json!({ "domain": ["positive"] }));
    }

    #[test]
    fn test_non_array_palette_ignored() {
        let mut s = spec(json!({ "type": "interval" }));
        apply_common_style(&mut s, &json!({ "style": { "palette": { "totalColor": "#00f" } } }));
        assert!(s.get("scale").is_none());
    }

    #[test]
    fn test_axis_titles() {
        let mut s = spec(json!({ "type": "line", "axis": { "x": { "title": "kept" } } }));
        apply_axis_titles(&mut s, &json!({ "axisXTitle": "Year", "axisYTitle": "Revenue" }));
        assert_eq!(s["axis"]["x"]["title"], json!("kept"));
        assert_eq!(s["axis"]["y"]["title"], json!("Revenue"));
    }

    #[test]
    fn test_hidden_axis_untouched() {
        let mut s = spec(json!({ "type": "interval", "axis": false }));
        apply_axis_titles(&mut s, &json!({ "axisXTitle": "Year" }));
        assert_eq!(s["axis"], json!(false));
    }

    #[test]
    fn test_no_axis_without_titles() {
        let mut s = spec(json!({ "type": "line" }));
        apply_axis_titles(&mut s, &json!({}));
        assert!(s.get("axis").is_none());
    }
}
