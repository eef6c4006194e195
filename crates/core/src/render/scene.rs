// Spec walking and the plotters canvas shared by every mark

use super::{marks, shapes};
use crate::error::{ChartError, ChartResult};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde_json::{Map, Value};

pub(crate) type Row = Map<String, Value>;

/// Pixel-addressed drawing area backed by an SVG string
pub(crate) type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

pub(crate) const DEFAULT_PALETTE: [RGBColor; 10] = [
    RGBColor(0x17, 0x83, 0xFF),
    RGBColor(0x00, 0xC9, 0xC9),
    RGBColor(0xF0, 0x88, 0x4D),
    RGBColor(0xD5, 0x80, 0xFF),
    RGBColor(0x78, 0x63, 0xFF),
    RGBColor(0x60, 0xC4, 0x2D),
    RGBColor(0xBD, 0x8F, 0x24),
    RGBColor(0xFF, 0x80, 0xCA),
    RGBColor(0x24, 0x91, 0xB3),
    RGBColor(0x17, 0xC7, 0x6F),
];

pub(crate) const TEXT_COLOR: RGBColor = RGBColor(0x1D, 0x21, 0x29);
pub(crate) const AXIS_COLOR: RGBColor = RGBColor(0x86, 0x90, 0x9C);
const FONT: &str = "sans-serif";

impl From<DrawingAreaErrorKind<std::io::Error>> for ChartError {
    fn from(e: DrawingAreaErrorKind<std::io::Error>) -> Self {
        ChartError::render(e)
    }
}

/// Compose a complete SVG document for `spec`
pub fn compose(spec: &Value, width: u32, height: u32) -> ChartResult<String> {
    let background = spec
        .pointer("/viewStyle/viewFill")
        .and_then(Value::as_str)
        .and_then(parse_color)
        .unwrap_or(WHITE);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        root.fill(&background)?;

        let titled = match spec.pointer("/title/title").and_then(Value::as_str) {
            Some(title) if !title.is_empty() => root.titled(title, text_style(18.0, &TEXT_COLOR))?,
            _ => root.clone(),
        };
        draw(&titled.margin(8, 8, 8, 16), spec, &rows_of(spec), background)?;
        root.present()?;
    }
    Ok(svg)
}

/// Dispatch on the geometry type
fn draw(area: &Area, spec: &Value, rows: &[&Row], background: RGBColor) -> ChartResult<()> {
    let geometry = spec
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ChartError::render("spec has no geometry type"))?;
    let coordinate = spec.pointer("/coordinate/type").and_then(Value::as_str);

    match geometry {
        "view" if coordinate == Some("polar") => shapes::radar(area, spec, rows),
        "view" => marks::layered(area, spec, rows),
        "interval" if coordinate == Some("theta") => shapes::pie(area, spec, rows, background),
        "interval" => marks::interval(area, spec, rows),
        "line" | "area" | "point" => marks::series(area, spec, rows),
        "rect" => marks::histogram(area, spec, rows),
        "boxplot" => marks::boxplot(area, spec, rows),
        "liquid" => shapes::liquid(area, spec),
        "wordCloud" => shapes::word_cloud(area, spec, rows),
        "path" => shapes::venn(area, spec, rows),
        "treemap" => shapes::treemap(area, spec),
        "sankey" => shapes::sankey(area, spec),
        "forceGraph" => shapes::force_graph(area, spec),
        other => Err(ChartError::render(format!("unknown geometry '{}'", other))),
    }
}

pub(crate) fn text_style(size: f64, color: &RGBColor) -> TextStyle<'static> {
    (FONT, size).into_font().color(color)
}

/// Text style anchored on its center point
pub(crate) fn centered(size: f64, color: &RGBColor) -> TextStyle<'static> {
    text_style(size, color).pos(Pos::new(HPos::Center, VPos::Center))
}

pub(crate) fn anchored(size: f64, color: &RGBColor, h: HPos) -> TextStyle<'static> {
    text_style(size, color).pos(Pos::new(h, VPos::Center))
}

pub(crate) fn px((x, y): (f64, f64)) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}

/// Size of `area` in pixels as floats
pub(crate) fn extent(area: &Area) -> (f64, f64) {
    let (w, h) = area.dim_in_pixel();
    (w as f64, h as f64)
}

/// `#RGB` or `#RRGGBB`
pub(crate) fn parse_color(text: &str) -> Option<RGBColor> {
    let hex = text.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => Some(RGBColor(
            channel(&hex[0..1])? * 17,
            channel(&hex[1..2])? * 17,
            channel(&hex[2..3])? * 17,
        )),
        6 => Some(RGBColor(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        _ => None,
    }
}

/// Categorical color assignment
pub(crate) struct ColorScale {
    domain: Vec<String>,
    range: Vec<RGBColor>,
}

impl ColorScale {
    /// Domain from `scale.color.domain` when given, else the observed keys
    pub fn new(spec: &Value, observed: Vec<String>) -> Self {
        let strings = |pointer: &str| -> Option<Vec<&str>> {
            spec.pointer(pointer)
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(Value::as_str).collect())
        };
        let range: Vec<RGBColor> = strings("/scale/color/range")
            .map(|r| r.into_iter().filter_map(parse_color).collect())
            .filter(|r: &Vec<RGBColor>| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_PALETTE.to_vec());
        let domain = strings("/scale/color/domain")
            .map(|d| d.into_iter().map(str::to_string).collect())
            .unwrap_or(observed);
        Self { domain, range }
    }

    pub fn color(&self, key: &str) -> RGBColor {
        self.at(self.domain.iter().position(|d| d == key).unwrap_or(0))
    }

    pub fn at(&self, index: usize) -> RGBColor {
        self.range[index % self.range.len()]
    }

    /// Legend entries in domain order
    pub fn entries(&self) -> Vec<(String, RGBColor)> {
        self.domain
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), self.at(i)))
            .collect()
    }
}

/// Swatches down the top-right edge of `area`
pub(crate) fn legend(area: &Area, entries: &[(String, RGBColor)]) -> ChartResult<()> {
    let (width, _) = area.dim_in_pixel();
    let x = width as i32 - 90;
    for (i, (name, color)) in entries.iter().enumerate().take(12) {
        let y = 16 * i as i32;
        area.draw(&Rectangle::new([(x, y), (x + 10, y + 10)], color.filled()))?;
        area.draw_text(name, &text_style(10.0, &TEXT_COLOR), (x + 14, y))?;
    }
    Ok(())
}

/// Rows of `spec.data`, looking through `{type: inline, value}` wrappers
pub(crate) fn rows_of(spec: &Value) -> Vec<&Row> {
    inline_value(spec)
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_object).collect())
        .unwrap_or_default()
}

static NULL: Value = Value::Null;

pub(crate) fn inline_value(spec: &Value) -> &Value {
    match spec.get("data") {
        Some(Value::Object(wrapper)) => wrapper.get("value").unwrap_or(&NULL),
        Some(data) => data,
        None => &NULL,
    }
}

pub(crate) fn num(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn key(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Field bound to an encoding channel
pub(crate) fn field<'a>(spec: &'a Value, channel: &str) -> Option<&'a str> {
    spec.get("encode")?.get(channel)?.as_str()
}

/// Distinct values of `field` in first-seen order
pub(crate) fn distinct(rows: &[&Row], field: Option<&str>) -> Vec<String> {
    let Some(field) = field else {
        return Vec::new();
    };
    let mut seen = Vec::new();
    for row in rows {
        let k = key(row.get(field));
        if !seen.contains(&k) {
            seen.push(k);
        }
    }
    seen
}

pub(crate) fn transform_types(spec: &Value) -> Vec<&str> {
    spec.get("transform")
        .and_then(Value::as_array)
        .map(|ts| ts.iter().filter_map(|t| t.get("type")?.as_str()).collect())
        .unwrap_or_default()
}

pub(crate) fn style_number(spec: &Value, name: &str) -> Option<f64> {
    spec.get("style").and_then(|s| num(s.get(name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compose_has_title_and_background() {
        let spec = json!({
            "type": "line",
            "data": [{ "time": "2020", "value": 1 }, { "time": "2021", "value": 2 }],
            "encode": { "x": "time", "y": "value" },
            "title": { "title": "Growth" },
            "viewStyle": { "viewFill": "#101010" }
        });
        let svg = compose(&spec, 400, 300).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Growth"));
        assert!(svg.contains("#101010"));
        assert!(svg.contains("<polyline"));
    }

    #[test]
    fn test_unknown_geometry_fails() {
        let err = compose(&json!({ "type": "hologram" }), 100, 100).unwrap_err();
        assert!(err.to_string().contains("hologram"));
        assert!(compose(&json!({}), 100, 100).is_err());
    }

    #[test]
    fn test_color_scale_domain_order() {
        let spec = json!({ "scale": { "color": { "domain": ["b", "a"], "range": ["#111111", "#222"] } } });
        let colors = ColorScale::new(&spec, vec!["a".into(), "b".into()]);
        assert_eq!(colors.color("b"), RGBColor(0x11, 0x11, 0x11));
        assert_eq!(colors.color("a"), RGBColor(0x22, 0x22, 0x22));
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#1783FF"), Some(RGBColor(0x17, 0x83, 0xFF)));
        assert_eq!(parse_color("#fff"), Some(RGBColor(255, 255, 255)));
        assert_eq!(parse_color("red"), None);
        assert_eq!(parse_color("#ééé"), None);
    }

    #[test]
    fn test_rows_through_inline_wrapper() {
        let spec = json!({ "data": { "type": "inline", "value": [{ "a": 1 }, 3] } });
        assert_eq!(rows_of(&spec).len(), 1);
    }
}
