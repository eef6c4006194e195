// Marks on cartesian axes: intervals, lines/areas/points, histogram, boxplot

use super::scene::{
    distinct, field, key, num, style_number, text_style, transform_types, Area, ColorScale, Row,
    AXIS_COLOR, TEXT_COLOR,
};
use crate::error::ChartResult;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use serde_json::Value;
use std::ops::Range;

/// Upper bound on histogram bins, whatever `binNumber` asks for
pub(crate) const MAX_BINS: usize = 1_000;

type Chart<'a, 'b> = ChartContext<'a, SVGBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// How an axis labels its ticks
#[derive(Clone, Copy)]
enum Scale<'s> {
    /// One slot per category, centred on integer positions
    Band(&'s [String]),
    Value,
}

impl Scale<'_> {
    fn label(&self, v: f64) -> String {
        match self {
            Scale::Band(domain) => {
                let index = v.round();
                if (v - index).abs() > 1e-6 || index < 0.0 {
                    return String::new();
                }
                domain.get(index as usize).cloned().unwrap_or_default()
            }
            Scale::Value => format_tick(v),
        }
    }

    fn ticks(&self) -> usize {
        match self {
            Scale::Band(domain) => domain.len().clamp(1, 12),
            Scale::Value => 6,
        }
    }
}

struct Axes<'s> {
    x: Scale<'s>,
    y: Scale<'s>,
    x_title: Option<&'s str>,
    y_title: Option<&'s str>,
}

impl<'s> Axes<'s> {
    fn of(spec: &'s Value, x: Scale<'s>, y: Scale<'s>) -> Self {
        Self {
            x,
            y,
            x_title: axis_title(spec, "x"),
            y_title: axis_title(spec, "y"),
        }
    }
}

fn band_range(count: usize) -> Range<f64> {
    -0.5..(count.max(1) as f64 - 0.5)
}

/// Padded range covering `values`; only negative minimums get padding below
fn value_range(values: impl IntoIterator<Item = f64>) -> Range<f64> {
    let (mut min, mut max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !min.is_finite() || !max.is_finite() {
        (min, max) = (0.0, 1.0);
    }
    if (max - min).abs() < f64::EPSILON {
        max = min + 1.0;
    }
    let pad = (max - min) * 0.05;
    (if min < 0.0 { min - pad } else { min })..(max + pad)
}

fn hidden_axes(spec: &Value) -> bool {
    spec.get("axis") == Some(&Value::Bool(false))
}

fn axis_title<'a>(spec: &'a Value, channel: &str) -> Option<&'a str> {
    spec.get("axis")?
        .get(channel)?
        .get("title")?
        .as_str()
        .filter(|t| !t.is_empty())
}

fn format_tick(v: f64) -> String {
    if v.fract().abs() < 1e-9 {
        format!("{}", v as i64)
    } else {
        format!("{:.2}", v)
    }
}

fn format_value(v: &f64) -> String {
    format_tick(*v)
}

/// Cartesian chart with label areas sized for visible axes
fn cartesian<'a, 'b>(area: &'a Area<'b>, spec: &Value, x: Range<f64>, y: Range<f64>) -> ChartResult<Chart<'a, 'b>> {
    let shown = if hidden_axes(spec) { 0 } else { 1 };
    let chart = ChartBuilder::on(area)
        .margin(6)
        .x_label_area_size(36 * shown)
        .y_label_area_size(56 * shown)
        .build_cartesian_2d(x, y)?;
    Ok(chart)
}

fn draw_mesh(chart: &mut Chart<'_, '_>, axes: Axes<'_>) -> ChartResult<()> {
    let x_label = |v: &f64| axes.x.label(*v);
    let y_label = |v: &f64| axes.y.label(*v);

    let mut mesh = chart.configure_mesh();
    mesh.disable_x_mesh()
        .light_line_style(TRANSPARENT)
        .bold_line_style(AXIS_COLOR.mix(0.2))
        .axis_style(AXIS_COLOR)
        .label_style(text_style(11.0, &TEXT_COLOR))
        .x_labels(axes.x.ticks())
        .y_labels(axes.y.ticks())
        .x_label_formatter(&x_label)
        .y_label_formatter(&y_label);
    if let Some(title) = axes.x_title {
        mesh.x_desc(title);
    }
    if let Some(title) = axes.y_title {
        mesh.y_desc(title);
    }
    mesh.draw()?;
    Ok(())
}

fn draw_legend<'a, 'b: 'a>(chart: &mut Chart<'a, 'b>) -> ChartResult<()> {
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(AXIS_COLOR)
        .draw()?;
    Ok(())
}

fn stroke(width: Option<f64>, fallback: u32) -> u32 {
    width.map(|w| w.round().clamp(1.0, 20.0) as u32).unwrap_or(fallback)
}

/// Groups from the color channel, or one unnamed group
fn groups_of(rows: &[&Row], color_field: Option<&str>) -> Vec<String> {
    let groups = distinct(rows, color_field);
    if groups.is_empty() {
        vec![String::new()]
    } else {
        groups
    }
}

struct Bar {
    category: usize,
    group: usize,
    y0: f64,
    y1: f64,
}

pub(crate) fn interval(area: &Area, spec: &Value, rows: &[&Row]) -> ChartResult<()> {
    let x_field = field(spec, "x");
    let color_field = field(spec, "color");
    let transforms = transform_types(spec);
    let stack = transforms.contains(&"stackY");
    let symmetric = transforms.contains(&"symmetryY");
    let transposed = spec
        .pointer("/coordinate/transform")
        .and_then(Value::as_array)
        .is_some_and(|ts| ts.iter().any(|t| t.get("type").and_then(Value::as_str) == Some("transpose")));

    let categories = distinct(rows, x_field);
    let groups = groups_of(rows, color_field);
    let dodge = transforms.contains(&"dodgeX") && groups.len() > 1;
    let colors = ColorScale::new(spec, distinct(rows, color_field));

    let mut positive = vec![0.0; categories.len()];
    let mut negative = vec![0.0; categories.len()];
    let mut bars = Vec::new();
    for row in rows {
        let category_key = key(x_field.and_then(|f| row.get(f)));
        let category = categories.iter().position(|c| *c == category_key).unwrap_or(0);
        let group_key = key(color_field.and_then(|f| row.get(f)));
        let group = groups.iter().position(|g| *g == group_key).unwrap_or(0);

        let (y0, y1) = match spec.pointer("/encode/y") {
            Some(Value::Array(range)) if range.len() == 2 => {
                let end = |i: usize| num(range[i].as_str().and_then(|f| row.get(f))).unwrap_or(0.0);
                (end(0), end(1))
            }
            Some(Value::String(y_field)) => {
                let v = num(row.get(y_field.as_str())).unwrap_or(0.0);
                if stack {
                    let offsets = if v >= 0.0 { &mut positive } else { &mut negative };
                    let base = offsets[category];
                    offsets[category] += v;
                    (base, base + v)
                } else if symmetric {
                    (-v / 2.0, v / 2.0)
                } else {
                    (0.0, v)
                }
            }
            _ => continue,
        };
        bars.push(Bar { category, group, y0, y1 });
    }

    let values = value_range(bars.iter().flat_map(|b| [b.y0, b.y1]).chain([0.0]));
    let band = band_range(categories.len());
    // transposed bars list the first category at the top
    let reversed: Vec<String> = categories.iter().rev().cloned().collect();
    let mut chart = if transposed {
        cartesian(area, spec, values, band)?
    } else {
        cartesian(area, spec, band, values)?
    };
    if !symmetric {
        let axes = if transposed {
            Axes::of(spec, Scale::Value, Scale::Band(&reversed))
        } else {
            Axes::of(spec, Scale::Band(&categories), Scale::Value)
        };
        draw_mesh(&mut chart, axes)?;
    }

    let padding = if spec.pointer("/scale/x/padding").and_then(Value::as_f64) == Some(0.0) {
        0.0
    } else {
        0.1
    };
    let slot = |bar: &Bar| -> (f64, f64) {
        let position = if transposed {
            categories.len().saturating_sub(1 + bar.category)
        } else {
            bar.category
        };
        let mut start = position as f64 - 0.5 + padding;
        let mut thickness = 1.0 - 2.0 * padding;
        if dodge {
            thickness /= groups.len() as f64;
            start += thickness * bar.group as f64;
        }
        (start, start + thickness)
    };

    let show_legend = color_field.is_some() && color_field != x_field && groups.len() > 1;
    for (g, name) in groups.iter().enumerate() {
        let fill = if color_field.is_some() { colors.color(name) } else { colors.at(0) };
        let rects = bars.iter().filter(|bar| bar.group == g).map(|bar| {
            let (a, b) = slot(bar);
            let corners = if transposed {
                [(bar.y0, a), (bar.y1, b)]
            } else {
                [(a, bar.y0), (b, bar.y1)]
            };
            Rectangle::new(corners, fill.filled())
        });
        let series = chart.draw_series(rects)?;
        if show_legend {
            series
                .label(name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], fill.filled()));
        }
    }
    if show_legend {
        draw_legend(&mut chart)?;
    }
    Ok(())
}

pub(crate) fn series(area: &Area, spec: &Value, rows: &[&Row]) -> ChartResult<()> {
    let geometry = spec.get("type").and_then(Value::as_str).unwrap_or("line");
    let x_field = field(spec, "x");
    let y_field = field(spec, "y");
    let color_field = field(spec, "color");
    let stack = transform_types(spec).contains(&"stackY");

    let numeric_x = !rows.is_empty()
        && rows
            .iter()
            .all(|r| x_field.and_then(|f| r.get(f)).is_some_and(Value::is_number));
    let categories = distinct(rows, x_field);
    let groups = groups_of(rows, color_field);
    let colors = ColorScale::new(spec, groups.clone());

    // (x, lower, upper) per group, stacked when requested
    let mut offsets = vec![0.0; categories.len()];
    let mut layers: Vec<Vec<(f64, f64, f64)>> = vec![Vec::new(); groups.len()];
    for row in rows {
        let x_key = key(x_field.and_then(|f| row.get(f)));
        let Some(v) = num(y_field.and_then(|f| row.get(f))) else {
            continue;
        };
        let index = categories.iter().position(|c| *c == x_key).unwrap_or(0);
        let x = if numeric_x {
            num(x_field.and_then(|f| row.get(f))).unwrap_or(0.0)
        } else {
            index as f64
        };
        let group = groups
            .iter()
            .position(|g| *g == key(color_field.and_then(|f| row.get(f))))
            .unwrap_or(0);
        let base = if stack {
            let base = offsets[index];
            offsets[index] += v;
            base
        } else {
            0.0
        };
        layers[group].push((x, base, base + v));
    }
    if numeric_x && geometry != "point" {
        for layer in &mut layers {
            layer.sort_by(|a, b| a.0.total_cmp(&b.0));
        }
    }

    let mut extent: Vec<f64> = layers.iter().flatten().flat_map(|(_, lo, hi)| [*lo, *hi]).collect();
    if geometry == "area" {
        extent.push(0.0);
    }
    if let Some(min) = spec.pointer("/scale/y/domainMin").and_then(Value::as_f64) {
        extent.push(min);
    }
    let x_range = if numeric_x {
        value_range(layers.iter().flatten().map(|(x, _, _)| *x))
    } else {
        band_range(categories.len())
    };
    let mut chart = cartesian(area, spec, x_range, value_range(extent))?;
    let x_scale = if numeric_x { Scale::Value } else { Scale::Band(&categories) };
    if !hidden_axes(spec) {
        draw_mesh(&mut chart, Axes::of(spec, x_scale, Scale::Value))?;
    }

    let line_width = stroke(style_number(spec, "lineWidth"), if geometry == "area" { 1 } else { 2 });
    let fill_opacity = style_number(spec, "fillOpacity").unwrap_or(0.5);
    let show_legend = color_field.is_some() && groups.len() > 1;
    for (i, layer) in layers.iter().enumerate() {
        let color = colors.color(&groups[i]);
        let upper: Vec<(f64, f64)> = layer.iter().map(|(x, _, hi)| (*x, *hi)).collect();

        let series = match geometry {
            "point" => chart.draw_series(upper.iter().map(|p| Circle::new(*p, 4, color.mix(0.85).filled())))?,
            "area" => {
                let mut outline = upper.clone();
                outline.extend(layer.iter().rev().map(|(x, lo, _)| (*x, *lo)));
                chart.draw_series(std::iter::once(Polygon::new(outline, color.mix(fill_opacity).filled())))?;
                chart.draw_series(LineSeries::new(upper, color.stroke_width(line_width)))?
            }
            _ => chart.draw_series(LineSeries::new(upper, color.stroke_width(line_width)))?,
        };
        if show_legend {
            series
                .label(groups[i].as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 14, y)], color.stroke_width(2)));
        }
    }
    if show_legend {
        draw_legend(&mut chart)?;
    }
    Ok(())
}

/// Column and line series sharing categories, the first on the left axis
/// and the rest on the right
pub(crate) fn layered(area: &Area, spec: &Value, rows: &[&Row]) -> ChartResult<()> {
    let children = spec
        .get("children")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let x_field = children.first().and_then(|c| field(c, "x"));
    let categories = distinct(rows, x_field);
    let colors = ColorScale::new(spec, Vec::new());

    // (is a column, value per category)
    let layers: Vec<(bool, Vec<Option<f64>>)> = children
        .iter()
        .map(|child| {
            let y_field = field(child, "y");
            let values = categories
                .iter()
                .map(|c| {
                    rows.iter()
                        .find(|r| key(x_field.and_then(|f| r.get(f))) == *c)
                        .and_then(|r| num(y_field.and_then(|f| r.get(f))))
                })
                .collect();
            (child.get("type").and_then(Value::as_str) == Some("interval"), values)
        })
        .collect();

    let values_of = |from: usize, to: usize| {
        layers[from.min(layers.len())..to.min(layers.len())]
            .iter()
            .flat_map(|(_, vs)| vs.iter().flatten().copied())
            .chain([0.0])
            .collect::<Vec<f64>>()
    };
    let primary = value_range(values_of(0, 1));
    let secondary = if layers.len() > 1 {
        value_range(values_of(1, layers.len()))
    } else {
        primary.clone()
    };

    let mut chart = ChartBuilder::on(area)
        .margin(6)
        .x_label_area_size(36)
        .y_label_area_size(56)
        .right_y_label_area_size(56)
        .build_cartesian_2d(band_range(categories.len()), primary)?
        .set_secondary_coord(band_range(categories.len()), secondary);

    let mut axes = Axes::of(spec, Scale::Band(&categories), Scale::Value);
    axes.y_title = children.first().and_then(|c| axis_title(c, "y"));
    draw_mesh(&mut chart, axes)?;
    if layers.len() > 1 {
        let mut right = chart.configure_secondary_axes();
        right.y_label_formatter(&format_value);
        if let Some(title) = children.get(1).and_then(|c| axis_title(c, "y")) {
            right.y_desc(title);
        }
        right.draw()?;
    }

    let columns = layers.iter().filter(|(column, _)| *column).count().max(1);
    let width = 0.8 / columns as f64;
    let mut column_index = 0;
    for (i, (column, values)) in layers.iter().enumerate() {
        let color = colors.at(i);
        let points: Vec<(f64, f64)> = values
            .iter()
            .enumerate()
            .filter_map(|(c, v)| v.map(|v| (c as f64, v)))
            .collect();
        if *column {
            let offset = -0.4 + width * column_index as f64;
            column_index += 1;
            let rects = points
                .iter()
                .map(move |(x, y)| Rectangle::new([(x + offset, 0.0), (x + offset + width, *y)], color.filled()));
            if i == 0 {
                chart.draw_series(rects)?;
            } else {
                chart.draw_secondary_series(rects)?;
            }
        } else {
            let line = LineSeries::new(points, color.stroke_width(2));
            if i == 0 {
                chart.draw_series(line)?;
            } else {
                chart.draw_secondary_series(line)?;
            }
        }
    }
    Ok(())
}

/// Bin counts over `[min, max]`: `thresholds` bins, `ceil(sqrt(n))` when
/// unset, never more than [`MAX_BINS`]
pub(crate) fn bin_counts(values: &[f64], thresholds: Option<usize>) -> (f64, f64, Vec<usize>) {
    if values.is_empty() {
        return (0.0, 1.0, Vec::new());
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let bins = thresholds
        .unwrap_or_else(|| (values.len() as f64).sqrt().ceil() as usize)
        .clamp(1, MAX_BINS);
    let width = if max > min { (max - min) / bins as f64 } else { 1.0 };

    let mut counts = vec![0; bins];
    for v in values {
        let index = (((v - min) / width) as usize).min(bins - 1);
        counts[index] += 1;
    }
    (min, min + width * bins as f64, counts)
}

pub(crate) fn histogram(area: &Area, spec: &Value, rows: &[&Row]) -> ChartResult<()> {
    let x_field = field(spec, "x");
    let values: Vec<f64> = rows
        .iter()
        .filter_map(|r| num(x_field.and_then(|f| r.get(f))))
        .filter(|v| v.is_finite())
        .collect();
    // float to int casts saturate, the bin cap does the rest
    let thresholds = spec
        .pointer("/transform/0/thresholds")
        .and_then(|t| num(Some(t)))
        .map(|t| t.max(1.0) as usize);

    let (min, max, counts) = bin_counts(&values, thresholds);
    let mut chart = cartesian(area, spec, min..max, value_range(counts.iter().map(|c| *c as f64).chain([0.0])))?;
    if !hidden_axes(spec) {
        draw_mesh(&mut chart, Axes::of(spec, Scale::Value, Scale::Value))?;
    }

    let fill = ColorScale::new(spec, Vec::new()).at(0);
    let width = (max - min) / counts.len().max(1) as f64;
    let gap = width * 0.02;
    chart.draw_series(counts.iter().enumerate().map(|(i, count)| {
        let left = min + width * i as f64;
        Rectangle::new([(left + gap, 0.0), (left + width - gap, *count as f64)], fill.filled())
    }))?;
    Ok(())
}

/// min, q1, median, q3, max of a sorted sample
pub(crate) fn five_numbers(sorted: &[f64]) -> Option<[f64; 5]> {
    if sorted.is_empty() {
        return None;
    }
    let quantile = |q: f64| {
        let pos = q * (sorted.len() - 1) as f64;
        let (lo, hi) = (pos.floor() as usize, pos.ceil() as usize);
        sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
    };
    Some([
        sorted[0],
        quantile(0.25),
        quantile(0.5),
        quantile(0.75),
        sorted[sorted.len() - 1],
    ])
}

pub(crate) fn boxplot(area: &Area, spec: &Value, rows: &[&Row]) -> ChartResult<()> {
    let x_field = field(spec, "x");
    let y_field = field(spec, "y");
    let color_field = field(spec, "color");
    let categories = distinct(rows, x_field);
    let colors = ColorScale::new(spec, distinct(rows, color_field));
    let opacity = style_number(spec, "opacity").unwrap_or(0.85);

    let mut samples: Vec<(Vec<f64>, String)> = categories.iter().map(|_| (Vec::new(), String::new())).collect();
    for row in rows {
        let category = key(x_field.and_then(|f| row.get(f)));
        if let (Some(index), Some(v)) = (
            categories.iter().position(|c| *c == category),
            num(y_field.and_then(|f| row.get(f))),
        ) {
            samples[index].0.push(v);
            samples[index].1 = key(color_field.and_then(|f| row.get(f)));
        }
    }
    for (sample, _) in &mut samples {
        sample.sort_by(|a, b| a.total_cmp(b));
    }

    let mut extent: Vec<f64> = samples.iter().flat_map(|(s, _)| s.iter().copied()).collect();
    if let Some(min) = spec.pointer("/scale/y/domainMin").and_then(Value::as_f64) {
        extent.push(min);
    }
    let mut chart = cartesian(area, spec, band_range(categories.len()), value_range(extent))?;
    if !hidden_axes(spec) {
        draw_mesh(&mut chart, Axes::of(spec, Scale::Band(&categories), Scale::Value))?;
    }

    let half = 0.25;
    let mut boxes = Vec::new();
    let mut strokes = Vec::new();
    for (i, (sample, color_key)) in samples.iter().enumerate() {
        let Some([min, q1, median, q3, max]) = five_numbers(sample) else {
            continue;
        };
        let x = i as f64;
        let color = colors.color(color_key);
        let whisker = color.stroke_width(2);
        boxes.push(Rectangle::new([(x - half, q1), (x + half, q3)], color.mix(opacity).filled()));
        strokes.push(PathElement::new(vec![(x, min), (x, q1)], whisker));
        strokes.push(PathElement::new(vec![(x, q3), (x, max)], whisker));
        strokes.push(PathElement::new(vec![(x - half / 2.0, min), (x + half / 2.0, min)], whisker));
        strokes.push(PathElement::new(vec![(x - half / 2.0, max), (x + half / 2.0, max)], whisker));
        strokes.push(PathElement::new(vec![(x - half, median), (x + half, median)], TEXT_COLOR.stroke_width(2)));
    }
    chart.draw_series(boxes)?;
    chart.draw_series(strokes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bin_counts() {
        let (min, max, counts) = bin_counts(&[1.0, 2.0, 3.0, 4.0], Some(2));
        assert_eq!((min, max), (1.0, 4.0));
        assert_eq!(counts, vec![2, 2]);

        let (_, _, auto) = bin_counts(&[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0], None);
        assert_eq!(auto.len(), 3);
        assert_eq!(auto.iter().sum::<usize>(), 8);
    }

    #[test]
    fn test_bin_count_is_capped() {
        let (_, _, counts) = bin_counts(&[1.0, 2.0, 3.0], Some(10_000_000_000_000));
        assert_eq!(counts.len(), MAX_BINS);
        assert_eq!(counts.iter().sum::<usize>(), 3);

        let (_, _, counts) = bin_counts(&[1.0, 2.0, 3.0], Some(usize::MAX));
        assert_eq!(counts.len(), MAX_BINS);
    }

    #[test]
    fn test_five_numbers() {
        assert_eq!(five_numbers(&[1.0, 2.0, 3.0, 4.0, 5.0]), Some([1.0, 2.0, 3.0, 4.0, 5.0]));
        assert_eq!(five_numbers(&[]), None);
    }

    #[test]
    fn test_value_range_pads_and_includes_data() {
        let range = value_range([0.0, 100.0]);
        assert_eq!(range.start, 0.0);
        assert!(range.end > 100.0);

        let negative = value_range([-10.0, 10.0]);
        assert!(negative.start < -10.0);

        let empty = value_range([]);
        assert_eq!(empty.start, 0.0);
        assert!(empty.end > 1.0);
    }

    #[test]
    fn test_band_labels_only_on_slots() {
        let domain = vec!["a".to_string(), "b".to_string()];
        let band = Scale::Band(&domain);
        assert_eq!(band.label(1.0), "b");
        assert_eq!(band.label(0.5), "");
        assert_eq!(band.label(-1.0), "");
        assert_eq!(band.label(7.0), "");
    }
}
