// Non-cartesian layouts: pie, radar, liquid, word cloud, venn, treemap, sankey, graphs

use super::scene::{
    anchored, centered, distinct, extent, field, inline_value, key, legend, num, parse_color, px,
    style_number, text_style, Area, ColorScale, Row, AXIS_COLOR, TEXT_COLOR,
};
use crate::error::ChartResult;
use plotters::prelude::*;
use plotters::style::text_anchor::HPos;
use serde_json::Value;
use std::f64::consts::{PI, TAU};

fn polar(center: (f64, f64), radius: f64, angle: f64) -> (f64, f64) {
    (center.0 + radius * angle.sin(), center.1 - radius * angle.cos())
}

/// Wedge from `start` sweeping clockwise by `sweep` radians
fn sector(center: (f64, f64), radius: f64, start: f64, sweep: f64) -> Vec<(i32, i32)> {
    let steps = (sweep / TAU * 96.0).ceil().max(2.0) as usize;
    let mut points = vec![px(center)];
    points.extend((0..=steps).map(|i| px(polar(center, radius, start + sweep * i as f64 / steps as f64))));
    points
}

pub(crate) fn pie(area: &Area, spec: &Value, rows: &[&Row], background: RGBColor) -> ChartResult<()> {
    let value_field = field(spec, "y");
    let color_field = field(spec, "color");
    let colors = ColorScale::new(spec, distinct(rows, color_field));

    let slices: Vec<(String, f64)> = rows
        .iter()
        .map(|r| {
            (
                key(color_field.and_then(|f| r.get(f))),
                num(value_field.and_then(|f| r.get(f))).unwrap_or(0.0).max(0.0),
            )
        })
        .collect();
    let total: f64 = slices.iter().map(|(_, v)| v).sum();

    let (w, h) = extent(area);
    let center = (w / 2.0, h / 2.0);
    let radius = w.min(h) / 2.0 * 0.9;
    if total > 0.0 {
        let mut angle = 0.0;
        for (name, value) in &slices {
            let sweep = value / total * TAU;
            if sweep > 0.0 {
                area.draw(&Polygon::new(sector(center, radius, angle, sweep), colors.color(name).filled()))?;
            }
            angle += sweep;
        }
    }

    if let Some(inner) = spec.pointer("/coordinate/innerRadius").and_then(|v| num(Some(v))) {
        let hole = (radius * inner.clamp(0.0, 1.0)).round() as i32;
        area.draw(&Circle::new(px(center), hole, background.filled()))?;
    }
    legend(area, &colors.entries())
}

/// Polar view: every child layer shares the category spokes and radius scale
pub(crate) fn radar(area: &Area, spec: &Value, rows: &[&Row]) -> ChartResult<()> {
    let children = spec
        .get("children")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let Some(first) = children.first() else {
        return Ok(());
    };
    let x_field = field(first, "x");
    let y_field = field(first, "y");
    let color_field = field(first, "color");

    let spokes = distinct(rows, x_field);
    let groups = {
        let g = distinct(rows, color_field);
        if g.is_empty() { vec![String::new()] } else { g }
    };
    let colors = ColorScale::new(spec, groups.clone());
    let max = rows
        .iter()
        .filter_map(|r| num(y_field.and_then(|f| r.get(f))))
        .fold(0.0_f64, f64::max)
        .max(1.0);

    let (w, h) = extent(area);
    let center = (w / 2.0, h / 2.0);
    let radius = w.min(h) / 2.0 * 0.8;
    let step = TAU / spokes.len().max(1) as f64;
    let grid = AXIS_COLOR.mix(0.5);

    for ring in 1..=4 {
        let r = radius * ring as f64 / 4.0;
        let outline: Vec<(i32, i32)> = (0..=spokes.len()).map(|i| px(polar(center, r, step * i as f64))).collect();
        area.draw(&PathElement::new(outline, grid))?;
    }
    for (i, name) in spokes.iter().enumerate() {
        let tip = polar(center, radius, step * i as f64);
        area.draw(&PathElement::new(vec![px(center), px(tip)], grid))?;
        let label = polar(center, radius + 14.0, step * i as f64);
        area.draw_text(name, &centered(11.0, &TEXT_COLOR), px(label))?;
    }

    for (g, group) in groups.iter().enumerate() {
        let points: Vec<(i32, i32)> = rows
            .iter()
            .filter(|r| color_field.is_none() || key(color_field.and_then(|f| r.get(f))) == *group)
            .filter_map(|r| {
                let spoke = spokes.iter().position(|s| *s == key(x_field.and_then(|f| r.get(f))))?;
                let v = num(y_field.and_then(|f| r.get(f)))?;
                Some(px(polar(center, radius * v / max, step * spoke as f64)))
            })
            .collect();
        let color = colors.at(g);
        for child in children {
            match child.get("type").and_then(Value::as_str) {
                Some("area") if points.len() >= 3 => {
                    let opacity = style_number(child, "fillOpacity").unwrap_or(0.5);
                    area.draw(&Polygon::new(points.clone(), color.mix(opacity).filled()))?;
                }
                Some("line") => {
                    let mut closed = points.clone();
                    closed.extend(points.first().copied());
                    let width = style_number(child, "lineWidth").unwrap_or(2.0).clamp(1.0, 20.0) as u32;
                    area.draw(&PathElement::new(closed, color.stroke_width(width)))?;
                }
                Some("point") => {
                    for point in &points {
                        area.draw(&Circle::new(*point, 3, color.filled()))?;
                    }
                }
                _ => {}
            }
        }
    }

    if color_field.is_some() && groups.len() > 1 {
        legend(area, &colors.entries())?;
    }
    Ok(())
}

/// Outline of the part of a circle below `level`
fn water(center: (f64, f64), radius: f64, level: f64) -> Vec<(i32, i32)> {
    // screen y grows downwards: the water is where sin(theta) >= (level - cy) / r
    let from = ((level - center.1) / radius).clamp(-1.0, 1.0).asin();
    let to = PI - from;
    (0..=64)
        .map(|i| {
            let theta = from + (to - from) * i as f64 / 64.0;
            px((center.0 + radius * theta.cos(), center.1 + radius * theta.sin()))
        })
        .collect()
}

pub(crate) fn liquid(area: &Area, spec: &Value) -> ChartResult<()> {
    let percent = num(spec.get("data")).unwrap_or(0.0).clamp(0.0, 1.0);
    let fill = spec
        .pointer("/style/fill")
        .and_then(Value::as_str)
        .and_then(parse_color)
        .unwrap_or(RGBColor(0x17, 0x83, 0xFF));

    let (w, h) = extent(area);
    let center = (w / 2.0, h / 2.0);
    let r = w.min(h) / 2.0 * 0.85;
    area.draw(&Circle::new(px(center), (r + 4.0).round() as i32, fill.stroke_width(3)))?;
    if percent > 0.0 {
        let level = center.1 + r - 2.0 * r * percent;
        area.draw(&Polygon::new(water(center, r, level), fill.mix(0.85).filled()))?;
    }
    area.draw_text(&format!("{:.2}%", percent * 100.0), &centered(28.0, &TEXT_COLOR), px(center))?;
    Ok(())
}

pub(crate) fn word_cloud(area: &Area, spec: &Value, rows: &[&Row]) -> ChartResult<()> {
    let mut words: Vec<(String, f64)> = rows
        .iter()
        .map(|r| (key(r.get("text")), num(r.get("value")).unwrap_or(1.0)))
        .collect();
    words.sort_by(|a, b| b.1.total_cmp(&a.1));
    let colors = ColorScale::new(spec, words.iter().map(|(w, _)| w.clone()).collect());
    let max = words.first().map(|(_, v)| *v).unwrap_or(1.0).max(f64::EPSILON);

    // greedy line filling, largest words first
    let (w, h) = extent(area);
    let (mut x, mut y, mut line_height) = (0.0, 0.0, 0.0_f64);
    for (word, value) in &words {
        let size = 12.0 + 36.0 * (value / max).clamp(0.0, 1.0);
        let width = word.chars().count() as f64 * size * 0.6;
        if x + width > w && x > 0.0 {
            x = 0.0;
            y += line_height + 6.0;
            line_height = 0.0;
        }
        if y + size > h {
            break;
        }
        area.draw_text(word, &text_style(size, &colors.color(word)), px((x, y)))?;
        x += width + 10.0;
        line_height = line_height.max(size);
    }
    Ok(())
}

/// Single-set circles sized by value, arranged on a ring so neighbours overlap
pub(crate) fn venn(area: &Area, spec: &Value, rows: &[&Row]) -> ChartResult<()> {
    let sets: Vec<(String, f64, String)> = rows
        .iter()
        .filter_map(|r| {
            let members = r.get("sets")?.as_array()?;
            if members.len() != 1 {
                return None;
            }
            let name = key(members.first());
            let label = r.get("label").map(|l| key(Some(l))).unwrap_or_else(|| name.clone());
            Some((name, num(r.get("value")).unwrap_or(1.0).max(0.0), label))
        })
        .collect();
    let colors = ColorScale::new(spec, sets.iter().map(|(n, _, _)| n.clone()).collect());
    let opacity = style_number(spec, "fillOpacity").unwrap_or(0.6);

    let max = sets.iter().map(|(_, v, _)| *v).fold(0.0_f64, f64::max).max(f64::EPSILON);
    let (w, h) = extent(area);
    let center = (w / 2.0, h / 2.0);
    let max_radius = w.min(h) / 3.0;
    let orbit = if sets.len() > 1 { max_radius * 0.6 } else { 0.0 };
    let step = TAU / sets.len().max(1) as f64;

    for (i, (name, value, _)) in sets.iter().enumerate() {
        let position = polar(center, orbit, step * i as f64);
        let r = (max_radius * (value / max).sqrt()).round() as i32;
        area.draw(&Circle::new(px(position), r, colors.color(name).mix(opacity).filled()))?;
    }
    for (i, (_, _, label)) in sets.iter().enumerate() {
        area.draw_text(label, &centered(12.0, &TEXT_COLOR), px(polar(center, orbit, step * i as f64)))?;
    }
    Ok(())
}

fn tree_value(node: &Value) -> f64 {
    match node.get("children").and_then(Value::as_array) {
        Some(children) if !children.is_empty() => children.iter().map(tree_value).sum(),
        _ => num(node.get("value")).unwrap_or(0.0).max(0.0),
    }
}

/// Slice-and-dice layout, alternating direction per depth
fn layout_tree(
    area: &Area,
    node: &Value,
    rect: (f64, f64, f64, f64),
    depth: usize,
    colors: &ColorScale,
    color_index: usize,
) -> ChartResult<()> {
    let (x, y, w, h) = rect;
    let children = node
        .get("children")
        .and_then(Value::as_array)
        .filter(|c| !c.is_empty());

    let Some(children) = children else {
        let corners = [px((x, y)), px((x + w, y + h))];
        area.draw(&Rectangle::new(corners, colors.at(color_index).filled()))?;
        area.draw(&Rectangle::new(corners, WHITE.stroke_width(1)))?;
        if w > 30.0 && h > 16.0 {
            area.draw_text(&key(node.get("name")), &text_style(12.0, &TEXT_COLOR), px((x + 4.0, y + 4.0)))?;
        }
        return Ok(());
    };

    let total = tree_value(node).max(f64::EPSILON);
    let mut offset = 0.0;
    for (i, child) in children.iter().enumerate() {
        let share = tree_value(child) / total;
        let index = if depth == 0 { i } else { color_index };
        let child_rect = if depth % 2 == 0 {
            (x + w * offset, y, w * share, h)
        } else {
            (x, y + h * offset, w, h * share)
        };
        layout_tree(area, child, child_rect, depth + 1, colors, index)?;
        offset += share;
    }
    Ok(())
}

pub(crate) fn treemap(area: &Area, spec: &Value) -> ChartResult<()> {
    let root = inline_value(spec);
    if !root.is_object() {
        return Ok(());
    }
    let (w, h) = extent(area);
    layout_tree(area, root, (0.0, 0.0, w, h), 0, &ColorScale::new(spec, Vec::new()), 0)
}

fn index_of(name: String, nodes: &mut Vec<String>) -> usize {
    match nodes.iter().position(|n| *n == name) {
        Some(i) => i,
        None => {
            nodes.push(name);
            nodes.len() - 1
        }
    }
}

/// Column per node from its longest incoming path
fn node_depths(nodes: &[String], links: &[(usize, usize, f64)]) -> Vec<usize> {
    let mut depth = vec![0; nodes.len()];
    // bounded relaxation keeps cycles from looping forever
    for _ in 0..nodes.len() {
        let mut changed = false;
        for (source, target, _) in links {
            if depth[*target] < depth[*source] + 1 && depth[*source] + 1 < nodes.len() {
                depth[*target] = depth[*source] + 1;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    depth
}

/// Cubic from `a` to `b` with horizontal tangents at both ends
fn flow_curve(a: (f64, f64), b: (f64, f64)) -> impl Iterator<Item = (f64, f64)> {
    let mid = (a.0 + b.0) / 2.0;
    (0..=24).map(move |i| {
        let t = i as f64 / 24.0;
        let u = 1.0 - t;
        let x = u * u * u * a.0 + 3.0 * u * u * t * mid + 3.0 * u * t * t * mid + t * t * t * b.0;
        let y = u * u * u * a.1 + 3.0 * u * u * t * a.1 + 3.0 * u * t * t * b.1 + t * t * t * b.1;
        (x, y)
    })
}

pub(crate) fn sankey(area: &Area, spec: &Value) -> ChartResult<()> {
    let raw_links = array(inline_value(spec), "links");

    let mut nodes: Vec<String> = Vec::new();
    let links: Vec<(usize, usize, f64)> = raw_links
        .iter()
        .map(|l| {
            let source = index_of(key(l.get("source")), &mut nodes);
            let target = index_of(key(l.get("target")), &mut nodes);
            (source, target, num(l.get("value")).unwrap_or(1.0).max(0.0))
        })
        .collect();
    if nodes.is_empty() {
        return Ok(());
    }

    let depth = node_depths(&nodes, &links);
    let columns = depth.iter().max().copied().unwrap_or(0) + 1;
    let throughput: Vec<f64> = (0..nodes.len())
        .map(|n| {
            let out: f64 = links.iter().filter(|l| l.0 == n).map(|l| l.2).sum();
            let incoming: f64 = links.iter().filter(|l| l.1 == n).map(|l| l.2).sum();
            out.max(incoming)
        })
        .collect();
    let scale = (0..columns)
        .map(|c| (0..nodes.len()).filter(|n| depth[*n] == c).map(|n| throughput[n]).sum::<f64>())
        .fold(0.0_f64, f64::max)
        .max(f64::EPSILON);

    let (w, h) = extent(area);
    let node_width = 12.0;
    let column_step = if columns > 1 { (w - node_width) / (columns - 1) as f64 } else { 0.0 };
    let usable = h * 0.8;
    let mut positions = vec![(0.0, 0.0, 0.0); nodes.len()];
    let mut cursor = vec![0.0; columns];
    for n in 0..nodes.len() {
        let c = depth[n];
        let height = (throughput[n] / scale * usable).max(2.0);
        positions[n] = (column_step * c as f64, cursor[c], height);
        cursor[c] += height + h * 0.2 / nodes.len() as f64;
    }

    let colors = ColorScale::new(spec, nodes.clone());
    let link_opacity = spec
        .pointer("/style/linkFillOpacity")
        .and_then(|v| num(Some(v)))
        .unwrap_or(0.4);
    let mut out_offset = vec![0.0; nodes.len()];
    let mut in_offset = vec![0.0; nodes.len()];
    for (source, target, value) in &links {
        let thickness = value / scale * usable;
        let (sx, sy, _) = positions[*source];
        let (tx, ty, _) = positions[*target];
        let y0 = sy + out_offset[*source];
        let y1 = ty + in_offset[*target];
        out_offset[*source] += thickness;
        in_offset[*target] += thickness;

        let (x0, x1) = (sx + node_width, tx);
        let mut band: Vec<(i32, i32)> = flow_curve((x0, y0), (x1, y1)).map(px).collect();
        let lower: Vec<(i32, i32)> = flow_curve((x0, y0 + thickness), (x1, y1 + thickness)).map(px).collect();
        band.extend(lower.into_iter().rev());
        area.draw(&Polygon::new(band, colors.color(&nodes[*source]).mix(link_opacity).filled()))?;
    }

    for (n, name) in nodes.iter().enumerate() {
        let (x, y, height) = positions[n];
        area.draw(&Rectangle::new([px((x, y)), px((x + node_width, y + height))], colors.color(name).filled()))?;
        let (label_x, side) = if depth[n] + 1 == columns && columns > 1 {
            (x - 4.0, HPos::Right)
        } else {
            (x + node_width + 4.0, HPos::Left)
        };
        area.draw_text(name, &anchored(11.0, &TEXT_COLOR, side), px((label_x, y + height / 2.0)))?;
    }
    Ok(())
}

/// Nodes on a circle, links as straight lines
pub(crate) fn force_graph(area: &Area, spec: &Value) -> ChartResult<()> {
    let value = inline_value(spec);
    let nodes: Vec<String> = array(value, "nodes").iter().map(|n| key(n.get("id"))).collect();
    let fill = ColorScale::new(spec, Vec::new()).at(0);

    let (w, h) = extent(area);
    let center = (w / 2.0, h / 2.0);
    let radius = if nodes.len() > 1 { w.min(h) / 2.0 * 0.8 } else { 0.0 };
    let step = TAU / nodes.len().max(1) as f64;
    // first node at twelve o'clock
    let position = |i: usize| polar(center, radius, step * i as f64);

    for link in array(value, "links") {
        let end = |name: &str| nodes.iter().position(|n| n == link_end(link, name)).map(position);
        if let (Some(a), Some(b)) = (end("source"), end("target")) {
            area.draw(&PathElement::new(vec![px(a), px(b)], AXIS_COLOR.stroke_width(1)))?;
        }
    }
    for (i, name) in nodes.iter().enumerate() {
        let (x, y) = position(i);
        area.draw(&Circle::new(px((x, y)), 10, fill.filled()))?;
        area.draw_text(name, &centered(11.0, &TEXT_COLOR), px((x, y - 18.0)))?;
    }
    Ok(())
}

fn array<'a>(value: &'a Value, name: &str) -> &'a [Value] {
    value.get(name).and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
}

fn link_end<'a>(link: &'a Value, name: &str) -> &'a str {
    link.get(name).and_then(Value::as_str).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_value_sums_leaves() {
        let tree = serde_json::json!({
            "name": "root",
            "value": 999,
            "children": [{ "name": "A", "value": 60 }, { "name": "B", "value": 40 }]
        });
        assert_eq!(tree_value(&tree), 100.0);
    }

    #[test]
    fn test_node_depths_chain_and_cycle() {
        let nodes: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(node_depths(&nodes, &[(0, 1, 1.0), (1, 2, 1.0)]), vec![0, 1, 2]);

        let cyclic = node_depths(&nodes, &[(0, 1, 1.0), (1, 0, 1.0)]);
        assert!(cyclic.iter().all(|d| *d < nodes.len()));
    }

    #[test]
    fn test_water_spans_fill_level() {
        let full = water((50.0, 50.0), 40.0, 10.0);
        let top = full.iter().map(|p| p.1).min().unwrap();
        assert!(top <= 11);

        let half = water((50.0, 50.0), 40.0, 50.0);
        assert!(half.iter().all(|p| p.1 >= 50));
    }

    #[test]
    fn test_sector_closes_on_center() {
        let wedge = sector((10.0, 10.0), 5.0, 0.0, PI);
        assert_eq!(wedge[0], (10, 10));
        assert_eq!(wedge[1], (10, 5));
        assert_eq!(*wedge.last().unwrap(), (10, 15));
    }
}
