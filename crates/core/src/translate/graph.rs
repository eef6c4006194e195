// Hierarchies and node/edge diagrams, all flattened to {nodes, links}

use super::{object, Args};
use serde::Serialize;
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
}

/// Depth-first flattening of a `{name, children}` tree.
///
/// A tree of N nodes yields N node records and N-1 links, parents before
/// children.
pub fn flatten_tree(root: &Value) -> (Vec<GraphNode>, Vec<GraphLink>) {
    let mut nodes = Vec::new();
    let mut links = Vec::new();
    let mut stack: Vec<(&Value, Option<String>)> = vec![(root, None)];

    while let Some((node, parent)) = stack.pop() {
        let id = name_of(node);
        if let Some(source) = parent {
            links.push(GraphLink {
                source,
                target: id.clone(),
            });
        }
        let children = node
            .get("children")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        // reversed so the first child is visited first
        stack.extend(children.iter().rev().map(|child| (child, Some(id.clone()))));
        nodes.push(GraphNode { id });
    }

    (nodes, links)
}

/// Mind map, organization chart and fishbone diagram
pub(super) fn tree_graph(args: &Args) -> Map<String, Value> {
    let (nodes, links) = match args.get("data") {
        Some(root) if root.is_object() => flatten_tree(root),
        _ => (Vec::new(), Vec::new()),
    };
    force_graph(&nodes, &links)
}

/// Network graph and flow diagram: explicit node and edge lists
pub(super) fn node_edge_graph(args: &Args) -> Map<String, Value> {
    let list = |key: &str| {
        args.get("data")
            .and_then(|d| d.get(key))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    };

    let nodes: Vec<GraphNode> = list("nodes")
        .iter()
        .map(|n| GraphNode { id: name_of(n) })
        .collect();
    let links: Vec<GraphLink> = list("edges")
        .iter()
        .map(|e| GraphLink {
            source: text(e.get("source")),
            target: text(e.get("target")),
        })
        .collect();

    force_graph(&nodes, &links)
}

fn force_graph(nodes: &[GraphNode], links: &[GraphLink]) -> Map<String, Value> {
    object(json!({
        "type": "forceGraph",
        "data": {
            "type": "inline",
            "value": { "nodes": nodes, "links": links },
        },
    }))
}

fn name_of(node: &Value) -> String {
    text(node.get("name"))
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
