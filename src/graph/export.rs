use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use super::builder::NoteGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Graphviz digraph.
    Dot,
    /// `{nodes, edges}` document.
    Json,
    /// Self-contained interactive page; requires the `graph-html` feature.
    Html,
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dot" => Ok(ExportFormat::Dot),
            "json" => Ok(ExportFormat::Json),
            "html" => Ok(ExportFormat::Html),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unknown export format: {0} (expected dot, json, or html)")]
    UnknownFormat(String),
    #[error("interactive HTML export requires building with the `graph-html` feature")]
    RendererUnavailable,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("failed to serialize graph: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Write the graph to `output` in the requested format.
pub fn export(graph: &NoteGraph, output: &Path, format: ExportFormat) -> Result<(), ExportError> {
    let body = match format {
        ExportFormat::Dot => render_dot(graph),
        ExportFormat::Json => render_json(graph)?,
        ExportFormat::Html => render_html(graph)?,
    };
    fs::write(output, body)?;
    Ok(())
}

fn render_dot(graph: &NoteGraph) -> String {
    let mut out = String::from("digraph notes {\n");
    let mut nodes: Vec<&str> = graph.iter_nodes().map(|(path, _)| path).collect();
    nodes.sort();
    for path in nodes {
        let title = graph.node(path).map(|n| n.title.as_str()).unwrap_or(path);
        out.push_str(&format!(
            "    \"{}\" [label=\"{}\"];\n",
            escape_dot(path),
            escape_dot(title)
        ));
    }
    let mut edges: Vec<(&str, &str)> = graph.edges().collect();
    edges.sort();
    for (source, target) in edges {
        out.push_str(&format!(
            "    \"{}\" -> \"{}\";\n",
            escape_dot(source),
            escape_dot(target)
        ));
    }
    out.push_str("}\n");
    out
}

fn render_json(graph: &NoteGraph) -> Result<String, serde_json::Error> {
    let mut nodes: Vec<serde_json::Value> = graph
        .iter_nodes()
        .map(|(path, info)| {
            serde_json::json!({
                "path": path,
                "title": info.title,
                "tags": info.tags,
                "degree": graph.degree(path),
            })
        })
        .collect();
    nodes.sort_by_key(|n| n["path"].as_str().unwrap_or("").to_string());

    let mut edges: Vec<(&str, &str)> = graph.edges().collect();
    edges.sort();
    let edges: Vec<serde_json::Value> = edges
        .into_iter()
        .map(|(source, target)| serde_json::json!({ "source": source, "target": target }))
        .collect();

    serde_json::to_string_pretty(&serde_json::json!({ "nodes": nodes, "edges": edges }))
}

#[cfg(feature = "graph-html")]
fn render_html(graph: &NoteGraph) -> Result<String, ExportError> {
    let data = render_json(graph)?;
    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Note graph</title>
<script src="https://unpkg.com/vis-network/standalone/umd/vis-network.min.js"></script>
<style>html, body, #graph {{ height: 100%; margin: 0; }}</style>
</head>
<body>
<div id="graph"></div>
<script>
const data = {data};
const nodes = data.nodes.map(n => ({{ id: n.path, label: n.title, value: n.degree + 1 }}));
const edges = data.edges.map(e => ({{ from: e.source, to: e.target, arrows: "to" }}));
new vis.Network(
    document.getElementById("graph"),
    {{ nodes: new vis.DataSet(nodes), edges: new vis.DataSet(edges) }},
    {{ nodes: {{ shape: "dot", scaling: {{ min: 8, max: 30 }} }} }}
);
</script>
</body>
</html>
"#
    ))
}

#[cfg(not(feature = "graph-html"))]
fn render_html(_graph: &NoteGraph) -> Result<String, ExportError> {
    Err(ExportError::RendererUnavailable)
}

fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
