use handlebars::{handlebars_helper, html_escape, Handlebars};
use indexmap::IndexSet;
use serde::Serialize;
use serde_json::json;

use crate::error::Result;
use crate::graph::{NodeData, PathwayGraph};
use crate::info::BiomarkerInfo;
use crate::kgml::EntryType;

/// Visual class of a node. The first matching rule wins: a biomarker match,
/// then gene, then compound, then everything else.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeStyle {
    Highlight,
    Gene,
    Compound,
    Other,
}

impl NodeStyle {
    pub fn for_node(node: &NodeData, selection: &IndexSet<String>) -> Self {
        let label = node.label.to_lowercase();
        if selection
            .iter()
            .any(|biomarker| label.contains(&biomarker.to_lowercase()))
        {
            NodeStyle::Highlight
        } else {
            match node.entry_type {
                EntryType::Gene => NodeStyle::Gene,
                EntryType::Compound => NodeStyle::Compound,
                _ => NodeStyle::Other,
            }
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            NodeStyle::Highlight => "#FF5252",
            NodeStyle::Gene => "#4CAF50",
            NodeStyle::Compound => "#2196F3",
            NodeStyle::Other => "#FFC107",
        }
    }

    pub fn size(self) -> u32 {
        match self {
            NodeStyle::Highlight => 25,
            NodeStyle::Gene => 18,
            NodeStyle::Compound => 15,
            NodeStyle::Other => 12,
        }
    }

    pub fn rgb(self) -> (f64, f64, f64) {
        let hex = &self.color()[1..];
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_or(0.0, |v| v as f64 / 255.0)
        };
        (channel(0), channel(2), channel(4))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VisualNode {
    pub id: String,
    pub label: String,
    pub title: String,
    pub color: &'static str,
    pub size: u32,
    #[serde(skip)]
    pub style: NodeStyle,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VisualEdge {
    pub from: String,
    pub to: String,
    pub title: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VisualGraph {
    pub nodes: Vec<VisualNode>,
    pub edges: Vec<VisualEdge>,
}

pub fn to_visual_node(node: &NodeData, selection: &IndexSet<String>) -> VisualNode {
    let style = NodeStyle::for_node(node, selection);
    VisualNode {
        id: node.id.clone(),
        label: node.label.clone(),
        title: format!(
            "<b>{}</b><br>Type: {}",
            html_escape(&node.label),
            node.entry_type.as_str()
        ),
        color: style.color(),
        size: style.size(),
        style,
    }
}

/// Node and edge descriptions for the graph canvas, in graph order.
pub fn to_visual(graph: &PathwayGraph, selection: &IndexSet<String>) -> VisualGraph {
    let nodes = graph
        .nodes()
        .map(|node| to_visual_node(node, selection))
        .collect();
    let edges = graph
        .edges()
        .map(|(from, to, edge)| {
            let subtypes = edge.subtype_names();
            let title = if subtypes.is_empty() {
                edge.relation_type.clone()
            } else {
                format!("{}: {}", edge.relation_type, subtypes.join(", "))
            };
            VisualEdge {
                from: from.id.clone(),
                to: to.id.clone(),
                title,
            }
        })
        .collect();
    VisualGraph { nodes, edges }
}

/// Everything shown on the generated page.
#[derive(Clone, Debug)]
pub struct PageContext<'a> {
    pub title: &'a str,
    pub pathway_title: &'a str,
    pub notice: String,
    pub fallback: bool,
    pub canvas_height_px: u32,
    pub visual: &'a VisualGraph,
    pub infos: &'a [BiomarkerInfo],
}

pub fn get_handlebars() -> Handlebars<'static> {
    let mut handlebars = Handlebars::new();

    handlebars_helper!(available: |status: String| status == "available");
    handlebars.register_helper("available", Box::new(available));

    handlebars
}

/// JSON that can sit inside an inline `<script>` element.
fn script_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

pub fn render_page(page: &PageContext) -> Result<String> {
    let handlebars = get_handlebars();
    let html = handlebars.render_template(
        &get_template(),
        &json!({
            "title": page.title,
            "pathway_title": page.pathway_title,
            "notice": page.notice,
            "notice_class": if page.fallback { "warning" } else { "success" },
            "height": page.canvas_height_px,
            "node_count": page.visual.nodes.len(),
            "edge_count": page.visual.edges.len(),
            "nodes_json": script_json(&page.visual.nodes)?,
            "edges_json": script_json(&page.visual.edges)?,
            "infos": page.infos,
        }),
    )?;
    Ok(html)
}

pub fn get_template() -> String {
    let template = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{{title}}</title>
  <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/vis-network/9.1.2/dist/dist/vis-network.min.css">
  <script src="https://cdnjs.cloudflare.com/ajax/libs/vis-network/9.1.2/dist/vis-network.min.js"></script>
  <style>
    body { font-family: sans-serif; margin: 1.5rem; }
    #pathway { width: 100%; height: {{height}}px; background-color: #111; border: 1px solid #333; }
    .notice { padding: 0.6rem 1rem; border-radius: 4px; margin: 1rem 0; }
    .notice.success { background: #e8f5e9; color: #1b5e20; }
    .notice.warning { background: #fff8e1; color: #8d6e00; }
    details { border: 1px solid #ddd; border-radius: 4px; margin: 0.5rem 0; padding: 0.5rem 1rem; }
    summary { cursor: pointer; }
    footer { text-align: center; margin-top: 2rem; color: #666; }
  </style>
</head>
<body>
  <h1>{{title}}</h1>
  <p>Explore KEGG biomarker interactions in the {{pathway_title}} pathway.</p>
  <div class="notice {{notice_class}}">{{notice}}</div>
  <p>{{node_count}} nodes, {{edge_count}} edges</p>
  <div id="pathway"></div>
  <script>
    var nodes = {{{nodes_json}}};
    var edges = {{{edges_json}}};
    nodes.forEach(function (node) {
      var tip = document.createElement("div");
      tip.innerHTML = node.title;
      node.title = tip;
    });
    var network = new vis.Network(
      document.getElementById("pathway"),
      { nodes: new vis.DataSet(nodes), edges: new vis.DataSet(edges) },
      {
        nodes: { shape: "dot", font: { color: "white" } },
        edges: { arrows: "to", color: { color: "#888" } },
        physics: { stabilization: true }
      }
    );
  </script>

  <hr>
  <h2>Biomarker Information</h2>
  {{#each infos as |info|}}
  <details>
    <summary><b>{{info.biomarker}}</b> &mdash; click to view KEGG details</summary>
    {{#if (available info.description.status)}}
    <p><b>Description:</b> {{info.description.text}}</p>
    {{else}}
    <p>{{info.description.text}}</p>
    {{/if}}
    <p><a href="{{info.link}}" target="_blank">Open in KEGG</a></p>
  </details>
  {{/each}}

  <footer>Built with KEGG REST and vis-network</footer>
</body>
</html>
"##;

    template.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PathwayError;
    use crate::info::Description;
    use crate::kgml::parse_kgml;

    fn node(id: &str, label: &str, entry_type: EntryType) -> NodeData {
        NodeData {
            id: id.to_string(),
            name: format!("hsa:{id}"),
            label: label.to_string(),
            entry_type,
            graphics: None,
        }
    }

    fn selection(items: &[&str]) -> IndexSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn biomarker_match_beats_type() {
        let sel = selection(&["app"]);
        for entry_type in [
            EntryType::Gene,
            EntryType::Compound,
            EntryType::Enzyme,
            EntryType::Other,
        ] {
            let visual = to_visual_node(&node("1", "APP, ABETA", entry_type), &sel);
            assert_eq!(visual.style, NodeStyle::Highlight);
            assert_eq!(visual.color, "#FF5252");
            assert_eq!(visual.size, 25);
        }
    }

    #[test]
    fn type_rules_apply_without_match() {
        let sel = selection(&["TNF"]);
        let gene = to_visual_node(&node("1", "APOE", EntryType::Gene), &sel);
        let compound = to_visual_node(&node("2", "Calcium", EntryType::Compound), &sel);
        let enzyme = to_visual_node(&node("3", "3.4.23.46", EntryType::Enzyme), &sel);
        assert_eq!((gene.color, gene.size), ("#4CAF50", 18));
        assert_eq!((compound.color, compound.size), ("#2196F3", 15));
        assert_eq!((enzyme.color, enzyme.size), ("#FFC107", 12));
    }

    #[test]
    fn highlight_only_looks_at_label() {
        // the raw name matches but the label does not
        let visual = to_visual_node(&node("351", "APP", EntryType::Gene), &selection(&["hsa:351"]));
        assert_eq!(visual.style, NodeStyle::Gene);
    }

    #[test]
    fn tooltip_bolds_escaped_label() {
        let visual = to_visual_node(&node("1", "APP", EntryType::Gene), &IndexSet::new());
        assert_eq!(visual.title, "<b>APP</b><br>Type: gene");
        let visual = to_visual_node(&node("2", "A<B", EntryType::Compound), &IndexSet::new());
        assert_eq!(visual.title, "<b>A&lt;B</b><br>Type: compound");
    }

    #[test]
    fn rgb_matches_hex() {
        assert_eq!(NodeStyle::Highlight.rgb(), (1.0, 82.0 / 255.0, 82.0 / 255.0));
    }

    #[test]
    fn visual_edges_carry_relation_and_subtypes() {
        let xml = r#"<pathway name="p">
            <entry id="a" name="A" type="gene"/>
            <entry id="b" name="B" type="gene"/>
            <relation entry1="a" entry2="b" type="PPrel"><subtype name="activation" value="--&gt;"/></relation>
            <relation entry1="b" entry2="a" type="GErel"/>
        </pathway>"#;
        let graph = PathwayGraph::build(&parse_kgml(xml).unwrap());
        let visual = to_visual(&graph, &IndexSet::new());
        assert_eq!(visual.nodes.len(), 2);
        assert_eq!(visual.edges[0].title, "PPrel: activation");
        assert_eq!(visual.edges[1].title, "GErel");
        assert_eq!((visual.edges[1].from.as_str(), visual.edges[1].to.as_str()), ("b", "a"));
    }

    #[test]
    fn page_embeds_graph_and_info_panel() {
        let visual = VisualGraph {
            nodes: vec![to_visual_node(
                &node("1", "APP</script>", EntryType::Gene),
                &selection(&["APP"]),
            )],
            edges: vec![],
        };
        let infos = vec![
            BiomarkerInfo {
                biomarker: "APP".to_string(),
                entry_id: "hsa:APP".to_string(),
                link: "https://www.kegg.jp/dbget-bin/www_bget?hsa:APP".to_string(),
                description: Description::Available("amyloid beta precursor protein".to_string()),
            },
            BiomarkerInfo {
                biomarker: "TNF".to_string(),
                entry_id: "hsa:TNF".to_string(),
                link: "https://www.kegg.jp/dbget-bin/www_bget?hsa:TNF".to_string(),
                description: Description::Unavailable("Information unavailable (timeout)".to_string()),
            },
        ];
        let html = render_page(&PageContext {
            title: "Explorer",
            pathway_title: "Alzheimer disease",
            notice: "Found 1 nodes related to selected biomarkers.".to_string(),
            fallback: false,
            canvas_height_px: 700,
            visual: &visual,
            infos: &infos,
        })
        .unwrap();

        assert!(html.contains("height: 700px"));
        assert!(html.contains(r#"class="notice success""#));
        assert!(html.contains("<b>Description:</b> amyloid beta precursor protein"));
        assert!(html.contains("Information unavailable (timeout)"));
        assert!(html.contains("www_bget?hsa:TNF"));
        assert!(html.contains(r##""color":"#FF5252""##));
        assert!(!html.contains("APP</script>"));
    }

    #[test]
    fn script_json_escapes_closing_tags() {
        let json = script_json(&vec!["a</script>b"]).unwrap();
        assert_eq!(json, r#"["a<\/script>b"]"#);
    }

    #[test]
    fn unserializable_graph_data_is_an_error() {
        // tuple keys have no JSON object form
        let data = std::collections::BTreeMap::from([((1u8, 2u8), "edge")]);
        let err = script_json(&data).unwrap_err();
        assert!(matches!(err, PathwayError::Serialize(_)));
    }
}
