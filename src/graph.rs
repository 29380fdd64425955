use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::debug;

use crate::kgml::{EntryType, Graphics, Pathway, RelationSubtype};

#[derive(Clone, Debug, PartialEq)]
pub struct NodeData {
    pub id: String,
    pub name: String,
    pub label: String,
    pub entry_type: EntryType,
    pub graphics: Option<Graphics>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeData {
    pub relation_type: String,
    pub subtypes: Vec<RelationSubtype>,
}

impl EdgeData {
    pub fn subtype_names(&self) -> Vec<&str> {
        self.subtypes.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Directed pathway graph keyed by KGML entry id. Never edited after it is
/// built; filtering derives a new graph.
#[derive(Clone, Debug, Default)]
pub struct PathwayGraph {
    graph: DiGraph<NodeData, EdgeData>,
    index: HashMap<String, NodeIndex>,
}

impl PathwayGraph {
    /// One node per gene, enzyme or compound entry and one edge per relation
    /// between two such nodes, in document order. Parallel edges are kept.
    pub fn build(pathway: &Pathway) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();

        for entry in pathway.entries.values() {
            if !entry.entry_type.is_retained() {
                continue;
            }
            let idx = graph.add_node(NodeData {
                id: entry.id.clone(),
                name: entry.name.clone(),
                label: entry.label().to_string(),
                entry_type: entry.entry_type,
                graphics: entry.graphics.clone(),
            });
            index.insert(entry.id.clone(), idx);
        }

        let mut skipped = 0;
        for relation in &pathway.relations {
            match (index.get(&relation.entry1), index.get(&relation.entry2)) {
                (Some(&from), Some(&to)) => {
                    graph.add_edge(
                        from,
                        to,
                        EdgeData {
                            relation_type: relation.relation_type.clone(),
                            subtypes: relation.subtypes.clone(),
                        },
                    );
                }
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            debug!("Skipped {skipped} relations touching non-node entries");
        }

        Self { graph, index }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn node(&self, id: &str) -> Option<&NodeData> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeData> {
        self.graph.node_weights()
    }

    /// Edges in insertion order as (source, target, data).
    pub fn edges(&self) -> impl Iterator<Item = (&NodeData, &NodeData, &EdgeData)> {
        self.graph.edge_references().map(move |edge| {
            (
                &self.graph[edge.source()],
                &self.graph[edge.target()],
                edge.weight(),
            )
        })
    }

    pub fn node_ids(&self) -> Vec<String> {
        self.nodes().map(|node| node.id.clone()).collect()
    }

    pub fn edge_pairs(&self) -> Vec<(String, String)> {
        self.edges()
            .map(|(from, to, _)| (from.id.clone(), to.id.clone()))
            .collect()
    }

    /// Node-induced subgraph: the nodes accepted by `keep` plus every edge
    /// whose endpoints both survive.
    pub fn induced_subgraph<F>(&self, keep: F) -> PathwayGraph
    where
        F: Fn(&NodeData) -> bool,
    {
        let graph = self.graph.filter_map(
            |_, node| keep(node).then(|| node.clone()),
            |_, edge| Some(edge.clone()),
        );
        let index = graph
            .node_indices()
            .map(|idx| (graph[idx].id.clone(), idx))
            .collect();
        PathwayGraph { graph, index }
    }
}
