use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use tracing::info;

use crate::cache::DocumentCache;
use crate::config::Config;
use crate::error::{PathwayError, Result};
use crate::filter::filter;
use crate::graph::PathwayGraph;
use crate::info::{fetch_all, BiomarkerInfo};
use crate::kegg::KeggClient;
use crate::kgml::Pathway;
use crate::loader::load;
use crate::render::{render_page, to_visual, PageContext};

#[derive(Clone, Debug)]
pub struct PassReport {
    pub notice: String,
    pub fallback: bool,
    pub node_count: usize,
    pub edge_count: usize,
    pub infos: Vec<BiomarkerInfo>,
    pub output_path: PathBuf,
    pub html: String,
}

/// One full recomputation for a selection: load or reuse the cached pathway,
/// build and filter the graph, fetch biomarker details and write the page.
pub struct RenderPass<'a, C: ?Sized, K: ?Sized> {
    config: &'a Config,
    cache: &'a C,
    client: &'a K,
}

impl<'a, C, K> RenderPass<'a, C, K>
where
    C: DocumentCache + ?Sized,
    K: KeggClient + ?Sized,
{
    pub fn new(config: &'a Config, cache: &'a C, client: &'a K) -> Self {
        Self {
            config,
            cache,
            client,
        }
    }

    pub fn load_graph(&self) -> Result<(Pathway, PathwayGraph)> {
        let pathway = load(self.cache, self.client, &self.config.accession)?;
        let graph = PathwayGraph::build(&pathway);
        info!(
            "Built graph with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok((pathway, graph))
    }

    pub fn run(&self, selection: &IndexSet<String>) -> Result<PassReport> {
        let (pathway, graph) = self.load_graph()?;
        let outcome = filter(&graph, selection);
        let view = outcome.graph();
        let visual = to_visual(view, selection);

        let infos = fetch_all(
            self.client,
            &self.config.organism,
            &self.config.entry_url,
            selection,
        );

        let pathway_title = if pathway.title.is_empty() {
            self.config.accession.as_str()
        } else {
            pathway.title.as_str()
        };
        let notice = outcome.notice();
        let html = render_page(&PageContext {
            title: &self.config.title,
            pathway_title,
            notice: notice.clone(),
            fallback: outcome.is_fallback(),
            canvas_height_px: self.config.canvas_height_px,
            visual: &visual,
            infos: &infos,
        })?;

        write_output(&self.config.output_path, &html)?;
        info!("Wrote {:?}", self.config.output_path);

        Ok(PassReport {
            notice,
            fallback: outcome.is_fallback(),
            node_count: view.node_count(),
            edge_count: view.edge_count(),
            infos,
            output_path: self.config.output_path.clone(),
            html,
        })
    }
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    let to_error = |source| PathwayError::Output {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(to_error)?;
    }
    fs::write(path, contents).map_err(to_error)
}
