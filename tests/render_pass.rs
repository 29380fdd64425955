use std::cell::RefCell;

use indexmap::IndexSet;
use kegg_pathway_explorer::cache::{DocumentCache, MemoryCache};
use kegg_pathway_explorer::config::Config;
use kegg_pathway_explorer::info::Description;
use kegg_pathway_explorer::kegg::KeggClient;
use kegg_pathway_explorer::pass::RenderPass;
use kegg_pathway_explorer::{PathwayError, Result};

const KGML: &str = r#"<?xml version="1.0"?>
<!DOCTYPE pathway SYSTEM "https://www.kegg.jp/kegg/xml/KGML_v0.7.2_.dtd">
<pathway name="path:hsa05010" org="hsa" number="05010" title="Alzheimer disease">
    <entry id="10" name="hsa:351" type="gene">
        <graphics name="APP, AAA, ABETA, ABPP" type="rectangle" x="200" y="100" width="46" height="17"/>
    </entry>
    <entry id="11" name="hsa:23621" type="gene">
        <graphics name="BACE1, ASP2, BACE" type="rectangle" x="300" y="100" width="46" height="17"/>
    </entry>
    <entry id="12" name="hsa:5663" type="gene">
        <graphics name="PSEN1, AD3, FAD" type="rectangle" x="300" y="150" width="46" height="17"/>
    </entry>
    <entry id="13" name="cpd:C00076" type="compound">
        <graphics name="C00076" type="circle" x="400" y="200" width="8" height="8"/>
    </entry>
    <relation entry1="11" entry2="10" type="PPrel"><subtype name="activation" value="--&gt;"/></relation>
    <relation entry1="12" entry2="10" type="PPrel"><subtype name="activation" value="--&gt;"/></relation>
    <relation entry1="10" entry2="13" type="PCrel"/>
</pathway>
"#;

#[derive(Default)]
struct StubKegg {
    requests: RefCell<Vec<String>>,
}

impl KeggClient for StubKegg {
    fn get_pathway_kgml(&self, accession: &str) -> Result<String> {
        self.requests.borrow_mut().push(accession.to_string());
        Ok(KGML.to_string())
    }

    fn get_entry(&self, id: &str) -> Result<String> {
        self.requests.borrow_mut().push(id.to_string());
        match id {
            "hsa:APP" => Ok("DEFINITION  amyloid beta precursor protein\nPATHWAY hsa05010\n".into()),
            "hsa:BACE1" => Ok("DEFINITION  beta-secretase 1\nPATHWAY hsa05010\n".into()),
            _ => Err(PathwayError::fetch(id, "HTTP 404 Not Found")),
        }
    }
}

fn config_in(dir: &tempfile::TempDir) -> Config {
    Config {
        output_path: dir.path().join("out").join("pathway_network.html"),
        cache_path: dir.path().join("hsa05010.xml"),
        ..Config::default()
    }
}

fn select(items: &[&str]) -> IndexSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn render_pass_writes_filtered_page() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let cache = MemoryCache::new();
    let kegg = StubKegg::default();

    let report = RenderPass::new(&config, &cache, &kegg)
        .run(&select(&["APP", "BACE1", "CYCS"]))
        .unwrap();

    assert!(!report.fallback);
    assert_eq!(report.notice, "Found 2 nodes related to selected biomarkers.");
    assert_eq!((report.node_count, report.edge_count), (2, 1));
    assert!(cache.exists());

    let written = std::fs::read_to_string(&config.output_path).unwrap();
    assert_eq!(written, report.html);
    assert!(written.contains("Alzheimer disease"));
    assert!(written.contains("beta-secretase 1"));

    // one info lookup per selected biomarker, the failing one degraded
    assert_eq!(report.infos.len(), 3);
    let order: Vec<_> = report.infos.iter().map(|i| i.biomarker.as_str()).collect();
    assert_eq!(order, ["APP", "BACE1", "CYCS"]);
    let cycs = report.infos.iter().find(|i| i.biomarker == "CYCS").unwrap();
    assert!(matches!(&cycs.description, Description::Unavailable(r) if r.contains("404")));
}

#[test]
fn unmatched_selection_shows_full_pathway() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let cache = MemoryCache::with_contents(KGML);
    let kegg = StubKegg::default();

    let report = RenderPass::new(&config, &cache, &kegg)
        .run(&select(&["SOD1"]))
        .unwrap();

    assert!(report.fallback);
    assert_eq!((report.node_count, report.edge_count), (4, 3));
    assert!(report.html.contains("showing full pathway"));
    // cached document reused, only the gene record was requested
    assert_eq!(*kegg.requests.borrow(), vec!["hsa:SOD1".to_string()]);
}

#[test]
fn broken_pathway_document_halts_the_pass() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let cache = MemoryCache::with_contents("<pathway><entry id=\"1\"");
    let kegg = StubKegg::default();

    let err = RenderPass::new(&config, &cache, &kegg)
        .run(&select(&["APP"]))
        .unwrap_err();

    assert!(matches!(err, PathwayError::Parse(_)));
    assert!(!config.output_path.exists());
    assert!(kegg.requests.borrow().is_empty());
}

#[test]
fn repeated_passes_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let cache = MemoryCache::new();
    let kegg = StubKegg::default();
    let pass = RenderPass::new(&config, &cache, &kegg);

    let first = pass.run(&select(&["PSEN1"])).unwrap();
    let second = pass.run(&select(&["PSEN1"])).unwrap();
    assert_eq!(first.html, second.html);
    assert_eq!(cache.write_count(), 1);
}
