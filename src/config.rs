use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use serde::Deserialize;

use crate::error::{PathwayError, Result};

pub const DEFAULT_BIOMARKERS: [&str; 10] = [
    "APP", "BACE1", "PSEN1", "MAPT", "GSK3B", "APOE", "IL6", "TNF", "SOD1", "CYCS",
];

/// Settings for one render pass. Everything the pass needs is carried here
/// rather than read from process-wide state.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub accession: String,
    pub organism: String,
    pub rest_base_url: String,
    pub entry_url: String,
    pub cache_path: PathBuf,
    pub output_path: PathBuf,
    pub title: String,
    pub canvas_height_px: u32,
    pub biomarkers: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            accession: "hsa05010".to_string(),
            organism: "hsa".to_string(),
            rest_base_url: "https://rest.kegg.jp".to_string(),
            entry_url: "https://www.kegg.jp/dbget-bin/www_bget?".to_string(),
            cache_path: PathBuf::from("hsa05010.xml"),
            output_path: PathBuf::from("pathway_network.html"),
            title: "Alzheimer's Disease Pathway Explorer".to_string(),
            canvas_height_px: 700,
            biomarkers: DEFAULT_BIOMARKERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).map_err(|err| PathwayError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|err| PathwayError::Config(format!("cannot read {path:?}: {err}")))?;
        Self::from_toml_str(&contents)
    }

    /// Switch to another pathway. The cache path follows the accession only
    /// while it is still the one derived from the previous accession.
    pub fn set_accession(&mut self, accession: &str) {
        if self.cache_path == derived_cache_path(&self.accession) {
            self.cache_path = derived_cache_path(accession);
        }
        self.accession = accession.to_string();
    }

    fn validate(&self) -> Result<()> {
        if self.accession.trim().is_empty() {
            return Err(PathwayError::Config("accession must not be empty".into()));
        }
        if self.organism.trim().is_empty() {
            return Err(PathwayError::Config("organism must not be empty".into()));
        }
        if self.biomarkers.is_empty() {
            return Err(PathwayError::Config("biomarker list must not be empty".into()));
        }
        // a blank option would substring-match every node
        if self.biomarkers.iter().any(|option| option.trim().is_empty()) {
            return Err(PathwayError::Config("biomarker options must not be blank".into()));
        }
        Ok(())
    }

    /// Resolve the user's choice against the configured options, keeping the
    /// configured order. An empty choice selects every option.
    pub fn validate_selection(&self, requested: &[String]) -> Result<IndexSet<String>> {
        self.validate()?;
        if requested.is_empty() {
            return Ok(self.biomarkers.iter().cloned().collect());
        }
        if let Some(unknown) = requested.iter().find(|biomarker| {
            !self
                .biomarkers
                .iter()
                .any(|option| option.eq_ignore_ascii_case(biomarker))
        }) {
            return Err(PathwayError::Config(format!(
                "unknown biomarker {unknown:?}; choose from {}",
                self.biomarkers.join(", ")
            )));
        }
        Ok(self
            .biomarkers
            .iter()
            .filter(|option| {
                requested
                    .iter()
                    .any(|biomarker| option.eq_ignore_ascii_case(biomarker))
            })
            .cloned()
            .collect())
    }
}

fn derived_cache_path(accession: &str) -> PathBuf {
    PathBuf::from(format!("{accession}.xml"))
}
