use tracing::debug;

use crate::error::{PathwayError, Result};

/// The two queries the explorer makes against the KEGG database. Both return
/// the raw response text.
pub trait KeggClient {
    /// KGML description of a pathway, e.g. `hsa05010`.
    fn get_pathway_kgml(&self, accession: &str) -> Result<String>;

    /// Flat-file record of a single database entry, e.g. `hsa:APP`.
    fn get_entry(&self, id: &str) -> Result<String>;
}

/// KEGG REST API client (`https://rest.kegg.jp/get/...`).
pub struct RestClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl RestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::blocking::Client::new(),
        }
    }

    fn get(&self, target: &str, url: &str) -> Result<String> {
        debug!("GET {url}");
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|e| PathwayError::fetch(target, e))?;

        if !response.status().is_success() {
            return Err(PathwayError::fetch(
                target,
                format!("KEGG returned {}", response.status()),
            ));
        }

        response.text().map_err(|e| PathwayError::fetch(target, e))
    }
}

impl KeggClient for RestClient {
    fn get_pathway_kgml(&self, accession: &str) -> Result<String> {
        let url = format!("{}/get/{}/kgml", self.base_url, accession);
        self.get(accession, &url)
    }

    fn get_entry(&self, id: &str) -> Result<String> {
        let url = format!("{}/get/{}", self.base_url, id);
        self.get(id, &url)
    }
}
