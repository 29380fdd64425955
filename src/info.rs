use indexmap::IndexSet;
use serde::Serialize;
use tracing::warn;

use crate::kegg::KeggClient;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum Description {
    Available(String),
    /// The reason shown to the user in place of a description.
    Unavailable(String),
}

impl Description {
    pub fn is_available(&self) -> bool {
        matches!(self, Description::Available(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BiomarkerInfo {
    pub biomarker: String,
    pub entry_id: String,
    pub link: String,
    pub description: Description,
}

/// Text between the first `DEFINITION` marker and the next `PATHWAY` marker,
/// trimmed. `None` when there is no `DEFINITION` field or it is blank.
pub fn extract_definition(record: &str) -> Option<String> {
    let (_, rest) = record.split_once("DEFINITION")?;
    let field = rest.split("DEFINITION").next().unwrap_or(rest);
    let field = field.split("PATHWAY").next().unwrap_or(field).trim();
    (!field.is_empty()).then(|| field.to_string())
}

/// Look up one biomarker's gene record. Failures are reported in the returned
/// description and never abort the caller.
pub fn fetch_description<K>(
    client: &K,
    organism: &str,
    entry_url: &str,
    biomarker: &str,
) -> BiomarkerInfo
where
    K: KeggClient + ?Sized,
{
    let entry_id = format!("{organism}:{biomarker}");
    let description = match client.get_entry(&entry_id) {
        Ok(record) => match extract_definition(&record) {
            Some(text) => Description::Available(text),
            None => Description::Unavailable("no DEFINITION field in KEGG record".to_string()),
        },
        Err(err) => {
            warn!("Information unavailable for {biomarker}: {err}");
            Description::Unavailable(format!("Information unavailable ({err})"))
        }
    };

    BiomarkerInfo {
        biomarker: biomarker.to_string(),
        link: format!("{entry_url}{entry_id}"),
        entry_id,
        description,
    }
}

pub fn fetch_all<K>(
    client: &K,
    organism: &str,
    entry_url: &str,
    selection: &IndexSet<String>,
) -> Vec<BiomarkerInfo>
where
    K: KeggClient + ?Sized,
{
    selection
        .iter()
        .map(|biomarker| fetch_description(client, organism, entry_url, biomarker))
        .collect()
}
