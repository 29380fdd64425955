use tracing::info;

use crate::cache::DocumentCache;
use crate::error::Result;
use crate::kegg::KeggClient;
use crate::kgml::{parse_kgml, Pathway};

/// Read the pathway from the cache, fetching it from KEGG first when the cache
/// holds nothing. A cached document is never refreshed.
pub fn load<C, K>(cache: &C, client: &K, accession: &str) -> Result<Pathway>
where
    C: DocumentCache + ?Sized,
    K: KeggClient + ?Sized,
{
    if !cache.exists() {
        info!("Fetching KEGG pathway {accession}");
        let kgml = client.get_pathway_kgml(accession)?;
        cache.write(&kgml)?;
    }

    let kgml = cache.read()?;
    let pathway = parse_kgml(&kgml)?;
    info!(
        "Loaded {} ({} entries, {} relations)",
        accession,
        pathway.entries.len(),
        pathway.relations.len()
    );
    Ok(pathway)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::cache::MemoryCache;
    use crate::error::PathwayError;
    use crate::kgml::tests::SAMPLE_KGML;

    struct StubClient {
        kgml: std::result::Result<&'static str, &'static str>,
        calls: Cell<usize>,
    }

    impl StubClient {
        fn ok(kgml: &'static str) -> Self {
            Self {
                kgml: Ok(kgml),
                calls: Cell::new(0),
            }
        }
    }

    impl KeggClient for StubClient {
        fn get_pathway_kgml(&self, accession: &str) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            self.kgml
                .map(|kgml| kgml.to_string())
                .map_err(|message| PathwayError::fetch(accession, message))
        }

        fn get_entry(&self, id: &str) -> Result<String> {
            Err(PathwayError::fetch(id, "not used"))
        }
    }

    #[test]
    fn fetches_and_caches_when_absent() {
        let cache = MemoryCache::new();
        let client = StubClient::ok(SAMPLE_KGML);
        let pathway = load(&cache, &client, "hsa05010").unwrap();
        assert_eq!(pathway.entries.len(), 5);
        assert_eq!(client.calls.get(), 1);
        assert_eq!(cache.read().unwrap(), SAMPLE_KGML);
    }

    #[test]
    fn cached_document_is_reused_without_fetching() {
        let cache = MemoryCache::with_contents(SAMPLE_KGML);
        let client = StubClient::ok("<pathway/>");
        let pathway = load(&cache, &client, "hsa05010").unwrap();
        assert_eq!(pathway.title, "Alzheimer disease");
        assert_eq!(client.calls.get(), 0);
        assert_eq!(cache.write_count(), 0);
    }

    #[test]
    fn stale_or_broken_cache_is_not_refetched() {
        let cache = MemoryCache::with_contents("<pathway><entry");
        let client = StubClient::ok(SAMPLE_KGML);
        let err = load(&cache, &client, "hsa05010").unwrap_err();
        assert!(matches!(err, PathwayError::Parse(_)));
        assert_eq!(client.calls.get(), 0);
    }

    #[test]
    fn fetch_failure_leaves_cache_empty() {
        let cache = MemoryCache::new();
        let client = StubClient {
            kgml: Err("service unavailable"),
            calls: Cell::new(0),
        };
        let err = load(&cache, &client, "hsa05010").unwrap_err();
        assert!(matches!(err, PathwayError::Fetch { .. }));
        assert!(!cache.exists());
    }

    #[test]
    fn works_against_file_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = crate::cache::FileCache::new(dir.path().join("hsa05010.xml"));
        let client = StubClient::ok(SAMPLE_KGML);
        load(&cache, &client, "hsa05010").unwrap();
        load(&cache, &client, "hsa05010").unwrap();
        assert_eq!(client.calls.get(), 1);
    }
}
