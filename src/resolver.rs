use std::collections::BTreeMap;

use tracing::debug;

use crate::catalog::CatalogStore;
use crate::domain::{CatalogKey, CatalogKind, FilePath};
use crate::fuzzy::Similar;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub file: FilePath,
    pub reasons: Vec<CatalogKey>,
}

pub struct QueryResolver<'a, M: Similar + ?Sized> {
    store: &'a CatalogStore,
    matcher: &'a M,
}

impl<'a, M: Similar + ?Sized> QueryResolver<'a, M> {
    pub fn new(store: &'a CatalogStore, matcher: &'a M) -> Self {
        Self { store, matcher }
    }

    pub fn resolve(&self, raw_query: &str) -> Vec<Resolution> {
        let tokens = tokenize(raw_query);
        if tokens.is_empty() {
            return Vec::new();
        }

        let universe = self.store.universe();
        let mut hits: BTreeMap<&FilePath, Vec<CatalogKey>> = BTreeMap::new();

        for token in tokens {
            let matched = self.matcher.similars(token, &universe);
            debug!(token, matched = ?matched, "token matches");
            for needle in matched {
                self.collect_hits(needle, &mut hits);
            }
        }

        hits.into_iter()
            .map(|(file, reasons)| Resolution {
                file: file.clone(),
                reasons,
            })
            .collect()
    }

    // A matched string may be a split component of either catalog, so both are
    // scanned: metadata first, then tags.
    fn collect_hits(&self, needle: &str, hits: &mut BTreeMap<&'a FilePath, Vec<CatalogKey>>) {
        for kind in CatalogKind::ALL {
            for (key, files) in self.store.catalog(kind) {
                if !key.contains(needle) {
                    continue;
                }
                for file in files {
                    hits.entry(file).or_default().push(key.clone());
                }
            }
        }
    }
}

pub fn tokenize(raw_query: &str) -> Vec<&str> {
    raw_query.split_whitespace().collect()
}
