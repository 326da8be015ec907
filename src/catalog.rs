use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::domain::{CatalogKey, CatalogKind, FilePath};

pub type Catalog = BTreeMap<CatalogKey, Vec<FilePath>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRecord {
    pub metadata: Vec<CatalogKey>,
    pub tags: Vec<CatalogKey>,
}

impl FileRecord {
    pub fn keys(&self, kind: CatalogKind) -> &[CatalogKey] {
        match kind {
            CatalogKind::Metadata => &self.metadata,
            CatalogKind::Tag => &self.tags,
        }
    }

    pub fn metadata_summary(&self) -> String {
        summary(&self.metadata)
    }

    pub fn tags_summary(&self) -> String {
        summary(&self.tags)
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty() && self.tags.is_empty()
    }

    fn prepend(&mut self, kind: CatalogKind, key: CatalogKey) {
        let list = match kind {
            CatalogKind::Metadata => &mut self.metadata,
            CatalogKind::Tag => &mut self.tags,
        };
        list.insert(0, key);
    }
}

fn summary(keys: &[CatalogKey]) -> String {
    keys.iter().fold(String::new(), |mut acc, key| {
        acc.push_str(key.as_str());
        acc.push(';');
        acc
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub files: usize,
    pub metadata_keys: usize,
    pub tag_keys: usize,
    pub metadata_entries: usize,
    pub tag_entries: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    metadata: Catalog,
    tags: Catalog,
    files: HashMap<FilePath, FileRecord>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: CatalogKind, key: CatalogKey, file: FilePath) {
        self.catalog_mut(kind)
            .entry(key.clone())
            .or_default()
            .push(file.clone());
        self.files.entry(file).or_default().prepend(kind, key);
    }

    pub fn catalog(&self, kind: CatalogKind) -> &Catalog {
        match kind {
            CatalogKind::Metadata => &self.metadata,
            CatalogKind::Tag => &self.tags,
        }
    }

    fn catalog_mut(&mut self, kind: CatalogKind) -> &mut Catalog {
        match kind {
            CatalogKind::Metadata => &mut self.metadata,
            CatalogKind::Tag => &mut self.tags,
        }
    }

    pub fn keys(&self, kind: CatalogKind) -> Vec<&CatalogKey> {
        self.catalog(kind).keys().collect()
    }

    pub fn split_keys<'a, I>(keys: I) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'a CatalogKey>,
    {
        keys.into_iter().flat_map(CatalogKey::components).collect()
    }

    pub fn files_for(&self, kind: CatalogKind, key: &CatalogKey) -> &[FilePath] {
        self.catalog(kind)
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn record(&self, file: &FilePath) -> FileRecord {
        self.files.get(file).cloned().unwrap_or_default()
    }

    pub fn files(&self) -> Vec<&FilePath> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for kind in CatalogKind::ALL {
            for file in self.catalog(kind).values().flatten() {
                if seen.insert(file) {
                    out.push(file);
                }
            }
        }
        out
    }

    pub fn universe(&self) -> Vec<&str> {
        let whole = self
            .metadata
            .keys()
            .chain(self.tags.keys())
            .map(CatalogKey::as_str);
        let split = Self::split_keys(self.metadata.keys().chain(self.tags.keys()));
        whole
            .chain(split)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            files: self.files.len(),
            metadata_keys: self.metadata.len(),
            tag_keys: self.tags.len(),
            metadata_entries: self.metadata.values().map(Vec::len).sum(),
            tag_entries: self.tags.values().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
