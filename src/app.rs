use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

use crate::assembler::{ResultAssembler, SearchResponse};
use crate::catalog::{CatalogStats, CatalogStore};
use crate::domain::{CatalogKey, CatalogKind};
use crate::error::FinderError;
use crate::fuzzy::{LevenshteinMatcher, Similar};
use crate::ingest::ingest;
use crate::resolver::QueryResolver;
use crate::source::ObjectSource;

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn event(&self, _event: ProgressEvent) {}
}

#[derive(Debug, Default)]
pub struct IndexSnapshot {
    pub store: CatalogStore,
    pub built_at: Option<String>,
}

impl IndexSnapshot {
    pub fn new(store: CatalogStore) -> Self {
        Self {
            store,
            built_at: Some(chrono::Utc::now().to_rfc3339()),
        }
    }
}

// Readers clone the `Arc` and keep using it while a rebuilt snapshot is swapped in.
#[derive(Debug, Default)]
pub struct IndexHandle {
    current: RwLock<Arc<IndexSnapshot>>,
}

impl IndexHandle {
    pub fn new(snapshot: IndexSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn load(&self) -> Arc<IndexSnapshot> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn swap(&self, snapshot: IndexSnapshot) -> Arc<IndexSnapshot> {
        let next = Arc::new(snapshot);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *guard, next)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub files: Vec<String>,
    pub metadata_keys: Vec<String>,
    pub tag_keys: Vec<String>,
    pub stats: CatalogStats,
    pub built_at: Option<String>,
}

impl Overview {
    fn from_snapshot(snapshot: &IndexSnapshot) -> Self {
        let keys = |kind: CatalogKind| -> Vec<String> {
            snapshot
                .store
                .keys(kind)
                .into_iter()
                .map(CatalogKey::to_string)
                .collect()
        };
        Self {
            files: snapshot
                .store
                .files()
                .into_iter()
                .map(ToString::to_string)
                .collect(),
            metadata_keys: keys(CatalogKind::Metadata),
            tag_keys: keys(CatalogKind::Tag),
            stats: snapshot.store.stats(),
            built_at: snapshot.built_at.clone(),
        }
    }
}

pub struct App<S: ObjectSource, M: Similar = LevenshteinMatcher> {
    source: S,
    matcher: M,
    assembler: ResultAssembler,
    index: IndexHandle,
}

impl<S: ObjectSource, M: Similar> App<S, M> {
    pub fn new(source: S, matcher: M, assembler: ResultAssembler) -> Self {
        Self {
            source,
            matcher,
            assembler,
            index: IndexHandle::default(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn index(&self, sink: &dyn ProgressSink) -> Result<Overview, FinderError> {
        let store = ingest(&self.source, sink)?;
        let snapshot = IndexSnapshot::new(store);
        let overview = Overview::from_snapshot(&snapshot);
        self.index.swap(snapshot);
        Ok(overview)
    }

    pub fn overview(&self) -> Overview {
        Overview::from_snapshot(&self.index.load())
    }

    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.index.load()
    }

    pub fn search(&self, query: &str, sink: &dyn ProgressSink) -> SearchResponse {
        let started = Instant::now();
        let snapshot = self.index.load();
        let resolved = QueryResolver::new(&snapshot.store, &self.matcher).resolve(query);
        let response = self.assembler.assemble(&snapshot.store, resolved);

        info!(query, results = response.results.len(), "search");
        sink.event(ProgressEvent {
            message: format!("phase=Search; {} results for '{query}'", response.results.len()),
            elapsed: Some(started.elapsed()),
        });
        response
    }
}
