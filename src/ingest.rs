use std::time::Instant;

use tracing::{debug, info};

use crate::app::{ProgressEvent, ProgressSink};
use crate::catalog::CatalogStore;
use crate::domain::{CatalogKey, CatalogKind, FilePath, ObjectRef};
use crate::error::FinderError;
use crate::source::{ObjectSource, Pairs};

// Any listing or fetch failure aborts the pass; a partial catalog is dropped.
pub fn ingest(
    source: &dyn ObjectSource,
    sink: &dyn ProgressSink,
) -> Result<CatalogStore, FinderError> {
    let started = Instant::now();
    let mut store = CatalogStore::new();

    sink.event(ProgressEvent {
        message: "phase=List; listing buckets".to_string(),
        elapsed: None,
    });
    let buckets = source
        .buckets()
        .map_err(|err| into_storage(err, "*", "*"))?;

    let mut objects = 0usize;
    for bucket in &buckets {
        for object in source.objects(bucket) {
            let object = object.map_err(|err| into_storage(err, bucket.as_str(), "*"))?;
            ingest_object(source, &object, &mut store)?;
            objects += 1;
            sink.event(ProgressEvent {
                message: format!("phase=Index; {}", object.file_path()),
                elapsed: Some(started.elapsed()),
            });
        }
    }

    let stats = store.stats();
    info!(
        buckets = buckets.len(),
        objects,
        metadata_keys = stats.metadata_keys,
        tag_keys = stats.tag_keys,
        "catalog built"
    );
    sink.event(ProgressEvent {
        message: format!(
            "phase=Ready; {objects} objects, {} metadata keys, {} tag keys",
            stats.metadata_keys, stats.tag_keys
        ),
        elapsed: Some(started.elapsed()),
    });
    Ok(store)
}

fn ingest_object(
    source: &dyn ObjectSource,
    object: &ObjectRef,
    store: &mut CatalogStore,
) -> Result<(), FinderError> {
    let bucket = object.bucket.as_str();
    let file = object.file_path();

    let metadata = source
        .metadata(object)
        .map_err(|err| into_storage(err, bucket, &object.key))?;
    insert_pairs(store, CatalogKind::Metadata, &metadata, &file);

    let tags = source
        .tags(object)
        .map_err(|err| into_storage(err, bucket, &object.key))?;
    insert_pairs(store, CatalogKind::Tag, &tags, &file);

    Ok(())
}

pub fn insert_pairs(store: &mut CatalogStore, kind: CatalogKind, pairs: &Pairs, file: &FilePath) {
    for (key, value) in pairs {
        debug!(%file, %kind, key = key.as_str(), value = value.as_str(), "indexing pair");
        store.insert(kind, CatalogKey::new(key, value), file.clone());
    }
}

fn into_storage(err: FinderError, bucket: &str, object: &str) -> FinderError {
    match err {
        FinderError::StorageUnavailable { .. } => err,
        other => FinderError::storage(bucket, object, other.to_string()),
    }
}
