use meta_finder::catalog::CatalogStore;
use meta_finder::domain::{CatalogKey, CatalogKind, FilePath};

fn file(raw: &str) -> FilePath {
    raw.parse().unwrap()
}

fn key(raw: &str) -> CatalogKey {
    raw.parse().unwrap()
}

#[test]
fn catalogs_are_independent() {
    let mut store = CatalogStore::new();
    store.insert(CatalogKind::Metadata, key("raw=txt"), file("test/a.txt"));
    store.insert(CatalogKind::Tag, key("raw=txt"), file("foo/b.txt"));

    assert_eq!(
        store.files_for(CatalogKind::Metadata, &key("raw=txt")),
        &[file("test/a.txt")]
    );
    assert_eq!(
        store.files_for(CatalogKind::Tag, &key("raw=txt")),
        &[file("foo/b.txt")]
    );
    assert!(
        store
            .files_for(CatalogKind::Tag, &key("missing=1"))
            .is_empty()
    );
}

#[test]
fn files_keep_ingestion_order() {
    let mut store = CatalogStore::new();
    for path in ["c/3", "a/1", "b/2"] {
        store.insert(CatalogKind::Metadata, key("content=text"), file(path));
    }
    assert_eq!(
        store.files_for(CatalogKind::Metadata, &key("content=text")),
        &[file("c/3"), file("a/1"), file("b/2")]
    );
}

#[test]
fn every_indexed_file_has_a_record() {
    let mut store = CatalogStore::new();
    store.insert(CatalogKind::Metadata, key("a=1"), file("test/one"));
    store.insert(CatalogKind::Tag, key("t=x"), file("test/two"));

    for indexed in store.files() {
        assert!(!store.record(indexed).is_empty());
    }
    assert_eq!(store.files().len(), 2);
    assert_eq!(store.stats().files, 2);
}

#[test]
fn files_lists_metadata_catalog_first() {
    let mut store = CatalogStore::new();
    store.insert(CatalogKind::Tag, key("t=x"), file("tags/only"));
    store.insert(CatalogKind::Metadata, key("m=y"), file("meta/only"));
    store.insert(CatalogKind::Tag, key("t=x"), file("meta/only"));

    let files: Vec<_> = store.files().into_iter().map(FilePath::as_str).collect();
    assert_eq!(files, vec!["meta/only", "tags/only"]);
}

#[test]
fn split_keys_yield_key_and_value() {
    let keys = [key("insertedBy=me"), key("raw=plain text")];
    let split = CatalogStore::split_keys(keys.iter());
    assert_eq!(split, vec!["insertedBy", "me", "raw", "plain text"]);
}

#[test]
fn stats_count_entries_with_duplicates() {
    let mut store = CatalogStore::new();
    store.insert(CatalogKind::Tag, key("raw=txt"), file("test/a"));
    store.insert(CatalogKind::Tag, key("raw=txt"), file("test/a"));
    store.insert(CatalogKind::Metadata, key("content=text"), file("test/a"));

    let stats = store.stats();
    assert_eq!(stats.files, 1);
    assert_eq!(stats.tag_keys, 1);
    assert_eq!(stats.tag_entries, 2);
    assert_eq!(stats.metadata_entries, 1);
    assert_eq!(store.record(&file("test/a")).tags_summary(), "raw=txt;raw=txt;");
}
