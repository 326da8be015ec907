use assert_matches::assert_matches;

use meta_finder::domain::{BucketName, CatalogKey, CatalogKind, FilePath, ObjectRef};
use meta_finder::error::FinderError;

#[test]
fn bucket_names_follow_s3_rules() {
    for good in ["test", "foo", "my-bucket.2024", "a1b"] {
        assert!(good.parse::<BucketName>().is_ok(), "{good} should parse");
    }
    for bad in ["", "-lead", "trail-", "UPPER", "under_score", "a..b"] {
        assert_matches!(
            bad.parse::<BucketName>(),
            Err(FinderError::InvalidBucketName(_)),
            "{bad} should be rejected"
        );
    }
    let too_long = "a".repeat(64);
    assert_matches!(
        too_long.parse::<BucketName>(),
        Err(FinderError::InvalidBucketName(_))
    );
}

#[test]
fn bucket_name_deserialization_validates() {
    let bucket: BucketName = serde_json::from_str(r#""reports""#).unwrap();
    assert_eq!(bucket.to_string(), "reports");
    assert!(serde_json::from_str::<BucketName>(r#""Bad_Name""#).is_err());
}

#[test]
fn object_ref_maps_to_file_path() {
    let object = ObjectRef::new("test".parse().unwrap(), "nested/dir/report.pdf");
    let path = object.file_path();
    assert_eq!(path.as_str(), "test/nested/dir/report.pdf");
    assert_eq!(path.bucket(), "test");
}

#[test]
fn file_path_parsing() {
    let path: FilePath = "bar/sample_bar.txt".parse().unwrap();
    assert_eq!(path, FilePath::join("bar", "sample_bar.txt"));
    assert_matches!(
        "no-separator".parse::<FilePath>(),
        Err(FinderError::InvalidFilePath(_))
    );
    assert_matches!("bucket/".parse::<FilePath>(), Err(FinderError::InvalidFilePath(_)));
    assert_matches!("/key".parse::<FilePath>(), Err(FinderError::InvalidFilePath(_)));
}

#[test]
fn catalog_keys_with_extra_separators() {
    let key = CatalogKey::new("query", "a=b");
    assert_eq!(key.as_str(), "query=a=b");
    assert_eq!(key.components().collect::<Vec<_>>(), vec!["query", "a", "b"]);
    assert!(key.contains("y=a"));
}

#[test]
fn catalog_kind_display() {
    assert_eq!(CatalogKind::Metadata.to_string(), "metadata");
    assert_eq!(CatalogKind::Tag.to_string(), "tag");
    assert_eq!(CatalogKind::ALL.len(), 2);
}
