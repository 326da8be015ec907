use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::FinderError;

static BUCKET_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9.\-]{1,61}[a-z0-9]$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Metadata,
    Tag,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 2] = [CatalogKind::Metadata, CatalogKind::Tag];
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogKind::Metadata => write!(f, "metadata"),
            CatalogKind::Tag => write!(f, "tag"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BucketName(String);

impl BucketName {
    pub(crate) fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BucketName {
    type Err = FinderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if !BUCKET_NAME.is_match(trimmed) || trimmed.contains("..") {
            return Err(FinderError::InvalidBucketName(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl TryFrom<String> for BucketName {
    type Error = FinderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BucketName> for String {
    fn from(value: BucketName) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilePath(String);

impl FilePath {
    pub fn join(bucket: &str, object_key: &str) -> Self {
        let bucket = bucket.trim_end_matches('/');
        let key = object_key.trim_start_matches('/');
        let joined = format!("{bucket}/{key}");
        let mut out = String::with_capacity(joined.len());
        let mut last_slash = false;
        for ch in joined.chars() {
            if ch == '/' {
                if last_slash {
                    continue;
                }
                last_slash = true;
            } else {
                last_slash = false;
            }
            out.push(ch);
        }
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn bucket(&self) -> &str {
        self.0.split_once('/').map(|(bucket, _)| bucket).unwrap_or(&self.0)
    }
}

impl fmt::Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FilePath {
    type Err = FinderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        match trimmed.split_once('/') {
            Some((bucket, key)) if !bucket.is_empty() && !key.trim_matches('/').is_empty() => {
                Ok(Self::join(bucket, key))
            }
            _ => Err(FinderError::InvalidFilePath(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogKey(String);

impl CatalogKey {
    pub fn new(key: &str, value: &str) -> Self {
        Self(format!("{key}={value}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('=').filter(|part| !part.is_empty())
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.0.contains(needle)
    }
}

impl fmt::Display for CatalogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CatalogKey {
    type Err = FinderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.split_once('=') {
            Some((key, _)) if !key.is_empty() => Ok(Self(value.to_string())),
            _ => Err(FinderError::InvalidCatalogKey(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub bucket: BucketName,
    pub key: String,
}

impl ObjectRef {
    pub fn new(bucket: BucketName, key: impl Into<String>) -> Self {
        Self {
            bucket,
            key: key.into(),
        }
    }

    pub fn file_path(&self) -> FilePath {
        FilePath::join(self.bucket.as_str(), &self.key)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn bucket_name_rules() {
        let bucket: BucketName = "test".parse().unwrap();
        assert_eq!(bucket.as_str(), "test");
        assert_matches!(
            "Upper".parse::<BucketName>(),
            Err(FinderError::InvalidBucketName(_))
        );
        assert_matches!(
            "ab".parse::<BucketName>(),
            Err(FinderError::InvalidBucketName(_))
        );
        assert_matches!(
            "a..b".parse::<BucketName>(),
            Err(FinderError::InvalidBucketName(_))
        );
    }

    #[test]
    fn file_path_join_collapses_separators() {
        assert_eq!(FilePath::join("test", "a.txt").as_str(), "test/a.txt");
        assert_eq!(FilePath::join("test/", "/a.txt").as_str(), "test/a.txt");
        assert_eq!(
            FilePath::join("test", "dir//nested/a.txt").as_str(),
            "test/dir/nested/a.txt"
        );
        assert_eq!(FilePath::join("test", "dir/a.txt").bucket(), "test");
    }

    #[test]
    fn catalog_key_components() {
        let key = CatalogKey::new("source", "the world");
        assert_eq!(key.as_str(), "source=the world");
        assert_eq!(key.components().collect::<Vec<_>>(), vec!["source", "the world"]);

        let empty = CatalogKey::new("flag", "");
        assert_eq!(empty.components().collect::<Vec<_>>(), vec!["flag"]);
    }

    #[test]
    fn catalog_key_requires_separator() {
        assert_matches!(
            "novalue".parse::<CatalogKey>(),
            Err(FinderError::InvalidCatalogKey(_))
        );
        assert!("a=b".parse::<CatalogKey>().is_ok());
    }
}
