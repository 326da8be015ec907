use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use flate2::read::GzDecoder;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};

use crate::domain::{BucketName, ObjectRef};
use crate::error::FinderError;

pub type Pairs = BTreeMap<String, String>;

pub type ObjectIter<'a> = Box<dyn Iterator<Item = Result<ObjectRef, FinderError>> + 'a>;

pub trait ObjectSource: Send + Sync {
    fn buckets(&self) -> Result<Vec<BucketName>, FinderError>;
    fn objects<'a>(&'a self, bucket: &BucketName) -> ObjectIter<'a>;
    fn metadata(&self, object: &ObjectRef) -> Result<Pairs, FinderError>;
    fn tags(&self, object: &ObjectRef) -> Result<Pairs, FinderError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub buckets: Vec<BucketEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketEntry {
    pub name: BucketName,
    #[serde(default)]
    pub objects: Vec<ObjectEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub key: String,
    #[serde(default)]
    pub metadata: Pairs,
    #[serde(default)]
    pub tags: Pairs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl Manifest {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, FinderError> {
        let manifest: Self = serde_json::from_reader(reader)
            .map_err(|err| FinderError::ManifestParse(err.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<(), FinderError> {
        let mut buckets = HashSet::new();
        for bucket in &self.buckets {
            if !buckets.insert(&bucket.name) {
                return Err(FinderError::ManifestParse(format!(
                    "duplicate bucket {}",
                    bucket.name
                )));
            }
            let mut keys = HashSet::new();
            for object in &bucket.objects {
                if !keys.insert(object.key.as_str()) {
                    return Err(FinderError::ManifestParse(format!(
                        "duplicate object {}/{}",
                        bucket.name, object.key
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn from_path(path: &Utf8Path) -> Result<Self, FinderError> {
        let file = File::open(path.as_std_path())
            .map_err(|err| FinderError::Filesystem(format!("open manifest {path}: {err}")))?;
        if path.extension() == Some("gz") {
            Self::from_reader(BufReader::new(GzDecoder::new(file)))
        } else {
            Self::from_reader(BufReader::new(file))
        }
    }

    pub fn write_atomic(&self, path: &Utf8Path) -> Result<(), FinderError> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent.to_path_buf(),
            _ => Utf8PathBuf::from("."),
        };
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| FinderError::Filesystem(err.to_string()))?;
        let content = serde_json::to_vec_pretty(self)
            .map_err(|err| FinderError::Filesystem(err.to_string()))?;
        let mut temp = tempfile::Builder::new()
            .prefix("meta-finder-manifest")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| FinderError::Filesystem(err.to_string()))?;
        temp.write_all(&content)
            .map_err(|err| FinderError::Filesystem(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| FinderError::Filesystem(err.to_string()))?;
        Ok(())
    }

    pub fn object(&self, object: &ObjectRef) -> Option<&ObjectEntry> {
        self.buckets
            .iter()
            .find(|bucket| bucket.name == object.bucket)
            .and_then(|bucket| bucket.objects.iter().find(|entry| entry.key == object.key))
    }

    pub fn object_count(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.objects.len()).sum()
    }

    pub fn sample() -> Self {
        let bucket = |name: &str, key: &str, metadata: &[(&str, &str)], tags: &[(&str, &str)]| {
            BucketEntry {
                name: BucketName::new_unchecked(name),
                objects: vec![ObjectEntry {
                    key: key.to_string(),
                    metadata: to_pairs(metadata),
                    tags: to_pairs(tags),
                    content_type: Some("text/plain".to_string()),
                }],
            }
        };
        Manifest {
            buckets: vec![
                bucket(
                    "test",
                    "sample_test.txt",
                    &[
                        ("insertedBy", "me"),
                        ("content", "text"),
                        ("source", "the world"),
                    ],
                    &[("raw", "txt")],
                ),
                bucket(
                    "foo",
                    "sample_foo.txt",
                    &[
                        ("insertedBy", "anotherMe"),
                        ("content", "text"),
                        ("source", "a tiny research"),
                    ],
                    &[("raw", "txt")],
                ),
                bucket(
                    "bar",
                    "sample_bar.txt",
                    &[
                        ("insertedBy", "Marvin"),
                        ("content", "text"),
                        ("source", "black hole"),
                    ],
                    &[("raw", "plain text")],
                ),
            ],
        }
    }
}

fn to_pairs(values: &[(&str, &str)]) -> Pairs {
    values
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

#[derive(Clone)]
pub struct HttpManifestClient {
    client: Client,
    url: String,
}

impl HttpManifestClient {
    pub fn new(url: &str) -> Result<Self, FinderError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("meta-finder/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| FinderError::ManifestHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| FinderError::ManifestHttp(err.to_string()))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn fetch(&self) -> Result<Manifest, FinderError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|err| FinderError::ManifestHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "manifest request failed".to_string());
            return Err(FinderError::ManifestStatus { status, message });
        }
        let bytes = response
            .bytes()
            .map_err(|err| FinderError::ManifestHttp(err.to_string()))?;
        if self.url.ends_with(".gz") {
            Manifest::from_reader(GzDecoder::new(bytes.as_ref()))
        } else {
            Manifest::from_reader(bytes.as_ref())
        }
    }
}

#[derive(Clone)]
enum Origin {
    Inline,
    File(Utf8PathBuf),
    Http(HttpManifestClient),
}

pub struct ManifestSource {
    origin: Origin,
    current: Mutex<Arc<Manifest>>,
}

impl ManifestSource {
    pub fn from_manifest(manifest: Manifest) -> Self {
        Self {
            origin: Origin::Inline,
            current: Mutex::new(Arc::new(manifest)),
        }
    }

    pub fn from_path(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            origin: Origin::File(path.into()),
            current: Mutex::new(Arc::new(Manifest::default())),
        }
    }

    pub fn from_url(url: &str) -> Result<Self, FinderError> {
        Ok(Self {
            origin: Origin::Http(HttpManifestClient::new(url)?),
            current: Mutex::new(Arc::new(Manifest::default())),
        })
    }

    pub fn describe(&self) -> String {
        match &self.origin {
            Origin::Inline => "inline manifest".to_string(),
            Origin::File(path) => format!("manifest {path}"),
            Origin::Http(client) => format!("manifest {}", client.url()),
        }
    }

    fn refresh(&self) -> Result<Arc<Manifest>, FinderError> {
        let loaded = match &self.origin {
            Origin::Inline => return Ok(self.snapshot()),
            Origin::File(path) => Manifest::from_path(path)?,
            Origin::Http(client) => client.fetch()?,
        };
        let loaded = Arc::new(loaded);
        let mut current = match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *current = loaded.clone();
        Ok(loaded)
    }

    fn snapshot(&self) -> Arc<Manifest> {
        match self.current.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn entry(&self, object: &ObjectRef) -> Result<ObjectEntry, FinderError> {
        self.snapshot().object(object).cloned().ok_or_else(|| {
            FinderError::storage(object.bucket.as_str(), &object.key, "object not found")
        })
    }
}

impl ObjectSource for ManifestSource {
    fn buckets(&self) -> Result<Vec<BucketName>, FinderError> {
        let manifest = self.refresh()?;
        Ok(manifest
            .buckets
            .iter()
            .map(|bucket| bucket.name.clone())
            .collect())
    }

    fn objects<'a>(&'a self, bucket: &BucketName) -> ObjectIter<'a> {
        let manifest = self.snapshot();
        let refs = manifest
            .buckets
            .iter()
            .filter(|entry| &entry.name == bucket)
            .flat_map(|entry| entry.objects.iter())
            .map(|object| Ok::<_, FinderError>(ObjectRef::new(bucket.clone(), object.key.clone())))
            .collect::<Vec<_>>();
        Box::new(refs.into_iter())
    }

    fn metadata(&self, object: &ObjectRef) -> Result<Pairs, FinderError> {
        Ok(self.entry(object)?.metadata)
    }

    fn tags(&self, object: &ObjectRef) -> Result<Pairs, FinderError> {
        Ok(self.entry(object)?.tags)
    }
}
