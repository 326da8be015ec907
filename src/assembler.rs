use serde::{Deserialize, Serialize};

use crate::catalog::CatalogStore;
use crate::domain::FilePath;
use crate::error::FinderError;
use crate::resolver::Resolution;

pub const DEFAULT_BASE_URL: &str = "http://localhost:9000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultItem {
    pub filename: String,
    pub metadata: String,
    pub tags: String,
    pub url: String,
    #[serde(rename = "match")]
    pub matches: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<ResultItem>,
}

impl SearchResponse {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn find(&self, filename: &str) -> Option<&ResultItem> {
        self.results.iter().find(|item| item.filename == filename)
    }
}

pub fn normalize_base_url(raw: &str) -> Result<String, FinderError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let has_host = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .is_some_and(|host| !host.is_empty());
    if !has_host {
        return Err(FinderError::InvalidBaseUrl(raw.to_string()));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultAssembler {
    base_url: String,
}

impl ResultAssembler {
    pub fn new(base_url: &str) -> Result<Self, FinderError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, file: &FilePath) -> String {
        format!("{}/{}", self.base_url, file)
    }

    pub fn assemble(&self, store: &CatalogStore, resolved: Vec<Resolution>) -> SearchResponse {
        let results = resolved
            .into_iter()
            .map(|resolution| {
                let record = store.record(&resolution.file);
                ResultItem {
                    filename: resolution.file.to_string(),
                    metadata: record.metadata_summary(),
                    tags: record.tags_summary(),
                    url: self.url_for(&resolution.file),
                    matches: resolution
                        .reasons
                        .into_iter()
                        .map(|key| key.as_str().to_string())
                        .collect(),
                }
            })
            .collect();
        SearchResponse { results }
    }
}

impl Default for ResultAssembler {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::domain::CatalogKind;

    #[test]
    fn url_does_not_double_slash() {
        let assembler = ResultAssembler::new("http://localhost:9000/").unwrap();
        let file: FilePath = "test/sample_test.txt".parse().unwrap();
        assert_eq!(
            assembler.url_for(&file),
            "http://localhost:9000/test/sample_test.txt"
        );
    }

    #[test]
    fn rejects_non_http_base() {
        assert_matches!(
            ResultAssembler::new("ftp://host"),
            Err(FinderError::InvalidBaseUrl(_))
        );
        assert_matches!(
            ResultAssembler::new("http://"),
            Err(FinderError::InvalidBaseUrl(_))
        );
    }

    #[test]
    fn serializes_match_field() {
        let mut store = CatalogStore::new();
        let file: FilePath = "test/sample_test.txt".parse().unwrap();
        store.insert(CatalogKind::Tag, "raw=txt".parse().unwrap(), file.clone());

        let response = ResultAssembler::default().assemble(
            &store,
            vec![Resolution {
                file,
                reasons: vec!["raw=txt".parse().unwrap()],
            }],
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["results"][0]["filename"], "test/sample_test.txt");
        assert_eq!(json["results"][0]["tags"], "raw=txt;");
        assert_eq!(json["results"][0]["metadata"], "");
        assert_eq!(json["results"][0]["match"][0], "raw=txt");
        assert_eq!(
            json["results"][0]["url"],
            "http://localhost:9000/test/sample_test.txt"
        );
    }
}
