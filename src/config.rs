use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::assembler::{DEFAULT_BASE_URL, normalize_base_url};
use crate::error::FinderError;
use crate::fuzzy::DEFAULT_THRESHOLD;

pub const CONFIG_FILE: &str = "meta-finder.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub source: Option<SourceEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SourceEntry {
    Shorthand(String),
    Manifest { manifest: String },
    Url { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    Manifest(Utf8PathBuf),
    Url(String),
}

impl SourceSpec {
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            SourceSpec::Url(trimmed.to_string())
        } else {
            SourceSpec::Manifest(Utf8PathBuf::from(trimmed))
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub threshold: Option<f64>,
    pub source: Option<SourceSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub base_url: String,
    pub threshold: f64,
    pub source: SourceSpec,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>, overrides: Overrides) -> Result<ResolvedConfig, FinderError> {
        let config = match path {
            Some(path) => Self::read(PathBuf::from(path))?,
            None => match Self::default_path() {
                Some(found) => Self::read(found)?,
                None => Config::default(),
            },
        };
        Self::resolve_config(config, overrides)
    }

    pub fn resolve_config(
        config: Config,
        overrides: Overrides,
    ) -> Result<ResolvedConfig, FinderError> {
        let schema_version = config.schema_version.unwrap_or(1);

        let base_url = overrides
            .base_url
            .or(config.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = normalize_base_url(&base_url)?;

        let threshold = overrides
            .threshold
            .or(config.threshold)
            .unwrap_or(DEFAULT_THRESHOLD);
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(FinderError::InvalidThreshold(threshold));
        }

        let source = match (overrides.source, config.source) {
            (Some(spec), _) => spec,
            (None, Some(SourceEntry::Shorthand(value))) => SourceSpec::parse(&value),
            (None, Some(SourceEntry::Manifest { manifest })) => {
                SourceSpec::Manifest(Utf8PathBuf::from(manifest))
            }
            (None, Some(SourceEntry::Url { url })) => SourceSpec::Url(url),
            (None, None) => return Err(FinderError::MissingConfig),
        };

        Ok(ResolvedConfig {
            schema_version,
            base_url,
            threshold,
            source,
        })
    }

    fn read(path: PathBuf) -> Result<Config, FinderError> {
        let content =
            fs::read_to_string(&path).map_err(|_| FinderError::ConfigRead(path.clone()))?;
        serde_json::from_str(&content).map_err(|err| FinderError::ConfigParse(err.to_string()))
    }

    fn default_path() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }
        ProjectDirs::from("", "", "meta-finder")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
            .filter(|path| path.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let config = Config {
            source: Some(SourceEntry::Shorthand("catalog.json".to_string())),
            ..Config::default()
        };

        let resolved = ConfigLoader::resolve_config(config, Overrides::default()).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(resolved.base_url, DEFAULT_BASE_URL);
        assert_eq!(resolved.threshold, DEFAULT_THRESHOLD);
        assert_eq!(
            resolved.source,
            SourceSpec::Manifest(Utf8PathBuf::from("catalog.json"))
        );
    }
}
