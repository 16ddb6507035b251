//! Default document source used when no local snapshot exists

use std::fmt;
use std::path::PathBuf;
use tracing::debug;

use crate::config::profile::ConfigDocument;
use crate::error::LoadError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackSource {
    File(PathBuf),
    Http(String),
    None,
}

impl FallbackSource {
    /// `http(s)://` URLs are fetched, anything else is a file path; blank means none
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            FallbackSource::None
        } else if value.starts_with("http://") || value.starts_with("https://") {
            FallbackSource::Http(value.to_string())
        } else {
            FallbackSource::File(PathBuf::from(value))
        }
    }

    /// Fetch and parse the document on a blocking worker
    pub async fn fetch(&self) -> Result<ConfigDocument, LoadError> {
        let source = self.clone();
        let source_name = self.to_string();
        if source == FallbackSource::None {
            return Err(LoadError::NoSource);
        }

        debug!(source = %source_name, "Fetching fallback document");
        let text = tokio::task::spawn_blocking(move || source.read_text())
            .await
            .map_err(|err| LoadError::FallbackUnavailable {
                source_name: source_name.clone(),
                reason: err.to_string(),
            })?
            .map_err(|reason| LoadError::FallbackUnavailable {
                source_name: source_name.clone(),
                reason,
            })?;

        ConfigDocument::from_json(&text)
            .map_err(|error| LoadError::FallbackInvalid { source_name, error })
    }

    fn read_text(&self) -> Result<String, String> {
        match self {
            FallbackSource::File(path) => std::fs::read_to_string(path).map_err(|err| err.to_string()),
            FallbackSource::Http(url) => ureq::get(url)
                .header("Cache-Control", "no-store")
                .call()
                .and_then(|mut response| response.body_mut().read_to_string())
                .map_err(|err| err.to_string()),
            FallbackSource::None => Err("no fallback document configured".to_string()),
        }
    }
}

impl fmt::Display for FallbackSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackSource::File(path) => write!(f, "{}", path.display()),
            FallbackSource::Http(url) => f.write_str(url),
            FallbackSource::None => f.write_str("<none>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source_kinds() {
        assert_eq!(FallbackSource::parse("  "), FallbackSource::None);
        assert_eq!(
            FallbackSource::parse("https://pad.lan/profiles.json"),
            FallbackSource::Http("https://pad.lan/profiles.json".to_string())
        );
        assert_eq!(
            FallbackSource::parse("/etc/nexus-pad/profiles.json"),
            FallbackSource::File(PathBuf::from("/etc/nexus-pad/profiles.json"))
        );
    }

    #[tokio::test]
    async fn test_fetch_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        std::fs::write(&path, r#"{"profiles":[{"id":"main","label":"Main"}]}"#).unwrap();

        let doc = FallbackSource::File(path).fetch().await.unwrap();
        assert_eq!(doc.profiles[0].id, "main");
    }

    #[tokio::test]
    async fn test_fetch_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = FallbackSource::File(dir.path().join("missing.json"));
        assert!(matches!(
            missing.fetch().await,
            Err(LoadError::FallbackUnavailable { .. })
        ));

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            FallbackSource::File(path).fetch().await,
            Err(LoadError::FallbackInvalid { .. })
        ));

        assert!(matches!(FallbackSource::None.fetch().await, Err(LoadError::NoSource)));
    }
}
