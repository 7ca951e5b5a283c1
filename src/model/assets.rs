//! Model asset locations and the label vocabulary format.

use crate::error::{Result, SignError};
use std::fmt;
use std::path::PathBuf;

/// Where a model asset lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetLocation {
    /// A file on the local filesystem.
    Local(PathBuf),
    /// An http(s) URL.
    Remote(String),
}

impl AssetLocation {
    /// Classify a configured location string.
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            AssetLocation::Remote(location.to_string())
        } else {
            AssetLocation::Local(PathBuf::from(location))
        }
    }

    /// Fetch the asset's raw bytes.
    pub async fn fetch(&self) -> Result<Vec<u8>> {
        match self {
            AssetLocation::Local(path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|e| SignError::AssetFetch {
                        location: self.to_string(),
                        message: e.to_string(),
                    })
            }
            AssetLocation::Remote(url) => fetch_remote(url).await,
        }
    }
}

impl fmt::Display for AssetLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetLocation::Local(path) => write!(f, "{}", path.display()),
            AssetLocation::Remote(url) => write!(f, "{}", url),
        }
    }
}

#[cfg(feature = "remote-assets")]
async fn fetch_remote(url: &str) -> Result<Vec<u8>> {
    let fetch_error = |message: String| SignError::AssetFetch {
        location: url.to_string(),
        message,
    };

    let response = reqwest::get(url)
        .await
        .map_err(|e| fetch_error(format!("request failed: {e}")))?;

    if !response.status().is_success() {
        return Err(fetch_error(format!("status {}", response.status())));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| fetch_error(format!("failed to read body: {e}")))?;
    Ok(bytes.to_vec())
}

#[cfg(not(feature = "remote-assets"))]
async fn fetch_remote(url: &str) -> Result<Vec<u8>> {
    Err(SignError::AssetFetch {
        location: url.to_string(),
        message: "remote assets require the `remote-assets` feature".to_string(),
    })
}

/// Parse a label vocabulary.
///
/// Accepts a JSON array of strings, or plain text with one label per line
/// where blank lines and `#` comments are skipped.
pub fn parse_labels(location: &str, bytes: &[u8]) -> Result<Vec<String>> {
    let parse_error = |message: String| SignError::AssetParse {
        location: location.to_string(),
        message,
    };

    let text = std::str::from_utf8(bytes).map_err(|e| parse_error(e.to_string()))?;
    let trimmed = text.trim_start_matches('\u{feff}').trim();

    let labels: Vec<String> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed).map_err(|e| parse_error(e.to_string()))?
    } else {
        trimmed
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect()
    };

    if labels.is_empty() {
        return Err(parse_error("label vocabulary is empty".to_string()));
    }

    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_location() {
        assert_eq!(
            AssetLocation::parse("https://cdn.example.com/labels.json"),
            AssetLocation::Remote("https://cdn.example.com/labels.json".to_string())
        );
        assert_eq!(
            AssetLocation::parse("models/labels.txt"),
            AssetLocation::Local(PathBuf::from("models/labels.txt"))
        );
        assert_eq!(
            AssetLocation::parse("models/labels.txt").to_string(),
            "models/labels.txt"
        );
    }

    #[test]
    fn test_parse_labels_plain_text() {
        let labels = parse_labels("labels.txt", b"# ASL glosses\nHELLO\n\n  THANK-YOU \nPLEASE\n")
            .unwrap();
        assert_eq!(labels, vec!["HELLO", "THANK-YOU", "PLEASE"]);
    }

    #[test]
    fn test_parse_labels_json_array() {
        let labels = parse_labels("labels.json", br#"["HELLO", "GOODBYE"]"#).unwrap();
        assert_eq!(labels, vec!["HELLO", "GOODBYE"]);
    }

    #[test]
    fn test_parse_labels_rejects_empty() {
        match parse_labels("labels.txt", b"\n# nothing\n") {
            Err(SignError::AssetParse { location, message }) => {
                assert_eq!(location, "labels.txt");
                assert!(message.contains("empty"));
            }
            other => panic!("Expected AssetParse, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_labels_rejects_bad_json() {
        assert!(parse_labels("labels.json", b"[\"HELLO\", 3]").is_err());
    }

    #[tokio::test]
    async fn test_fetch_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"HELLO\n").unwrap();

        let location = AssetLocation::parse(&file.path().to_string_lossy());
        assert_eq!(location.fetch().await.unwrap(), b"HELLO\n");
    }

    #[tokio::test]
    async fn test_fetch_missing_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let location = AssetLocation::Local(dir.path().join("missing.json"));
        match location.fetch().await {
            Err(SignError::AssetFetch { location, .. }) => {
                assert!(location.ends_with("missing.json"));
            }
            other => panic!("Expected AssetFetch, got {:?}", other),
        }
    }
}
