//! Plain-text loader.

use async_trait::async_trait;
use stache_core::{DocumentLoader, LoadError};
use std::path::Path;
use tokio::fs;

/// Loader for text-based formats, read as UTF-8.
pub struct TextLoader;

impl TextLoader {
    /// Create a new text loader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentLoader for TextLoader {
    fn name(&self) -> &str {
        "text"
    }

    fn extensions(&self) -> &[&str] {
        &[
            "txt", "md", "markdown", "rst", "csv", "json", "toml", "yaml", "yml", "html", "xml",
            "log",
        ]
    }

    async fn load(&self, path: &Path) -> Result<String, LoadError> {
        let bytes = fs::read(path).await?;
        String::from_utf8(bytes)
            .map_err(|e| LoadError::Parse(format!("{} is not valid UTF-8: {e}", path.display())))
    }
}

/// Split text into trimmed, non-empty paragraphs separated by blank lines.
#[must_use]
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
            continue;
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line.trim_end());
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_can_load_by_extension() {
        let loader = TextLoader::new();
        assert!(loader.can_load(Path::new("/test/file.txt")));
        assert!(loader.can_load(Path::new("/test/FILE.YML")));
        assert!(!loader.can_load(Path::new("/test/image.png")));
        assert!(!loader.can_load(Path::new("/test/noext")));
    }

    #[tokio::test]
    async fn test_load_reads_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, "Hello, world!").unwrap();

        let content = TextLoader::new().load(&path).await.unwrap();
        assert_eq!(content, "Hello, world!");
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = TextLoader::new()
            .load(&dir.path().join("missing.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }

    #[tokio::test]
    async fn test_load_rejects_invalid_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("binary.txt");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        let err = TextLoader::new().load(&path).await.unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
    }

    #[test]
    fn test_split_paragraphs() {
        let text = "First line\nsame paragraph\n\n\n  \nSecond one  \n\nThird";
        assert_eq!(
            split_paragraphs(text),
            vec!["First line\nsame paragraph", "Second one", "Third"]
        );
        assert!(split_paragraphs("\n\n  \n").is_empty());
    }
}
