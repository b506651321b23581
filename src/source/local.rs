//! Local file source implementation.

use super::{Document, DocumentRef, DocumentSource};
use crate::analysis::AnalysisKind;
use crate::error::{RecapError, Result};
use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

/// Reads transcriptions from a file or from every matching file in a directory.
pub struct LocalSource {
    suffix: String,
}

impl LocalSource {
    /// Directory listings keep files whose name ends with `suffix`.
    pub fn new(suffix: &str) -> Self {
        Self {
            suffix: suffix.to_string(),
        }
    }

    /// Document id for a file: its name without the suffix, or its stem.
    fn document_id(&self, path: &Path) -> String {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");

        if let Some(id) = name.strip_suffix(&self.suffix).filter(|id| !id.is_empty()) {
            return id.to_string();
        }

        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string()
    }

    /// Files written by the result sink are never picked up again.
    fn is_analysis_output(name: &str) -> bool {
        name.ends_with("_analysis.json")
            || AnalysisKind::ALL
                .iter()
                .any(|kind| name.ends_with(&format!("_{}.txt", kind.key())))
    }

    fn to_ref(&self, path: &Path) -> DocumentRef {
        DocumentRef {
            id: self.document_id(path),
            location: path.display().to_string(),
        }
    }
}

impl Default for LocalSource {
    fn default() -> Self {
        Self::new("_formatted.txt")
    }
}

#[async_trait]
impl DocumentSource for LocalSource {
    async fn list(&self, input: &str) -> Result<Vec<DocumentRef>> {
        let path = Path::new(input);

        if !path.exists() {
            return Err(RecapError::Source(format!("Path not found: {}", input)));
        }

        if path.is_file() {
            return Ok(vec![self.to_ref(path)]);
        }

        let mut entries = tokio::fs::read_dir(path).await?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let entry_path = entry.path();
            if !entry_path.is_file() {
                continue;
            }
            let Some(name) = entry_path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.ends_with(&self.suffix) && !Self::is_analysis_output(name) {
                paths.push(entry_path);
            }
        }
        paths.sort();

        debug!("Found {} documents in {}", paths.len(), input);
        Ok(paths.iter().map(|p| self.to_ref(p)).collect())
    }

    async fn read(&self, document: &DocumentRef) -> Result<Document> {
        let content = tokio::fs::read_to_string(&document.location)
            .await
            .map_err(|e| {
                RecapError::Source(format!("Failed to read {}: {}", document.location, e))
            })?;
        Ok(Document::new(document.id.clone(), content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_strips_suffix() {
        let source = LocalSource::new("_formatted.txt");
        assert_eq!(source.document_id(Path::new("/t/meeting_formatted.txt")), "meeting");
        assert_eq!(source.document_id(Path::new("/t/notes.txt")), "notes");
        assert_eq!(source.document_id(Path::new("/t/_formatted.txt")), "_formatted");
    }

    #[tokio::test]
    async fn test_lists_matching_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "b_formatted.txt",
            "a_formatted.txt",
            "raw.txt",
            "a_summary.txt",
            "a_key_points.txt",
        ] {
            std::fs::write(dir.path().join(name), "text").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested_formatted.txt")).unwrap();

        let source = LocalSource::default();
        let refs = source.list(dir.path().to_str().unwrap()).await.unwrap();
        let ids: Vec<_> = refs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_plain_suffix_skips_analysis_outputs() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["talk.txt", "talk_summary.txt", "talk_topics.txt"] {
            std::fs::write(dir.path().join(name), "text").unwrap();
        }

        let source = LocalSource::new(".txt");
        let refs = source.list(dir.path().to_str().unwrap()).await.unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].id, "talk");
    }

    #[tokio::test]
    async fn test_single_file_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lecture_formatted.txt");
        std::fs::write(&path, "Hola a todos.").unwrap();

        let source = LocalSource::default();
        let refs = source.list(path.to_str().unwrap()).await.unwrap();
        assert_eq!(refs.len(), 1);

        let document = source.read(&refs[0]).await.unwrap();
        assert_eq!(document.id, "lecture");
        assert_eq!(document.content, "Hola a todos.");
    }

    #[tokio::test]
    async fn test_missing_path_is_error() {
        let source = LocalSource::default();
        let err = source.list("/definitely/not/here").await.unwrap_err();
        assert!(matches!(err, RecapError::Source(_)));
    }
}
