//! Document source abstraction for Recap.
//!
//! A source turns an input (a file, a directory) into documents to analyze.
//! The analysis core never touches the filesystem itself.

mod local;

pub use local::LocalSource;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A transcription to analyze.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier used to name output artifacts.
    pub id: String,
    /// Full text.
    pub content: String,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }

    /// Whether the document has nothing to analyze.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Length in characters.
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

/// Pointer to a document that has not been read yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    /// Identifier the document will carry.
    pub id: String,
    /// Source-specific location (a path for local files).
    pub location: String,
}

/// Trait for document providers.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// List the documents available for `input`, in a stable order.
    async fn list(&self, input: &str) -> Result<Vec<DocumentRef>>;

    /// Read one document.
    async fn read(&self, document: &DocumentRef) -> Result<Document>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_document() {
        assert!(Document::new("a", " \n\t ").is_blank());
        assert!(!Document::new("a", "hola").is_blank());
    }

    #[test]
    fn test_char_count() {
        assert_eq!(Document::new("a", "canción").char_count(), 7);
    }
}
