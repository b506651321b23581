//! Result sink abstraction for Recap.
//!
//! A sink persists the analyses of one document. Only non-empty bundles are
//! handed to it.

mod file;

pub use file::{AnalysisExport, FileSink};

use crate::analysis::AnalysisBundle;
use crate::error::Result;
use async_trait::async_trait;

/// Trait for persisting analysis results.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Persist `bundle` for the document `document_id`.
    ///
    /// Returns the locations that were written.
    async fn write(&self, document_id: &str, bundle: &AnalysisBundle) -> Result<Vec<String>>;
}
