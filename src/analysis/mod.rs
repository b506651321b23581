//! Transcription analysis: executive summary, key points and topics.
//!
//! Summary and key points run a chunked map-reduce over the whole text:
//! every chunk gets its own generation call (the map stage) and the partial
//! results are merged by one more call (the reduce stage) when there is more
//! than one. Topics skip chunking and work on a head+tail sample.
//!
//! Failures are local. A chunk that fails is left out of the reduce, and an
//! analysis that produces nothing is left out of the [`AnalysisBundle`].

mod analyzer;
mod map;
mod reduce;

pub use analyzer::Analyzer;
pub use map::{map_chunks, Scheduler};
pub use reduce::{LlmReducer, Reducer, PARTIAL_SEPARATOR};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of analysis produced for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    Summary,
    KeyPoints,
    Topics,
}

impl AnalysisKind {
    /// All kinds, in output order.
    pub const ALL: [AnalysisKind; 3] = [
        AnalysisKind::Summary,
        AnalysisKind::KeyPoints,
        AnalysisKind::Topics,
    ];

    /// Stable key used in file names and JSON output.
    pub fn key(&self) -> &'static str {
        match self {
            AnalysisKind::Summary => "summary",
            AnalysisKind::KeyPoints => "key_points",
            AnalysisKind::Topics => "topics",
        }
    }

    /// Heading written above the result.
    pub fn title(&self) -> &'static str {
        match self {
            AnalysisKind::Summary => "EXECUTIVE SUMMARY",
            AnalysisKind::KeyPoints => "KEY POINTS",
            AnalysisKind::Topics => "MAIN TOPICS",
        }
    }
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl std::str::FromStr for AnalysisKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "summary" => Ok(AnalysisKind::Summary),
            "key_points" | "keypoints" => Ok(AnalysisKind::KeyPoints),
            "topics" => Ok(AnalysisKind::Topics),
            _ => Err(format!("Unknown analysis kind: {}", s)),
        }
    }
}

/// The analyses that succeeded for one document.
///
/// Only kinds that produced a result are present; an empty bundle means
/// nothing could be analyzed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisBundle {
    results: BTreeMap<AnalysisKind, String>,
}

impl AnalysisBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result for a kind, replacing any previous one.
    pub fn insert(&mut self, kind: AnalysisKind, text: String) {
        self.results.insert(kind, text);
    }

    pub fn get(&self, kind: AnalysisKind) -> Option<&str> {
        self.results.get(&kind).map(String::as_str)
    }

    pub fn contains(&self, kind: AnalysisKind) -> bool {
        self.results.contains_key(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Results in output order (summary, key points, topics).
    pub fn iter(&self) -> impl Iterator<Item = (AnalysisKind, &str)> {
        self.results.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Kinds present in the bundle.
    pub fn kinds(&self) -> Vec<AnalysisKind> {
        self.results.keys().copied().collect()
    }
}
