pub mod checker;
pub mod cli;
pub mod config;
pub mod dict;
pub mod error;
pub mod logging;
pub mod parser;

pub use checker::cache::{CacheStats, ResultCache};
pub use checker::dictionary::{DictionaryEngine, LanguageState};
pub use checker::{CheckSettings, SpellChecker};
pub use config::Config;
pub use error::SpellError;
pub use parser::languages::{LanguageConfig, LanguageRegistry};
pub use parser::regions::{find_code_regions, CodeRegion, RegionKind};

use serde::{Deserialize, Serialize};

/// Byte range into the checked text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn shifted(self, offset: usize) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Info,
    Hint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Spelling,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellIssue {
    pub word: String,
    pub suggestions: Vec<String>,
    pub position: Span,
    pub line: usize,
    pub column: usize,
    pub kind: IssueKind,
    pub severity: Severity,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckStatistics {
    pub words_checked: usize,
    pub processing_time_ms: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub spelling: Vec<SpellIssue>,
    pub statistics: CheckStatistics,
}

impl CheckOutcome {
    pub fn error_count(&self) -> usize {
        self.spelling.len()
    }
}
