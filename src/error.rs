use std::fmt;
use std::path::PathBuf;

/// Errors surfaced by the spell-checking core.
///
/// Only a missing primary dictionary is fatal. Secondary languages fall back
/// to the primary dictionary and never produce an error.
#[derive(Debug, thiserror::Error)]
pub enum SpellError {
    #[error("no dictionary could be loaded for '{language}': {}", format_attempts(.attempts))]
    DictionaryUnavailable {
        language: String,
        attempts: Vec<StrategyFailure>,
    },

    #[error("dictionary for '{language}' is not initialized")]
    NotInitialized { language: String },

    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub type Result<T> = std::result::Result<T, SpellError>;

/// Why a single loading strategy could not produce a dictionary.
#[derive(Debug, Clone)]
pub struct StrategyFailure {
    pub strategy: &'static str,
    pub reason: FailureReason,
}

#[derive(Debug, Clone)]
pub enum FailureReason {
    NotRegistered,
    NotFound(Vec<PathBuf>),
    Io { path: PathBuf, message: String },
    Parse(String),
}

impl fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            FailureReason::NotRegistered => write!(f, "{}: not registered", self.strategy),
            FailureReason::NotFound(paths) => {
                let paths = paths
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{}: not found (tried {})", self.strategy, paths)
            }
            FailureReason::Io { path, message } => {
                write!(f, "{}: {}: {}", self.strategy, path.display(), message)
            }
            FailureReason::Parse(message) => write!(f, "{}: parse error: {}", self.strategy, message),
        }
    }
}

fn format_attempts(attempts: &[StrategyFailure]) -> String {
    if attempts.is_empty() {
        return "no strategies configured".to_string();
    }
    attempts
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
