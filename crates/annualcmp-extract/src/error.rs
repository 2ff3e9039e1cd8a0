use thiserror::Error;

/// Failure to open or load a PDF as a whole.
///
/// Per-page extraction problems are not represented here: they are logged and
/// the page is skipped.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to open PDF {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("failed to load PDF from memory: {0}")]
    Load(String),
}
