use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while normalizing or compositing page content.
#[derive(Error, Debug)]
pub enum OverlayError {
    /// The page object graph has a shape that cannot be content
    #[error("Invalid content structure: {0}")]
    Structural(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// lopdf failed to read, decode or write an object
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Missing resource {}", .0.display())]
    MissingResource(PathBuf),

    #[error("SVG conversion failed: {0}")]
    Svg(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    #[error("Overlay source has no pages")]
    NoPages,
}

impl OverlayError {
    /// True for failures of reading or writing streams and sources, as opposed
    /// to malformed input or configuration.
    pub fn is_io_failure(&self) -> bool {
        !matches!(
            self,
            OverlayError::Structural(_) | OverlayError::Config(_) | OverlayError::Pattern(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, OverlayError>;
