//! Rendering errors.

use designset_core::MergeError;
use thiserror::Error;

use crate::archive::ArchiveError;

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Errors raised while turning a design set into a page.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Caller input is unusable (missing template name, no design set).
    #[error("{0}")]
    Validation(String),

    /// Design-set directory does not exist.
    #[error("design set directory not found: {0}")]
    DesignSetNotFound(String),

    /// Main template does not exist.
    #[error("template file not found: {0}")]
    TemplateNotFound(String),

    /// A requested file does not exist.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// Download or extraction of a remote archive failed.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// The template engine rejected or failed a template.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// A module failed while strict module handling is enabled.
    #[error("module `{name}` failed: {reason}")]
    Module { name: String, reason: String },

    /// Override data could not be merged into the context.
    #[error("invalid override data: {0}")]
    Merge(#[from] MergeError),

    /// Any failure while processing a remote archive.
    #[error("remote archive processing failed: {0}")]
    Remote(#[source] Box<RenderError>),
}

impl RenderError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Wrap an error raised while handling a remote archive.
    #[must_use]
    pub fn remote(self) -> Self {
        match self {
            already @ Self::Remote(_) => already,
            other => Self::Remote(Box::new(other)),
        }
    }

    /// Whether this error is caused by bad caller input.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Whether this error means a requested resource is absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::DesignSetNotFound(_) | Self::TemplateNotFound(_) | Self::FileNotFound(_)
        )
    }
}
