// src/error.rs

use thiserror::Error;

/// Errors raised while editing or validating a column layout.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// A requested width violates the field's `[min, max]` range.
    #[error("width {width}% for `{key}` is outside the allowed range {min}-{max}%")]
    OutOfRangeWidth {
        key: String,
        width: u32,
        min: u32,
        max: u32,
    },

    /// A field key that the current catalog does not know about.
    #[error("unknown field key `{0}`")]
    UnknownFieldKey(String),

    /// A reorder index past the end of the visible list.
    #[error("column index {index} is out of bounds for {len} visible columns")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Saving a layout with no visible columns.
    #[error("at least one column must be visible")]
    EmptyLayout,
}

/// Failures of the persistence collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("stored settings are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("timestamp formatting failed: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// Failures while producing a rendered document.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("pdf error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level error for the print settings service.
#[derive(Error, Debug)]
pub enum PrintError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// Load, save or delete failed. The caller's draft is untouched and the
    /// operation may be retried.
    #[error("print settings persistence failed: {0}")]
    Persistence(#[from] StoreError),

    #[error("render failed: {0}")]
    Render(#[from] RenderError),
}
