//! Error types for pdf-sideways.
//!
//! * [`SidewaysError`] is **fatal**: the source cannot be opened, the layout
//!   is invalid, or the output cannot be written. Returned from the
//!   top-level `convert*` functions.
//!
//! * [`PageError`] is **non-fatal**: one source page yielded no text. The
//!   page is converted as if it were empty and the error is recorded in its
//!   [`crate::output::PageResult`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the library.
#[derive(Debug, Error)]
pub enum SidewaysError {
    // ── Input errors ──────────────────────────────────────────────────────
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file was read, but does not start with `%PDF`.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// A requested page (1-indexed) lies outside the document.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// The page selection matched nothing in the document.
    #[error("No pages selected (document has {total} pages)")]
    EmptySelection { total: usize },

    // ── Output errors ─────────────────────────────────────────────────────
    /// pdfium refused to build an output page or text object.
    #[error("Rendering failed on output page {page}: {detail}")]
    RenderFailed { page: usize, detail: String },

    #[error("Failed to write output file '{path}': {detail}")]
    OutputWriteFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<pdfium_auto::PdfiumAutoError> for SidewaysError {
    fn from(e: pdfium_auto::PdfiumAutoError) -> Self {
        SidewaysError::PdfiumBindingFailed(e.to_string())
    }
}

/// A non-fatal error for a single source page.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// pdfium could not load the page or its text layer.
    #[error("Page {page}: text extraction failed: {detail}")]
    ExtractionFailed { page: usize, detail: String },
}
