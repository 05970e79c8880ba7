//! Result types returned by the conversion entry points.

use crate::config::Budget;
use crate::error::PageError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a finished conversion reports back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Where the sideways PDF was written.
    pub output_path: PathBuf,
    /// One entry per converted source page, in page order.
    pub pages: Vec<PageResult>,
    /// Metadata of the source document.
    pub metadata: DocumentMetadata,
    pub stats: ConversionStats,
}

/// What happened to one source page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed source page number.
    pub page_num: usize,
    /// Characters of extracted text after normalisation.
    pub text_chars: usize,
    /// Wrapped lines, header block included.
    pub wrapped_lines: usize,
    /// Output sheets generated for this page.
    pub output_pages: usize,
    /// Set when extraction failed and the page was treated as empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<PageError>,
}

/// Aggregate counters for a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages in the source document.
    pub source_pages: usize,
    /// Source pages that went through the pipeline.
    pub converted_pages: usize,
    /// Converted pages that produced no text (extraction empty or failed).
    pub empty_pages: usize,
    /// Sheets in the output document.
    pub output_pages: usize,
    /// Wrapped lines drawn, header blocks included.
    pub total_lines: usize,
    /// Characters-per-line budget used for wrapping.
    pub max_chars: usize,
    /// Lines-per-sheet budget used for pagination.
    pub max_lines: usize,
    pub total_duration_ms: u64,
}

impl ConversionStats {
    /// Fold per-page results into run totals.
    pub fn from_pages(
        source_pages: usize,
        pages: &[PageResult],
        budget: Budget,
        total_duration_ms: u64,
    ) -> Self {
        Self {
            source_pages,
            converted_pages: pages.len(),
            empty_pages: pages.iter().filter(|p| p.text_chars == 0).count(),
            output_pages: pages.iter().map(|p| p.output_pages).sum(),
            total_lines: pages.iter().map(|p| p.wrapped_lines).sum(),
            max_chars: budget.max_chars,
            max_lines: budget.max_lines,
            total_duration_ms,
        }
    }
}

/// Document-level information read from the source PDF.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}
