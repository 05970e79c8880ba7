//! Progress-callback trait for per-page conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as each source page is reflowed and drawn. Pages are processed
//! strictly in order, one at a time.
//!
//! # Example
//!
//! ```rust
//! use pdf_sideways::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct SheetCounter {
//!     sheets: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for SheetCounter {
//!     fn on_page_complete(&self, _page_num: usize, _total_pages: usize, output_pages: usize) {
//!         self.sheets.fetch_add(output_pages, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(SheetCounter { sheets: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the conversion pipeline as it processes each source page.
///
/// All methods default to no-ops; override only what you need.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once, before the first page.
    ///
    /// # Arguments
    /// * `total_pages` — number of source pages selected for conversion
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called before a source page's text is extracted.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called after a source page has been drawn.
    ///
    /// # Arguments
    /// * `page_num`     — 1-indexed source page number
    /// * `total_pages`  — number of selected pages
    /// * `output_pages` — sheets generated for this page
    fn on_page_complete(&self, page_num: usize, total_pages: usize, output_pages: usize) {
        let _ = (page_num, total_pages, output_pages);
    }

    /// Called when a page's text could not be extracted. The page is still
    /// drawn (header only) and `on_page_complete` follows.
    fn on_page_warning(&self, page_num: usize, total_pages: usize, warning: &str) {
        let _ = (page_num, total_pages, warning);
    }

    /// Called once after the last page has been drawn, before saving.
    ///
    /// # Arguments
    /// * `total_pages`  — number of selected source pages
    /// * `output_pages` — sheets in the saved document
    fn on_conversion_complete(&self, total_pages: usize, output_pages: usize) {
        let _ = (total_pages, output_pages);
    }
}

/// Ignores every event. Used when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// The type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
