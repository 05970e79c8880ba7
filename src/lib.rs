//! # pdf-sideways
//!
//! Reflow the extracted text of a PDF onto new portrait pages with the text
//! turned 90°, so a wide line of text runs along the long edge of the sheet.
//!
//! Each source page contributes a header (`"<title> (extracted text) — page
//! N"`), a rule of dashes and a blank line, followed by its text wrapped to
//! the character budget of the rotated frame. Pages too long for one sheet
//! continue on the next; the header appears only on the first.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    validate path and %PDF magic
//!  ├─ 2. Extract  per-page text via pdfium, tabs → spaces, trimmed
//!  ├─ 3. Reflow   header block + greedy wrap at whitespace
//!  ├─ 4. Paginate cut into sheets of max_lines
//!  ├─ 5. Render   rotated Helvetica text objects, one page per sheet
//!  └─ 6. Output   atomic save + per-page stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_sideways::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert("handout.pdf", "handout_text_sideways.pdf", &config).await?;
//!     eprintln!(
//!         "{} source pages → {} sheets",
//!         output.stats.converted_pages, output.stats.output_pages
//!     );
//!     Ok(())
//! }
//! ```
//!
//! The reflow core is pure and usable on its own:
//!
//! ```rust
//! use pdf_sideways::{paginate, reflow};
//!
//! let lines = reflow("Hello world\n\nFoo bar baz", "H", 8);
//! assert_eq!(lines, ["H", "-", "", "Hello", "world", "", "Foo bar", "baz"]);
//! assert_eq!(paginate(lines, 5).len(), 2);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `sideways` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf-sideways = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    Budget, ConversionConfig, ConversionConfigBuilder, PageSelection, PageSize, Rotation,
};
pub use convert::{convert, convert_from_bytes, convert_sync, inspect, run_pipeline};
pub use error::{PageError, SidewaysError};
pub use output::{ConversionOutput, ConversionStats, DocumentMetadata, PageResult};
pub use pipeline::extract::TextSource;
pub use pipeline::input::default_output_path;
pub use pipeline::reflow::{header_block, paginate, reflow, wrap_line, wrap_text};
pub use pipeline::render::PageSink;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
