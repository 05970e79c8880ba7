//! Pipeline stages for PDF-to-sideways-text conversion.
//!
//! Each submodule implements one step. The two pdfium-backed stages sit
//! behind traits ([`extract::TextSource`], [`render::PageSink`]) so the
//! driver in [`crate::convert`] runs unchanged against in-memory fakes.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ reflow ──▶ layout ──▶ render
//! (path)    (pdfium)    (wrap +    (rotated   (pdfium)
//!                        paginate)  frame)
//! ```
//!
//! 1. [`input`]   validate the source path and its `%PDF` magic
//! 2. [`extract`] one text blob per source page, normalised
//! 3. [`reflow`]  header block, greedy wrap, cut into sheets; pure
//! 4. [`layout`]  baseline positions and the rotated→page mapping
//! 5. [`render`]  draw each sheet as rotated Helvetica and save once

pub mod extract;
pub mod input;
pub mod layout;
pub mod reflow;
pub mod render;
