//! Rendering: draw sheets of wrapped lines as rotated text.
//!
//! [`PageSink`] is the writer-side seam. It receives rotated-frame
//! coordinates; turning them onto the portrait page, and choosing the font,
//! is the sink's business. [`PdfiumPageSink`] builds a new PDF with
//! pdfium, using the standard Helvetica font.

use crate::config::{ConversionConfig, Rotation};
use crate::error::SidewaysError;
use crate::pipeline::layout::{to_page, Point, SheetLayout};
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::debug;

/// Accumulates output pages and saves them once.
pub trait PageSink {
    /// Start a new output page.
    fn begin_page(&mut self) -> Result<(), SidewaysError>;

    /// Draw `text` with its baseline origin at rotated-frame `(x, y)`.
    fn draw_line(&mut self, x: f32, y: f32, text: &str) -> Result<(), SidewaysError>;

    /// Finish the current page.
    fn end_page(&mut self) -> Result<(), SidewaysError>;

    /// Write the document to `path`.
    fn save(&mut self, path: &Path) -> Result<(), SidewaysError>;
}

/// Draw one sheet: a page with `lines` stepped down by the layout's leading.
///
/// Empty lines take up a slot but draw nothing.
pub fn draw_sheet<S: PageSink + ?Sized>(
    sink: &mut S,
    layout: &SheetLayout,
    lines: &[String],
) -> Result<(), SidewaysError> {
    sink.begin_page()?;
    for (i, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let Point { x, y } = layout.line_origin(i);
        sink.draw_line(x, y, line)?;
    }
    sink.end_page()
}

/// [`PageSink`] that writes a PDF through pdfium.
pub struct PdfiumPageSink<'a> {
    // declared before `document` so an open page is dropped first
    current: Option<PdfPage<'a>>,
    document: PdfDocument<'a>,
    font: PdfFontToken,
    font_size: f32,
    page_size: (f32, f32),
    rotation: Rotation,
    pages_written: usize,
}

impl<'a> PdfiumPageSink<'a> {
    pub fn new(pdfium: &'a Pdfium, config: &ConversionConfig) -> Result<Self, SidewaysError> {
        let mut document = pdfium
            .create_new_pdf()
            .map_err(|e| SidewaysError::Internal(format!("cannot create output PDF: {e:?}")))?;
        let font = document.fonts_mut().helvetica();

        Ok(Self {
            current: None,
            document,
            font,
            font_size: config.font_size,
            page_size: config.page_size.dimensions(),
            rotation: config.rotation,
            pages_written: 0,
        })
    }

    fn render_err(&self, e: PdfiumError) -> SidewaysError {
        SidewaysError::RenderFailed {
            page: self.pages_written + 1,
            detail: format!("{e:?}"),
        }
    }
}

impl PageSink for PdfiumPageSink<'_> {
    fn begin_page(&mut self) -> Result<(), SidewaysError> {
        if self.current.is_some() {
            self.end_page()?;
        }
        let (w, h) = self.page_size;
        let page = self
            .document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::Custom(PdfPoints::new(w), PdfPoints::new(h)))
            .map_err(|e| self.render_err(e))?;
        self.current = Some(page);
        Ok(())
    }

    fn draw_line(&mut self, x: f32, y: f32, text: &str) -> Result<(), SidewaysError> {
        let (w, h) = self.page_size;
        let origin = to_page(Point { x, y }, self.rotation, w, h);

        let mut object = PdfPageTextObject::new(
            &self.document,
            text,
            self.font,
            PdfPoints::new(self.font_size),
        )
        .map_err(|e| self.render_err(e))?;

        match self.rotation {
            Rotation::CounterClockwise => object.rotate_counter_clockwise_degrees(90.0),
            Rotation::Clockwise => object.rotate_clockwise_degrees(90.0),
        }
        .and_then(|_| object.translate(PdfPoints::new(origin.x), PdfPoints::new(origin.y)))
        .map_err(|e| self.render_err(e))?;

        let page_num = self.pages_written + 1;
        let page = self.current.as_mut().ok_or_else(|| {
            SidewaysError::Internal(format!("draw_line before begin_page (sheet {page_num})"))
        })?;
        page.objects_mut()
            .add_text_object(object)
            .map_err(|e| SidewaysError::RenderFailed {
                page: page_num,
                detail: format!("{e:?}"),
            })?;
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), SidewaysError> {
        let Some(mut page) = self.current.take() else {
            return Ok(());
        };
        page.regenerate_content().map_err(|e| self.render_err(e))?;
        self.pages_written += 1;
        debug!("Finished sheet {}", self.pages_written);
        Ok(())
    }

    fn save(&mut self, path: &Path) -> Result<(), SidewaysError> {
        self.end_page()?;
        self.document
            .save_to_file(path)
            .map_err(|e| SidewaysError::OutputWriteFailed {
                path: path.to_path_buf(),
                detail: format!("{e:?}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl PageSink for Recorder {
        fn begin_page(&mut self) -> Result<(), SidewaysError> {
            self.events.push("begin".into());
            Ok(())
        }

        fn draw_line(&mut self, x: f32, y: f32, text: &str) -> Result<(), SidewaysError> {
            self.events.push(format!("{x:.1},{y:.1} {text}"));
            Ok(())
        }

        fn end_page(&mut self) -> Result<(), SidewaysError> {
            self.events.push("end".into());
            Ok(())
        }

        fn save(&mut self, _path: &Path) -> Result<(), SidewaysError> {
            self.events.push("save".into());
            Ok(())
        }
    }

    #[test]
    fn draw_sheet_steps_by_leading_and_skips_blanks() {
        let layout = SheetLayout {
            origin: Point { x: 10.0, y: 100.0 },
            leading: 12.0,
        };
        let lines = vec!["H".to_string(), "-".into(), String::new(), "body".into()];
        let mut sink = Recorder::default();

        draw_sheet(&mut sink, &layout, &lines).unwrap();

        assert_eq!(
            sink.events,
            vec!["begin", "10.0,100.0 H", "10.0,88.0 -", "10.0,64.0 body", "end"]
        );
    }

    #[test]
    fn draw_sheet_on_all_blank_lines_still_makes_a_page() {
        let layout = SheetLayout {
            origin: Point { x: 0.0, y: 50.0 },
            leading: 10.0,
        };
        let mut sink = Recorder::default();
        draw_sheet(&mut sink, &layout, &[String::new(), String::new()]).unwrap();
        assert_eq!(sink.events, vec!["begin", "end"]);
    }
}
