//! Conversion entry points and the page driver.
//!
//! [`run_pipeline`] is the whole algorithm: for each selected source page,
//! extract → normalise → reflow → paginate → draw. It is generic over
//! [`TextSource`] and [`PageSink`] and never touches pdfium itself.
//!
//! The `convert*` functions wire it to the pdfium-backed implementations,
//! bind the native library, and write the result atomically (temp sibling
//! then rename) so a failed run never leaves a half-written destination.

use crate::config::{Budget, ConversionConfig};
use crate::error::SidewaysError;
use crate::output::{ConversionOutput, ConversionStats, DocumentMetadata, PageResult};
use crate::pipeline::extract::{
    load_document, normalize_extracted, read_metadata, PdfiumTextSource, TextSource,
};
use crate::pipeline::input;
use crate::pipeline::layout::SheetLayout;
use crate::pipeline::reflow::{page_header, reflow_page};
use crate::pipeline::render::{draw_sheet, PageSink, PdfiumPageSink};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Reflow the selected pages of `source` onto `sink`.
///
/// `page_indices` are 0-based and processed in the order given. Every page
/// produces at least one output page (its header block). A page whose
/// extraction fails is converted as empty and its error recorded in the
/// returned [`PageResult`].
///
/// Does not call [`PageSink::save`]; the caller saves once when all pages
/// are drawn.
pub fn run_pipeline<S, K>(
    source: &mut S,
    sink: &mut K,
    config: &ConversionConfig,
    title: &str,
    page_indices: &[usize],
) -> Result<Vec<PageResult>, SidewaysError>
where
    S: TextSource + ?Sized,
    K: PageSink + ?Sized,
{
    let total = source.page_count();
    if page_indices.is_empty() {
        return Err(SidewaysError::EmptySelection { total });
    }
    if let Some(&bad) = page_indices.iter().find(|&&i| i >= total) {
        return Err(SidewaysError::PageOutOfRange {
            page: bad + 1,
            total,
        });
    }

    let budget = config.budget();
    let layout = SheetLayout::from_config(config);
    let selected = page_indices.len();
    debug!(
        "Budget: {} chars × {} lines per sheet",
        budget.max_chars, budget.max_lines
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(selected);
    }

    let mut results = Vec::with_capacity(selected);
    for &index in page_indices {
        let page_num = index + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_num, selected);
        }

        let (raw, error) = match source.extract_page_text(index) {
            Ok(text) => (text, None),
            Err(e) => {
                warn!("{e}; converting page as empty");
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_warning(page_num, selected, &e.to_string());
                }
                (String::new(), Some(e))
            }
        };

        let result = draw_page(sink, &layout, budget, title, page_num, &raw, error)?;
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_complete(page_num, selected, result.output_pages);
        }
        results.push(result);
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(selected, results.iter().map(|r| r.output_pages).sum());
    }
    Ok(results)
}

fn draw_page<K: PageSink + ?Sized>(
    sink: &mut K,
    layout: &SheetLayout,
    budget: Budget,
    title: &str,
    page_num: usize,
    raw: &str,
    error: Option<crate::error::PageError>,
) -> Result<PageResult, SidewaysError> {
    let text = normalize_extracted(raw);
    let header = page_header(title, page_num);
    let sheets = reflow_page(&text, &header, budget);

    for sheet in &sheets {
        draw_sheet(sink, layout, sheet)?;
    }

    let result = PageResult {
        page_num,
        text_chars: text.chars().count(),
        wrapped_lines: sheets.iter().map(Vec::len).sum(),
        output_pages: sheets.len(),
        error,
    };
    debug!(
        "Page {} → {} lines on {} sheet(s)",
        page_num, result.wrapped_lines, result.output_pages
    );
    Ok(result)
}

/// Convert the PDF at `input` into a sideways-text PDF at `output`.
///
/// The pdfium work runs on tokio's blocking pool.
///
/// # Example
/// ```rust,no_run
/// use pdf_sideways::{convert, ConversionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ConversionConfig::default();
/// let out = convert("handout.pdf", "handout_text_sideways.pdf", &config).await?;
/// println!("{} sheets", out.stats.output_pages);
/// # Ok(())
/// # }
/// ```
pub async fn convert(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, SidewaysError> {
    let input = input.as_ref().to_path_buf();
    let output = output.as_ref().to_path_buf();
    let config = config.clone();

    tokio::task::spawn_blocking(move || convert_sync(&input, &output, &config))
        .await
        .map_err(|e| SidewaysError::Internal(format!("Conversion task panicked: {}", e)))?
}

/// Blocking form of [`convert`]; runs on the calling thread.
pub fn convert_sync(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, SidewaysError> {
    let input = input.as_ref();
    let title = config
        .title
        .clone()
        .unwrap_or_else(|| input::source_stem(input));
    convert_blocking(input, output.as_ref(), config, &title)
}

/// Convert PDF bytes held in memory.
///
/// The bytes are written to a managed [`tempfile`] that is removed on
/// return. Without a configured title the header uses `"document"`.
pub async fn convert_from_bytes(
    bytes: &[u8],
    output: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, SidewaysError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| SidewaysError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| SidewaysError::Internal(format!("tempfile write: {e}")))?;

    let output = output.as_ref().to_path_buf();
    let config = config.clone();
    let title = config.title.clone().unwrap_or_else(|| "document".to_string());

    // `tmp` moves into the task and is deleted when it finishes
    tokio::task::spawn_blocking(move || convert_blocking(tmp.path(), &output, &config, &title))
        .await
        .map_err(|e| SidewaysError::Internal(format!("Conversion task panicked: {}", e)))?
}

/// Read document metadata without converting anything.
pub async fn inspect(
    input: impl AsRef<Path>,
    password: Option<&str>,
) -> Result<DocumentMetadata, SidewaysError> {
    let path = input::resolve_input(input)?;
    let password = password.map(str::to_string);

    tokio::task::spawn_blocking(move || -> Result<DocumentMetadata, SidewaysError> {
        let pdfium = pdfium_auto::bind_pdfium(None)?;
        let document = load_document(&pdfium, &path, password.as_deref())?;
        Ok(read_metadata(&document))
    })
    .await
    .map_err(|e| SidewaysError::Internal(format!("Inspect task panicked: {}", e)))?
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn convert_blocking(
    input: &Path,
    output: &Path,
    config: &ConversionConfig,
    title: &str,
) -> Result<ConversionOutput, SidewaysError> {
    let total_start = Instant::now();
    info!("Starting conversion: {}", input.display());

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let pdf_path = input::resolve_input(input)?;
    reject_in_place(&pdf_path, output)?;

    // ── Step 2: Bind pdfium and open the source ──────────────────────────
    let pdfium = pdfium_auto::bind_pdfium(None)?;
    let mut source = PdfiumTextSource::open(&pdfium, &pdf_path, config.password.as_deref())?;
    let metadata = source.metadata();
    let total_pages = metadata.page_count;

    // ── Step 3: Compute page indices ─────────────────────────────────────
    let page_indices = config.pages.to_indices(total_pages);
    if page_indices.is_empty() {
        if let Some(page) = config.pages.first_out_of_range(total_pages) {
            return Err(SidewaysError::PageOutOfRange {
                page,
                total: total_pages,
            });
        }
    }
    debug!("Selected {} of {} pages", page_indices.len(), total_pages);

    // ── Step 4: Reflow and draw ──────────────────────────────────────────
    let mut sink = PdfiumPageSink::new(&pdfium, config)?;
    let pages = run_pipeline(&mut source, &mut sink, config, title, &page_indices)?;

    // ── Step 5: Save atomically ──────────────────────────────────────────
    save_atomic(&mut sink, output)?;

    let stats = ConversionStats::from_pages(
        total_pages,
        &pages,
        config.budget(),
        total_start.elapsed().as_millis() as u64,
    );
    info!(
        "Conversion complete: {} source pages → {} sheets, {}ms total",
        stats.converted_pages, stats.output_pages, stats.total_duration_ms
    );

    Ok(ConversionOutput {
        output_path: output.to_path_buf(),
        pages,
        metadata,
        stats,
    })
}

/// Refuse to write the output over the source it is read from.
fn reject_in_place(input: &Path, output: &Path) -> Result<(), SidewaysError> {
    let same = match (input.canonicalize(), output.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    };
    if same {
        return Err(SidewaysError::InvalidConfig(format!(
            "output path '{}' is the input file",
            output.display()
        )));
    }
    Ok(())
}

/// `out.pdf` → `out.pdf.tmp`, in the same directory so the rename is atomic.
fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn save_atomic<K: PageSink + ?Sized>(sink: &mut K, path: &Path) -> Result<(), SidewaysError> {
    let write_err = |e: std::io::Error| SidewaysError::OutputWriteFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let tmp_path = temp_sibling(path);
    if let Err(e) = sink.save(&tmp_path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }
    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        write_err(e)
    })?;

    debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageSelection;
    use crate::error::PageError;
    use crate::progress::ConversionProgressCallback;
    use std::sync::{Arc, Mutex};

    struct FakeSource {
        pages: Vec<Result<String, String>>,
        reads: Vec<usize>,
    }

    impl FakeSource {
        fn new(pages: &[&str]) -> Self {
            Self {
                pages: pages.iter().map(|p| Ok(p.to_string())).collect(),
                reads: Vec::new(),
            }
        }
    }

    impl TextSource for FakeSource {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn extract_page_text(&mut self, index: usize) -> Result<String, PageError> {
            self.reads.push(index);
            self.pages[index]
                .clone()
                .map_err(|detail| PageError::ExtractionFailed {
                    page: index + 1,
                    detail,
                })
        }
    }

    #[derive(Default)]
    struct FakeSink {
        sheets: Vec<Vec<(f32, f32, String)>>,
        open: bool,
        begins: usize,
        ends: usize,
        saved: Vec<PathBuf>,
        fail_save: bool,
    }

    impl PageSink for FakeSink {
        fn begin_page(&mut self) -> Result<(), SidewaysError> {
            assert!(!self.open, "begin_page while a page is open");
            self.open = true;
            self.begins += 1;
            self.sheets.push(Vec::new());
            Ok(())
        }

        fn draw_line(&mut self, x: f32, y: f32, text: &str) -> Result<(), SidewaysError> {
            assert!(self.open, "draw_line outside a page");
            if let Some(sheet) = self.sheets.last_mut() {
                sheet.push((x, y, text.to_string()));
            }
            Ok(())
        }

        fn end_page(&mut self) -> Result<(), SidewaysError> {
            assert!(self.open, "end_page without begin_page");
            self.open = false;
            self.ends += 1;
            Ok(())
        }

        fn save(&mut self, path: &Path) -> Result<(), SidewaysError> {
            self.saved.push(path.to_path_buf());
            if self.fail_save {
                return Err(SidewaysError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    detail: "disk full".into(),
                });
            }
            std::fs::write(path, b"%PDF-fake").map_err(|e| SidewaysError::Internal(e.to_string()))
        }
    }

    fn small_config() -> ConversionConfig {
        // 50 chars × 6 lines: frame 300×100, margin 10 → usable 280×80
        ConversionConfig::builder()
            .page_size(crate::config::PageSize::Custom(100.0, 300.0))
            .margin(10.0)
            .font_size(10.0)
            .leading(12.0)
            .build()
            .unwrap()
    }

    fn texts(sheet: &[(f32, f32, String)]) -> Vec<&str> {
        sheet.iter().map(|(_, _, t)| t.as_str()).collect()
    }

    #[test]
    fn small_config_budget() {
        let budget = small_config().budget();
        assert_eq!(budget.max_chars, 50);
        assert_eq!(budget.max_lines, 6);
    }

    #[test]
    fn one_source_page_one_sheet() {
        let mut source = FakeSource::new(&["Hello world\n\nFoo bar baz"]);
        let mut sink = FakeSink::default();
        let results =
            run_pipeline(&mut source, &mut sink, &small_config(), "Doc", &[0]).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].output_pages, 1);
        assert_eq!(results[0].wrapped_lines, 6);
        assert_eq!(sink.begins, 1);
        assert_eq!(sink.ends, 1);
        assert!(sink.saved.is_empty(), "run_pipeline must not save");

        // the blank lines are not drawn
        assert_eq!(
            texts(&sink.sheets[0]),
            vec![
                "Doc (extracted text) — page 1",
                "-----------------------------",
                "Hello world",
                "Foo bar baz"
            ]
        );
    }

    #[test]
    fn lines_are_positioned_from_the_frame_top() {
        let config = small_config();
        let mut source = FakeSource::new(&["a\n\nb"]);
        let mut sink = FakeSink::default();
        run_pipeline(&mut source, &mut sink, &config, "T", &[0]).unwrap();

        // frame height = page width = 100; first baseline at 100 - 10
        let ys: Vec<f32> = sink.sheets[0].iter().map(|(_, y, _)| *y).collect();
        assert_eq!(ys, vec![90.0, 78.0, 54.0, 30.0]);
        assert!(sink.sheets[0].iter().all(|(x, _, _)| *x == 10.0));
    }

    #[test]
    fn long_page_spills_onto_more_sheets_without_repeating_header() {
        let text = (1..=10).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let mut source = FakeSource::new(&[text.as_str()]);
        let mut sink = FakeSink::default();
        let results =
            run_pipeline(&mut source, &mut sink, &small_config(), "T", &[0]).unwrap();

        // 3 header + 10 text = 13 lines over 6-line sheets
        assert_eq!(results[0].output_pages, 3);
        assert_eq!(sink.begins, 3);
        assert_eq!(sink.ends, 3);
        assert_eq!(texts(&sink.sheets[1])[0], "line 4");
        assert_eq!(texts(&sink.sheets[2]), vec!["line 10"]);
    }

    #[test]
    fn empty_and_failed_pages_still_get_a_header_sheet() {
        let mut source = FakeSource {
            pages: vec![Ok("  \t\n ".into()), Err("broken xref".into())],
            reads: Vec::new(),
        };
        let mut sink = FakeSink::default();
        let results =
            run_pipeline(&mut source, &mut sink, &small_config(), "T", &[0, 1]).unwrap();

        assert_eq!(sink.sheets.len(), 2);
        assert_eq!(results[0].text_chars, 0);
        assert!(results[0].error.is_none());
        assert_eq!(
            results[1].error,
            Some(PageError::ExtractionFailed {
                page: 2,
                detail: "broken xref".into()
            })
        );
        assert_eq!(texts(&sink.sheets[1])[0], "T (extracted text) — page 2");
    }

    #[test]
    fn only_selected_pages_are_read_in_order() {
        let mut source = FakeSource::new(&["one", "two", "three", "four"]);
        let mut sink = FakeSink::default();
        let indices = PageSelection::Set(vec![4, 2]).to_indices(4);
        let results =
            run_pipeline(&mut source, &mut sink, &small_config(), "T", &indices).unwrap();

        assert_eq!(source.reads, vec![1, 3]);
        let nums: Vec<usize> = results.iter().map(|r| r.page_num).collect();
        assert_eq!(nums, vec![2, 4]);
    }

    #[test]
    fn empty_or_out_of_range_selection_is_rejected() {
        let mut source = FakeSource::new(&["x"]);
        let mut sink = FakeSink::default();
        let err = run_pipeline(&mut source, &mut sink, &small_config(), "T", &[]).unwrap_err();
        assert!(matches!(err, SidewaysError::EmptySelection { total: 1 }));

        let err = run_pipeline(&mut source, &mut sink, &small_config(), "T", &[3]).unwrap_err();
        assert!(matches!(err, SidewaysError::PageOutOfRange { page: 4, total: 1 }));
        assert_eq!(sink.begins, 0);
    }

    #[derive(Default)]
    struct EventLog(Mutex<Vec<String>>);

    impl ConversionProgressCallback for EventLog {
        fn on_conversion_start(&self, total_pages: usize) {
            self.0.lock().unwrap().push(format!("start {total_pages}"));
        }
        fn on_page_start(&self, page_num: usize, _total_pages: usize) {
            self.0.lock().unwrap().push(format!("page {page_num}"));
        }
        fn on_page_complete(&self, page_num: usize, _total_pages: usize, output_pages: usize) {
            self.0
                .lock()
                .unwrap()
                .push(format!("done {page_num} {output_pages}"));
        }
        fn on_page_warning(&self, page_num: usize, _total_pages: usize, _warning: &str) {
            self.0.lock().unwrap().push(format!("warn {page_num}"));
        }
        fn on_conversion_complete(&self, total_pages: usize, output_pages: usize) {
            self.0
                .lock()
                .unwrap()
                .push(format!("complete {total_pages} {output_pages}"));
        }
    }

    #[test]
    fn progress_events_fire_in_order() {
        let log = Arc::new(EventLog::default());
        let config = ConversionConfig::builder()
            .page_size(crate::config::PageSize::Custom(100.0, 300.0))
            .margin(10.0)
            .progress_callback(log.clone())
            .build()
            .unwrap();
        let mut source = FakeSource {
            pages: vec![Ok("a".into()), Err("bad".into())],
            reads: Vec::new(),
        };
        let mut sink = FakeSink::default();
        run_pipeline(&mut source, &mut sink, &config, "T", &[0, 1]).unwrap();

        assert_eq!(
            *log.0.lock().unwrap(),
            vec![
                "start 2",
                "page 1",
                "done 1 1",
                "page 2",
                "warn 2",
                "done 2 1",
                "complete 2 2"
            ]
        );
    }

    #[test]
    fn save_atomic_renames_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out.pdf");
        let mut sink = FakeSink::default();

        save_atomic(&mut sink, &out).unwrap();

        assert_eq!(sink.saved, vec![dir.path().join("nested").join("out.pdf.tmp")]);
        assert_eq!(std::fs::read(&out).unwrap(), b"%PDF-fake");
        assert!(!temp_sibling(&out).exists());
    }

    #[test]
    fn failed_save_leaves_no_destination() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.pdf");
        let mut sink = FakeSink {
            fail_save: true,
            ..Default::default()
        };

        let err = save_atomic(&mut sink, &out).unwrap_err();
        assert!(matches!(err, SidewaysError::OutputWriteFailed { .. }));
        assert!(!out.exists());
        assert!(!temp_sibling(&out).exists());
    }

    #[test]
    fn writing_over_the_input_is_rejected() {
        let f = tempfile::NamedTempFile::new().unwrap();
        let err = reject_in_place(f.path(), f.path()).unwrap_err();
        assert!(matches!(err, SidewaysError::InvalidConfig(_)));

        let other = f.path().with_file_name("elsewhere.pdf");
        assert!(reject_in_place(f.path(), &other).is_ok());
    }
}
