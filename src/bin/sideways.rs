//! CLI binary for pdf-sideways.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_sideways::{
    convert, default_output_path, inspect, ConversionConfig, ConversionProgressCallback,
    PageSelection, PageSize, ProgressCallback, Rotation,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a bar over source pages plus one log line
/// per page.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Pages whose text could not be extracted.
    warnings: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_conversion_start` reports the page count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            warnings: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Reflowing");
    }
}

/// `done` pages finished out of `selected`, with the source page alongside
/// since a selection need not start at page 1.
fn page_label(done: u64, selected: usize, page_num: usize) -> String {
    format!(
        "Page {:>3}/{:<3} {}",
        done + 1,
        selected,
        dim(&format!("(source p. {page_num})"))
    )
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
    }

    fn on_page_start(&self, page_num: usize, _total_pages: usize) {
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize, output_pages: usize) {
        self.bar.println(format!(
            "  {} {}  {}",
            green("✓"),
            page_label(self.bar.position(), total_pages, page_num),
            dim(&format!("{output_pages} sheet(s)")),
        ));
        self.bar.inc(1);
    }

    fn on_page_warning(&self, page_num: usize, total_pages: usize, warning: &str) {
        self.warnings.fetch_add(1, Ordering::SeqCst);
        let msg: String = if warning.chars().count() > 80 {
            let head: String = warning.chars().take(79).collect();
            format!("{head}\u{2026}")
        } else {
            warning.to_string()
        };
        self.bar.println(format!(
            "  {} {}  {}",
            yellow("!"),
            page_label(self.bar.position(), total_pages, page_num),
            yellow(&msg),
        ));
    }

    fn on_conversion_complete(&self, total_pages: usize, output_pages: usize) {
        self.bar.finish_and_clear();
        let warned = self.warnings.load(Ordering::SeqCst);
        if warned == 0 {
            eprintln!(
                "{} {} pages reflowed onto {} sheets",
                green("✔"),
                bold(&total_pages.to_string()),
                bold(&output_pages.to_string()),
            );
        } else {
            eprintln!(
                "{} {} pages reflowed onto {} sheets  ({} without text)",
                cyan("⚠"),
                bold(&total_pages.to_string()),
                bold(&output_pages.to_string()),
                yellow(&warned.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion, writes handout_text_sideways.pdf next to the input
  sideways handout.pdf

  # Choose the output file and header title
  sideways handout.pdf -o printable.pdf --title "Week 3 Notes"

  # A4 paper, text turned clockwise, smaller type
  sideways --page-size a4 --rotation cw --font-size 9 --leading 11 paper.pdf

  # Only some pages
  sideways --pages 3-15 book.pdf

  # Inspect PDF metadata
  sideways --inspect-only handout.pdf

  # Per-page statistics as JSON
  sideways --json handout.pdf > stats.json

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to an existing libpdfium, skipping auto-download
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory
  RUST_LOG                Override the log filter (e.g. pdf_sideways=debug)

SETUP:
  PDFium (~30 MB) is downloaded automatically on first run and cached in
  ~/.cache/pdf-sideways/pdfium-7690/. No manual library setup is required.
"#;

/// Reflow a PDF's text onto portrait pages with the text turned sideways.
#[derive(Parser, Debug)]
#[command(
    name = "sideways",
    version,
    about = "Reflow a PDF's extracted text onto portrait pages, rotated 90°",
    long_about = "Extract the text of every page of a PDF, re-wrap it to fit the long edge \
of a portrait sheet, and write a new PDF with the text turned 90 degrees. Each source \
page starts with a header naming the document and page number.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Source PDF file.
    input: PathBuf,

    /// Output PDF path. Default: <input stem>_text_sideways.pdf beside the input.
    #[arg(short, long, env = "SIDEWAYS_OUTPUT")]
    output: Option<PathBuf>,

    /// Title shown in each page header. Default: the input file stem.
    #[arg(long, env = "SIDEWAYS_TITLE")]
    title: Option<String>,

    /// Output paper size (portrait).
    #[arg(long, env = "SIDEWAYS_PAGE_SIZE", value_enum, default_value = "letter")]
    page_size: PageSizeArg,

    /// Which way to turn the text.
    #[arg(long, env = "SIDEWAYS_ROTATION", value_enum, default_value = "ccw")]
    rotation: RotationArg,

    /// Font size in points.
    #[arg(long, env = "SIDEWAYS_FONT_SIZE", default_value_t = 10.0)]
    font_size: f32,

    /// Baseline-to-baseline distance in points.
    #[arg(long, env = "SIDEWAYS_LEADING", default_value_t = 12.0)]
    leading: f32,

    /// Margin on every side, in points.
    #[arg(long, env = "SIDEWAYS_MARGIN", default_value_t = 43.2)]
    margin: f32,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "SIDEWAYS_PAGES", default_value = "all")]
    pages: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "SIDEWAYS_PASSWORD")]
    password: Option<String>,

    /// Print ConversionOutput as JSON instead of the confirmation line.
    #[arg(long, env = "SIDEWAYS_JSON")]
    json: bool,

    /// Print PDF metadata only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "SIDEWAYS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SIDEWAYS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SIDEWAYS_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PageSizeArg {
    Letter,
    A4,
    Legal,
}

impl From<PageSizeArg> for PageSize {
    fn from(v: PageSizeArg) -> Self {
        match v {
            PageSizeArg::Letter => PageSize::Letter,
            PageSizeArg::A4 => PageSize::A4,
            PageSizeArg::Legal => PageSize::Legal,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum RotationArg {
    /// Counter-clockwise: text reads bottom to top.
    Ccw,
    /// Clockwise: text reads top to bottom.
    Cw,
}

impl From<RotationArg> for Rotation {
    fn from(v: RotationArg) -> Self {
        match v {
            RotationArg::Ccw => Rotation::CounterClockwise,
            RotationArg::Cw => Rotation::Clockwise,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO logs would tear through the progress bar; keep them off while
    // it is shown.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Ensure PDFium engine is available ───────────────────────────────────
    // First run downloads the library from bblanchon/pdfium-binaries into
    //   ~/.cache/pdf-sideways/pdfium-{VERSION}/
    // Later runs only check the path.
    if !pdfium_auto::is_pdfium_cached() {
        if !cli.quiet {
            let dl_bar = ProgressBar::new(0);
            dl_bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.cyan} {prefix:.bold}  \
                     [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  ")
                .tick_strings(TICKS),
            );
            dl_bar.set_prefix("PDF engine");
            dl_bar.set_message("Connecting…");
            dl_bar.enable_steady_tick(Duration::from_millis(80));

            let bar = dl_bar.clone();
            tokio::task::block_in_place(|| {
                pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
                    if let Some(t) = total {
                        if bar.length().unwrap_or(0) != t {
                            bar.set_length(t);
                        }
                    }
                    bar.set_position(downloaded);
                }))
            })
            .context("Failed to download PDFium engine")?;

            dl_bar.finish_with_message("ready ✓");
        } else {
            tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
                .context("Failed to download PDFium engine")?;
        }
    }

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input, cli.password.as_deref())
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input.display());
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input));

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert(&cli.input, &output_path, &config)
        .await
        .context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        println!("Created: {}", output.output_path.display());
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .page_size(cli.page_size.into())
        .rotation(cli.rotation.into())
        .font_size(cli.font_size)
        .leading(cli.leading)
        .margin(cli.margin)
        .pages(parse_pages(&cli.pages)?);

    if let Some(ref title) = cli.title {
        builder = builder.title(title.clone());
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!(
                "Invalid page range '{}-{}': start must be <= end",
                start,
                end
            );
        }

        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .with_context(|| format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(&p) = pages.iter().find(|&&p| p < 1) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
        }

        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }

    Ok(PageSelection::Single(page))
}
