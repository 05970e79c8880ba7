//! Configuration for a sideways conversion.
//!
//! Every layout and selection knob lives in [`ConversionConfig`], built via
//! [`ConversionConfigBuilder`]. The defaults reproduce the classic handout
//! layout: US Letter portrait, 0.6 in margins, Helvetica 10 pt on 12 pt
//! leading, text turned counter-clockwise.

use crate::error::SidewaysError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Points per inch.
pub const POINTS_PER_INCH: f32 = 72.0;

/// Average glyph advance as a fraction of the font size.
///
/// Used instead of real font metrics when estimating how many characters
/// fit on a line, so wrapping is approximate.
pub const CHAR_WIDTH_FACTOR: f32 = 0.55;

/// `max_chars` never drops below this, however small the frame.
pub const MIN_LINE_CHARS: usize = 20;

/// Default margin on every side: 0.6 in.
pub const DEFAULT_MARGIN: f32 = 0.6 * POINTS_PER_INCH;
pub const DEFAULT_FONT_SIZE: f32 = 10.0;
pub const DEFAULT_LEADING: f32 = 12.0;

/// Configuration for a PDF → sideways-text PDF conversion.
///
/// # Example
/// ```rust
/// use pdf_sideways::{ConversionConfig, PageSize, Rotation};
///
/// let config = ConversionConfig::builder()
///     .page_size(PageSize::A4)
///     .rotation(Rotation::Clockwise)
///     .font_size(9.0)
///     .build()
///     .unwrap();
/// assert!(config.budget().max_chars > 100);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Output page size (always portrait). Default: US Letter.
    pub page_size: PageSize,

    /// Which way the text is turned. Default: counter-clockwise.
    pub rotation: Rotation,

    /// Font size in points. Default: 10.
    pub font_size: f32,

    /// Baseline-to-baseline distance in points. Default: 12.
    pub leading: f32,

    /// Margin applied to all four sides of the rotated frame, in points.
    /// Default: 43.2 (0.6 in).
    pub margin: f32,

    /// Title used in each page header. `None` uses the source file stem.
    pub title: Option<String>,

    /// Source pages to convert. Default: all.
    pub pages: PageSelection,

    /// User password for encrypted sources.
    pub password: Option<String>,

    /// Receives per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::default(),
            rotation: Rotation::default(),
            font_size: DEFAULT_FONT_SIZE,
            leading: DEFAULT_LEADING,
            margin: DEFAULT_MARGIN,
            title: None,
            pages: PageSelection::default(),
            password: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("page_size", &self.page_size)
            .field("rotation", &self.rotation)
            .field("font_size", &self.font_size)
            .field("leading", &self.leading)
            .field("margin", &self.margin)
            .field("title", &self.title)
            .field("pages", &self.pages)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Width and height of the rotated frame: the portrait page turned on
    /// its side, so width is the page height and height the page width.
    pub fn frame(&self) -> (f32, f32) {
        let (w, h) = self.page_size.dimensions();
        (h, w)
    }

    /// Usable width and height of the rotated frame after margins.
    pub fn usable_area(&self) -> (f32, f32) {
        let (fw, fh) = self.frame();
        (fw - 2.0 * self.margin, fh - 2.0 * self.margin)
    }

    /// Character and line budget derived from the layout constants.
    pub fn budget(&self) -> Budget {
        let (usable_w, usable_h) = self.usable_area();
        Budget::from_layout(usable_w, usable_h, self.font_size, self.leading)
    }
}

/// Builder for [`ConversionConfig`].
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl fmt::Debug for ConversionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ConversionConfigBuilder {
    pub fn page_size(mut self, size: PageSize) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.config.rotation = rotation;
        self
    }

    pub fn font_size(mut self, pt: f32) -> Self {
        self.config.font_size = pt;
        self
    }

    pub fn leading(mut self, pt: f32) -> Self {
        self.config.leading = pt;
        self
    }

    pub fn margin(mut self, pt: f32) -> Self {
        self.config.margin = pt;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, rejecting layouts that leave no room for text.
    pub fn build(self) -> Result<ConversionConfig, SidewaysError> {
        let c = &self.config;
        if !(c.font_size.is_finite() && c.font_size > 0.0) {
            return Err(SidewaysError::InvalidConfig(format!(
                "font size must be > 0, got {}",
                c.font_size
            )));
        }
        if !(c.leading.is_finite() && c.leading > 0.0) {
            return Err(SidewaysError::InvalidConfig(format!(
                "leading must be > 0, got {}",
                c.leading
            )));
        }
        if !(c.margin.is_finite() && c.margin >= 0.0) {
            return Err(SidewaysError::InvalidConfig(format!(
                "margin must be ≥ 0, got {}",
                c.margin
            )));
        }
        let (usable_w, usable_h) = c.usable_area();
        if usable_w <= 0.0 || usable_h <= 0.0 {
            let (fw, fh) = c.frame();
            return Err(SidewaysError::InvalidConfig(format!(
                "margin {} leaves no room on a {}×{} pt frame",
                c.margin, fw, fh
            )));
        }
        Ok(self.config)
    }
}

// ── Budget ───────────────────────────────────────────────────────────────

/// How much text one output page holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Characters per line, estimated from the average glyph width.
    pub max_chars: usize,
    /// Lines per output page.
    pub max_lines: usize,
}

impl Budget {
    /// Derive the budget from usable frame dimensions and type settings.
    ///
    /// `max_chars = max(20, ⌊usable_w / (font_size × 0.55)⌋)` and
    /// `max_lines = max(1, ⌊usable_h / leading⌋)`.
    pub fn from_layout(usable_w: f32, usable_h: f32, font_size: f32, leading: f32) -> Self {
        let chars = (usable_w / (font_size * CHAR_WIDTH_FACTOR)).floor();
        let lines = (usable_h / leading).floor();
        Self {
            max_chars: (chars.max(0.0) as usize).max(MIN_LINE_CHARS),
            max_lines: (lines.max(0.0) as usize).max(1),
        }
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Portrait output page size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PageSize {
    /// 8.5 × 11 in (612 × 792 pt). (default)
    #[default]
    Letter,
    /// 8.5 × 14 in (612 × 1008 pt).
    Legal,
    /// 210 × 297 mm (595 × 842 pt).
    A4,
    /// Arbitrary portrait size in points (width, height).
    Custom(f32, f32),
}

impl PageSize {
    /// `(width, height)` in points.
    pub fn dimensions(&self) -> (f32, f32) {
        match self {
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::A4 => (595.0, 842.0),
            PageSize::Custom(w, h) => (*w, *h),
        }
    }
}

/// Direction the text is turned on the portrait page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    /// Text reads bottom-to-top; turn the sheet clockwise to read it. (default)
    #[default]
    CounterClockwise,
    /// Text reads top-to-bottom; turn the sheet counter-clockwise to read it.
    Clockwise,
}

/// Which source pages to convert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum PageSelection {
    /// Every page (default).
    #[default]
    All,
    /// A single page (1-indexed).
    Single(usize),
    /// A contiguous range (1-indexed, inclusive).
    Range(usize, usize),
    /// Specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand into sorted, deduplicated 0-indexed page numbers, dropping any
    /// that fall outside `0..total_pages`.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// First requested page (1-indexed) lying outside a `total_pages`
    /// document, if any.
    pub fn first_out_of_range(&self, total_pages: usize) -> Option<usize> {
        let outside = |p: usize| p == 0 || p > total_pages;
        match self {
            PageSelection::All => None,
            PageSelection::Single(p) => Some(*p).filter(|&p| outside(p)),
            PageSelection::Range(start, end) => [*start, *end].into_iter().find(|&p| outside(p)),
            PageSelection::Set(pages) => pages.iter().copied().find(|&p| outside(p)),
        }
    }
}
