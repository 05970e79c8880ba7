//! # pdfium-auto
//!
//! Gets a usable [`Pdfium`] instance without asking the user to install
//! libpdfium by hand.
//!
//! Resolution order, first hit wins:
//!
//! 1. `PDFIUM_LIB_PATH` pointing at an existing library file.
//! 2. A previously downloaded copy in the cache directory
//!    (`{cache}/pdf-sideways/pdfium-{VERSION}/`, or
//!    `$PDFIUM_AUTO_CACHE_DIR/pdfium-{VERSION}/` when that is set).
//! 3. A fresh download of the platform archive from
//!    [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries),
//!    from which only the shared library is unpacked into the cache.
//!
//! ```rust,no_run
//! let pdfium = pdfium_auto::bind_pdfium(None)?;
//! let document = pdfium.create_new_pdf()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use pdfium_render::prelude::Pdfium;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Release tag of `bblanchon/pdfium-binaries` that gets downloaded.
pub const PDFIUM_VERSION: &str = "7690";

/// Environment variable naming an existing libpdfium to bind directly.
pub const LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Environment variable overriding the cache root.
pub const CACHE_DIR_ENV: &str = "PDFIUM_AUTO_CACHE_DIR";

const RELEASE_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

/// Download progress hook: `(bytes_so_far, content_length)`.
pub type ProgressFn<'a> = &'a dyn Fn(u64, Option<u64>);

#[derive(Error, Debug)]
pub enum PdfiumAutoError {
    #[error("No prebuilt PDFium for {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("Cannot prepare cache directory '{path}': {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("PDFium download failed: {0}")]
    Download(String),

    #[error("PDFium archive extraction failed: {0}")]
    Extract(String),

    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },
}

// ── Platform table ──────────────────────────────────────────────────────────

/// Where the shared library lives for one OS/arch pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    /// Release asset name, e.g. `pdfium-linux-x64.tgz`.
    pub archive: &'static str,
    /// Member path inside the archive.
    pub member: &'static str,
    /// File name written into the cache.
    pub file_name: &'static str,
}

const fn entry(archive: &'static str, file_name: &'static str, member: &'static str) -> Platform {
    Platform {
        archive,
        member,
        file_name,
    }
}

impl Platform {
    /// Look up the platform entry for an `(os, arch)` pair as reported by
    /// [`std::env::consts`].
    pub fn for_target(os: &str, arch: &str) -> Result<Self, PdfiumAutoError> {
        let platform = match (os, arch) {
            ("linux", "x86_64") => entry("pdfium-linux-x64.tgz", "libpdfium.so", "lib/libpdfium.so"),
            ("linux", "aarch64") => {
                entry("pdfium-linux-arm64.tgz", "libpdfium.so", "lib/libpdfium.so")
            }
            ("macos", "x86_64") => {
                entry("pdfium-mac-x64.tgz", "libpdfium.dylib", "lib/libpdfium.dylib")
            }
            ("macos", "aarch64") => {
                entry("pdfium-mac-arm64.tgz", "libpdfium.dylib", "lib/libpdfium.dylib")
            }
            ("windows", "x86_64") => entry("pdfium-win-x64.tgz", "pdfium.dll", "bin/pdfium.dll"),
            ("windows", "aarch64") => {
                entry("pdfium-win-arm64.tgz", "pdfium.dll", "bin/pdfium.dll")
            }
            ("windows", "x86") => entry("pdfium-win-x86.tgz", "pdfium.dll", "bin/pdfium.dll"),
            (os, arch) => {
                return Err(PdfiumAutoError::UnsupportedPlatform {
                    os: os.to_string(),
                    arch: arch.to_string(),
                })
            }
        };
        Ok(platform)
    }

    /// The platform this binary was compiled for.
    pub fn current() -> Result<Self, PdfiumAutoError> {
        Self::for_target(std::env::consts::OS, std::env::consts::ARCH)
    }

    fn download_url(&self) -> String {
        format!("{RELEASE_URL}/chromium%2F{PDFIUM_VERSION}/{}", self.archive)
    }
}

// ── Cache location ──────────────────────────────────────────────────────────

/// Versioned cache directory, honouring [`CACHE_DIR_ENV`].
pub fn pdfium_cache_dir() -> PathBuf {
    cache_dir_with_override(std::env::var_os(CACHE_DIR_ENV).map(PathBuf::from))
}

fn cache_dir_with_override(root_override: Option<PathBuf>) -> PathBuf {
    let versioned = format!("pdfium-{PDFIUM_VERSION}");
    match root_override {
        Some(root) => root.join(versioned),
        None => dirs::cache_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
            .unwrap_or_else(std::env::temp_dir)
            .join("pdf-sideways")
            .join(versioned),
    }
}

/// How the library path was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibrarySource {
    /// Taken from [`LIB_PATH_ENV`].
    Explicit(PathBuf),
    /// Already present in the cache.
    Cached(PathBuf),
    /// Fetched during this call.
    Downloaded(PathBuf),
}

impl LibrarySource {
    pub fn path(&self) -> &Path {
        match self {
            LibrarySource::Explicit(p) | LibrarySource::Cached(p) | LibrarySource::Downloaded(p) => p,
        }
    }
}

/// Path of a library that can be bound without touching the network.
pub fn cached_pdfium_path() -> Option<PathBuf> {
    explicit_library().or_else(|| {
        let platform = Platform::current().ok()?;
        let path = pdfium_cache_dir().join(platform.file_name);
        path.is_file().then_some(path)
    })
}

/// `true` when [`ensure_pdfium_library`] will not need to download.
pub fn is_pdfium_cached() -> bool {
    cached_pdfium_path().is_some()
}

fn explicit_library() -> Option<PathBuf> {
    let path = PathBuf::from(std::env::var_os(LIB_PATH_ENV)?);
    if path.is_file() {
        Some(path)
    } else {
        warn!(
            "{LIB_PATH_ENV}='{}' is not a file; falling back to the cache",
            path.display()
        );
        None
    }
}

static RESOLVED: OnceLock<PathBuf> = OnceLock::new();

/// Make sure a PDFium library exists locally and return where it is.
///
/// The result is memoised for the lifetime of the process.
pub fn ensure_pdfium_library(progress: Option<ProgressFn<'_>>) -> Result<PathBuf, PdfiumAutoError> {
    if let Some(path) = RESOLVED.get() {
        return Ok(path.clone());
    }
    let source = locate_or_fetch(progress)?;
    debug!("PDFium library: {:?}", source);
    let path = source.path().to_path_buf();
    let _ = RESOLVED.set(path.clone());
    Ok(path)
}

/// Resolve (downloading if needed) and bind in one step.
pub fn bind_pdfium(progress: Option<ProgressFn<'_>>) -> Result<Pdfium, PdfiumAutoError> {
    let path = ensure_pdfium_library(progress)?;
    bind_pdfium_from_path(&path)
}

/// Bind to a library at an explicit location; never downloads.
pub fn bind_pdfium_from_path(path: &Path) -> Result<Pdfium, PdfiumAutoError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| PdfiumAutoError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn locate_or_fetch(progress: Option<ProgressFn<'_>>) -> Result<LibrarySource, PdfiumAutoError> {
    if let Some(path) = explicit_library() {
        return Ok(LibrarySource::Explicit(path));
    }

    let platform = Platform::current()?;
    let dir = pdfium_cache_dir();
    let target = dir.join(platform.file_name);
    if target.is_file() {
        return Ok(LibrarySource::Cached(target));
    }

    std::fs::create_dir_all(&dir).map_err(|source| PdfiumAutoError::CacheDir {
        path: dir.clone(),
        source,
    })?;

    let url = platform.download_url();
    info!("Downloading PDFium {} from {}", PDFIUM_VERSION, url);
    let archive = fetch(&url, progress)?;
    unpack_member(&archive, platform.member, &target)?;
    info!("PDFium cached at {}", target.display());

    Ok(LibrarySource::Downloaded(target))
}

fn fetch(url: &str, progress: Option<ProgressFn<'_>>) -> Result<Vec<u8>, PdfiumAutoError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pdfium-auto/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| PdfiumAutoError::Download(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| PdfiumAutoError::Download(format!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(PdfiumAutoError::Download(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }

    let total = response.content_length();
    let mut body = Vec::with_capacity(total.unwrap_or(0) as usize);
    let mut buf = [0u8; 64 * 1024];
    loop {
        match response.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                body.extend_from_slice(&buf[..n]);
                if let Some(report) = progress {
                    report(body.len() as u64, total);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(PdfiumAutoError::Download(format!("read error: {e}"))),
        }
    }
    Ok(body)
}

/// Copy one member of a `.tgz` archive to `dest`.
///
/// The member is unpacked next to `dest` first and renamed into place, so a
/// half-written library never sits at the cached path.
fn unpack_member(archive: &[u8], member: &str, dest: &Path) -> Result<(), PdfiumAutoError> {
    let extract_err = |e: std::io::Error| PdfiumAutoError::Extract(e.to_string());

    let mut tar = tar::Archive::new(flate2::read::GzDecoder::new(archive));
    for entry in tar.entries().map_err(extract_err)? {
        let mut entry = entry.map_err(extract_err)?;
        let is_member = entry
            .path()
            .map_err(extract_err)?
            .to_string_lossy()
            .trim_start_matches("./")
            == member;
        if !is_member {
            continue;
        }

        let partial = dest.with_extension("part");
        entry.unpack(&partial).map_err(extract_err)?;
        std::fs::rename(&partial, dest).map_err(extract_err)?;
        return Ok(());
    }

    Err(PdfiumAutoError::Extract(format!(
        "'{member}' not present in archive"
    )))
}
