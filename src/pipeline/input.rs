//! Input resolution: validate the source path before pdfium sees it.
//!
//! pdfium reports a missing file and a non-PDF the same opaque way, so the
//! path is checked up front and the `%PDF` magic bytes verified. Callers
//! get a meaningful error instead of a generic load failure.

use crate::error::SidewaysError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffix appended to the source stem for the default output name.
pub const OUTPUT_SUFFIX: &str = "_text_sideways.pdf";

/// Check that `path` is a readable file starting with `%PDF`.
pub fn resolve_input(path: impl AsRef<Path>) -> Result<PathBuf, SidewaysError> {
    let path = path.as_ref().to_path_buf();

    if !path.is_file() {
        return Err(SidewaysError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(SidewaysError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(SidewaysError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(SidewaysError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}

/// File stem of `path`, or `"document"` when it has none.
pub fn source_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "document".to_string())
}

/// `<stem>_text_sideways.pdf` in the same directory as `input`.
pub fn default_output_path(input: &Path) -> PathBuf {
    let name = format!("{}{}", source_stem(input), OUTPUT_SUFFIX);
    input.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_not_found() {
        let err = resolve_input("/definitely/not/here.pdf").unwrap_err();
        assert!(matches!(err, SidewaysError::FileNotFound { .. }));
    }

    #[test]
    fn directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_input(dir.path()).unwrap_err();
        assert!(matches!(err, SidewaysError::FileNotFound { .. }));
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"PK\x03\x04 not a pdf").unwrap();
        match resolve_input(f.path()).unwrap_err() {
            SidewaysError::NotAPdf { magic, .. } => assert_eq!(&magic, b"PK\x03\x04"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn pdf_magic_is_accepted() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%PDF-1.7\n").unwrap();
        assert_eq!(resolve_input(f.path()).unwrap(), f.path());
    }

    #[test]
    fn default_output_sits_beside_input() {
        assert_eq!(
            default_output_path(Path::new("/tmp/docs/Arithmetic Operators.pdf")),
            PathBuf::from("/tmp/docs/Arithmetic Operators_text_sideways.pdf")
        );
        assert_eq!(
            default_output_path(Path::new("notes.pdf")),
            PathBuf::from("notes_text_sideways.pdf")
        );
    }

    #[test]
    fn stem_falls_back_for_bare_roots() {
        assert_eq!(source_stem(Path::new("/")), "document");
        assert_eq!(source_stem(Path::new("report.v2.pdf")), "report.v2");
    }
}
