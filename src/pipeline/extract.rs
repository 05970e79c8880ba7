//! Text extraction: one plain-text blob per source page.
//!
//! [`TextSource`] is the seam between the pipeline and whatever produces
//! page text. [`PdfiumTextSource`] is the production implementation backed
//! by pdfium's text layer; tests substitute in-memory sources.

use crate::error::{PageError, SidewaysError};
use crate::output::DocumentMetadata;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Produces the text of each source page, by 0-based index.
pub trait TextSource {
    /// Number of pages in the source document.
    fn page_count(&self) -> usize;

    /// Text of page `index`, unnormalised.
    ///
    /// A page without a text layer returns `Ok(String::new())`; `Err` is
    /// reserved for pages that could not be read at all. The pipeline
    /// treats both the same way: the page is converted as empty.
    fn extract_page_text(&mut self, index: usize) -> Result<String, PageError>;
}

/// Clean up extracted text before it is reflowed: tabs become spaces and
/// surrounding whitespace of the whole blob is trimmed.
pub fn normalize_extracted(text: &str) -> String {
    text.replace('\t', " ").trim().to_string()
}

/// [`TextSource`] reading a PDF through pdfium.
pub struct PdfiumTextSource<'a> {
    document: PdfDocument<'a>,
}

impl<'a> PdfiumTextSource<'a> {
    /// Open `path`, mapping pdfium load failures to fatal errors.
    pub fn open(
        pdfium: &'a Pdfium,
        path: &Path,
        password: Option<&'a str>,
    ) -> Result<Self, SidewaysError> {
        let document = load_document(pdfium, path, password)?;
        info!("PDF loaded: {} pages", document.pages().len());
        Ok(Self { document })
    }

    pub fn metadata(&self) -> DocumentMetadata {
        read_metadata(&self.document)
    }
}

impl TextSource for PdfiumTextSource<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn extract_page_text(&mut self, index: usize) -> Result<String, PageError> {
        let failed = |detail: String| PageError::ExtractionFailed {
            page: index + 1,
            detail,
        };

        let page_index = u16::try_from(index)
            .map_err(|_| failed(format!("page index {index} exceeds pdfium's limit")))?;
        let page = self
            .document
            .pages()
            .get(page_index)
            .map_err(|e| failed(format!("{e:?}")))?;
        let text = page.text().map_err(|e| failed(format!("{e:?}")))?.all();

        debug!("Extracted page {} → {} chars", index + 1, text.chars().count());
        Ok(text)
    }
}

/// Open a PDF, distinguishing password problems from corruption.
///
/// pdfium keeps the password borrowed for as long as the document is open.
pub(crate) fn load_document<'a>(
    pdfium: &'a Pdfium,
    path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, SidewaysError> {
    pdfium.load_pdf_from_file(path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                SidewaysError::WrongPassword {
                    path: path.to_path_buf(),
                }
            } else {
                SidewaysError::PasswordRequired {
                    path: path.to_path_buf(),
                }
            }
        } else {
            SidewaysError::CorruptPdf {
                path: path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

pub(crate) fn read_metadata(document: &PdfDocument<'_>) -> DocumentMetadata {
    let metadata = document.metadata();
    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata
            .get(tag)
            .map(|t| t.value().to_string())
            .filter(|v| !v.is_empty())
    };

    DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    }
}
