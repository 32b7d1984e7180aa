// PDF opening and text extraction

use crate::error::{ExtractError, PipelineError};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// An open document whose pages can be read in order.
///
/// The handle is released when the box is dropped.
pub trait Document {
    fn page_count(&self) -> usize;

    /// Plain text of the page at `index` (0-based).
    fn page_text(&self, index: usize) -> Result<String, ExtractError>;
}

/// Opens documents from disk.
pub trait DocumentOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn Document>, ExtractError>;
}

/// Opener backed by the `lopdf` parser.
#[derive(Debug, Default)]
pub struct LopdfOpener;

struct LopdfDocument {
    inner: lopdf::Document,
    /// Page numbers in reading order
    page_numbers: Vec<u32>,
}

impl DocumentOpener for LopdfOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn Document>, ExtractError> {
        let inner = lopdf::Document::load(path).map_err(ExtractError::Open)?;
        let page_numbers = inner.get_pages().keys().copied().collect();
        Ok(Box::new(LopdfDocument {
            inner,
            page_numbers,
        }))
    }
}

impl Document for LopdfDocument {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn page_text(&self, index: usize) -> Result<String, ExtractError> {
        let page_no = *self
            .page_numbers
            .get(index)
            .ok_or_else(|| ExtractError::Page {
                page: index + 1,
                message: "page does not exist".to_string(),
            })?;

        self.inner
            .extract_text(&[page_no])
            .map_err(|e| ExtractError::Page {
                page: index + 1,
                message: e.to_string(),
            })
    }
}

/// Full text of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub pages: usize,
}

/// Read every page of the PDF at `path`, each page followed by a newline.
///
/// Fails with [`PipelineError::NoText`] when the document has no
/// extractable text.
pub fn extract_text(opener: &dyn DocumentOpener, path: &Path) -> Result<ExtractedText, PipelineError> {
    let wrap = |source| PipelineError::Extraction {
        path: path.to_path_buf(),
        source,
    };

    let document = opener.open(path).map_err(wrap)?;
    let pages = document.page_count();
    log::debug!("{} has {} page(s)", path.display(), pages);

    let pb = ProgressBar::new(pages as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message("Pages processed");

    let mut text = String::new();
    for index in 0..pages {
        let page = document.page_text(index).map_err(|e| {
            pb.abandon();
            wrap(e)
        })?;
        text.push_str(&page);
        text.push('\n');
        pb.inc(1);
    }
    pb.finish_and_clear();
    drop(document);

    if text.trim().is_empty() {
        return Err(PipelineError::NoText {
            path: path.to_path_buf(),
        });
    }

    Ok(ExtractedText { text, pages })
}


#[cfg(test)]
mod tests {
    use super::testing::InMemoryOpener;
    use super::*;
    use crate::error::Stage;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};
    use tempfile::TempDir;

    fn write_pdf(path: &Path, pages: &[&str]) {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn test_pages_joined_with_newlines() {
        let opener = InMemoryOpener::new(&["Hello world.", "Second page."]);
        let extracted = extract_text(&opener, Path::new("book.pdf")).unwrap();
        assert_eq!(extracted.text, "Hello world.\nSecond page.\n");
        assert_eq!(extracted.pages, 2);
        assert_eq!(opener.open_handles(), 0);
    }

    #[test]
    fn test_blank_document_is_no_text() {
        let opener = InMemoryOpener::new(&["", "  \n"]);
        let err = extract_text(&opener, Path::new("blank.pdf")).unwrap_err();
        assert!(matches!(err, PipelineError::NoText { .. }));
        assert_eq!(opener.open_handles(), 0);
    }

    #[test]
    fn test_unreadable_page_is_typed_error_and_releases_handle() {
        let opener = InMemoryOpener::new(&["one", "two", "three"]).with_broken_page(1);
        let err = extract_text(&opener, Path::new("broken.pdf")).unwrap_err();
        assert_eq!(err.stage(), Stage::Extraction);
        match err {
            PipelineError::Extraction {
                source: ExtractError::Page { page, .. },
                ..
            } => assert_eq!(page, 2),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(opener.open_handles(), 0);
    }

    #[test]
    fn test_lopdf_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = extract_text(&LopdfOpener, &temp_dir.path().join("missing.pdf")).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Extraction {
                source: ExtractError::Open(_),
                ..
            }
        ));
    }

    #[test]
    fn test_lopdf_rejects_non_pdf() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.pdf");
        std::fs::write(&path, "just some text").unwrap();
        assert!(extract_text(&LopdfOpener, &path).is_err());
    }

    #[test]
    fn test_open_failure_keeps_parser_error_as_source() {
        use std::error::Error;

        let temp_dir = TempDir::new().unwrap();
        let err = extract_text(&LopdfOpener, &temp_dir.path().join("missing.pdf")).unwrap_err();

        let open = err.source().unwrap();
        assert_eq!(open.to_string(), "failed to open document");
        let parser = open.source().unwrap();
        assert!(parser.downcast_ref::<lopdf::Error>().is_some());
    }

    #[test]
    fn test_lopdf_reads_pages_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("two-pages.pdf");
        write_pdf(&path, &["Hello world.", "Second page."]);

        let extracted = extract_text(&LopdfOpener, &path).unwrap();
        assert_eq!(extracted.pages, 2);
        let first = extracted.text.find("Hello world.").unwrap();
        let second = extracted.text.find("Second page.").unwrap();
        assert!(first < second);
        assert!(extracted.text.ends_with('\n'));
    }
}
