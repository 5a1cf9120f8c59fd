//! Raw text extraction, one implementation per file format.
//!
//! The index only ever sees the string an extractor returns. Which
//! extractor runs is decided by [`ExtractorRegistry`] from the file
//! extension, so a broken parser for one format cannot affect the others.

use crate::error::{DocSearchError, Result};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

pub trait TextExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Lowercase extensions (without the dot) this extractor handles.
    fn extensions(&self) -> &'static [&'static str];

    fn extract(&self, path: &Path) -> Result<String>;
}

/// UTF-8 text files. Invalid sequences are replaced rather than rejected.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &'static str { "text" }

    fn extensions(&self) -> &'static [&'static str] { &["txt"] }

    fn extract(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).map_err(|e| DocSearchError::extraction(path, e))?;
        let text = match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };
        Ok(text.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(text))
    }
}

pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn name(&self) -> &'static str { "pdf" }

    fn extensions(&self) -> &'static [&'static str] { &["pdf"] }

    fn extract(&self, path: &Path) -> Result<String> {
        pdf_extract::extract_text(path).map_err(|e| DocSearchError::extraction(path, e))
    }
}

/// Office Open XML documents: the body lives in `word/document.xml`.
pub struct DocxExtractor;

lazy_static! {
    // Field instructions and deleted revisions are not part of the visible text.
    static ref HIDDEN_RUN: Regex =
        Regex::new(r"(?s)<w:(?:instrText|delText)\b[^>]*>.*?</w:(?:instrText|delText)>").expect("valid regex");
    static ref PARAGRAPH_END: Regex = Regex::new(r"</w:p>|<w:br\s*/>|<w:cr\s*/>").expect("valid regex");
    static ref TAB: Regex = Regex::new(r"<w:tab\s*/>").expect("valid regex");
    static ref TAG: Regex = Regex::new(r"<[^>]*>").expect("valid regex");
    static ref ENTITY: Regex = Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|[a-z]+);").expect("valid regex");
}

impl DocxExtractor {
    fn document_xml(path: &Path) -> std::result::Result<String, String> {
        let file = File::open(path).map_err(|e| e.to_string())?;
        let mut archive = zip::ZipArchive::new(file).map_err(|e| e.to_string())?;
        let mut entry = archive.by_name("word/document.xml").map_err(|e| e.to_string())?;
        let mut xml = String::new();
        entry.read_to_string(&mut xml).map_err(|e| e.to_string())?;
        Ok(xml)
    }

    fn xml_to_text(xml: &str) -> String {
        let text = HIDDEN_RUN.replace_all(xml, "");
        let text = PARAGRAPH_END.replace_all(&text, "\n");
        let text = TAB.replace_all(&text, "\t");
        let text = TAG.replace_all(&text, "");
        ENTITY
            .replace_all(&text, |caps: &Captures| decode_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string()))
            .trim_end()
            .to_string()
    }
}

impl TextExtractor for DocxExtractor {
    fn name(&self) -> &'static str { "docx" }

    fn extensions(&self) -> &'static [&'static str] { &["docx"] }

    fn extract(&self, path: &Path) -> Result<String> {
        let xml = Self::document_xml(path).map_err(|e| DocSearchError::extraction(path, e))?;
        Ok(Self::xml_to_text(&xml))
    }
}

fn decode_entity(name: &str) -> Option<String> {
    let c = match name {
        "lt" => '<',
        "gt" => '>',
        "amp" => '&',
        "quot" => '"',
        "apos" => '\'',
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x") {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)?
        }
    };
    Some(c.to_string())
}

/// Extension-keyed lookup of extractors.
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    by_extension: HashMap<String, Arc<dyn TextExtractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the plain text, PDF and DOCX extractors.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(PlainTextExtractor);
        registry.register(PdfExtractor);
        registry.register(DocxExtractor);
        registry
    }

    /// Register `extractor` for all of its extensions, replacing any
    /// previous owner of those extensions.
    pub fn register<E: TextExtractor + 'static>(&mut self, extractor: E) {
        let extractor: Arc<dyn TextExtractor> = Arc::new(extractor);
        for ext in extractor.extensions() {
            self.by_extension.insert(ext.to_string(), Arc::clone(&extractor));
        }
    }

    pub fn get(&self, extension: &str) -> Option<&dyn TextExtractor> {
        self.by_extension.get(&extension.to_lowercase()).map(|e| e.as_ref())
    }

    pub fn supports(&self, path: &Path) -> bool {
        extension_of(path).map_or(false, |ext| self.get(&ext).is_some())
    }

    pub fn extract(&self, path: &Path) -> Result<String> {
        let extension = extension_of(path).unwrap_or_default();
        let extractor = self.get(&extension).ok_or_else(|| DocSearchError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: extension.clone(),
        })?;
        tracing::debug!(path = %path.display(), extractor = extractor.name(), "extracting");
        extractor.extract(path)
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension().and_then(|e| e.to_str()).map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_docx(path: &Path, body_xml: &str) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::FileOptions::default();
        zip.start_file("word/document.xml", options).unwrap();
        zip.write_all(body_xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn plain_text_is_read_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.TXT");
        fs::write(&path, "\u{feff}Cartea este pe masă").unwrap();
        let text = ExtractorRegistry::with_defaults().extract(&path).unwrap();
        assert_eq!(text, "Cartea este pe masă");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.txt");
        fs::write(&path, [b'm', b'a', 0xff, b's']).unwrap();
        let text = PlainTextExtractor.extract(&path).unwrap();
        assert!(text.starts_with("ma"));
        assert!(text.ends_with('s'));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let registry = ExtractorRegistry::with_defaults();
        let err = registry.extract(Path::new("poza.jpg")).unwrap_err();
        assert!(matches!(err, DocSearchError::UnsupportedFormat { ref extension, .. } if extension == "jpg"));
        let err = registry.extract(Path::new("Makefile")).unwrap_err();
        assert!(matches!(err, DocSearchError::UnsupportedFormat { .. }));
        assert!(!registry.supports(Path::new("poza.jpg")));
        assert!(registry.supports(Path::new("raport.PDF")));
    }

    #[test]
    fn missing_file_is_extraction_error() {
        let err = ExtractorRegistry::with_defaults().extract(Path::new("/nu/exista.txt")).unwrap_err();
        assert!(matches!(err, DocSearchError::Extraction { .. }));
    }

    #[test]
    fn docx_paragraphs_and_entities() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.docx");
        write_docx(
            &path,
            r#"<?xml version="1.0"?><w:document><w:body><w:p><w:r><w:t>Scaunul &amp; masa</w:t></w:r></w:p><w:p><w:r><w:t>în cameră</w:t><w:tab/><w:t>&#x219;i</w:t></w:r></w:p></w:body></w:document>"#,
        );
        let text = ExtractorRegistry::with_defaults().extract(&path).unwrap();
        assert_eq!(text, "Scaunul & masa\nîn cameră\tși");
    }

    #[test]
    fn docx_drops_field_codes_and_deleted_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("campuri.docx");
        write_docx(
            &path,
            r#"<w:document><w:body><w:p><w:r><w:instrText xml:space="preserve"> HYPERLINK "http://exemplu.ro" </w:instrText></w:r><w:r><w:t>legătură</w:t></w:r><w:del><w:r><w:delText>șters</w:delText></w:r></w:del><w:r><w:t> rămas</w:t></w:r></w:p></w:body></w:document>"#,
        );
        let text = DocxExtractor.extract(&path).unwrap();
        assert_eq!(text, "legătură rămas");
    }

    #[test]
    fn docx_without_body_is_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gol.docx");
        let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
        zip.start_file("other.xml", zip::write::FileOptions::default()).unwrap();
        zip.finish().unwrap();
        let err = DocxExtractor.extract(&path).unwrap_err();
        assert!(matches!(err, DocSearchError::Extraction { .. }));
    }

    #[test]
    fn later_registration_wins() {
        struct Upper;
        impl TextExtractor for Upper {
            fn name(&self) -> &'static str { "upper" }
            fn extensions(&self) -> &'static [&'static str] { &["txt"] }
            fn extract(&self, _path: &Path) -> Result<String> { Ok("UPPER".into()) }
        }
        let mut registry = ExtractorRegistry::with_defaults();
        registry.register(Upper);
        assert_eq!(registry.get("TXT").unwrap().name(), "upper");
        assert_eq!(registry.extract(Path::new("x.txt")).unwrap(), "UPPER");
    }
}
