//! PDF metadata extraction

use std::path::Path;
use lopdf::{Document, Object};
use crate::error::{Error, Result};
use super::fields::{decode_text_string, list_fields, resolve, FieldType};

/// Count pages by reading the Count field from the Pages dictionary
/// This is more reliable than get_pages() which doesn't handle nested page trees
fn count_pages_from_catalog(doc: &Document) -> Result<usize> {
    let catalog_id = doc.trailer.get(b"Root")
        .and_then(|root| root.as_reference())
        .map_err(|_| Error::General("Root is missing or not a reference".to_string()))?;

    let pages = doc.get_dictionary(catalog_id)?
        .get(b"Pages")
        .map_err(|_| Error::General("No Pages in catalog".to_string()))?;

    let pages_dict = resolve(doc, pages)?
        .as_dict()
        .map_err(|_| Error::General("Pages is not a dictionary".to_string()))?;

    match pages_dict.get(b"Count") {
        Ok(Object::Integer(n)) => Ok(*n as usize),
        _ => Err(Error::General("Count is missing or not an integer".to_string())),
    }
}

/// Summary of a PDF form document
#[derive(Debug, Clone)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
    /// Whether the catalog carries an interactive form
    pub has_acroform: bool,
    /// Number of terminal form fields
    pub field_count: usize,
    /// Fields that currently hold a value
    pub filled_count: usize,
}

fn info_string(doc: &Document, key: &[u8]) -> Option<String> {
    let info = doc.trailer.get(b"Info").ok()?;
    let info = resolve(doc, info).ok()?.as_dict().ok()?;
    match resolve(doc, info.get(key).ok()?).ok()? {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        _ => None,
    }
}

/// Extract metadata from a PDF file
pub fn extract_metadata(path: &Path) -> Result<PdfMetadata> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    metadata_from_document(&doc)
}

/// Extract metadata from an already loaded document
pub fn metadata_from_document(doc: &Document) -> Result<PdfMetadata> {
    let page_count = count_pages_from_catalog(doc)?;

    let (has_acroform, field_count, filled_count) = match list_fields(doc) {
        Ok(fields) => {
            let filled = fields
                .iter()
                .filter(|f| match f.value.as_deref().map(str::trim) {
                    Some("") | None => false,
                    Some("Off") => f.field_type != FieldType::Button,
                    Some(_) => true,
                })
                .count();
            (true, fields.len(), filled)
        }
        Err(Error::NoAcroForm) => (false, 0, 0),
        Err(e) => return Err(e),
    };

    Ok(PdfMetadata {
        page_count,
        title: info_string(doc, b"Title"),
        author: info_string(doc, b"Author"),
        has_acroform,
        field_count,
        filled_count,
    })
}

/// Count the number of pages in a PDF file
///
/// This is a quick operation that reads the Count field from the Pages dictionary.
pub fn count_pages(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    let page_count = count_pages_from_catalog(&doc)?;

    if page_count == 0 {
        return Err(Error::General(format!("PDF has no pages: {}", path.display())));
    }

    Ok(page_count)
}
