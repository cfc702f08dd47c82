//! Key/value extraction from filled forms

use std::io::Write;
use std::path::Path;

use lopdf::Document;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::pdf::fields::{list_fields, FieldType};

/// Default summary table filename
pub const DEFAULT_SUMMARY_FILE: &str = "form_processing_results.csv";

/// One filled field of one document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedField {
    pub file: String,
    pub name: String,
    pub value: String,
    pub field_type: String,
}

/// Collect every field of a document that holds a value
///
/// Empty values and unchecked buttons (`Off`) are skipped. A text field
/// holding the word `Off` is a real value and is kept.
pub fn extract_from_document(doc: &Document, file: &str) -> Result<Vec<ExtractedField>> {
    let fields = list_fields(doc)?
        .into_iter()
        .filter_map(|field| {
            let value = field.value?.trim().to_string();
            if value.is_empty() || (field.field_type == FieldType::Button && value == "Off") {
                return None;
            }
            Some(ExtractedField {
                file: file.to_string(),
                name: field.full_name,
                value,
                field_type: field.field_type.as_str().to_string(),
            })
        })
        .collect();
    Ok(fields)
}

/// Collect every filled field of a PDF file
pub fn extract_fields(path: &Path) -> Result<Vec<ExtractedField>> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let fields = extract_from_document(&doc, &file)?;
    log::debug!("{}: {} filled fields", file, fields.len());
    Ok(fields)
}

/// Write the summary table as CSV
pub fn write_summary_csv<W: Write>(fields: &[ExtractedField], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["File", "Field Name", "Value", "Type"])?;
    for field in fields {
        csv.write_record([&field.file, &field.name, &field.value, &field.field_type])?;
    }
    csv.flush()?;
    Ok(())
}

/// Write the summary as a pretty-printed JSON array
pub fn write_summary_json<W: Write>(fields: &[ExtractedField], mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, fields)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::FormKind;
    use crate::pdf::fill::{fill_document, FillOptions};
    use crate::pdf::scaffold::build_template;

    fn filled_1040() -> Document {
        let mut doc = build_template(FormKind::F1040);
        let specs = FormKind::F1040.field_specs();
        let assignments = vec![
            (specs[0].candidates[0].to_string(), "Yes".to_string()),
            (specs[4].candidates[0].to_string(), "Ada".to_string()),
            (specs[5].candidates[0].to_string(), "Lovelace".to_string()),
        ];
        fill_document(&mut doc, &assignments, &FillOptions::default()).unwrap();
        doc
    }

    #[test]
    fn test_only_filled_fields_extracted() {
        let fields = extract_from_document(&filled_1040(), "f1040.pdf").unwrap();
        assert_eq!(fields.len(), 3);
        assert!(fields.iter().any(|f| f.value == "Ada" && f.field_type == "text"));
        assert!(fields.iter().any(|f| f.value == "Yes" && f.field_type == "button"));
        assert!(fields.iter().all(|f| f.file == "f1040.pdf"));
    }

    #[test]
    fn test_text_field_reading_off_is_kept() {
        let mut doc = build_template(FormKind::F1040);
        let last_name = FormKind::F1040.field_specs()[5].candidates[0].to_string();
        fill_document(&mut doc, &[(last_name.clone(), "Off".to_string())], &FillOptions::default()).unwrap();

        let fields = extract_from_document(&doc, "f1040.pdf").unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, last_name);
        assert_eq!(fields[0].value, "Off");
        assert_eq!(fields[0].field_type, "text");
    }

    #[test]
    fn test_blank_template_has_nothing() {
        let doc = build_template(FormKind::F941ScheduleD);
        assert!(extract_from_document(&doc, "blank.pdf").unwrap().is_empty());
    }

    #[test]
    fn test_csv_summary() {
        let fields = vec![ExtractedField {
            file: "a.pdf".to_string(),
            name: "form.name".to_string(),
            value: "Smith, Jane".to_string(),
            field_type: "text".to_string(),
        }];
        let mut out = Vec::new();
        write_summary_csv(&fields, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "File,Field Name,Value,Type\na.pdf,form.name,\"Smith, Jane\",text\n");
    }

    #[test]
    fn test_json_summary() {
        let fields = extract_from_document(&filled_1040(), "f1040.pdf").unwrap();
        let mut out = Vec::new();
        write_summary_json(&fields, &mut out).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 3);
        assert_eq!(parsed[0]["file"], "f1040.pdf");
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            extract_fields(Path::new("/nonexistent/filled.pdf")),
            Err(Error::FileNotFound(_))
        ));
    }
}
