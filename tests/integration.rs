//! Integration tests for the tax form filler library

use lopdf::{Dictionary, Document, Object};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use taxform_filler::extract::{extract_fields, write_summary_csv};
use taxform_filler::forms::{FormKind, TaxRecord};
use taxform_filler::pdf::{
    build_template, count_pages, extract_metadata, fill_file, list_fields, save_to_bytes, FillOptions,
};
use taxform_filler::period::{parse_tax_period, TaxPeriod};
use taxform_filler::synth::SyntheticGenerator;
use taxform_filler::template::{load_template, TemplateSource};
use taxform_filler::workflow::{generate_filled, GenerateOptions};
use taxform_filler::Error;

/// Write an offline template for `kind` into `dir`
fn scaffold(dir: &Path, kind: FormKind) -> PathBuf {
    let path = dir.join(format!("{}-template.pdf", kind.slug()));
    let bytes = save_to_bytes(&mut build_template(kind)).expect("Failed to save template");
    std::fs::write(&path, bytes).expect("Failed to write template");
    path
}

fn formless_pdf(dir: &Path) -> PathBuf {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Kids", Object::Array(vec![]));
    pages.set("Count", Object::Integer(0));
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let path = dir.join("plain.pdf");
    doc.save(&path).expect("Failed to save plain PDF");
    path
}

#[tokio::test]
async fn test_scaffold_generate_extract_1040() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let template_path = scaffold(temp_dir.path(), FormKind::F1040);

    let template = load_template(&TemplateSource::Path(template_path))
        .await
        .expect("Failed to load template");

    let mut generator = SyntheticGenerator::seeded(2023);
    let options = GenerateOptions::new(TaxPeriod::year(2023));
    let generated = generate_filled(FormKind::F1040, &template, &mut generator, &options)
        .expect("Failed to generate");

    let output = temp_dir.path().join("f1040-filled.pdf");
    std::fs::write(&output, &generated.pdf_bytes).unwrap();

    // Output must re-open and carry the generated values
    let extracted = extract_fields(&output).expect("Failed to extract");
    let record = match &generated.record {
        TaxRecord::F1040(record) => record,
        other => panic!("unexpected record {:?}", other),
    };
    let digits: String = record.taxpayer.ssn.chars().filter(|c| c.is_ascii_digit()).collect();
    assert!(extracted.iter().any(|f| f.value == record.taxpayer.last_name));
    assert!(extracted.iter().any(|f| f.value == digits));
    assert_eq!(extracted.iter().filter(|f| f.field_type == "button").count(), 1);

    let metadata = extract_metadata(&output).unwrap();
    assert_eq!(metadata.page_count, 1);
    assert!(metadata.has_acroform);
    assert_eq!(metadata.filled_count, extracted.len());
}

#[tokio::test]
async fn test_quarterly_schedule_d_summary_csv() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let template_path = scaffold(temp_dir.path(), FormKind::F941ScheduleD);
    let template = std::fs::read(&template_path).unwrap();

    let period = parse_tax_period("2024-Q3").unwrap();
    let options = GenerateOptions::new(period);
    let mut generator = SyntheticGenerator::seeded(5);

    let mut outputs = Vec::new();
    for n in 1..=3 {
        let generated = generate_filled(FormKind::F941ScheduleD, &template, &mut generator, &options).unwrap();
        if let TaxRecord::F941ScheduleD(record) = &generated.record {
            assert!(record.transaction_date >= period.start_date());
            assert!(record.transaction_date <= period.end_date());
        }
        let path = temp_dir.path().join(format!("f941sd-filled-{:03}.pdf", n));
        std::fs::write(&path, &generated.pdf_bytes).unwrap();
        outputs.push(path);
    }

    let mut rows = Vec::new();
    for path in &outputs {
        rows.extend(extract_fields(path).unwrap());
    }

    let summary_path = temp_dir.path().join("form_processing_results.csv");
    write_summary_csv(&rows, std::fs::File::create(&summary_path).unwrap()).unwrap();

    let mut reader = csv::Reader::from_path(&summary_path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), vec!["File", "Field Name", "Value", "Type"]);
    let records: Vec<_> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), rows.len());
    assert!(records.iter().any(|r| &r[0] == "f941sd-filled-002.pdf"));
}

#[test]
fn test_fill_file_leaves_other_fields_alone() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let template_path = scaffold(temp_dir.path(), FormKind::F1040);
    let output = temp_dir.path().join("filled.pdf");

    let first_name = FormKind::F1040.field_specs()[4].candidates[0].to_string();
    let assignments = vec![
        (first_name.clone(), "José".to_string()),
        ("topmostSubform[0].Page1[0].nope[0]".to_string(), "x".to_string()),
    ];
    let report = fill_file(&template_path, &output, &assignments, &FillOptions::default()).unwrap();
    assert_eq!(report.filled, vec![first_name.clone()]);
    assert_eq!(report.unknown.len(), 1);

    let doc = Document::load(&output).unwrap();
    let fields = list_fields(&doc).unwrap();
    for field in &fields {
        if field.full_name == first_name {
            assert_eq!(field.value.as_deref(), Some("José"));
        } else {
            assert!(
                matches!(field.value.as_deref(), None | Some("Off")),
                "{} changed",
                field.full_name
            );
        }
    }
}

#[test]
fn test_strict_fill_rejects_unknown_field() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let template_path = scaffold(temp_dir.path(), FormKind::F1040);
    let output = temp_dir.path().join("filled.pdf");

    let options = FillOptions { strict: true, lock_fields: false };
    let assignments = vec![("missing".to_string(), "x".to_string())];
    let result = fill_file(&template_path, &output, &assignments, &options);
    assert!(matches!(result, Err(Error::UnknownField(name)) if name == "missing"));
    assert!(!output.exists());
}

#[test]
fn test_formless_pdf_is_reported() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let plain = formless_pdf(temp_dir.path());

    let doc = Document::load(&plain).unwrap();
    assert!(matches!(list_fields(&doc), Err(Error::NoAcroForm)));

    let output = temp_dir.path().join("out.pdf");
    let result = fill_file(&plain, &output, &[], &FillOptions::default());
    assert!(matches!(result, Err(Error::NoAcroForm)));

    let metadata = extract_metadata(&plain).unwrap();
    assert!(!metadata.has_acroform);
    assert_eq!(metadata.page_count, 0);
    assert!(count_pages(&plain).is_err());
}

#[test]
fn test_missing_template() {
    let result = fill_file(
        Path::new("/nonexistent/template.pdf"),
        Path::new("/nonexistent/out.pdf"),
        &[],
        &FillOptions::default(),
    );
    assert!(matches!(result, Err(Error::FileNotFound(_))));
}
