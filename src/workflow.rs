//! The generate action shared by the CLI and the web UI
//!
//! Generate a record, map it onto the template's fields, fill, and serialize.

use chrono::NaiveDate;
use lopdf::Document;
use rand::Rng;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::forms::{build_fill_plan, FormKind, TaxRecord};
use crate::pdf::fields::{list_fields, FormField};
use crate::pdf::fill::{fill_document, save_to_bytes, FillOptions, FillReport};
use crate::period::TaxPeriod;
use crate::synth::SyntheticGenerator;

/// Options for generating a filled form
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Tax year (and quarter, for 941 Schedule D) of the generated record
    pub period: TaxPeriod,
    /// Date printed next to the signature line
    pub signature_date: Option<NaiveDate>,
    pub fill: FillOptions,
}

impl GenerateOptions {
    pub fn new(period: TaxPeriod) -> Self {
        Self {
            period,
            signature_date: None,
            fill: FillOptions::default(),
        }
    }
}

/// A generated record and the PDF it was filled into
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedDocument {
    pub record: TaxRecord,
    #[serde(skip)]
    pub pdf_bytes: Vec<u8>,
    pub report: FillReport,
    /// Record keys the template has no field for
    pub unresolved: Vec<&'static str>,
}

/// Fill a fresh record into an already parsed template
///
/// `template` is cloned so one parse can serve many records.
pub fn generate_into<R: Rng>(
    kind: FormKind,
    template: &Document,
    fields: &[FormField],
    generator: &mut SyntheticGenerator<R>,
    options: &GenerateOptions,
) -> Result<GeneratedDocument> {
    let mut record = kind.generate(generator, options.period);
    record.set_signature_date(options.signature_date);

    let plan = build_fill_plan(&record, fields);
    let total = plan.assignments.len() + plan.unresolved.len();
    // Related IRS forms share field paths, so a few matches prove nothing
    if plan.assignments.len() * 2 < total {
        return Err(Error::InvalidTemplate(format!(
            "template matches only {} of {} {} fields",
            plan.assignments.len(),
            total,
            kind.display_name()
        )));
    }
    if options.fill.strict && !plan.unresolved.is_empty() {
        return Err(Error::UnknownField(plan.unresolved.join(", ")));
    }

    let mut doc = template.clone();
    let report = fill_document(&mut doc, &plan.pairs(), &options.fill)?;
    let pdf_bytes = save_to_bytes(&mut doc)?;

    log::info!("Generated {}: {}", kind, record.summary());
    Ok(GeneratedDocument {
        record,
        pdf_bytes,
        report,
        unresolved: plan.unresolved,
    })
}

/// Generate a record and fill it into a template given as PDF bytes
pub fn generate_filled<R: Rng>(
    kind: FormKind,
    template: &[u8],
    generator: &mut SyntheticGenerator<R>,
    options: &GenerateOptions,
) -> Result<GeneratedDocument> {
    let doc = Document::load_mem(template)?;
    let fields = list_fields(&doc)?;
    generate_into(kind, &doc, &fields, generator, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_from_document;
    use crate::pdf::fill::save_to_bytes;
    use crate::pdf::scaffold::build_template;

    fn template_bytes(kind: FormKind) -> Vec<u8> {
        save_to_bytes(&mut build_template(kind)).unwrap()
    }

    #[test]
    fn test_generate_fills_every_key() {
        for kind in FormKind::ALL {
            let template = template_bytes(kind);
            let mut gen = SyntheticGenerator::seeded(3);
            let options = GenerateOptions::new(TaxPeriod::year(2023));

            let generated = generate_filled(kind, &template, &mut gen, &options).unwrap();
            assert!(generated.unresolved.is_empty());
            assert!(!generated.report.has_problems());
            assert_eq!(generated.report.filled.len(), kind.field_specs().len());
            assert_eq!(generated.record.kind(), kind);

            let filled = Document::load_mem(&generated.pdf_bytes).unwrap();
            assert!(!extract_from_document(&filled, "out.pdf").unwrap().is_empty());
        }
    }

    #[test]
    fn test_same_seed_same_record() {
        let template = template_bytes(FormKind::F941ScheduleD);
        let options = GenerateOptions::new(TaxPeriod::year(2024));
        let a = generate_filled(FormKind::F941ScheduleD, &template, &mut SyntheticGenerator::seeded(9), &options)
            .unwrap();
        let b = generate_filled(FormKind::F941ScheduleD, &template, &mut SyntheticGenerator::seeded(9), &options)
            .unwrap();
        assert_eq!(a.record, b.record);
    }

    #[test]
    fn test_signature_date_written() {
        let template = template_bytes(FormKind::F1040);
        let mut options = GenerateOptions::new(TaxPeriod::year(2023));
        options.signature_date = NaiveDate::from_ymd_opt(2024, 4, 15);

        let generated =
            generate_filled(FormKind::F1040, &template, &mut SyntheticGenerator::seeded(1), &options).unwrap();
        let filled = Document::load_mem(&generated.pdf_bytes).unwrap();
        let fields = extract_from_document(&filled, "out.pdf").unwrap();
        assert!(fields.iter().any(|f| f.value == "04/15/2024"));
    }

    #[test]
    fn test_other_form_template_rejected() {
        let options = GenerateOptions::new(TaxPeriod::year(2023));
        for (kind, template_kind) in [
            (FormKind::F1040, FormKind::F941ScheduleD),
            (FormKind::F941ScheduleD, FormKind::F1040),
        ] {
            let template = template_bytes(template_kind);
            let result = generate_filled(kind, &template, &mut SyntheticGenerator::seeded(1), &options);
            assert!(
                matches!(result, Err(Error::InvalidTemplate(_))),
                "{} accepted a {} template",
                kind,
                template_kind
            );
        }
    }

    #[test]
    fn test_partial_template_still_fills() {
        // Drop a few fields from the form; the rest should still be filled
        let doc = build_template(FormKind::F941ScheduleD);
        let dropped: Vec<&str> = FormKind::F941ScheduleD.field_specs()[..3]
            .iter()
            .map(|spec| spec.candidates[0])
            .collect();
        let fields: Vec<FormField> = list_fields(&doc)
            .unwrap()
            .into_iter()
            .filter(|f| !dropped.contains(&f.full_name.as_str()))
            .collect();
        let options = GenerateOptions::new(TaxPeriod::year(2023));

        let generated =
            generate_into(FormKind::F941ScheduleD, &doc, &fields, &mut SyntheticGenerator::seeded(2), &options)
                .unwrap();
        assert_eq!(generated.unresolved, vec!["filer_ein", "filer_name", "tax_year"]);
        assert_eq!(generated.report.filled.len(), fields.len());
    }

    #[test]
    fn test_strict_rejects_unresolved_keys() {
        let doc = build_template(FormKind::F1040);
        let dropped = FormKind::F1040.field_specs()[0].candidates[0];
        let fields: Vec<FormField> = list_fields(&doc)
            .unwrap()
            .into_iter()
            .filter(|f| f.full_name != dropped)
            .collect();
        let mut options = GenerateOptions::new(TaxPeriod::year(2023));
        options.fill.strict = true;

        let result = generate_into(FormKind::F1040, &doc, &fields, &mut SyntheticGenerator::seeded(2), &options);
        assert!(matches!(result, Err(Error::UnknownField(_))));
    }

    #[test]
    fn test_no_acroform() {
        let mut doc = Document::with_version("1.7");
        let mut catalog = lopdf::Dictionary::new();
        catalog.set("Type", lopdf::Object::Name(b"Catalog".to_vec()));
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", lopdf::Object::Reference(catalog_id));
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();

        let options = GenerateOptions::new(TaxPeriod::year(2023));
        let result = generate_filled(FormKind::F1040, &bytes, &mut SyntheticGenerator::seeded(1), &options);
        assert!(matches!(result, Err(Error::NoAcroForm)));
    }
}
