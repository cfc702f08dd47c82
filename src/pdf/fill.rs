//! Writing values into AcroForm fields

use std::collections::HashMap;
use std::path::Path;

use lopdf::{Document, Object, ObjectId};
use serde::Serialize;

use crate::error::{Error, Result};
use super::fields::{encode_text_string, list_fields, widget_on_states, FieldType, FormField, FLAG_READ_ONLY};

/// Options for filling a form
#[derive(Debug, Clone, Default)]
pub struct FillOptions {
    /// Fail on unknown or read-only field names instead of reporting them
    pub strict: bool,
    /// Mark every filled field read-only
    pub lock_fields: bool,
}

/// What happened to each requested assignment
#[derive(Debug, Clone, Default, Serialize)]
pub struct FillReport {
    pub filled: Vec<String>,
    pub unknown: Vec<String>,
    pub read_only: Vec<String>,
    pub truncated: Vec<String>,
    /// Field types that cannot hold a plain value (signatures)
    pub unsupported: Vec<String>,
}

impl FillReport {
    /// Any assignment that did not land
    pub fn has_problems(&self) -> bool {
        !self.unknown.is_empty() || !self.read_only.is_empty() || !self.unsupported.is_empty()
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "yes" | "true" | "1" | "x" | "on" | "checked"
    )
}

/// Fill `assignments` (fully qualified name, value) into the document's form
///
/// Fields not named in `assignments` are left untouched. `/NeedAppearances`
/// is switched on so viewers rebuild the appearance of changed fields, and
/// any XFA packet is dropped so viewers render the AcroForm values.
pub fn fill_document(
    doc: &mut Document,
    assignments: &[(String, String)],
    options: &FillOptions,
) -> Result<FillReport> {
    let fields = list_fields(doc)?;
    let by_name: HashMap<&str, &FormField> = fields
        .iter()
        .map(|f| (f.full_name.as_str(), f))
        .collect();

    let mut report = FillReport::default();

    for (name, value) in assignments {
        let Some(field) = by_name.get(name.as_str()) else {
            if options.strict {
                return Err(Error::UnknownField(name.clone()));
            }
            log::warn!("No field named {} in template", name);
            report.unknown.push(name.clone());
            continue;
        };

        if field.is_read_only() {
            if options.strict {
                return Err(Error::ReadOnlyField(name.clone()));
            }
            log::warn!("Skipping read-only field {}", name);
            report.read_only.push(name.clone());
            continue;
        }

        match field.field_type {
            FieldType::Button => set_button(doc, field, value)?,
            FieldType::Signature => {
                log::warn!("Cannot fill signature field {}", name);
                report.unsupported.push(name.clone());
                continue;
            }
            FieldType::Text | FieldType::Choice | FieldType::Unknown => {
                if set_text(doc, field, value)? {
                    report.truncated.push(name.clone());
                }
            }
        }

        if options.lock_fields {
            let dict = doc.get_dictionary_mut(field.object_id)?;
            dict.set("Ff", Object::Integer((field.flags | FLAG_READ_ONLY) as i64));
        }

        log::debug!("{} = {:?}", name, value);
        report.filled.push(name.clone());
    }

    prepare_acroform(doc)?;

    log::info!(
        "Filled {} of {} fields ({} unknown, {} read-only)",
        report.filled.len(),
        assignments.len(),
        report.unknown.len(),
        report.read_only.len()
    );
    Ok(report)
}

/// Set a text or choice value; returns true if it was cut to /MaxLen
fn set_text(doc: &mut Document, field: &FormField, value: &str) -> Result<bool> {
    let (value, truncated) = match field.max_len {
        Some(max) if value.chars().count() > max => {
            log::warn!(
                "Truncating value for {} to {} characters",
                field.full_name,
                max
            );
            (value.chars().take(max).collect::<String>(), true)
        }
        _ => (value.to_string(), false),
    };

    doc.get_dictionary_mut(field.object_id)?
        .set("V", encode_text_string(&value));

    // Drop stale appearance streams so the viewer regenerates them
    for widget_id in &field.widget_ids {
        if let Ok(widget) = doc.get_dictionary_mut(*widget_id) {
            widget.remove(b"AP");
        }
    }

    Ok(truncated)
}

/// Select a checkbox/radio state
///
/// A value naming one of the field's on-states selects that state; any other
/// truthy value selects the first on-state; everything else turns it off.
fn set_button(doc: &mut Document, field: &FormField, value: &str) -> Result<()> {
    let state = if field.on_states.iter().any(|s| s == value) {
        value.to_string()
    } else if is_truthy(value) {
        field
            .on_states
            .first()
            .cloned()
            .unwrap_or_else(|| "Yes".to_string())
    } else {
        "Off".to_string()
    };

    doc.get_dictionary_mut(field.object_id)?
        .set("V", Object::Name(state.as_bytes().to_vec()));

    let widget_states: Vec<(ObjectId, Vec<String>)> = field
        .widget_ids
        .iter()
        .filter_map(|id| {
            doc.get_dictionary(*id)
                .ok()
                .map(|w| (*id, widget_on_states(doc, w)))
        })
        .collect();

    for (widget_id, states) in widget_states {
        let appearance = if states.contains(&state) { state.as_str() } else { "Off" };
        doc.get_dictionary_mut(widget_id)?
            .set("AS", Object::Name(appearance.as_bytes().to_vec()));
    }

    Ok(())
}

/// Turn on /NeedAppearances and remove /XFA from the AcroForm dictionary
fn prepare_acroform(doc: &mut Document) -> Result<()> {
    let root_id = doc.trailer.get(b"Root")?.as_reference()?;
    let acroform_ref = doc
        .get_dictionary(root_id)?
        .get(b"AcroForm")
        .map_err(|_| Error::NoAcroForm)?
        .clone();

    let acroform = match acroform_ref {
        Object::Reference(id) => doc.get_dictionary_mut(id)?,
        _ => doc
            .get_dictionary_mut(root_id)?
            .get_mut(b"AcroForm")?
            .as_dict_mut()?,
    };

    acroform.set("NeedAppearances", Object::Boolean(true));
    if acroform.remove(b"XFA").is_some() {
        log::info!("Removed XFA form data so AcroForm values are shown");
    }
    Ok(())
}

/// Serialize a document to bytes
pub fn save_to_bytes(doc: &mut Document) -> Result<Vec<u8>> {
    doc.compress();
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

/// Fill an in-memory template and return the filled PDF bytes
pub fn fill_template(
    template: &[u8],
    assignments: &[(String, String)],
    options: &FillOptions,
) -> Result<(Vec<u8>, FillReport)> {
    let mut doc = Document::load_mem(template)?;
    let report = fill_document(&mut doc, assignments, options)?;
    let bytes = save_to_bytes(&mut doc)?;
    Ok((bytes, report))
}

/// Fill a template file and save the result to `output`
pub fn fill_file(
    template: &Path,
    output: &Path,
    assignments: &[(String, String)],
    options: &FillOptions,
) -> Result<FillReport> {
    if !template.exists() {
        return Err(Error::FileNotFound(template.to_path_buf()));
    }

    let mut doc = Document::load(template)?;
    let report = fill_document(&mut doc, assignments, options)?;
    doc.compress();
    doc.save(output)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::FormKind;
    use crate::pdf::scaffold::build_template;

    fn template() -> Document {
        build_template(FormKind::F1040)
    }

    fn pair(name: &str, value: &str) -> (String, String) {
        (name.to_string(), value.to_string())
    }

    fn field<'a>(fields: &'a [FormField], name: &str) -> &'a FormField {
        fields.iter().find(|f| f.full_name == name).unwrap()
    }

    #[test]
    fn test_fill_text_and_leave_others() {
        let mut doc = template();
        let before = list_fields(&doc).unwrap();
        let target = before.iter().find(|f| f.field_type == FieldType::Text).unwrap().full_name.clone();

        let report = fill_document(&mut doc, &[pair(&target, "Ada")], &FillOptions::default()).unwrap();
        assert_eq!(report.filled, vec![target.clone()]);
        assert!(!report.has_problems());

        let after = list_fields(&doc).unwrap();
        assert_eq!(field(&after, &target).value.as_deref(), Some("Ada"));
        for f in after.iter().filter(|f| f.full_name != target) {
            assert_eq!(f.value, field(&before, &f.full_name).value, "{} changed", f.full_name);
        }

        let acroform = crate::pdf::fields::acroform(&doc).unwrap();
        assert!(matches!(acroform.get(b"NeedAppearances"), Ok(Object::Boolean(true))));
    }

    #[test]
    fn test_fill_unknown_field() {
        let mut doc = template();
        let report = fill_document(&mut doc, &[pair("nope", "x")], &FillOptions::default()).unwrap();
        assert_eq!(report.unknown, vec!["nope".to_string()]);
        assert!(report.has_problems());

        let strict = FillOptions { strict: true, ..Default::default() };
        let err = fill_document(&mut doc, &[pair("nope", "x")], &strict).unwrap_err();
        assert!(matches!(err, Error::UnknownField(name) if name == "nope"));
    }

    #[test]
    fn test_checkbox_states() {
        let mut doc = template();
        let fields = list_fields(&doc).unwrap();
        let checkbox = fields.iter().find(|f| f.field_type == FieldType::Button).unwrap().clone();

        fill_document(&mut doc, &[pair(&checkbox.full_name, "yes")], &FillOptions::default()).unwrap();
        let value = field(&list_fields(&doc).unwrap(), &checkbox.full_name).value.clone();
        assert_eq!(value.as_deref(), Some(checkbox.on_states[0].as_str()));
        let widget = doc.get_dictionary(checkbox.widget_ids[0]).unwrap();
        assert!(matches!(widget.get(b"AS"), Ok(Object::Name(n)) if n == checkbox.on_states[0].as_bytes()));

        fill_document(&mut doc, &[pair(&checkbox.full_name, "")], &FillOptions::default()).unwrap();
        let value = field(&list_fields(&doc).unwrap(), &checkbox.full_name).value.clone();
        assert_eq!(value.as_deref(), Some("Off"));
    }

    #[test]
    fn test_read_only_and_lock() {
        let mut doc = template();
        let target = list_fields(&doc)
            .unwrap()
            .into_iter()
            .find(|f| f.field_type == FieldType::Text)
            .unwrap()
            .full_name;

        let lock = FillOptions { lock_fields: true, ..Default::default() };
        fill_document(&mut doc, &[pair(&target, "first")], &lock).unwrap();
        assert!(field(&list_fields(&doc).unwrap(), &target).is_read_only());

        let report = fill_document(&mut doc, &[pair(&target, "second")], &FillOptions::default()).unwrap();
        assert_eq!(report.read_only, vec![target.clone()]);
        assert_eq!(field(&list_fields(&doc).unwrap(), &target).value.as_deref(), Some("first"));

        let strict = FillOptions { strict: true, ..Default::default() };
        assert!(matches!(
            fill_document(&mut doc, &[pair(&target, "third")], &strict),
            Err(Error::ReadOnlyField(_))
        ));
    }

    #[test]
    fn test_max_len_truncation() {
        let mut doc = template();
        let fields = list_fields(&doc).unwrap();
        let ssn = fields.iter().find(|f| f.max_len.is_some()).unwrap().clone();
        let max = ssn.max_len.unwrap();

        let long = "9".repeat(max + 5);
        let report = fill_document(&mut doc, &[pair(&ssn.full_name, &long)], &FillOptions::default()).unwrap();
        assert_eq!(report.truncated, vec![ssn.full_name.clone()]);

        let value = field(&list_fields(&doc).unwrap(), &ssn.full_name).value.clone().unwrap();
        assert_eq!(value.chars().count(), max);
    }

    #[test]
    fn test_fill_template_bytes_reload() {
        let mut doc = template();
        let bytes = save_to_bytes(&mut doc).unwrap();
        let target = list_fields(&doc)
            .unwrap()
            .into_iter()
            .find(|f| f.field_type == FieldType::Text)
            .unwrap()
            .full_name;

        let (filled, report) =
            fill_template(&bytes, &[pair(&target, "Zoë")], &FillOptions::default()).unwrap();
        assert_eq!(report.filled.len(), 1);

        let reloaded = Document::load_mem(&filled).unwrap();
        let fields = list_fields(&reloaded).unwrap();
        assert_eq!(field(&fields, &target).value.as_deref(), Some("Zoë"));
    }
}
