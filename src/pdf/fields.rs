//! AcroForm field inspection
//!
//! Walks the interactive form tree (ISO 32000-1, 12.7) and flattens it into
//! terminal fields with fully qualified names.

use std::collections::HashSet;

use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use serde::Serialize;

use crate::error::{Error, Result};

/// Field flag bit 1: the field may not be changed
pub const FLAG_READ_ONLY: u32 = 1;

/// Field type from the /FT key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Button,
    Choice,
    Signature,
    Unknown,
}

impl FieldType {
    fn from_name(name: &[u8]) -> Self {
        match name {
            b"Tx" => FieldType::Text,
            b"Btn" => FieldType::Button,
            b"Ch" => FieldType::Choice,
            b"Sig" => FieldType::Signature,
            _ => FieldType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Button => "button",
            FieldType::Choice => "choice",
            FieldType::Signature => "signature",
            FieldType::Unknown => "unknown",
        }
    }
}

/// A terminal form field
#[derive(Debug, Clone, Serialize)]
pub struct FormField {
    /// Fully qualified name (`parent.child.leaf`)
    pub full_name: String,
    /// The field's own /T
    pub partial_name: String,
    pub field_type: FieldType,
    /// Current value (/V), decoded
    pub value: Option<String>,
    /// Alternate description shown as a tooltip (/TU)
    pub tooltip: Option<String>,
    /// Field flags (/Ff)
    pub flags: u32,
    /// Maximum text length (/MaxLen)
    pub max_len: Option<usize>,
    /// Appearance state names other than `Off`, for buttons
    pub on_states: Vec<String>,
    #[serde(skip)]
    pub object_id: ObjectId,
    /// Widget annotations that display this field (may include the field itself)
    #[serde(skip)]
    pub widget_ids: Vec<ObjectId>,
}

impl FormField {
    pub fn is_read_only(&self) -> bool {
        self.flags & FLAG_READ_ONLY != 0
    }

    /// Last dotted segment of the fully qualified name
    pub fn terminal_name(&self) -> &str {
        terminal_segment(&self.full_name)
    }
}

/// Last dotted segment of a field name
pub fn terminal_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Attributes a field inherits from its ancestors
#[derive(Clone, Default)]
struct Inherited {
    name: Option<String>,
    field_type: Option<Vec<u8>>,
    flags: Option<u32>,
    max_len: Option<usize>,
    value: Option<String>,
}

/// Resolve a possibly indirect object
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object> {
    match obj {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

/// Locate the catalog's /AcroForm dictionary
pub(crate) fn acroform(doc: &Document) -> Result<&Dictionary> {
    let root_id = doc.trailer.get(b"Root")?.as_reference()?;
    let catalog = doc.get_dictionary(root_id)?;
    let acroform = catalog.get(b"AcroForm").map_err(|_| Error::NoAcroForm)?;
    resolve(doc, acroform)?.as_dict().map_err(|_| Error::NoAcroForm)
}

/// Decode a PDF text string
///
/// UTF-16BE with a byte order mark and UTF-8 with a BOM are honored; anything
/// else is read as PDFDocEncoding, treated as its Latin-1 subset.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// Encode a text string: literal for ASCII, UTF-16BE hex otherwise
pub fn encode_text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn text_entry(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok().and_then(|o| resolve(doc, o).ok())? {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        _ => None,
    }
}

fn value_entry(doc: &Document, dict: &Dictionary) -> Option<String> {
    match dict.get(b"V").ok().and_then(|o| resolve(doc, o).ok())? {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        Object::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Object::String(bytes, _) => Some(decode_text_string(bytes)),
                    Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
                    _ => None,
                })
                .collect();
            Some(parts.join(", "))
        }
        _ => None,
    }
}

fn integer_entry(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<i64> {
    dict.get(key).ok().and_then(|o| resolve(doc, o).ok())?.as_i64().ok()
}

/// Appearance state names under /AP /N, excluding `Off`
pub(crate) fn widget_on_states(doc: &Document, widget: &Dictionary) -> Vec<String> {
    let normal = widget
        .get(b"AP")
        .ok()
        .and_then(|ap| resolve(doc, ap).ok())
        .and_then(|ap| ap.as_dict().ok())
        .and_then(|ap| ap.get(b"N").ok())
        .and_then(|n| resolve(doc, n).ok())
        .and_then(|n| n.as_dict().ok());

    match normal {
        Some(states) => states
            .iter()
            .map(|(name, _)| String::from_utf8_lossy(name).into_owned())
            .filter(|name| name != "Off")
            .collect(),
        None => Vec::new(),
    }
}

fn is_widget(dict: &Dictionary) -> bool {
    matches!(dict.get(b"Subtype"), Ok(Object::Name(name)) if name == b"Widget")
}

fn kid_ids(dict: &Dictionary) -> Vec<ObjectId> {
    match dict.get(b"Kids") {
        Ok(Object::Array(kids)) => kids.iter().filter_map(|k| k.as_reference().ok()).collect(),
        _ => Vec::new(),
    }
}

/// List every terminal field in the document's AcroForm
pub fn list_fields(doc: &Document) -> Result<Vec<FormField>> {
    let acroform = acroform(doc)?;
    let roots: Vec<ObjectId> = match acroform.get(b"Fields") {
        Ok(fields) => match resolve(doc, fields)? {
            Object::Array(items) => items.iter().filter_map(|i| i.as_reference().ok()).collect(),
            _ => Vec::new(),
        },
        Err(_) => Vec::new(),
    };

    let mut visited = HashSet::new();
    let mut fields = Vec::new();
    for id in roots {
        walk_field(doc, id, &Inherited::default(), &mut visited, &mut fields);
    }

    log::debug!("Found {} form fields", fields.len());
    Ok(fields)
}

fn walk_field(
    doc: &Document,
    id: ObjectId,
    parent: &Inherited,
    visited: &mut HashSet<ObjectId>,
    out: &mut Vec<FormField>,
) {
    if !visited.insert(id) {
        log::warn!("Skipping field {:?}: cycle in field tree", id);
        return;
    }

    let dict = match doc.get_dictionary(id) {
        Ok(dict) => dict,
        Err(e) => {
            log::warn!("Skipping field {:?}: {}", id, e);
            return;
        }
    };

    let partial = text_entry(doc, dict, b"T");
    let full_name = match (&parent.name, &partial) {
        (Some(p), Some(t)) => Some(format!("{}.{}", p, t)),
        (None, Some(t)) => Some(t.clone()),
        (p, None) => p.clone(),
    };

    let Some(full_name) = full_name else {
        log::debug!("Skipping unnamed top-level widget {:?}", id);
        return;
    };

    let inherited = Inherited {
        name: Some(full_name.clone()),
        field_type: match dict.get(b"FT") {
            Ok(Object::Name(ft)) => Some(ft.clone()),
            _ => parent.field_type.clone(),
        },
        flags: integer_entry(doc, dict, b"Ff").map(|f| f as u32).or(parent.flags),
        max_len: integer_entry(doc, dict, b"MaxLen").map(|m| m as usize).or(parent.max_len),
        value: value_entry(doc, dict).or_else(|| parent.value.clone()),
    };

    let kids = kid_ids(dict);
    let (field_kids, widget_kids): (Vec<ObjectId>, Vec<ObjectId>) = kids.into_iter().partition(|kid| {
        doc.get_dictionary(*kid)
            .map(|k| k.has(b"T"))
            .unwrap_or(false)
    });

    if !field_kids.is_empty() {
        for kid in field_kids {
            walk_field(doc, kid, &inherited, visited, out);
        }
        return;
    }

    let mut widget_ids = Vec::new();
    let mut on_states = Vec::new();
    if is_widget(dict) {
        widget_ids.push(id);
        on_states.extend(widget_on_states(doc, dict));
    }
    for kid in widget_kids {
        if let Ok(widget) = doc.get_dictionary(kid) {
            widget_ids.push(kid);
            for state in widget_on_states(doc, widget) {
                if !on_states.contains(&state) {
                    on_states.push(state);
                }
            }
        }
    }

    out.push(FormField {
        partial_name: partial.unwrap_or_default(),
        full_name,
        field_type: inherited
            .field_type
            .as_deref()
            .map(FieldType::from_name)
            .unwrap_or(FieldType::Unknown),
        value: inherited.value,
        tooltip: text_entry(doc, dict, b"TU"),
        flags: inherited.flags.unwrap_or(0),
        max_len: inherited.max_len,
        on_states,
        object_id: id,
        widget_ids,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(n: &str) -> Object {
        Object::Name(n.as_bytes().to_vec())
    }

    /// Catalog + AcroForm with one hierarchical text field and one checkbox
    fn form_document() -> Document {
        let mut doc = Document::with_version("1.7");

        let parent_id = doc.new_object_id();
        let leaf_id = doc.new_object_id();
        let widget_id = doc.new_object_id();
        let check_id = doc.new_object_id();

        let mut leaf = Dictionary::new();
        leaf.set("T", Object::string_literal("f1_01[0]"));
        leaf.set("TU", Object::string_literal("Your first name"));
        leaf.set("MaxLen", Object::Integer(8));
        leaf.set("Parent", Object::Reference(parent_id));
        leaf.set("Kids", Object::Array(vec![Object::Reference(widget_id)]));
        doc.objects.insert(leaf_id, Object::Dictionary(leaf));

        let mut widget = Dictionary::new();
        widget.set("Subtype", name("Widget"));
        widget.set("Parent", Object::Reference(leaf_id));
        doc.objects.insert(widget_id, Object::Dictionary(widget));

        let mut parent = Dictionary::new();
        parent.set("T", Object::string_literal("Page1[0]"));
        parent.set("FT", name("Tx"));
        parent.set("Ff", Object::Integer(FLAG_READ_ONLY as i64));
        parent.set("Kids", Object::Array(vec![Object::Reference(leaf_id)]));
        doc.objects.insert(parent_id, Object::Dictionary(parent));

        let mut normal = Dictionary::new();
        normal.set("Yes", Object::Null);
        normal.set("Off", Object::Null);
        let mut ap = Dictionary::new();
        ap.set("N", Object::Dictionary(normal));
        let mut check = Dictionary::new();
        check.set("T", encode_text_string("Célibataire"));
        check.set("FT", name("Btn"));
        check.set("V", name("Off"));
        check.set("Subtype", name("Widget"));
        check.set("AP", Object::Dictionary(ap));
        doc.objects.insert(check_id, Object::Dictionary(check));

        let mut acroform = Dictionary::new();
        acroform.set(
            "Fields",
            Object::Array(vec![Object::Reference(parent_id), Object::Reference(check_id)]),
        );
        let acroform_id = doc.add_object(Object::Dictionary(acroform));

        let mut catalog = Dictionary::new();
        catalog.set("Type", name("Catalog"));
        catalog.set("AcroForm", Object::Reference(acroform_id));
        let catalog_id = doc.add_object(Object::Dictionary(catalog));
        doc.trailer.set("Root", Object::Reference(catalog_id));
        doc
    }

    #[test]
    fn test_list_fields_composes_names_and_inherits() {
        let doc = form_document();
        let fields = list_fields(&doc).unwrap();
        assert_eq!(fields.len(), 2);

        let text = &fields[0];
        assert_eq!(text.full_name, "Page1[0].f1_01[0]");
        assert_eq!(text.partial_name, "f1_01[0]");
        assert_eq!(text.terminal_name(), "f1_01[0]");
        assert_eq!(text.field_type, FieldType::Text);
        assert_eq!(text.tooltip.as_deref(), Some("Your first name"));
        assert_eq!(text.max_len, Some(8));
        assert!(text.is_read_only());
        assert_eq!(text.widget_ids.len(), 1);

        let check = &fields[1];
        assert_eq!(check.full_name, "Célibataire");
        assert_eq!(check.field_type, FieldType::Button);
        assert_eq!(check.value.as_deref(), Some("Off"));
        assert_eq!(check.on_states, vec!["Yes".to_string()]);
        assert_eq!(check.widget_ids, vec![check.object_id]);
    }

    #[test]
    fn test_list_fields_without_acroform() {
        let mut doc = Document::with_version("1.7");
        let mut catalog = Dictionary::new();
        catalog.set("Type", name("Catalog"));
        let catalog_id = doc.add_object(Object::Dictionary(catalog));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        assert!(matches!(list_fields(&doc), Err(Error::NoAcroForm)));
    }

    #[test]
    fn test_cycle_in_field_tree_terminates() {
        let mut doc = form_document();
        // Point the leaf's widget back at the parent field
        let fields = list_fields(&doc).unwrap();
        let leaf_id = fields[0].object_id;
        let root_id = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
        let acroform_id = doc
            .get_dictionary(root_id)
            .unwrap()
            .get(b"AcroForm")
            .unwrap()
            .as_reference()
            .unwrap();
        let mut looped = Dictionary::new();
        looped.set("T", Object::string_literal("loop"));
        looped.set("Kids", Object::Array(vec![Object::Reference(leaf_id)]));
        let looped_id = doc.add_object(Object::Dictionary(looped));
        doc.get_dictionary_mut(leaf_id)
            .unwrap()
            .set("Kids", Object::Array(vec![Object::Reference(looped_id)]));
        doc.get_dictionary_mut(acroform_id)
            .unwrap()
            .set("Fields", Object::Array(vec![Object::Reference(looped_id)]));

        // Must return rather than recurse forever
        let fields = list_fields(&doc).unwrap();
        assert!(fields.len() <= 1);
    }

    #[test]
    fn test_text_string_round_trip() {
        for text in ["Plain ASCII", "Zoë Müller", "東京"] {
            let obj = encode_text_string(text);
            match obj {
                Object::String(bytes, _) => assert_eq!(decode_text_string(&bytes), text),
                _ => panic!("expected string object"),
            }
        }
    }

    #[test]
    fn test_decode_latin1_fallback() {
        assert_eq!(decode_text_string(b"caf\xe9"), "café");
        assert_eq!(decode_text_string(&[0xEF, 0xBB, 0xBF, b'o', b'k']), "ok");
    }

    #[test]
    fn test_terminal_segment() {
        assert_eq!(terminal_segment("topmostSubform[0].Page1[0].f1_04[0]"), "f1_04[0]");
        assert_eq!(terminal_segment("plain"), "plain");
    }
}
