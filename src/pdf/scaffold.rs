//! Offline fillable templates
//!
//! Builds a single-page AcroForm carrying one field per [`FieldSpec`], named
//! after its first candidate name. This stands in for the published IRS PDF
//! when there is no network, and gives tests a template with known fields.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::forms::{FieldSpec, FormKind, SpecKind};

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const TOP: f32 = 740.0;
const LABEL_X: f32 = 48.0;
const FIELD_X: f32 = 260.0;
const FIELD_WIDTH: f32 = 300.0;
const CHECKBOX_SIZE: f32 = 10.0;
const DEFAULT_APPEARANCE: &str = "/Helv 9 Tf 0 g";

fn name(n: &str) -> Object {
    Object::Name(n.as_bytes().to_vec())
}

fn rect(x1: f32, y1: f32, x2: f32, y2: f32) -> Object {
    Object::Array(vec![Object::Real(x1), Object::Real(y1), Object::Real(x2), Object::Real(y2)])
}

/// Escape special characters in PDF strings
fn escape_pdf_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// Intermediate (non-terminal) node in the field hierarchy
struct FieldNode {
    id: ObjectId,
    partial_name: String,
    parent: Option<ObjectId>,
    kids: Vec<ObjectId>,
}

/// Appearance streams for a checkbox: a cross for `Yes`, nothing for `Off`
fn checkbox_appearances(doc: &mut Document) -> Dictionary {
    let bbox = rect(0.0, 0.0, CHECKBOX_SIZE, CHECKBOX_SIZE);

    let mut form = Dictionary::new();
    form.set("Type", name("XObject"));
    form.set("Subtype", name("Form"));
    form.set("BBox", bbox);

    let on = format!(
        "q 0 g 1 w 2 2 m {s} {s} l S 2 {s} m {s} 2 l S Q\n",
        s = CHECKBOX_SIZE - 2.0
    );
    let on_id = doc.add_object(Stream::new(form.clone(), on.into_bytes()));
    let off_id = doc.add_object(Stream::new(form, Vec::new()));

    let mut normal = Dictionary::new();
    normal.set("Yes", Object::Reference(on_id));
    normal.set("Off", Object::Reference(off_id));

    let mut appearances = Dictionary::new();
    appearances.set("N", Object::Dictionary(normal));
    appearances
}

fn terminal_field(
    doc: &mut Document,
    spec: &FieldSpec,
    partial_name: &str,
    parent: Option<ObjectId>,
    page_id: ObjectId,
    y: f32,
) -> Dictionary {
    let mut field = Dictionary::new();
    field.set("T", Object::string_literal(partial_name));
    field.set("TU", Object::string_literal(spec.tooltip()));
    if let Some(parent) = parent {
        field.set("Parent", Object::Reference(parent));
    }

    // Merged field/widget dictionary
    field.set("Type", name("Annot"));
    field.set("Subtype", name("Widget"));
    field.set("P", Object::Reference(page_id));
    field.set("F", Object::Integer(4));

    match spec.kind {
        SpecKind::Text => {
            field.set("FT", name("Tx"));
            field.set("DA", Object::string_literal(DEFAULT_APPEARANCE));
            field.set("Rect", rect(FIELD_X, y - 3.0, FIELD_X + FIELD_WIDTH, y + 11.0));
            if let Some(max_len) = spec.max_len {
                field.set("MaxLen", Object::Integer(max_len as i64));
            }
        }
        SpecKind::Checkbox => {
            field.set("FT", name("Btn"));
            field.set("V", name("Off"));
            field.set("AS", name("Off"));
            field.set("Rect", rect(FIELD_X, y - 1.0, FIELD_X + CHECKBOX_SIZE, y - 1.0 + CHECKBOX_SIZE));
            let appearances = checkbox_appearances(doc);
            field.set("AP", Object::Dictionary(appearances));
        }
    }

    field
}

/// Build a blank fillable template for `kind`
pub fn build_template(kind: FormKind) -> Document {
    let specs = kind.field_specs();
    let mut doc = Document::with_version("1.7");

    let pages_id = doc.new_object_id();
    let page_id = doc.new_object_id();

    let mut font = Dictionary::new();
    font.set("Type", name("Font"));
    font.set("Subtype", name("Type1"));
    font.set("BaseFont", name("Helvetica"));
    font.set("Encoding", name("WinAnsiEncoding"));
    let font_id = doc.add_object(Object::Dictionary(font));

    let mut nodes: Vec<FieldNode> = Vec::new();
    let mut node_index: HashMap<String, usize> = HashMap::new();
    let mut top_level: Vec<ObjectId> = Vec::new();
    let mut widgets: Vec<Object> = Vec::new();

    let mut content = format!(
        "BT /F1 14 Tf {} {} Td ({}) Tj ET\n",
        LABEL_X,
        TOP + 20.0,
        escape_pdf_string(kind.display_name())
    );

    let row_height = ((TOP - 36.0) / specs.len().max(1) as f32).min(18.0);

    for (row, spec) in specs.iter().enumerate() {
        let y = TOP - row as f32 * row_height;
        let segments: Vec<&str> = spec.candidates[0].split('.').collect();
        let (leaf, ancestors) = match segments.split_last() {
            Some(split) => split,
            None => continue,
        };

        let mut parent: Option<usize> = None;
        let mut prefix = String::new();
        for segment in ancestors {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(segment);

            let index = match node_index.get(&prefix) {
                Some(&index) => index,
                None => {
                    let id = doc.new_object_id();
                    let parent_id = parent.map(|p| nodes[p].id);
                    match parent {
                        Some(p) => nodes[p].kids.push(id),
                        None => top_level.push(id),
                    }
                    nodes.push(FieldNode {
                        id,
                        partial_name: segment.to_string(),
                        parent: parent_id,
                        kids: Vec::new(),
                    });
                    node_index.insert(prefix.clone(), nodes.len() - 1);
                    nodes.len() - 1
                }
            };
            parent = Some(index);
        }

        let parent_id = parent.map(|p| nodes[p].id);
        let field = terminal_field(&mut doc, spec, leaf, parent_id, page_id, y);
        let field_id = doc.add_object(Object::Dictionary(field));
        match parent {
            Some(p) => nodes[p].kids.push(field_id),
            None => top_level.push(field_id),
        }
        widgets.push(Object::Reference(field_id));

        content.push_str(&format!(
            "BT /F1 8 Tf {} {} Td ({}) Tj ET\n",
            LABEL_X,
            y,
            escape_pdf_string(&spec.tooltip())
        ));
    }

    for node in nodes {
        let mut dict = Dictionary::new();
        dict.set("T", Object::string_literal(node.partial_name));
        dict.set("Kids", Object::Array(node.kids.into_iter().map(Object::Reference).collect()));
        if let Some(parent) = node.parent {
            dict.set("Parent", Object::Reference(parent));
        }
        doc.objects.insert(node.id, Object::Dictionary(dict));
    }

    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

    let mut font_resources = Dictionary::new();
    font_resources.set("F1", Object::Reference(font_id));
    font_resources.set("Helv", Object::Reference(font_id));
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(font_resources.clone()));

    let mut page = Dictionary::new();
    page.set("Type", name("Page"));
    page.set("Parent", Object::Reference(pages_id));
    page.set("MediaBox", rect(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
    page.set("Resources", Object::Dictionary(resources));
    page.set("Contents", Object::Reference(content_id));
    page.set("Annots", Object::Array(widgets));
    doc.objects.insert(page_id, Object::Dictionary(page));

    let mut pages = Dictionary::new();
    pages.set("Type", name("Pages"));
    pages.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
    pages.set("Count", Object::Integer(1));
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut default_resources = Dictionary::new();
    default_resources.set("Font", Object::Dictionary(font_resources));
    let mut acroform = Dictionary::new();
    acroform.set("Fields", Object::Array(top_level.into_iter().map(Object::Reference).collect()));
    acroform.set("DR", Object::Dictionary(default_resources));
    acroform.set("DA", Object::string_literal(DEFAULT_APPEARANCE));
    let acroform_id = doc.add_object(Object::Dictionary(acroform));

    let mut catalog = Dictionary::new();
    catalog.set("Type", name("Catalog"));
    catalog.set("Pages", Object::Reference(pages_id));
    catalog.set("AcroForm", Object::Reference(acroform_id));
    let catalog_id = doc.add_object(Object::Dictionary(catalog));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut info = Dictionary::new();
    info.set("Title", Object::string_literal(format!("{} (offline template)", kind.display_name())));
    info.set("Producer", Object::string_literal(concat!("taxform-filler ", env!("CARGO_PKG_VERSION"))));
    let info_id = doc.add_object(Object::Dictionary(info));
    doc.trailer.set("Info", Object::Reference(info_id));

    log::debug!("Built offline {} template with {} fields", kind, specs.len());
    doc
}
