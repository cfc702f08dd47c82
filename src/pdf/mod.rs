//! PDF form handling module

pub mod fields;
pub mod fill;
pub mod metadata;
pub mod scaffold;

// Re-export commonly used items
pub use fields::{list_fields, FieldType, FormField};
pub use fill::{fill_document, fill_file, fill_template, save_to_bytes, FillOptions, FillReport};
pub use metadata::{count_pages, extract_metadata, metadata_from_document, PdfMetadata};
pub use scaffold::build_template;
