//! Tax Form Filler Library
//!
//! Generates synthetic tax-form records and writes them into fillable IRS
//! PDF templates. This library provides functionality to:
//! - Generate deterministic synthetic 1040 and 941 Schedule D records
//! - Locate a template's AcroForm fields by name or tooltip
//! - Fill, lock, and save form values
//! - Extract filled values into a summary table
//! - Serve a small generate/download web UI
//!
//! # Example
//!
//! ```no_run
//! use taxform_filler::forms::FormKind;
//! use taxform_filler::period::TaxPeriod;
//! use taxform_filler::synth::SyntheticGenerator;
//! use taxform_filler::workflow::{generate_filled, GenerateOptions};
//!
//! let template = std::fs::read("f1040.pdf").expect("template");
//! let mut generator = SyntheticGenerator::seeded(42);
//! let options = GenerateOptions::new(TaxPeriod::year(2023));
//!
//! let generated = generate_filled(FormKind::F1040, &template, &mut generator, &options)
//!     .expect("Failed to fill template");
//! std::fs::write("f1040-filled.pdf", &generated.pdf_bytes).expect("write");
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod forms;
pub mod pdf;
pub mod period;
pub mod synth;
pub mod template;
pub mod web;
pub mod workflow;

// Re-export commonly used items
pub use error::{Error, Result};
