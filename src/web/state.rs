use std::sync::atomic::AtomicU64;
use std::sync::Mutex;

use lopdf::Document;
use rand::rngs::StdRng;

use crate::error::Result;
use crate::forms::FormKind;
use crate::pdf::fields::{list_fields, FormField};
use crate::synth::SyntheticGenerator;
use crate::workflow::GenerateOptions;

/// The most recently generated document, served by `/download`
#[derive(Debug, Clone)]
pub struct Latest {
    pub filename: String,
    pub pdf_bytes: Vec<u8>,
}

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub kind: FormKind,
    /// Template PDF; parsed per request on the blocking pool
    pub template: Vec<u8>,
    pub fields: Vec<FormField>,
    pub options: GenerateOptions,
    pub generator: Mutex<SyntheticGenerator<StdRng>>,
    pub latest: Mutex<Option<Latest>>,
    pub generated: AtomicU64,
}

impl AppState {
    /// Parse the template and check it has a form before serving it
    pub fn new(
        kind: FormKind,
        template: &[u8],
        options: GenerateOptions,
        seed: Option<u64>,
    ) -> Result<Self> {
        let fields = list_fields(&Document::load_mem(template)?)?;
        let generator = match seed {
            Some(seed) => SyntheticGenerator::seeded(seed),
            None => SyntheticGenerator::from_os_rng(),
        };

        Ok(Self {
            kind,
            template: template.to_vec(),
            fields,
            options,
            generator: Mutex::new(generator),
            latest: Mutex::new(None),
            generated: AtomicU64::new(0),
        })
    }
}
