//! Web server settings

use std::net::SocketAddr;

use chrono::{Datelike, Local};

use crate::forms::FormKind;
use crate::pdf::fill::FillOptions;
use crate::period::TaxPeriod;
use crate::template::TemplateSource;

/// Address the UI listens on unless told otherwise
pub const DEFAULT_ADDR: &str = "127.0.0.1:7860";

/// The most recent tax year with published forms
pub fn default_tax_year() -> i32 {
    Local::now().year() - 1
}

/// Everything `serve` needs to start the UI
#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub addr: SocketAddr,
    pub form: FormKind,
    pub template: TemplateSource,
    pub period: TaxPeriod,
    /// Seed for reproducible records; `None` draws from the OS
    pub seed: Option<u64>,
    pub signature_date: Option<chrono::NaiveDate>,
    pub fill: FillOptions,
}

impl ServeConfig {
    /// Defaults for `form`: the IRS template, last year, a local address
    pub fn new(form: FormKind) -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 7860)),
            form,
            template: TemplateSource::default_for(form),
            period: TaxPeriod::year(default_tax_year()),
            seed: None,
            signature_date: None,
            fill: FillOptions::default(),
        }
    }
}
