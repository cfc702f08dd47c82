//! Form definitions and record-to-field mapping
//!
//! Each supported form has a table of [`FieldSpec`]s. A spec names a semantic
//! key (`first_name`, `ss_wages_941`, ...) and the ways to find that key's
//! field in a template: known fully qualified names, and tooltip keywords for
//! template revisions whose field names moved.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::pdf::fields::{terminal_segment, FormField};
use crate::period::TaxPeriod;
use crate::synth::{Form1040Record, Schedule941DRecord, SyntheticGenerator};

pub mod f1040;
pub mod f941d;

/// Supported tax forms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FormKind {
    /// IRS Form 1040, U.S. Individual Income Tax Return
    F1040,
    /// IRS Form 941 Schedule D, Report of Discrepancies Caused by Acquisitions,
    /// Statutory Mergers, or Consolidations
    F941ScheduleD,
}

impl FormKind {
    pub const ALL: [FormKind; 2] = [FormKind::F1040, FormKind::F941ScheduleD];

    pub fn display_name(&self) -> &'static str {
        match self {
            FormKind::F1040 => "Form 1040",
            FormKind::F941ScheduleD => "Form 941 Schedule D",
        }
    }

    /// Short identifier used in file names and URLs
    pub fn slug(&self) -> &'static str {
        match self {
            FormKind::F1040 => "f1040",
            FormKind::F941ScheduleD => "f941sd",
        }
    }

    /// Current fillable template published by the IRS
    pub fn template_url(&self) -> &'static str {
        match self {
            FormKind::F1040 => "https://www.irs.gov/pub/irs-pdf/f1040.pdf",
            FormKind::F941ScheduleD => "https://www.irs.gov/pub/irs-pdf/f941sd.pdf",
        }
    }

    pub fn default_output(&self) -> String {
        format!("{}-filled.pdf", self.slug())
    }

    pub fn field_specs(&self) -> &'static [FieldSpec] {
        match self {
            FormKind::F1040 => f1040::FIELD_SPECS,
            FormKind::F941ScheduleD => f941d::FIELD_SPECS,
        }
    }

    /// Draw a random record of this kind
    pub fn generate<R: Rng>(&self, generator: &mut SyntheticGenerator<R>, period: TaxPeriod) -> TaxRecord {
        match self {
            FormKind::F1040 => TaxRecord::F1040(generator.form_1040(period.year)),
            FormKind::F941ScheduleD => TaxRecord::F941ScheduleD(generator.schedule_941d(period)),
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for FormKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "1040" | "f1040" | "form1040" => Ok(FormKind::F1040),
            "941d" | "941sd" | "f941sd" | "941scheduled" | "form941scheduled" | "scheduled941"
            | "schedule941d" => Ok(FormKind::F941ScheduleD),
            _ => Err(Error::UnknownForm(s.to_string())),
        }
    }
}

/// How a spec's field is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecKind {
    Text,
    Checkbox,
}

/// Where to find one semantic value in a template
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: &'static str,
    pub kind: SpecKind,
    /// Fully qualified names seen in published templates, newest first
    pub candidates: &'static [&'static str],
    /// Words that all appear in the field's tooltip
    pub tooltip_keywords: &'static [&'static str],
    /// Comb/limit length on published templates
    pub max_len: Option<usize>,
}

impl FieldSpec {
    pub const fn text(
        key: &'static str,
        candidates: &'static [&'static str],
        tooltip_keywords: &'static [&'static str],
    ) -> Self {
        Self { key, kind: SpecKind::Text, candidates, tooltip_keywords, max_len: None }
    }

    pub const fn checkbox(
        key: &'static str,
        candidates: &'static [&'static str],
        tooltip_keywords: &'static [&'static str],
    ) -> Self {
        Self { key, kind: SpecKind::Checkbox, candidates, tooltip_keywords, max_len: None }
    }

    pub const fn max_len(mut self, len: usize) -> Self {
        self.max_len = Some(len);
        self
    }

    /// Text used as the tooltip when building a template from this spec
    pub fn tooltip(&self) -> String {
        self.tooltip_keywords.join(" ")
    }
}

/// A generated record for any supported form
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum TaxRecord {
    F1040(Form1040Record),
    F941ScheduleD(Schedule941DRecord),
}

impl TaxRecord {
    pub fn kind(&self) -> FormKind {
        match self {
            TaxRecord::F1040(_) => FormKind::F1040,
            TaxRecord::F941ScheduleD(_) => FormKind::F941ScheduleD,
        }
    }

    /// Values keyed by [`FieldSpec::key`], in spec order
    pub fn field_values(&self) -> Vec<(&'static str, String)> {
        match self {
            TaxRecord::F1040(record) => f1040::field_values(record),
            TaxRecord::F941ScheduleD(record) => f941d::field_values(record),
        }
    }

    pub fn set_signature_date(&mut self, date: Option<NaiveDate>) {
        match self {
            TaxRecord::F1040(record) => record.signature_date = date,
            TaxRecord::F941ScheduleD(record) => record.signature_date = date,
        }
    }

    /// One-line description for progress output
    pub fn summary(&self) -> String {
        match self {
            TaxRecord::F1040(r) => format!(
                "{} {} ({}), AGI ${}",
                r.taxpayer.first_name,
                r.taxpayer.last_name,
                r.filing_status.label(),
                crate::synth::format_dollars(r.adjusted_gross_income)
            ),
            TaxRecord::F941ScheduleD(r) => format!(
                "{} ({}) {} {}",
                r.filer_name,
                r.filer_ein,
                r.transaction.label().to_lowercase(),
                r.other_party_name
            ),
        }
    }
}

/// How a spec was matched to a template field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    TerminalName,
    Tooltip,
}

/// Outcome of locating one spec in a template
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub key: &'static str,
    pub field_name: Option<String>,
    pub matched_by: Option<MatchKind>,
}

fn normalize_tooltip(text: &str) -> String {
    text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}

/// Locate each spec's field among `fields`
///
/// Specs are tried in order. For each, an exact candidate name wins, then a
/// field whose terminal name segment matches a candidate's, then a field whose
/// tooltip contains every keyword. A field is claimed by at most one spec.
pub fn resolve_fields(specs: &[FieldSpec], fields: &[FormField]) -> Vec<Resolution> {
    let by_name: HashMap<&str, usize> = fields
        .iter()
        .enumerate()
        .map(|(i, f)| (f.full_name.as_str(), i))
        .collect();
    let tooltips: Vec<Option<String>> = fields
        .iter()
        .map(|f| f.tooltip.as_deref().map(normalize_tooltip))
        .collect();

    let mut claimed: HashSet<usize> = HashSet::new();
    let mut resolutions = Vec::with_capacity(specs.len());

    for spec in specs {
        let exact = spec
            .candidates
            .iter()
            .filter_map(|c| by_name.get(c).copied())
            .find(|i| !claimed.contains(i))
            .map(|i| (i, MatchKind::Exact));

        let terminal = || {
            spec.candidates.iter().find_map(|c| {
                let segment = terminal_segment(c);
                fields
                    .iter()
                    .enumerate()
                    .find(|(i, f)| !claimed.contains(i) && f.terminal_name() == segment)
                    .map(|(i, _)| (i, MatchKind::TerminalName))
            })
        };

        let tooltip = || {
            if spec.tooltip_keywords.is_empty() {
                return None;
            }
            tooltips
                .iter()
                .enumerate()
                .find(|(i, tip)| {
                    !claimed.contains(i)
                        && tip.as_deref().is_some_and(|tip| {
                            spec.tooltip_keywords
                                .iter()
                                .all(|kw| tip.contains(&normalize_tooltip(kw)))
                        })
                })
                .map(|(i, _)| (i, MatchKind::Tooltip))
        };

        let found = exact.or_else(terminal).or_else(tooltip);

        match found {
            Some((index, matched_by)) => {
                claimed.insert(index);
                log::debug!("{} -> {} ({:?})", spec.key, fields[index].full_name, matched_by);
                resolutions.push(Resolution {
                    key: spec.key,
                    field_name: Some(fields[index].full_name.clone()),
                    matched_by: Some(matched_by),
                });
            }
            None => {
                log::debug!("{} not found in template", spec.key);
                resolutions.push(Resolution { key: spec.key, field_name: None, matched_by: None });
            }
        }
    }

    resolutions
}

/// One value bound to a concrete template field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub key: &'static str,
    pub field_name: String,
    pub value: String,
    pub matched_by: MatchKind,
}

/// Everything needed to fill one record into one template
#[derive(Debug, Clone, Default, Serialize)]
pub struct FillPlan {
    pub assignments: Vec<Assignment>,
    /// Keys with no matching template field
    pub unresolved: Vec<&'static str>,
}

impl FillPlan {
    /// `(field name, value)` pairs for the PDF writer
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.assignments
            .iter()
            .map(|a| (a.field_name.clone(), a.value.clone()))
            .collect()
    }
}

/// Map a record onto a template's fields
pub fn build_fill_plan(record: &TaxRecord, fields: &[FormField]) -> FillPlan {
    let values: HashMap<&'static str, String> = record.field_values().into_iter().collect();
    let resolutions = resolve_fields(record.kind().field_specs(), fields);

    let mut plan = FillPlan::default();
    for resolution in resolutions {
        let Some(value) = values.get(resolution.key) else {
            continue;
        };
        match (resolution.field_name, resolution.matched_by) {
            (Some(field_name), Some(matched_by)) => plan.assignments.push(Assignment {
                key: resolution.key,
                field_name,
                value: value.clone(),
                matched_by,
            }),
            _ => plan.unresolved.push(resolution.key),
        }
    }

    if !plan.unresolved.is_empty() {
        log::warn!(
            "{} keys not found in the {} template: {}",
            plan.unresolved.len(),
            record.kind(),
            plan.unresolved.join(", ")
        );
    }
    plan
}
