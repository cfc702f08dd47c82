//! Form 941 Schedule D field table
//!
//! Lines 1-4 of Part 2 compare totals reported on Forms 941 against totals
//! reported on Forms W-2, with the difference as the discrepancy column.

use super::FieldSpec;
use crate::period::format_form_date;
use crate::synth::{format_dollars, Schedule941DRecord, SubmissionType, TransactionType};

macro_rules! sd {
    ($leaf:literal) => {
        concat!("topmostSubform[0].Page1[0].", $leaf)
    };
}

pub const FIELD_SPECS: &[FieldSpec] = &[
    FieldSpec::text("filer_ein", &[sd!("EntityArea[0].f1_01[0]")], &["employer identification number (ein)"])
        .max_len(9),
    FieldSpec::text("filer_name", &[sd!("EntityArea[0].f1_02[0]")], &["name (not your trade name)"]),
    FieldSpec::text("tax_year", &[sd!("EntityArea[0].f1_03[0]")], &["calendar year"]).max_len(4),
    FieldSpec::checkbox("submission_original", &[sd!("c1_1[0]")], &["type of submission", "original"]),
    FieldSpec::checkbox("submission_corrected", &[sd!("c1_1[1]")], &["type of submission", "corrected"]),
    FieldSpec::checkbox("transaction_acquisition", &[sd!("c1_2[0]")], &["transaction", "acquisition"]),
    FieldSpec::checkbox("transaction_merger", &[sd!("c1_2[1]")], &["transaction", "statutory merger"]),
    FieldSpec::checkbox("transaction_consolidation", &[sd!("c1_2[2]")], &["transaction", "consolidation"]),
    FieldSpec::text("transaction_date", &[sd!("f1_04[0]")], &["effective date"]),
    FieldSpec::text("other_party_ein", &[sd!("f1_05[0]")], &["other party", "employer identification number"])
        .max_len(9),
    FieldSpec::text("other_party_name", &[sd!("f1_06[0]")], &["other party", "name"]),
    FieldSpec::text("ss_wages_941", &[sd!("Part2[0].f1_07[0]")], &["social security wages", "form 941"]),
    FieldSpec::text("ss_wages_w2", &[sd!("Part2[0].f1_08[0]")], &["social security wages", "form w-2"]),
    FieldSpec::text("ss_wages_discrepancy", &[sd!("Part2[0].f1_09[0]")], &["social security wages", "discrepancy"]),
    FieldSpec::text("ss_tips_941", &[sd!("Part2[0].f1_10[0]")], &["social security tips", "form 941"]),
    FieldSpec::text("ss_tips_w2", &[sd!("Part2[0].f1_11[0]")], &["social security tips", "form w-2"]),
    FieldSpec::text("ss_tips_discrepancy", &[sd!("Part2[0].f1_12[0]")], &["social security tips", "discrepancy"]),
    FieldSpec::text("medicare_941", &[sd!("Part2[0].f1_13[0]")], &["medicare wages and tips", "form 941"]),
    FieldSpec::text("medicare_w2", &[sd!("Part2[0].f1_14[0]")], &["medicare wages and tips", "form w-2"]),
    FieldSpec::text("medicare_discrepancy", &[sd!("Part2[0].f1_15[0]")], &["medicare wages and tips", "discrepancy"]),
    FieldSpec::text("withheld_941", &[sd!("Part2[0].f1_16[0]")], &["federal income tax withheld", "form 941"]),
    FieldSpec::text("withheld_w2", &[sd!("Part2[0].f1_17[0]")], &["federal income tax withheld", "form w-2"]),
    FieldSpec::text("withheld_discrepancy", &[sd!("Part2[0].f1_18[0]")], &["federal income tax withheld", "discrepancy"]),
    FieldSpec::text("contact_name", &[sd!("Part3[0].f1_19[0]")], &["contact person"]),
    FieldSpec::text("contact_phone", &[sd!("Part3[0].f1_20[0]")], &["contact", "phone number"]),
    FieldSpec::text("signature_date", &[sd!("Part3[0].f1_21[0]")], &["date", "sign"]),
];

fn checkbox(on: bool) -> String {
    let state = if on { "Yes" } else { "Off" };
    state.to_string()
}

fn ein_digits(ein: &str) -> String {
    ein.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn field_values(r: &Schedule941DRecord) -> Vec<(&'static str, String)> {
    vec![
        ("filer_ein", ein_digits(&r.filer_ein)),
        ("filer_name", r.filer_name.clone()),
        ("tax_year", r.tax_year.to_string()),
        ("submission_original", checkbox(r.submission == SubmissionType::Original)),
        ("submission_corrected", checkbox(r.submission == SubmissionType::Corrected)),
        ("transaction_acquisition", checkbox(r.transaction == TransactionType::Acquisition)),
        ("transaction_merger", checkbox(r.transaction == TransactionType::StatutoryMerger)),
        ("transaction_consolidation", checkbox(r.transaction == TransactionType::Consolidation)),
        ("transaction_date", format_form_date(&r.transaction_date)),
        ("other_party_ein", ein_digits(&r.other_party_ein)),
        ("other_party_name", r.other_party_name.clone()),
        ("ss_wages_941", format_dollars(r.social_security_wages.form_941)),
        ("ss_wages_w2", format_dollars(r.social_security_wages.form_w2)),
        ("ss_wages_discrepancy", format_dollars(r.social_security_wages.discrepancy)),
        ("ss_tips_941", format_dollars(r.social_security_tips.form_941)),
        ("ss_tips_w2", format_dollars(r.social_security_tips.form_w2)),
        ("ss_tips_discrepancy", format_dollars(r.social_security_tips.discrepancy)),
        ("medicare_941", format_dollars(r.medicare_wages_and_tips.form_941)),
        ("medicare_w2", format_dollars(r.medicare_wages_and_tips.form_w2)),
        ("medicare_discrepancy", format_dollars(r.medicare_wages_and_tips.discrepancy)),
        ("withheld_941", format_dollars(r.income_tax_withheld.form_941)),
        ("withheld_w2", format_dollars(r.income_tax_withheld.form_w2)),
        ("withheld_discrepancy", format_dollars(r.income_tax_withheld.discrepancy)),
        ("contact_name", r.contact_name.clone()),
        ("contact_phone", r.contact_phone.clone()),
        ("signature_date", r.signature_date.as_ref().map(format_form_date).unwrap_or_default()),
    ]
}
