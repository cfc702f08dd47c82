//! Form 1040 field table

use super::FieldSpec;
use crate::period::format_form_date;
use crate::synth::{format_dollars, FilingStatus, Form1040Record};

macro_rules! p1 {
    ($leaf:literal) => {
        concat!("topmostSubform[0].Page1[0].", $leaf)
    };
}

macro_rules! p2 {
    ($leaf:literal) => {
        concat!("topmostSubform[0].Page2[0].", $leaf)
    };
}

pub const FIELD_SPECS: &[FieldSpec] = &[
    FieldSpec::checkbox(
        "filing_status_single",
        &[p1!("FilingStatus_ReadOrder[0].c1_3[0]"), p1!("c1_1[0]")],
        &["filing status", "single"],
    ),
    FieldSpec::checkbox(
        "filing_status_joint",
        &[p1!("FilingStatus_ReadOrder[0].c1_3[1]"), p1!("c1_1[1]")],
        &["filing status", "married filing jointly"],
    ),
    FieldSpec::checkbox(
        "filing_status_separate",
        &[p1!("FilingStatus_ReadOrder[0].c1_3[2]"), p1!("c1_1[2]")],
        &["filing status", "married filing separately"],
    ),
    FieldSpec::checkbox(
        "filing_status_head_of_household",
        &[p1!("c1_3[3]"), p1!("c1_1[3]")],
        &["filing status", "head of household"],
    ),
    FieldSpec::text("first_name", &[p1!("f1_04[0]")], &["your first name"]),
    FieldSpec::text("last_name", &[p1!("f1_05[0]")], &["your last name"]),
    FieldSpec::text("ssn", &[p1!("f1_06[0]")], &["your social security number"]).max_len(9),
    FieldSpec::text("spouse_first_name", &[p1!("f1_07[0]")], &["spouse", "first name"]),
    FieldSpec::text("spouse_last_name", &[p1!("f1_08[0]")], &["spouse", "last name"]),
    FieldSpec::text("spouse_ssn", &[p1!("f1_09[0]")], &["spouse", "social security number"])
        .max_len(9),
    FieldSpec::text("street", &[p1!("Address_ReadOrder[0].f1_10[0]")], &["home address"]),
    FieldSpec::text("apartment", &[p1!("Address_ReadOrder[0].f1_11[0]")], &["apt. no"]),
    FieldSpec::text("city", &[p1!("Address_ReadOrder[0].f1_12[0]")], &["city, town, or post office"]),
    FieldSpec::text("state", &[p1!("Address_ReadOrder[0].f1_13[0]")], &["address", "state"]),
    FieldSpec::text("zip", &[p1!("Address_ReadOrder[0].f1_14[0]")], &["zip code"]).max_len(10),
    FieldSpec::text("wages", &[p1!("f1_32[0]")], &["1a", "form(s) w-2, box 1"]),
    FieldSpec::text("wages_total", &[p1!("f1_41[0]")], &["1z", "add lines 1a through 1h"]),
    FieldSpec::text("tax_exempt_interest", &[p1!("f1_42[0]")], &["2a", "tax-exempt interest"]),
    FieldSpec::text("taxable_interest", &[p1!("f1_43[0]")], &["2b", "taxable interest"]),
    FieldSpec::text("qualified_dividends", &[p1!("f1_44[0]")], &["3a", "qualified dividends"]),
    FieldSpec::text("ordinary_dividends", &[p1!("f1_45[0]")], &["3b", "ordinary dividends"]),
    FieldSpec::text("total_income", &[p1!("f1_53[0]")], &["9", "total income"]),
    FieldSpec::text("adjustments", &[p1!("f1_54[0]")], &["10", "adjustments to income"]),
    FieldSpec::text("adjusted_gross_income", &[p1!("f1_55[0]")], &["11", "adjusted gross income"]),
    FieldSpec::text("standard_deduction", &[p1!("f1_56[0]")], &["12", "standard deduction"]),
    FieldSpec::text("taxable_income", &[p1!("f1_59[0]")], &["15", "this is your taxable income"]),
    FieldSpec::text("tax", &[p2!("f2_02[0]")], &["16", "tax (see instructions)"]),
    FieldSpec::text("total_tax", &[p2!("f2_10[0]")], &["24", "this is your total tax"]),
    FieldSpec::text("withholding", &[p2!("f2_11[0]")], &["25a", "form(s) w-2"]),
    FieldSpec::text("total_payments", &[p2!("f2_22[0]")], &["33", "total payments"]),
    FieldSpec::text("refund", &[p2!("f2_23[0]")], &["34", "amount you overpaid"]),
    FieldSpec::text("amount_owed", &[p2!("f2_28[0]")], &["37", "amount you owe"]),
    FieldSpec::text("occupation", &[p2!("f2_33[0]")], &["your occupation"]),
    FieldSpec::text("spouse_occupation", &[p2!("f2_35[0]")], &["spouse's occupation"]),
    FieldSpec::text("phone", &[p2!("f2_37[0]")], &["phone no"]),
    FieldSpec::text("email", &[p2!("f2_38[0]")], &["email address"]),
    FieldSpec::text("signature_date", &[p2!("f2_32[0]")], &["date", "your signature"]),
];

fn checkbox(on: bool) -> String {
    let state = if on { "Yes" } else { "Off" };
    state.to_string()
}

/// Optional lines are left blank rather than printed as zero
fn optional_dollars(amount: i64) -> String {
    if amount == 0 {
        String::new()
    } else {
        format_dollars(amount)
    }
}

/// SSN as the nine digits a comb field expects
fn ssn_digits(ssn: &str) -> String {
    ssn.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn field_values(r: &Form1040Record) -> Vec<(&'static str, String)> {
    let spouse = r.spouse.as_ref();
    vec![
        ("filing_status_single", checkbox(r.filing_status == FilingStatus::Single)),
        ("filing_status_joint", checkbox(r.filing_status == FilingStatus::MarriedFilingJointly)),
        ("filing_status_separate", checkbox(r.filing_status == FilingStatus::MarriedFilingSeparately)),
        ("filing_status_head_of_household", checkbox(r.filing_status == FilingStatus::HeadOfHousehold)),
        ("first_name", r.taxpayer.given_names()),
        ("last_name", r.taxpayer.last_name.clone()),
        ("ssn", ssn_digits(&r.taxpayer.ssn)),
        ("spouse_first_name", spouse.map(|s| s.given_names()).unwrap_or_default()),
        ("spouse_last_name", spouse.map(|s| s.last_name.clone()).unwrap_or_default()),
        ("spouse_ssn", spouse.map(|s| ssn_digits(&s.ssn)).unwrap_or_default()),
        ("street", r.address.street.clone()),
        ("apartment", r.address.apartment.clone().unwrap_or_default()),
        ("city", r.address.city.clone()),
        ("state", r.address.state.clone()),
        ("zip", r.address.zip.clone()),
        ("wages", format_dollars(r.wages)),
        ("wages_total", format_dollars(r.wages)),
        ("tax_exempt_interest", optional_dollars(r.tax_exempt_interest)),
        ("taxable_interest", optional_dollars(r.taxable_interest)),
        ("qualified_dividends", optional_dollars(r.qualified_dividends)),
        ("ordinary_dividends", optional_dollars(r.ordinary_dividends)),
        ("total_income", format_dollars(r.total_income)),
        ("adjustments", optional_dollars(r.adjustments)),
        ("adjusted_gross_income", format_dollars(r.adjusted_gross_income)),
        ("standard_deduction", format_dollars(r.standard_deduction)),
        ("taxable_income", format_dollars(r.taxable_income)),
        ("tax", format_dollars(r.tax)),
        ("total_tax", format_dollars(r.tax)),
        ("withholding", format_dollars(r.withholding)),
        ("total_payments", format_dollars(r.withholding)),
        ("refund", optional_dollars(r.refund)),
        ("amount_owed", optional_dollars(r.amount_owed)),
        ("occupation", r.taxpayer.occupation.clone()),
        ("spouse_occupation", spouse.map(|s| s.occupation.clone()).unwrap_or_default()),
        ("phone", r.phone.clone()),
        ("email", r.email.clone()),
        ("signature_date", r.signature_date.as_ref().map(format_form_date).unwrap_or_default()),
    ]
}
