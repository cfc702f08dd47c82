//! Synthetic taxpayer and employer data
//!
//! Every value produced here is fake: SSNs and EINs are well-formed but drawn
//! at random, phone numbers stay in the 555-01xx fictional range, and the
//! return amounts are random inputs run through the 2023 Form 1040 arithmetic.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::period::TaxPeriod;

const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "Robert", "Patricia", "John", "Jennifer", "Michael", "Linda",
    "David", "Elizabeth", "William", "Barbara", "Richard", "Susan", "Joseph", "Jessica",
    "Thomas", "Sarah", "Carlos", "Karen", "Daniel", "Lisa", "Matthew", "Nancy",
    "Anthony", "Sandra", "Mark", "Ashley", "Wei", "Priya", "Andre", "Fatima",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis",
    "Rodriguez", "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson",
    "Thomas", "Taylor", "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson",
    "White", "Harris", "Sanchez", "Clark", "Nguyen", "Patel", "Okafor",
];

const STREET_NAMES: &[&str] = &[
    "Maple", "Oak", "Cedar", "Pine", "Elm", "Washington", "Lake", "Hill",
    "Park", "Sunset", "Ridge", "Highland", "Meadow", "River", "Church", "Mill",
];

const STREET_SUFFIXES: &[&str] = &["St", "Ave", "Rd", "Blvd", "Ln", "Dr", "Ct", "Way"];

/// (city, state, ZIP prefix)
const CITIES: &[(&str, &str, u32)] = &[
    ("Springfield", "IL", 627),
    ("Columbus", "OH", 432),
    ("Austin", "TX", 787),
    ("Madison", "WI", 537),
    ("Denver", "CO", 802),
    ("Raleigh", "NC", 276),
    ("Portland", "OR", 972),
    ("Albany", "NY", 122),
    ("Tucson", "AZ", 857),
    ("Richmond", "VA", 232),
    ("Boise", "ID", 837),
    ("Savannah", "GA", 314),
];

const OCCUPATIONS: &[&str] = &[
    "Teacher", "Nurse", "Accountant", "Electrician", "Software Engineer", "Sales Manager",
    "Pharmacist", "Carpenter", "Graphic Designer", "Mechanic", "Paralegal", "Chef",
];

const COMPANY_SUFFIXES: &[&str] = &[
    "Logistics LLC", "Manufacturing Inc", "Holdings Corp", "Services LLC",
    "Construction Co", "Foods Inc", "Technologies Inc", "Partners LP",
];

/// IRS campus prefixes assigned to EINs
const EIN_PREFIXES: &[u32] = &[
    1, 2, 3, 4, 5, 6, 10, 11, 12, 13, 14, 15, 16, 20, 21, 22, 23, 24, 25, 26, 27,
    30, 31, 32, 33, 34, 35, 36, 37, 38, 39, 40, 41, 42, 43, 44, 45, 46, 47, 48,
    50, 51, 52, 53, 54, 55, 56, 57, 58, 59, 60, 61, 62, 63, 64, 65, 66, 67, 68,
    71, 72, 73, 74, 75, 76, 77, 80, 81, 82, 83, 84, 85, 86, 87, 88,
    90, 91, 92, 93, 94, 95, 98, 99,
];

/// Form 1040 filing status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    Single,
    MarriedFilingJointly,
    MarriedFilingSeparately,
    HeadOfHousehold,
}

impl FilingStatus {
    pub const ALL: [FilingStatus; 4] = [
        FilingStatus::Single,
        FilingStatus::MarriedFilingJointly,
        FilingStatus::MarriedFilingSeparately,
        FilingStatus::HeadOfHousehold,
    ];

    /// 2023 standard deduction
    pub fn standard_deduction(&self) -> i64 {
        match self {
            FilingStatus::Single | FilingStatus::MarriedFilingSeparately => 13_850,
            FilingStatus::MarriedFilingJointly => 27_700,
            FilingStatus::HeadOfHousehold => 20_800,
        }
    }

    /// 2023 bracket upper bounds for the 10/12/22/24/32/35% rates
    fn bracket_limits(&self) -> [i64; 6] {
        match self {
            FilingStatus::Single => [11_000, 44_725, 95_375, 182_100, 231_250, 578_125],
            FilingStatus::MarriedFilingJointly => {
                [22_000, 89_450, 190_750, 364_200, 462_500, 693_750]
            }
            FilingStatus::MarriedFilingSeparately => {
                [11_000, 44_725, 95_375, 182_100, 231_250, 346_875]
            }
            FilingStatus::HeadOfHousehold => [15_700, 59_850, 95_350, 182_100, 231_250, 578_100],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FilingStatus::Single => "Single",
            FilingStatus::MarriedFilingJointly => "Married filing jointly",
            FilingStatus::MarriedFilingSeparately => "Married filing separately",
            FilingStatus::HeadOfHousehold => "Head of household",
        }
    }
}

const BRACKET_RATES: [i64; 7] = [10, 12, 22, 24, 32, 35, 37];

/// Income tax on `taxable_income` using the 2023 rate schedules, rounded to whole dollars
pub fn compute_tax(status: FilingStatus, taxable_income: i64) -> i64 {
    if taxable_income <= 0 {
        return 0;
    }

    let limits = status.bracket_limits();
    let mut lower = 0;
    // Accumulated in dollar-percent units to stay in integer math
    let mut total = 0;

    for (i, rate) in BRACKET_RATES.iter().enumerate() {
        let upper = limits.get(i).copied().unwrap_or(i64::MAX);
        if taxable_income <= lower {
            break;
        }
        let slice = taxable_income.min(upper) - lower;
        total += slice * rate;
        lower = upper;
    }

    (total + 50) / 100
}

/// Render whole dollars with thousands separators ("52,340", "-1,200")
pub fn format_dollars(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Person {
    pub first_name: String,
    pub middle_initial: Option<char>,
    pub last_name: String,
    pub ssn: String,
    pub occupation: String,
}

impl Person {
    /// First name plus middle initial, as the 1040 name line expects
    pub fn given_names(&self) -> String {
        match self.middle_initial {
            Some(mi) => format!("{} {}", self.first_name, mi),
            None => self.first_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Address {
    pub street: String,
    pub apartment: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Form1040Record {
    pub tax_year: i32,
    pub filing_status: FilingStatus,
    pub taxpayer: Person,
    pub spouse: Option<Person>,
    pub address: Address,
    pub phone: String,
    pub email: String,
    /// Line 1a
    pub wages: i64,
    /// Line 2a
    pub tax_exempt_interest: i64,
    /// Line 2b
    pub taxable_interest: i64,
    /// Line 3a
    pub qualified_dividends: i64,
    /// Line 3b
    pub ordinary_dividends: i64,
    /// Line 9
    pub total_income: i64,
    /// Line 10
    pub adjustments: i64,
    /// Line 11
    pub adjusted_gross_income: i64,
    /// Line 12
    pub standard_deduction: i64,
    /// Line 15
    pub taxable_income: i64,
    /// Line 16
    pub tax: i64,
    /// Line 25a
    pub withholding: i64,
    /// Line 34
    pub refund: i64,
    /// Line 37
    pub amount_owed: i64,
    pub signature_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionType {
    Original,
    Corrected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Acquisition,
    StatutoryMerger,
    Consolidation,
}

impl TransactionType {
    pub fn label(&self) -> &'static str {
        match self {
            TransactionType::Acquisition => "Acquisition",
            TransactionType::StatutoryMerger => "Statutory merger",
            TransactionType::Consolidation => "Consolidation",
        }
    }
}

/// One Schedule D comparison line: Form 941 total vs. Form W-2 total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiscrepancyLine {
    pub form_941: i64,
    pub form_w2: i64,
    pub discrepancy: i64,
}

impl DiscrepancyLine {
    pub fn new(form_941: i64, form_w2: i64) -> Self {
        Self {
            form_941,
            form_w2,
            discrepancy: form_941 - form_w2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schedule941DRecord {
    pub tax_year: i32,
    pub filer_ein: String,
    pub filer_name: String,
    pub submission: SubmissionType,
    pub transaction: TransactionType,
    pub transaction_date: NaiveDate,
    pub other_party_ein: String,
    pub other_party_name: String,
    pub social_security_wages: DiscrepancyLine,
    pub social_security_tips: DiscrepancyLine,
    pub medicare_wages_and_tips: DiscrepancyLine,
    pub income_tax_withheld: DiscrepancyLine,
    pub contact_name: String,
    pub contact_phone: String,
    pub signature_date: Option<NaiveDate>,
}

/// Random record generator
///
/// Seeding with [`SyntheticGenerator::seeded`] makes output reproducible.
pub struct SyntheticGenerator<R: Rng> {
    rng: R,
}

impl SyntheticGenerator<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Generator seeded from the operating system
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> SyntheticGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.rng.random_range(0..items.len())]
    }

    /// Random amount in `[low, high]` rounded down to a multiple of `step`
    fn amount(&mut self, low: i64, high: i64, step: i64) -> i64 {
        let value = self.rng.random_range(low..=high);
        value - value % step
    }

    /// Amount that is zero with probability `p_zero`
    fn sparse_amount(&mut self, p_zero: f64, high: i64) -> i64 {
        if self.rng.random_bool(p_zero) {
            0
        } else {
            self.amount(1, high, 1)
        }
    }

    /// SSN in `XXX-XX-XXXX` form, avoiding areas 000, 666, 900-999, group 00 and serial 0000
    pub fn ssn(&mut self) -> String {
        let area = loop {
            let a = self.rng.random_range(1..=899);
            if a != 666 {
                break a;
            }
        };
        let group = self.rng.random_range(1..=99);
        let serial = self.rng.random_range(1..=9999);
        format!("{:03}-{:02}-{:04}", area, group, serial)
    }

    /// EIN in `XX-XXXXXXX` form with a valid campus prefix
    pub fn ein(&mut self) -> String {
        let prefix = *self.pick(EIN_PREFIXES);
        let serial = self.rng.random_range(0..=9_999_999);
        format!("{:02}-{:07}", prefix, serial)
    }

    /// Phone number in the fictional 555-0100..0199 block
    pub fn phone(&mut self) -> String {
        let area = self.rng.random_range(201..=989);
        let line = self.rng.random_range(100..=199);
        format!("({}) 555-{:04}", area, line)
    }

    pub fn person(&mut self, last_name: Option<&str>) -> Person {
        let middle_initial = if self.rng.random_bool(0.6) {
            Some((b'A' + self.rng.random_range(0..26u8)) as char)
        } else {
            None
        };
        let last_name = match last_name {
            Some(name) => name.to_string(),
            None => self.pick(LAST_NAMES).to_string(),
        };
        Person {
            first_name: self.pick(FIRST_NAMES).to_string(),
            middle_initial,
            last_name,
            ssn: self.ssn(),
            occupation: self.pick(OCCUPATIONS).to_string(),
        }
    }

    pub fn address(&mut self) -> Address {
        let number = self.rng.random_range(100..=9999);
        let street = format!("{} {} {}", number, self.pick(STREET_NAMES), self.pick(STREET_SUFFIXES));
        let apartment = if self.rng.random_bool(0.25) {
            Some(format!("{}", self.rng.random_range(1..=40) * 10 + self.rng.random_range(1..=9)))
        } else {
            None
        };
        let (city, state, zip_prefix) = *self.pick(CITIES);
        let zip = format!("{:03}{:02}", zip_prefix, self.rng.random_range(1..=99));
        Address {
            street,
            apartment,
            city: city.to_string(),
            state: state.to_string(),
            zip,
        }
    }

    fn company_name(&mut self) -> String {
        format!("{} {}", self.pick(LAST_NAMES), self.pick(COMPANY_SUFFIXES))
    }

    fn date_in_period(&mut self, period: TaxPeriod) -> NaiveDate {
        let start = period.start_date();
        let span = (period.end_date() - start).num_days();
        start + chrono::Duration::days(self.rng.random_range(0..=span))
    }

    /// Generate a Form 1040 for `tax_year`
    pub fn form_1040(&mut self, tax_year: i32) -> Form1040Record {
        let filing_status = *self.pick(&FilingStatus::ALL);
        let taxpayer = self.person(None);
        let spouse = match filing_status {
            FilingStatus::MarriedFilingJointly => {
                let shared = taxpayer.last_name.clone();
                Some(self.person(Some(&shared)))
            }
            _ => None,
        };
        let address = self.address();
        let phone = self.phone();
        let email = format!(
            "{}.{}@example.com",
            taxpayer.first_name.to_lowercase(),
            taxpayer.last_name.to_lowercase()
        );

        let wages = match filing_status {
            FilingStatus::MarriedFilingJointly => self.amount(35_000, 240_000, 10),
            _ => self.amount(18_000, 160_000, 10),
        };
        let tax_exempt_interest = self.sparse_amount(0.7, 800);
        let taxable_interest = self.sparse_amount(0.5, 2_500);
        let ordinary_dividends = self.sparse_amount(0.5, 5_000);
        let qualified_dividends = self.rng.random_range(0..=ordinary_dividends);
        let adjustments = self.sparse_amount(0.6, 3_000);

        let mut record = Form1040Record {
            tax_year,
            filing_status,
            taxpayer,
            spouse,
            address,
            phone,
            email,
            wages,
            tax_exempt_interest,
            taxable_interest,
            qualified_dividends,
            ordinary_dividends,
            total_income: 0,
            adjustments,
            adjusted_gross_income: 0,
            standard_deduction: 0,
            taxable_income: 0,
            tax: 0,
            withholding: 0,
            refund: 0,
            amount_owed: 0,
            signature_date: None,
        };
        compute_1040_totals(&mut record);

        // Withholding lands within +/-20% of the tax so both refunds and balances due show up
        let tax = record.tax;
        record.withholding = self.rng.random_range(tax * 80 / 100..=tax * 120 / 100);
        compute_1040_totals(&mut record);

        record
    }

    /// Generate a Form 941 Schedule D for `period`
    ///
    /// The transaction date falls inside the period, so a quarter narrows it.
    pub fn schedule_941d(&mut self, period: TaxPeriod) -> Schedule941DRecord {
        let submission = if self.rng.random_bool(0.85) {
            SubmissionType::Original
        } else {
            SubmissionType::Corrected
        };
        let transaction = *self.pick(&[
            TransactionType::Acquisition,
            TransactionType::StatutoryMerger,
            TransactionType::Consolidation,
        ]);

        let ss_wages = self.amount(250_000, 4_000_000, 1);
        let ss_tips = self.sparse_amount(0.6, 120_000);
        let medicare = ss_wages + ss_tips + self.amount(0, 300_000, 1);
        let withheld = medicare * self.rng.random_range(10..=18) / 100;

        let contact = self.person(None);

        Schedule941DRecord {
            tax_year: period.year,
            filer_ein: self.ein(),
            filer_name: self.company_name(),
            submission,
            transaction,
            transaction_date: self.date_in_period(period),
            other_party_ein: self.ein(),
            other_party_name: self.company_name(),
            social_security_wages: self.discrepancy_line(ss_wages),
            social_security_tips: self.discrepancy_line(ss_tips),
            medicare_wages_and_tips: self.discrepancy_line(medicare),
            income_tax_withheld: self.discrepancy_line(withheld),
            contact_name: format!("{} {}", contact.first_name, contact.last_name),
            contact_phone: self.phone(),
            signature_date: None,
        }
    }

    /// W-2 total drifts from the 941 total by up to 3% in either direction
    fn discrepancy_line(&mut self, form_941: i64) -> DiscrepancyLine {
        let drift = form_941 * 3 / 100;
        let form_w2 = if drift == 0 {
            form_941
        } else {
            form_941 + self.rng.random_range(-drift..=drift)
        };
        DiscrepancyLine::new(form_941, form_w2)
    }
}

/// Recompute every derived 1040 line from the input lines
pub fn compute_1040_totals(record: &mut Form1040Record) {
    record.total_income = record.wages + record.taxable_interest + record.ordinary_dividends;
    record.adjusted_gross_income = record.total_income - record.adjustments;
    record.standard_deduction = record.filing_status.standard_deduction();
    record.taxable_income = (record.adjusted_gross_income - record.standard_deduction).max(0);
    record.tax = compute_tax(record.filing_status, record.taxable_income);

    let payments = record.withholding;
    record.refund = (payments - record.tax).max(0);
    record.amount_owed = (record.tax - payments).max(0);
}
