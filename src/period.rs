//! Tax period and form date parsing
//!
//! Tax periods are a calendar year with an optional quarter (Form 941 filers
//! report quarterly). Form dates are the signature/preparation dates printed
//! on a return, accepted as flexible expressions.

use std::fmt;

use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;

use crate::error::{Error, Result};

/// Calendar quarter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    /// Build a quarter from its number (1-4)
    pub fn from_number(n: u32) -> Option<Self> {
        match n {
            1 => Some(Quarter::Q1),
            2 => Some(Quarter::Q2),
            3 => Some(Quarter::Q3),
            4 => Some(Quarter::Q4),
            _ => None,
        }
    }

    pub fn number(&self) -> u32 {
        match self {
            Quarter::Q1 => 1,
            Quarter::Q2 => 2,
            Quarter::Q3 => 3,
            Quarter::Q4 => 4,
        }
    }

    /// Last day of the quarter
    pub fn end_date(&self, year: i32) -> NaiveDate {
        let (month, day) = match self {
            Quarter::Q1 => (3, 31),
            Quarter::Q2 => (6, 30),
            Quarter::Q3 => (9, 30),
            Quarter::Q4 => (12, 31),
        };
        // Quarter ends are fixed calendar days and always valid
        NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
    }

    /// First day of the quarter
    pub fn start_date(&self, year: i32) -> NaiveDate {
        let month = (self.number() - 1) * 3 + 1;
        NaiveDate::from_ymd_opt(year, month, 1).unwrap_or_default()
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.number())
    }
}

/// A tax year, optionally narrowed to one quarter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaxPeriod {
    pub year: i32,
    pub quarter: Option<Quarter>,
}

impl TaxPeriod {
    pub fn year(year: i32) -> Self {
        Self { year, quarter: None }
    }

    pub fn quarter(year: i32, quarter: Quarter) -> Self {
        Self { year, quarter: Some(quarter) }
    }

    /// First day covered by the period
    pub fn start_date(&self) -> NaiveDate {
        match self.quarter {
            Some(q) => q.start_date(self.year),
            None => Quarter::Q1.start_date(self.year),
        }
    }

    /// Last day covered by the period
    pub fn end_date(&self) -> NaiveDate {
        match self.quarter {
            Some(q) => q.end_date(self.year),
            None => Quarter::Q4.end_date(self.year),
        }
    }
}

impl fmt::Display for TaxPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.quarter {
            Some(q) => write!(f, "{}-{}", self.year, q),
            None => write!(f, "{}", self.year),
        }
    }
}

/// Parse a tax period
///
/// Supported formats:
/// - `"2024"` → calendar year 2024
/// - `"2024Q3"`, `"2024-Q3"` → third quarter of 2024
/// - `"Q3 2024"`, `"Q3/2024"` → third quarter of 2024
pub fn parse_tax_period(expr: &str) -> Result<TaxPeriod> {
    let expr = expr.trim().to_ascii_uppercase();
    if expr.is_empty() {
        return Err(Error::InvalidPeriod("empty period".to_string()));
    }

    if let Some(idx) = expr.find('Q') {
        let (left, right) = expr.split_at(idx);
        let right = &right[1..];
        let left = left.trim_end_matches(['-', ' ', '/']);

        let (year_str, quarter_str) = if left.is_empty() {
            // "Q3 2024"
            let (q, y) = right
                .split_once([' ', '/', '-'])
                .ok_or_else(|| Error::InvalidPeriod(format!("missing year: {}", expr)))?;
            (y.trim(), q.trim())
        } else {
            // "2024Q3"
            (left, right.trim())
        };

        let year = parse_year(year_str)?;
        let quarter = quarter_str
            .parse::<u32>()
            .ok()
            .and_then(Quarter::from_number)
            .ok_or_else(|| Error::InvalidPeriod(format!("invalid quarter: {}", quarter_str)))?;
        return Ok(TaxPeriod::quarter(year, quarter));
    }

    Ok(TaxPeriod::year(parse_year(&expr)?))
}

fn parse_year(s: &str) -> Result<i32> {
    let year: i32 = s
        .trim()
        .parse()
        .map_err(|_| Error::InvalidPeriod(format!("invalid year: {}", s)))?;
    if !(1900..=2100).contains(&year) {
        return Err(Error::InvalidPeriod(format!("year out of range: {}", year)));
    }
    Ok(year)
}

/// Date expression types
#[derive(Debug, Clone, PartialEq)]
pub enum DateExpression {
    /// Use today's date
    Today,
    /// Use an explicit date
    Explicit(NaiveDate),
    /// No date (leave the field blank)
    None,
}

/// Parse a date expression string into a DateExpression
///
/// Supported formats:
/// - `""` (empty) → None
/// - `"today"` → Today
/// - `"2024-04-15"` → Explicit date (ISO format)
/// - `"04/15/2024"` → Explicit date (US format)
pub fn parse_date_expression(expr: &str) -> Result<DateExpression> {
    let expr = expr.trim();

    if expr.is_empty() {
        return Ok(DateExpression::None);
    }

    if expr.eq_ignore_ascii_case("today") {
        return Ok(DateExpression::Today);
    }

    if let Ok(date) = NaiveDate::parse_from_str(expr, "%Y-%m-%d") {
        return Ok(DateExpression::Explicit(date));
    }

    if let Ok(date) = NaiveDate::parse_from_str(expr, "%m/%d/%Y") {
        return Ok(DateExpression::Explicit(date));
    }

    Err(Error::InvalidDateExpression(format!("Unable to parse date expression: {}", expr)))
}

/// Resolve a DateExpression to an actual date (if applicable)
pub fn resolve_date(expr: &DateExpression) -> Option<NaiveDate> {
    match expr {
        DateExpression::None => None,
        DateExpression::Today => Some(Local::now().date_naive()),
        DateExpression::Explicit(date) => Some(*date),
    }
}

/// Format a date the way IRS forms print it: "MM/DD/YYYY"
pub fn format_form_date(date: &NaiveDate) -> String {
    format!("{:02}/{:02}/{}", date.month(), date.day(), date.year())
}
