//! Sorting for record listings.

use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::models::PatientRecord;

/// Fields a listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Age,
    Gender,
    Address,
    Phone,
    City,
    Height,
    Weight,
    Bmi,
    Verdict,
}

impl SortField {
    pub const ALL: [SortField; 10] = [
        SortField::Name,
        SortField::Age,
        SortField::Gender,
        SortField::Address,
        SortField::Phone,
        SortField::City,
        SortField::Height,
        SortField::Weight,
        SortField::Bmi,
        SortField::Verdict,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Age => "age",
            SortField::Gender => "gender",
            SortField::Address => "address",
            SortField::Phone => "phone",
            SortField::City => "city",
            SortField::Height => "height",
            SortField::Weight => "weight",
            SortField::Bmi => "bmi",
            SortField::Verdict => "verdict",
        }
    }

    /// Comma-separated list of valid names, for error messages.
    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(SortField::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for SortField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|f| f.as_str() == s).ok_or(())
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(()),
        }
    }
}

/// Comparable projection of a field value.
///
/// A missing or null value sorts as the number `0`. Across kinds, numbers
/// come before strings and strings before any other JSON value; values of
/// that last kind compare equal.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Number(f64),
    Text(String),
    Other,
}

impl SortKey {
    fn from_value(value: Option<Value>) -> Self {
        match value {
            None | Some(Value::Null) => SortKey::Number(0.0),
            Some(Value::Number(n)) => SortKey::Number(n.as_f64().unwrap_or(0.0)),
            Some(Value::String(s)) => SortKey::Text(s),
            Some(_) => SortKey::Other,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Number(_) => 0,
            SortKey::Text(_) => 1,
            SortKey::Other => 2,
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Stable sort; ties keep their incoming order in both directions.
pub fn sort_records(records: &mut Vec<PatientRecord>, field: SortField, order: SortOrder) {
    let mut keyed: Vec<(SortKey, PatientRecord)> = records
        .drain(..)
        .map(|record| (SortKey::from_value(record.field_value(field.as_str())), record))
        .collect();

    match order {
        SortOrder::Asc => keyed.sort_by(|a, b| a.0.compare(&b.0)),
        SortOrder::Desc => keyed.sort_by(|a, b| b.0.compare(&a.0)),
    }

    records.extend(keyed.into_iter().map(|(_, record)| record));
}
