//! Field-level validation rules and error reporting.
//!
//! Every field is checked independently; for a single field the first
//! failing rule wins. The resulting [`ValidationError`] lists all failing
//! fields in declaration order, with cross-field rules last.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Minimum name length in characters.
pub const NAME_MIN_CHARS: usize = 2;
/// Maximum name length in characters.
pub const NAME_MAX_CHARS: usize = 50;
/// Maximum number of listed allergies.
pub const MAX_ALLERGIES: usize = 10;
/// Exclusive upper bound for height in centimetres.
pub const MAX_HEIGHT_CM: f64 = 300.0;
/// Exclusive upper bound for weight in kilograms.
pub const MAX_WEIGHT_KG: f64 = 1000.0;
/// Patients older than this need an emergency contact.
pub const EMERGENCY_CONTACT_AGE: f64 = 60.0;
/// Key that must be present in `contact` above [`EMERGENCY_CONTACT_AGE`].
pub const EMERGENCY_CONTACT_KEY: &str = "emergency";
/// Email domains accepted by the strict variant.
pub const STRICT_EMAIL_DOMAINS: [&str; 3] = ["gmail.com", "yahoo.com", "hotmail.com"];

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub reason: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// A patient record failed validation.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid patient record: {}", join_violations(.violations))]
pub struct ValidationError {
    violations: Vec<FieldViolation>,
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Error with exactly one violation.
    pub fn single(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            violations: vec![FieldViolation {
                field: field.into(),
                reason: reason.into(),
            }],
        }
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Reason recorded for `field`, if it failed.
    pub fn reason_for(&self, field: &str) -> Option<&str> {
        self.violations
            .iter()
            .find(|v| v.field == field)
            .map(|v| v.reason.as_str())
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.reason_for(field).is_some()
    }
}

/// Which rule set a deployment validates against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVariant {
    /// Age below 100, email restricted to [`STRICT_EMAIL_DOMAINS`].
    Strict,
    /// Age below 120, any well-formed email.
    #[default]
    Api,
}

impl std::str::FromStr for SchemaVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(SchemaVariant::Strict),
            "api" => Ok(SchemaVariant::Api),
            other => Err(format!("unknown schema variant '{}' (expected strict or api)", other)),
        }
    }
}

/// Bounds that differ between variants.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaRules {
    pub variant: SchemaVariant,
    /// Exclusive upper bound for age.
    pub max_age: u32,
    /// `None` accepts any domain.
    pub allowed_email_domains: Option<Vec<String>>,
}

impl SchemaRules {
    pub fn for_variant(variant: SchemaVariant) -> Self {
        match variant {
            SchemaVariant::Strict => Self {
                variant,
                max_age: 100,
                allowed_email_domains: Some(
                    STRICT_EMAIL_DOMAINS.iter().map(|d| d.to_string()).collect(),
                ),
            },
            SchemaVariant::Api => Self {
                variant,
                max_age: 120,
                allowed_email_domains: None,
            },
        }
    }

    pub fn strict() -> Self {
        Self::for_variant(SchemaVariant::Strict)
    }

    pub fn api() -> Self {
        Self::for_variant(SchemaVariant::Api)
    }

    fn is_domain_allowed(&self, domain: &str) -> bool {
        match &self.allowed_email_domains {
            None => true,
            Some(domains) => domains.iter().any(|d| d.eq_ignore_ascii_case(domain)),
        }
    }
}

impl Default for SchemaRules {
    fn default() -> Self {
        Self::for_variant(SchemaVariant::default())
    }
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("email pattern")
    })
}

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://[^\s/?#@]+(:[0-9]+)?([/?#]\S*)?$")
            .expect("url pattern")
    })
}

/// Collects violations while a record is being read field by field.
///
/// Each reader returns `Some(value)` on success and records the reason
/// otherwise, so callers can keep going and report every failing field.
#[derive(Debug)]
pub(crate) struct FieldReader<'a> {
    raw: &'a Map<String, Value>,
    violations: Vec<FieldViolation>,
}

pub(crate) type Check<T> = Result<T, String>;

impl<'a> FieldReader<'a> {
    pub(crate) fn new(raw: &'a Map<String, Value>) -> Self {
        Self {
            raw,
            violations: Vec::new(),
        }
    }

    pub(crate) fn fail(&mut self, field: &str, reason: impl Into<String>) {
        self.violations.push(FieldViolation {
            field: field.to_string(),
            reason: reason.into(),
        });
    }

    /// Record the outcome of a check under `field`.
    pub(crate) fn check<T>(&mut self, field: &str, result: Check<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(reason) => {
                self.fail(field, reason);
                None
            }
        }
    }

    /// Raw value of `field`, with `null` treated as absent.
    pub(crate) fn value(&self, field: &str) -> Option<&'a Value> {
        self.raw.get(field).filter(|v| !v.is_null())
    }

    pub(crate) fn required<T>(
        &mut self,
        field: &str,
        parse: impl FnOnce(&'a Value) -> Check<T>,
    ) -> Option<T> {
        let result = match self.value(field) {
            Some(value) => parse(value),
            None => Err("field required".to_string()),
        };
        self.check(field, result)
    }

    /// Optional field; `Some(None)` means absent or null.
    pub(crate) fn optional<T>(
        &mut self,
        field: &str,
        parse: impl FnOnce(&'a Value) -> Check<T>,
    ) -> Option<Option<T>> {
        match self.value(field) {
            None => Some(None),
            Some(value) => {
                let result = parse(value).map(Some);
                self.check(field, result)
            }
        }
    }

    pub(crate) fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub(crate) fn into_error(self) -> ValidationError {
        ValidationError {
            violations: self.violations,
        }
    }
}

pub(crate) fn as_string(value: &Value) -> Check<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| "expected a string".to_string())
}

pub(crate) fn as_integer(value: &Value) -> Check<i64> {
    if let Some(n) = value.as_i64() {
        return Ok(n);
    }
    match value.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
        _ => Err("expected an integer".to_string()),
    }
}

pub(crate) fn as_number(value: &Value) -> Check<f64> {
    value
        .as_f64()
        .ok_or_else(|| "expected a number".to_string())
}

pub(crate) fn as_bool(value: &Value) -> Check<bool> {
    value
        .as_bool()
        .ok_or_else(|| "expected a boolean".to_string())
}

pub(crate) fn as_string_list(value: &Value) -> Check<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| "expected a list of strings".to_string())?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| "expected a list of strings".to_string())
        })
        .collect()
}

pub(crate) fn non_empty(value: String) -> Check<String> {
    if value.trim().is_empty() {
        Err("must not be empty".to_string())
    } else {
        Ok(value)
    }
}

pub(crate) fn char_length(value: String, min: usize, max: usize) -> Check<String> {
    let len = value.chars().count();
    if len < min || len > max {
        Err(format!("length must be between {} and {} characters", min, max))
    } else {
        Ok(value)
    }
}

/// Exclusive bounds on both ends.
pub(crate) fn within(value: f64, lower: f64, upper: f64) -> Check<f64> {
    if value <= lower {
        Err(format!("must be greater than {}", lower))
    } else if value >= upper {
        Err(format!("must be less than {}", upper))
    } else {
        Ok(value)
    }
}

pub(crate) fn email(value: String, rules: &SchemaRules) -> Check<String> {
    if !email_pattern().is_match(&value) {
        return Err("invalid email address".to_string());
    }
    let domain = value.split('@').nth(1).unwrap_or_default();
    if !rules.is_domain_allowed(domain) {
        return Err("unsupported domain".to_string());
    }
    Ok(value)
}

pub(crate) fn absolute_url(value: String) -> Check<String> {
    if url_pattern().is_match(&value) {
        Ok(value)
    } else {
        Err("invalid URL".to_string())
    }
}

pub(crate) fn max_items<T>(items: Vec<T>, max: usize) -> Check<Vec<T>> {
    if items.len() > max {
        Err(format!("at most {} items allowed", max))
    } else {
        Ok(items)
    }
}

/// Older patients must list an emergency contact.
///
/// Runs against the raw input: a missing or malformed `contact` counts as
/// an empty mapping, and a non-numeric age never triggers the rule.
pub(crate) fn emergency_contact_satisfied(raw: &Map<String, Value>) -> bool {
    let age = raw.get("age").and_then(Value::as_f64).unwrap_or(0.0);
    if age <= EMERGENCY_CONTACT_AGE {
        return true;
    }
    raw.get("contact")
        .and_then(Value::as_object)
        .is_some_and(|contact| contact.contains_key(EMERGENCY_CONTACT_KEY))
}
