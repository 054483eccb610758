//! Patient record models.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use super::validation::{
    absolute_url, as_bool, as_integer, as_number, as_string, as_string_list, char_length,
    email, emergency_contact_satisfied, max_items, non_empty, within, Check, FieldReader,
    SchemaRules, ValidationError, MAX_ALLERGIES, MAX_HEIGHT_CM, MAX_WEIGHT_KG, NAME_MAX_CHARS,
    NAME_MIN_CHARS,
};
use super::vitals::{compute_bmi, Verdict};

/// Fields that are always recomputed and never taken from input.
pub const DERIVED_FIELDS: [&str; 2] = ["bmi", "verdict"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    fn parse(value: &Value) -> Check<Self> {
        match value.as_str() {
            Some("Male") => Ok(Gender::Male),
            Some("Female") => Ok(Gender::Female),
            Some("Other") => Ok(Gender::Other),
            _ => Err("must be one of Male, Female, Other".to_string()),
        }
    }
}

/// A structured postal address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

/// The `address` field holds either a single line or a structured address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum AddressField {
    Line(String),
    Structured(Address),
}

impl AddressField {
    /// Parse the `address` field, reporting nested failures as `address.<part>`.
    fn read(reader: &mut FieldReader<'_>) -> Option<Self> {
        match reader.value("address") {
            None => {
                reader.fail("address", "field required");
                None
            }
            Some(Value::String(line)) => Some(AddressField::Line(line.clone())),
            Some(Value::Object(parts)) => {
                let mut nested = FieldReader::new(parts);
                let address = nested.required("address", as_string);
                let city = nested.required("city", as_string);
                let state = nested.required("state", as_string);
                let zip = nested.required("zip", as_string);
                let country = nested.required("country", as_string);
                for violation in nested.into_error().violations() {
                    reader.fail(&format!("address.{}", violation.field), violation.reason.clone());
                }
                let (Some(address), Some(city), Some(state), Some(zip), Some(country)) =
                    (address, city, state, zip, country)
                else {
                    return None;
                };
                Some(AddressField::Structured(Address {
                    address,
                    city,
                    state,
                    zip,
                    country,
                }))
            }
            Some(_) => {
                reader.fail("address", "expected a string or an address object");
                None
            }
        }
    }
}

/// Uppercase a patient name. Idempotent.
pub fn normalize_name(name: &str) -> String {
    name.to_uppercase()
}

/// A validated patient record.
///
/// Only constructible through [`PatientRecord::parse`], so every instance
/// satisfies the field rules. `bmi` and `verdict` are computed from
/// `height` and `weight` on access and cannot be set.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientRecord {
    id: String,
    name: String,
    email: String,
    linkedin: String,
    age: u32,
    married: Option<bool>,
    gender: Gender,
    address: AddressField,
    phone: String,
    city: String,
    contact: BTreeMap<String, String>,
    allergies: Option<Vec<String>>,
    height: f64,
    weight: f64,
}

impl PatientRecord {
    /// Validate untrusted input into a record.
    ///
    /// Any `bmi` or `verdict` present in `raw` is ignored.
    pub fn parse(raw: &Map<String, Value>, rules: &SchemaRules) -> Result<Self, ValidationError> {
        let mut reader = FieldReader::new(raw);
        let max_age = f64::from(rules.max_age);

        let id = reader.required("id", |v| as_string(v).and_then(non_empty));
        // Uppercasing can lengthen a name ("ß" -> "SS"), so the stored form
        // is bounded as well.
        let name = reader.required("name", |v| {
            as_string(v)
                .and_then(|s| char_length(s, NAME_MIN_CHARS, NAME_MAX_CHARS))
                .map(|s| normalize_name(&s))
                .and_then(|s| char_length(s, NAME_MIN_CHARS, NAME_MAX_CHARS))
        });
        let email = reader.required("email", |v| as_string(v).and_then(|s| email(s, rules)));
        let linkedin = reader.required("linkedin", |v| as_string(v).and_then(absolute_url));
        let age = reader.required("age", |v| {
            as_integer(v)
                .and_then(|n| within(n as f64, 0.0, max_age))
                .map(|n| n as u32)
        });
        let married = reader.optional("married", as_bool);
        let gender = reader.required("gender", Gender::parse);
        let address = AddressField::read(&mut reader);
        let phone = reader.required("phone", as_string);
        let city = reader.required("city", as_string);
        let contact = reader.required("contact", parse_contact);
        let allergies = reader.optional("allergies", |v| {
            as_string_list(v).and_then(|items| max_items(items, MAX_ALLERGIES))
        });
        let height = reader.required("height", |v| {
            as_number(v).and_then(|h| within(h, 0.0, MAX_HEIGHT_CM))
        });
        let weight = reader.required("weight", |v| {
            as_number(v).and_then(|w| within(w, 0.0, MAX_WEIGHT_KG))
        });

        if !emergency_contact_satisfied(raw) {
            reader.fail("contact", "missing emergency contact");
        }
        if !reader.is_clean() {
            return Err(reader.into_error());
        }

        let (
            Some(id),
            Some(name),
            Some(email),
            Some(linkedin),
            Some(age),
            Some(married),
            Some(gender),
            Some(address),
            Some(phone),
            Some(city),
            Some(contact),
            Some(allergies),
            Some(height),
            Some(weight),
        ) = (
            id, name, email, linkedin, age, married, gender, address, phone, city, contact,
            allergies, height, weight,
        )
        else {
            return Err(reader.into_error());
        };

        Ok(Self {
            id,
            name,
            email,
            linkedin,
            age,
            married,
            gender,
            address,
            phone,
            city,
            contact,
            allergies,
            height,
            weight,
        })
    }

    /// Parse a stored entry, which is keyed by id and carries no `id` field.
    pub fn from_stored(
        id: &str,
        fields: &Map<String, Value>,
        rules: &SchemaRules,
    ) -> Result<Self, ValidationError> {
        let mut raw = fields.clone();
        raw.insert("id".to_string(), Value::String(id.to_string()));
        Self::parse(&raw, rules)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Upper-cased name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn linkedin(&self) -> &str {
        &self.linkedin
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn married(&self) -> Option<bool> {
        self.married
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn address(&self) -> &AddressField {
        &self.address
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn contact(&self) -> &BTreeMap<String, String> {
        &self.contact
    }

    pub fn allergies(&self) -> Option<&[String]> {
        self.allergies.as_deref()
    }

    /// Height in centimetres.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Weight in kilograms.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn bmi(&self) -> f64 {
        compute_bmi(self.height, self.weight)
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::from_bmi(self.bmi())
    }

    /// Fields as persisted in the store document: no `id`, derived fields
    /// included.
    pub fn to_stored(&self) -> Map<String, Value> {
        [
            ("name", json!(self.name)),
            ("email", json!(self.email)),
            ("linkedin", json!(self.linkedin)),
            ("age", json!(self.age)),
            ("married", json!(self.married)),
            ("gender", json!(self.gender)),
            ("address", json!(self.address)),
            ("phone", json!(self.phone)),
            ("city", json!(self.city)),
            ("contact", json!(self.contact)),
            ("allergies", json!(self.allergies)),
            ("height", json!(self.height)),
            ("weight", json!(self.weight)),
            ("bmi", json!(self.bmi())),
            ("verdict", json!(self.verdict())),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
    }

    /// Full representation including `id`.
    pub fn to_json(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        fields.extend(self.to_stored());
        fields
    }

    /// JSON value of a named field, derived fields included.
    pub fn field_value(&self, field: &str) -> Option<Value> {
        if field == "id" {
            return Some(Value::String(self.id.clone()));
        }
        self.to_stored().remove(field)
    }
}

impl Serialize for PatientRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

fn parse_contact(value: &Value) -> Check<BTreeMap<String, String>> {
    let entries = value
        .as_object()
        .ok_or_else(|| "expected an object of strings".to_string())?;
    entries
        .iter()
        .map(|(key, v)| match v.as_str() {
            Some(s) => Ok((key.clone(), s.to_string())),
            None => Err(format!("value for '{}' must be a string", key)),
        })
        .collect()
}
