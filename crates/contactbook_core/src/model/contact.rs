//! Contact domain model.
//!
//! # Responsibility
//! - Define the canonical contact record and its natural key.
//! - Provide structural validation and the flat string-keyed mapping used by
//!   storage, wire and tabular representations.
//!
//! # Invariants
//! - `(first_name, last_name)` identifies a contact; see [`ContactKey`].
//! - `first_name` is never empty; `last_name` may be empty.
//! - Optional text fields are stored as empty strings, never `None`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Field names of the flat mapping, in storage column order.
pub const FIELD_FIRST_NAME: &str = "first_name";
pub const FIELD_LAST_NAME: &str = "last_name";
pub const FIELD_CATEGORY: &str = "category";
pub const FIELD_PHONE_NUMBER: &str = "phone_number";
pub const FIELD_EMAIL: &str = "email";
pub const FIELD_ADDRESS: &str = "address";
pub const FIELD_INSTITUTION: &str = "institution";
pub const FIELD_IS_STARRED: &str = "is_starred";

/// Natural key of a contact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContactKey {
    pub first_name: String,
    pub last_name: String,
}

impl ContactKey {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

impl Display for ContactKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.last_name.is_empty() {
            write!(f, "{}", self.first_name)
        } else {
            write!(f, "{} {}", self.first_name, self.last_name)
        }
    }
}

/// Canonical contact record.
///
/// Deserialization accepts partial objects: optional text fields default to
/// empty strings and `is_starred` defaults to `false`. `is_starred` takes the
/// same truthy values as [`Contact::from_map`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default, deserialize_with = "deserialize_truthy")]
    pub is_starred: bool,
}

/// Structural validation errors for [`Contact`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactValidationError {
    /// `first_name` is empty or whitespace-only.
    EmptyFirstName,
    /// A required field is absent from a flat mapping.
    MissingField(&'static str),
    /// A required field is present but not a string.
    NotAString(&'static str),
}

impl Display for ContactValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyFirstName => write!(f, "first_name cannot be empty"),
            Self::MissingField(field) => write!(f, "missing required field `{field}`"),
            Self::NotAString(field) => write!(f, "field `{field}` must be a string"),
        }
    }
}

impl Error for ContactValidationError {}

impl Contact {
    /// Creates a contact with empty optional fields and `is_starred = false`.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            category: String::new(),
            phone_number: String::new(),
            email: String::new(),
            address: String::new(),
            institution: String::new(),
            is_starred: false,
        }
    }

    /// Returns an owned copy of this contact's natural key.
    pub fn key(&self) -> ContactKey {
        ContactKey::new(self.first_name.clone(), self.last_name.clone())
    }

    /// Checks record-level invariants before persistence.
    pub fn validate(&self) -> Result<(), ContactValidationError> {
        if self.first_name.trim().is_empty() {
            return Err(ContactValidationError::EmptyFirstName);
        }
        Ok(())
    }

    /// Text fields in search order: names first, then the free-text columns.
    pub fn text_fields(&self) -> [&str; 7] {
        [
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.category.as_str(),
            self.phone_number.as_str(),
            self.email.as_str(),
            self.address.as_str(),
            self.institution.as_str(),
        ]
    }

    /// Converts this contact into its flat string-keyed mapping.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(FIELD_FIRST_NAME.into(), Value::from(self.first_name.as_str()));
        map.insert(FIELD_LAST_NAME.into(), Value::from(self.last_name.as_str()));
        map.insert(FIELD_CATEGORY.into(), Value::from(self.category.as_str()));
        map.insert(
            FIELD_PHONE_NUMBER.into(),
            Value::from(self.phone_number.as_str()),
        );
        map.insert(FIELD_EMAIL.into(), Value::from(self.email.as_str()));
        map.insert(FIELD_ADDRESS.into(), Value::from(self.address.as_str()));
        map.insert(
            FIELD_INSTITUTION.into(),
            Value::from(self.institution.as_str()),
        );
        map.insert(FIELD_IS_STARRED.into(), Value::Bool(self.is_starred));
        map
    }

    /// Builds a contact from a flat mapping.
    ///
    /// # Contract
    /// - `first_name` and `last_name` must be present as strings.
    /// - Missing or null optional fields become empty strings.
    /// - `is_starred` accepts any truthy/falsy value.
    /// - Does not call [`Contact::validate`]; write paths do that.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, ContactValidationError> {
        Ok(Self {
            first_name: required_text(map, FIELD_FIRST_NAME)?,
            last_name: required_text(map, FIELD_LAST_NAME)?,
            category: optional_text(map, FIELD_CATEGORY),
            phone_number: optional_text(map, FIELD_PHONE_NUMBER),
            email: optional_text(map, FIELD_EMAIL),
            address: optional_text(map, FIELD_ADDRESS),
            institution: optional_text(map, FIELD_INSTITUTION),
            is_starred: map.get(FIELD_IS_STARRED).is_some_and(is_truthy),
        })
    }
}

fn required_text(
    map: &Map<String, Value>,
    field: &'static str,
) -> Result<String, ContactValidationError> {
    match map.get(field) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(ContactValidationError::NotAString(field)),
        None => Err(ContactValidationError::MissingField(field)),
    }
}

fn optional_text(map: &Map<String, Value>, field: &str) -> String {
    match map.get(field) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(value)) => value.clone(),
        Some(other) => other.to_string(),
    }
}

/// Coerces loosely-typed input into a flag.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => {
            let normalized = text.trim().to_ascii_lowercase();
            !matches!(normalized.as_str(), "" | "0" | "false" | "no" | "off")
        }
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

fn deserialize_truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|value| is_truthy(&value))
}

#[cfg(test)]
mod tests {
    use super::{is_truthy, Contact, ContactKey, ContactValidationError};
    use serde_json::{json, Value};

    fn object(value: Value) -> serde_json::Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn new_contact_defaults_to_unstarred_and_empty_fields() {
        let contact = Contact::new("Ada", "Lovelace");
        assert!(!contact.is_starred);
        assert!(contact.email.is_empty());
        assert!(contact.institution.is_empty());
        assert_eq!(contact.key(), ContactKey::new("Ada", "Lovelace"));
    }

    #[test]
    fn validate_rejects_blank_first_name_but_allows_empty_last_name() {
        assert_eq!(
            Contact::new("  ", "Lovelace").validate(),
            Err(ContactValidationError::EmptyFirstName)
        );
        assert!(Contact::new("Prince", "").validate().is_ok());
    }

    #[test]
    fn from_map_fills_missing_optional_fields() {
        let map = object(json!({
            "first_name": "Grace",
            "last_name": "Hopper",
            "email": "grace@navy.mil",
            "address": null
        }));
        let contact = Contact::from_map(&map).unwrap();
        assert_eq!(contact.email, "grace@navy.mil");
        assert_eq!(contact.address, "");
        assert_eq!(contact.category, "");
        assert!(!contact.is_starred);
    }

    #[test]
    fn from_map_requires_string_names() {
        let missing = object(json!({ "first_name": "Grace" }));
        assert_eq!(
            Contact::from_map(&missing),
            Err(ContactValidationError::MissingField("last_name"))
        );

        let numeric = object(json!({ "first_name": 7, "last_name": "" }));
        assert_eq!(
            Contact::from_map(&numeric),
            Err(ContactValidationError::NotAString("first_name"))
        );
    }

    #[test]
    fn from_map_renders_numeric_optional_fields_as_text() {
        let map = object(json!({
            "first_name": "Alan",
            "last_name": "Turing",
            "phone_number": 5551234
        }));
        assert_eq!(Contact::from_map(&map).unwrap().phone_number, "5551234");
    }

    #[test]
    fn is_starred_coerces_truthy_values() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("yes")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("false")));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&Value::Null));
    }

    #[test]
    fn to_map_and_from_map_agree() {
        let mut contact = Contact::new("Ada", "Lovelace");
        contact.institution = "Analytical Society".to_string();
        contact.is_starred = true;
        let restored = Contact::from_map(&contact.to_map()).unwrap();
        assert_eq!(restored, contact);
    }

    #[test]
    fn key_display_omits_empty_last_name() {
        assert_eq!(ContactKey::new("Ada", "Lovelace").to_string(), "Ada Lovelace");
        assert_eq!(ContactKey::new("Prince", "").to_string(), "Prince");
    }

    #[test]
    fn serde_defaults_optional_fields() {
        let contact: Contact =
            serde_json::from_value(json!({ "first_name": "Ada", "last_name": "" })).unwrap();
        assert_eq!(contact, Contact::new("Ada", ""));
    }

    #[test]
    fn serde_coerces_truthy_is_starred() {
        let parse = |flag: Value| -> Contact {
            serde_json::from_value(json!({
                "first_name": "Ada",
                "last_name": "Lovelace",
                "is_starred": flag
            }))
            .unwrap()
        };

        assert!(parse(json!(true)).is_starred);
        assert!(parse(json!(1)).is_starred);
        assert!(parse(json!("yes")).is_starred);
        assert!(!parse(json!(0)).is_starred);
        assert!(!parse(json!("0")).is_starred);
        assert!(!parse(json!("off")).is_starred);
        assert!(!parse(Value::Null).is_starred);
    }
}
