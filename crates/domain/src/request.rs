//! Declarative request validation.
//!
//! Each service describes its body with a [`RequestSchema`]: the geometry
//! member, the other required members in the order they are checked, and the
//! optional members with their defaults. [`RequestSchema::validate`] is pure
//! and never coerces types.

use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::geometry::GeometryInput;

/// The JSON type a field must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A JSON integer (`2023`, not `2023.0`).
    Integer,
    /// Any JSON number.
    Number,
    /// Any JSON string.
    Text,
    /// A string holding `YYYY-MM-DD` or an RFC 3339 timestamp.
    Date,
}

impl FieldKind {
    fn expected(self) -> &'static str {
        match self {
            Self::Integer => "an integer",
            Self::Number => "a number",
            Self::Text | Self::Date => "a string",
        }
    }

    fn check(self, field: &'static str, value: &Value) -> Result<(), ValidationError> {
        let ok = match self {
            Self::Integer => value.as_i64().is_some(),
            Self::Number => value.is_number(),
            Self::Text => value.is_string(),
            Self::Date => {
                let text = value.as_str().ok_or(ValidationError::WrongType {
                    field,
                    expected: self.expected(),
                })?;
                if is_iso_date(text) {
                    return Ok(());
                }
                return Err(ValidationError::InvalidDate {
                    field,
                    value: text.to_string(),
                });
            }
        };
        if ok {
            Ok(())
        } else {
            Err(ValidationError::WrongType {
                field,
                expected: self.expected(),
            })
        }
    }
}

fn is_iso_date(text: &str) -> bool {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok() || DateTime::parse_from_rfc3339(text).is_ok()
}

/// Default applied when an optional field is absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Integer(i64),
    Number(f64),
    Text(&'static str),
}

impl DefaultValue {
    fn to_value(self) -> Value {
        match self {
            Self::Integer(n) => Value::from(n),
            Self::Number(n) => Value::from(n),
            Self::Text(s) => Value::from(s),
        }
    }
}

/// A required member other than the geometry.
#[derive(Debug, Clone, Copy)]
pub struct RequiredField {
    pub name: &'static str,
    pub kind: FieldKind,
}

/// An optional member and the default it takes when absent.
#[derive(Debug, Clone, Copy)]
pub struct OptionalField {
    pub name: &'static str,
    pub kind: FieldKind,
    pub default: DefaultValue,
}

/// Shape of a service's request body.
#[derive(Debug, Clone, Copy)]
pub struct RequestSchema {
    /// Name of the GeoJSON member, always checked first.
    pub geometry_field: &'static str,
    /// Checked in order after the geometry; the first absent one is reported.
    pub required: &'static [RequiredField],
    pub optional: &'static [OptionalField],
}

impl RequestSchema {
    /// Validate a raw body and fill in defaults.
    ///
    /// `null` counts as absent. Explicit values are kept even when falsy
    /// (`cloud_threshold: 0` stays `0`).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingBody`] when `body` is absent or not
    /// an object, [`ValidationError::MissingField`] naming the first absent
    /// required member, and [`ValidationError::WrongType`] or
    /// [`ValidationError::InvalidDate`] for mistyped members.
    pub fn validate(&self, body: Option<&Value>) -> Result<ValidatedRequest, ValidationError> {
        let object = body
            .and_then(Value::as_object)
            .ok_or(ValidationError::MissingBody)?;

        let geometry = match present(object, self.geometry_field) {
            None => return Err(ValidationError::MissingField(self.geometry_field)),
            Some(Value::Object(members)) => GeometryInput::new(members.clone()),
            Some(_) => {
                return Err(ValidationError::WrongType {
                    field: self.geometry_field,
                    expected: "a GeoJSON object",
                });
            }
        };

        let mut params = Map::new();
        for field in self.required {
            let value =
                present(object, field.name).ok_or(ValidationError::MissingField(field.name))?;
            field.kind.check(field.name, value)?;
            params.insert(field.name.to_string(), value.clone());
        }
        for field in self.optional {
            let value = match present(object, field.name) {
                Some(value) => {
                    field.kind.check(field.name, value)?;
                    value.clone()
                }
                None => field.default.to_value(),
            };
            params.insert(field.name.to_string(), value);
        }

        Ok(ValidatedRequest { geometry, params })
    }
}

fn present<'a>(object: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    object.get(name).filter(|value| !value.is_null())
}

/// A body that passed its schema, with every optional field filled.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub geometry: GeometryInput,
    params: Map<String, Value>,
}

impl ValidatedRequest {
    /// Read an integer parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the schema did not declare `name` as an
    /// integer.
    pub fn integer(&self, name: &'static str) -> Result<i64, ValidationError> {
        self.params
            .get(name)
            .and_then(Value::as_i64)
            .ok_or(ValidationError::MissingField(name))
    }

    /// Read a numeric parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the schema did not declare `name` as a
    /// number.
    pub fn number(&self, name: &'static str) -> Result<f64, ValidationError> {
        self.params
            .get(name)
            .and_then(Value::as_f64)
            .ok_or(ValidationError::MissingField(name))
    }

    /// Read a string or date parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the schema did not declare `name` as a
    /// string.
    pub fn text(&self, name: &'static str) -> Result<String, ValidationError> {
        self.params
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(ValidationError::MissingField(name))
    }
}
