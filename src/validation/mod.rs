//! Form validation and sanitization.
//!
//! Every submitted form goes through the same pipeline:
//!
//! 1. decode the url-encoded body into a [`FormInput`] (repeated keys kept),
//! 2. normalize array fields ([`normalize_array`]),
//! 3. run each field's [`FieldRules`] chain: trim, check, escape,
//! 4. branch on the collected [`FieldError`]s.
//!
//! Validation never fails outright. It always yields the cleaned, escaped
//! input together with a possibly empty error list, so an invalid form can be
//! redisplayed as-is.

pub mod forms;
pub mod rules;
pub mod sanitize;

pub use forms::{CategoryInput, ProductInput};
pub use rules::{FieldRules, Rule};
pub use sanitize::{escape_html, normalize_array};

use crate::metrics::METRICS;
use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::Serialize;

/// Raw value of one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn first(&self) -> &str {
        match self {
            FieldValue::Scalar(value) => value,
            FieldValue::List(values) => values.first().map(String::as_str).unwrap_or_default(),
        }
    }
}

/// Submitted form fields in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInput {
    fields: IndexMap<String, FieldValue>,
}

impl FormInput {
    /// Builds the input from decoded pairs; a key seen twice becomes a list.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut fields: IndexMap<String, FieldValue> = IndexMap::new();
        for (key, value) in pairs {
            let value: String = value.into();
            match fields.entry(key.into()) {
                Entry::Vacant(slot) => {
                    slot.insert(FieldValue::Scalar(value));
                }
                Entry::Occupied(mut slot) => {
                    let current = slot.get_mut();
                    match current {
                        FieldValue::List(items) => items.push(value),
                        FieldValue::Scalar(first) => {
                            let first = std::mem::take(first);
                            *current = FieldValue::List(vec![first, value]);
                        }
                    }
                }
            }
        }
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// First value of a field, if present.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(FieldValue::first)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Cleaned input plus the errors found while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated<T> {
    pub input: T,
    pub errors: Vec<FieldError>,
}

impl<T> Validated<T> {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_error_for(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

/// A form whose cleaned input converts into entity fields.
pub trait FormSchema: Sized {
    /// Label used in logs and metrics.
    const NAME: &'static str;

    type Fields;

    fn from_form(form: &FormInput) -> Validated<Self>;

    /// Converts input that passed every rule.
    fn to_fields(&self) -> Result<Self::Fields, FieldError>;
}

impl<T: FormSchema> Validated<T> {
    /// Entity fields when valid, otherwise the input and errors for redisplay.
    pub fn into_fields(mut self) -> Result<T::Fields, Validated<T>> {
        if self.is_valid() {
            match self.input.to_fields() {
                Ok(fields) => return Ok(fields),
                Err(error) => self.errors.push(error),
            }
        }
        METRICS.record_validation_failure(T::NAME);
        tracing::debug!(form = T::NAME, errors = self.errors.len(), "form rejected");
        Err(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_keys_become_lists_in_order() {
        let form = FormInput::from_pairs([("category", "b"), ("name", "x"), ("category", "a")]);
        assert_eq!(
            form.get("category"),
            Some(&FieldValue::List(vec!["b".into(), "a".into()]))
        );
        assert_eq!(form.get("name"), Some(&FieldValue::Scalar("x".into())));
        assert_eq!(form.text("category"), Some("b"));
        assert_eq!(form.text("missing"), None);
    }
}
