//! Live field values for one form session.
//!
//! Values are written only by user edits (`set`, `clear`) or an explicit
//! `reset`. Navigation and schema reloads never remove a value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::schema::{FieldKind, FormSchema, Section};

/// Current value of one control. JSON: `null`, a boolean or a string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Empty,
    Bool(bool),
    Text(String),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Empty, or text with nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Bool(_) => false,
        }
    }

    /// Text trimmed of surrounding whitespace; blank text becomes `Empty`.
    pub fn trimmed(&self) -> Self {
        match self {
            Self::Text(s) if s.trim().is_empty() => Self::Empty,
            Self::Text(s) => Self::Text(s.trim().to_string()),
            other => other.clone(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    kind: FieldKind,
    value: FieldValue,
}

/// Mapping of field id to value for every field of the current schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    entries: BTreeMap<String, Entry>,
}

impl FormState {
    /// Fresh state with every field at its kind's default.
    pub fn for_schema(schema: &FormSchema) -> Self {
        let mut state = Self::default();
        state.adopt(schema);
        state
    }

    /// Switch to a (re)loaded schema. Values of fields present in both
    /// schemas are kept; fields the new schema no longer has are dropped.
    pub fn adopt(&mut self, schema: &FormSchema) {
        self.entries.retain(|field_id, _| schema.field(field_id).is_some());
        for field in schema.fields() {
            self.entries
                .entry(field.field_id.clone())
                .and_modify(|e| {
                    if e.kind != field.kind {
                        e.kind = field.kind;
                        if !field.kind.rules().accepts(&e.value) {
                            e.value = field.kind.rules().default_value();
                        }
                    }
                })
                .or_insert_with(|| Entry {
                    kind: field.kind,
                    value: field.kind.rules().default_value(),
                });
        }
    }

    pub fn get(&self, field_id: &str) -> Option<&FieldValue> {
        self.entries.get(field_id).map(|e| &e.value)
    }

    /// Value of `field_id`, or `Empty` for a field the state does not know.
    pub fn value(&self, field_id: &str) -> FieldValue {
        self.get(field_id).cloned().unwrap_or_default()
    }

    pub fn contains(&self, field_id: &str) -> bool {
        self.entries.contains_key(field_id)
    }

    /// Store a user edit. The value is kept as entered; normalization happens
    /// at validation and submission time.
    pub fn set(&mut self, field_id: &str, value: impl Into<FieldValue>) -> Result<(), StateError> {
        let value = value.into();
        let entry = self
            .entries
            .get_mut(field_id)
            .ok_or_else(|| StateError::UnknownField {
                field_id: field_id.to_string(),
            })?;

        let rules = entry.kind.rules();
        if !rules.accepts(&value) {
            return Err(StateError::TypeMismatch {
                field_id: field_id.to_string(),
                expected: rules.expected(),
            });
        }
        entry.value = value;
        Ok(())
    }

    /// Put one field back to its default (user cleared the control).
    pub fn clear(&mut self, field_id: &str) -> Result<(), StateError> {
        let entry = self
            .entries
            .get_mut(field_id)
            .ok_or_else(|| StateError::UnknownField {
                field_id: field_id.to_string(),
            })?;
        entry.value = entry.kind.rules().default_value();
        Ok(())
    }

    /// Put every field back to its default.
    pub fn reset(&mut self) {
        for entry in self.entries.values_mut() {
            entry.value = entry.kind.rules().default_value();
        }
    }

    /// Values of one section in display order.
    pub fn section_values<'a>(
        &'a self,
        section: &'a Section,
    ) -> impl Iterator<Item = (&'a str, FieldValue)> + 'a {
        section
            .fields
            .iter()
            .map(move |f| (f.field_id.as_str(), self.value(&f.field_id)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), &e.value))
    }

    /// Fields holding something other than their default.
    pub fn populated_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.value != e.kind.rules().default_value())
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
