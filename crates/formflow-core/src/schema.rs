//! Form schema model as served by `GET /api/form`.
//!
//! The wire format is camelCase JSON. Two envelopes are in circulation and
//! both decode to the same [`FormSchema`]:
//!
//! ```text
//! { "sections": [ ... ] }
//! { "form": { "sections": [ ... ] } }
//! ```

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::validate::anchored_pattern;

/// Parameters a schema was requested with. Both absent means the default shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_count: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_count: Option<u32>,
}

impl ShapeParams {
    pub fn new(section_count: Option<u32>, field_count: Option<u32>) -> Self {
        Self {
            section_count,
            field_count,
        }
    }

    pub fn with_section_count(mut self, count: u32) -> Self {
        self.section_count = Some(count);
        self
    }

    pub fn with_field_count(mut self, count: u32) -> Self {
        self.field_count = Some(count);
        self
    }

    /// True for the key the initial page load uses.
    pub fn is_default(&self) -> bool {
        self.section_count.is_none() && self.field_count.is_none()
    }

    /// Query string pairs, absent parameters omitted.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(n) = self.section_count {
            pairs.push(("sectionCount", n.to_string()));
        }
        if let Some(n) = self.field_count {
            pairs.push(("fieldCount", n.to_string()));
        }
        pairs
    }
}

impl fmt::Display for ShapeParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            return f.write_str("default");
        }
        let show = |v: Option<u32>| v.map_or_else(|| "-".to_string(), |n| n.to_string());
        write!(
            f,
            "sections={} fields={}",
            show(self.section_count),
            show(self.field_count)
        )
    }
}

/// A complete form: ordered sections of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    pub sections: Vec<Section>,

    /// Parameters this schema was fetched with (set by the loader).
    #[serde(skip)]
    pub shape: ShapeParams,
}

/// Response body of the schema endpoint in either of its envelopes.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SchemaEnvelope {
    Wrapped { form: SchemaBody },
    Bare(SchemaBody),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaBody {
    pub sections: Vec<Section>,
}

impl SchemaEnvelope {
    pub fn into_schema(self) -> FormSchema {
        let body = match self {
            Self::Wrapped { form } => form,
            Self::Bare(body) => body,
        };
        FormSchema::new(body.sections)
    }
}

/// One page of the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub fields: Vec<Field>,
}

/// One input control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub field_id: String,

    #[serde(rename = "type")]
    pub kind: FieldKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldValidation>,

    /// Stable `data-test-id` of the control; defaults to `field_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_test_id: Option<String>,
}

/// Declared field type.
///
/// Behavior per kind lives in [`crate::validate::FieldRules`] implementations,
/// reached through [`FieldKind::rules`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Email,
    Tel,
    Date,
    Textarea,
    Radio,
    Dropdown,
    Checkbox,
}

impl FieldKind {
    /// Kinds whose value must be one of the declared options.
    pub fn has_options(&self) -> bool {
        matches!(self, Self::Radio | Self::Dropdown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Tel => "tel",
            Self::Date => "date",
            Self::Textarea => "textarea",
            Self::Radio => "radio",
            Self::Dropdown => "dropdown",
            Self::Checkbox => "checkbox",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Choice for radio and dropdown fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOption {
    pub value: String,
    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_test_id: Option<String>,
}

impl FieldOption {
    /// `data-test-id` of this option's control: explicit id or `{field_id}-{value}`.
    pub fn binding_id(&self, field_id: &str) -> Cow<'_, str> {
        match &self.data_test_id {
            Some(id) => Cow::Borrowed(id.as_str()),
            None => Cow::Owned(format!("{}-{}", field_id, self.value)),
        }
    }
}

/// Declared format constraints and the user-facing failure message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Regex the whole trimmed value must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<FieldRole>,

    /// Minimum age in years for [`FieldRole::DateOfBirth`] (default 16).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_age: Option<u32>,
}

/// Semantic role of a field, declared by the schema rather than inferred
/// from its id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldRole {
    DateOfBirth,
    Other(String),
}

impl From<String> for FieldRole {
    fn from(s: String) -> Self {
        match s.as_str() {
            "date-of-birth" => Self::DateOfBirth,
            _ => Self::Other(s),
        }
    }
}

impl From<FieldRole> for String {
    fn from(role: FieldRole) -> Self {
        match role {
            FieldRole::DateOfBirth => "date-of-birth".to_string(),
            FieldRole::Other(s) => s,
        }
    }
}

impl Field {
    /// `data-test-id` of the control.
    pub fn binding_id(&self) -> &str {
        self.data_test_id.as_deref().unwrap_or(&self.field_id)
    }

    pub fn role(&self) -> Option<&FieldRole> {
        self.validation.as_ref().and_then(|v| v.role.as_ref())
    }

    /// Declared failure message, if any.
    pub fn message(&self) -> Option<&str> {
        self.validation.as_ref().and_then(|v| v.message.as_deref())
    }

    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }

    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.field_id)
    }
}

/// What a `data-test-id` points at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Binding<'a> {
    Field {
        section: usize,
        field: &'a Field,
    },
    Option {
        section: usize,
        field: &'a Field,
        option: &'a FieldOption,
    },
}

impl<'a> Binding<'a> {
    pub fn field(&self) -> &'a Field {
        match *self {
            Self::Field { field, .. } | Self::Option { field, .. } => field,
        }
    }

    pub fn section(&self) -> usize {
        match *self {
            Self::Field { section, .. } | Self::Option { section, .. } => section,
        }
    }
}

impl FormSchema {
    pub fn new(sections: Vec<Section>) -> Self {
        Self {
            sections,
            shape: ShapeParams::default(),
        }
    }

    /// Decode a response body in either envelope.
    pub fn from_json_str(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<SchemaEnvelope>(body).map(SchemaEnvelope::into_schema)
    }

    pub fn with_shape(mut self, shape: ShapeParams) -> Self {
        self.shape = shape;
        self
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn field_count(&self) -> usize {
        self.sections.iter().map(|s| s.fields.len()).sum()
    }

    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    /// All fields in display order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }

    pub fn field(&self, field_id: &str) -> Option<&Field> {
        self.fields().find(|f| f.field_id == field_id)
    }

    /// Index of the section holding `field_id`.
    pub fn section_of(&self, field_id: &str) -> Option<usize> {
        self.sections
            .iter()
            .position(|s| s.fields.iter().any(|f| f.field_id == field_id))
    }

    /// Resolve a control's `data-test-id`.
    pub fn resolve_binding(&self, binding_id: &str) -> Option<Binding<'_>> {
        for (section, s) in self.sections.iter().enumerate() {
            for field in &s.fields {
                if field.binding_id() == binding_id {
                    return Some(Binding::Field { section, field });
                }
                if let Some(option) = field
                    .options
                    .iter()
                    .find(|o| o.binding_id(&field.field_id) == binding_id)
                {
                    return Some(Binding::Option {
                        section,
                        field,
                        option,
                    });
                }
            }
        }
        None
    }

    /// Every control id in display order, options following their field.
    pub fn binding_ids(&self) -> Vec<(String, Binding<'_>)> {
        let mut out = Vec::new();
        for (section, s) in self.sections.iter().enumerate() {
            for field in &s.fields {
                out.push((field.binding_id().to_string(), Binding::Field { section, field }));
                for option in &field.options {
                    out.push((
                        option.binding_id(&field.field_id).into_owned(),
                        Binding::Option {
                            section,
                            field,
                            option,
                        },
                    ));
                }
            }
        }
        out
    }

    /// Structural checks a schema must pass before a session may use it.
    pub fn check(&self) -> Result<(), SchemaError> {
        if self.sections.is_empty() {
            return Err(SchemaError::NoSections);
        }

        let mut titles = HashSet::new();
        let mut field_ids = HashSet::new();
        let mut bindings = HashSet::new();

        for section in &self.sections {
            if !titles.insert(section.title.as_str()) {
                return Err(SchemaError::DuplicateSectionTitle {
                    title: section.title.clone(),
                });
            }

            for field in &section.fields {
                if !field_ids.insert(field.field_id.as_str()) {
                    return Err(SchemaError::DuplicateFieldId {
                        field_id: field.field_id.clone(),
                    });
                }
                if !bindings.insert(field.binding_id().to_string()) {
                    return Err(SchemaError::DuplicateBinding {
                        binding_id: field.binding_id().to_string(),
                    });
                }
                check_options(field, &mut bindings)?;

                if let Some(pattern) = field.validation.as_ref().and_then(|v| v.pattern.as_ref()) {
                    anchored_pattern(pattern).map_err(|e| SchemaError::InvalidPattern {
                        field_id: field.field_id.clone(),
                        reason: e.to_string(),
                    })?;
                }
            }
        }
        Ok(())
    }
}

fn check_options(field: &Field, bindings: &mut HashSet<String>) -> Result<(), SchemaError> {
    if !field.kind.has_options() {
        return Ok(());
    }
    if field.options.is_empty() {
        return Err(SchemaError::MissingOptions {
            field_id: field.field_id.clone(),
        });
    }

    let mut values = HashSet::new();
    for option in &field.options {
        if !values.insert(option.value.as_str()) {
            return Err(SchemaError::DuplicateOption {
                field_id: field.field_id.clone(),
                value: option.value.clone(),
            });
        }
        let id = option.binding_id(&field.field_id).into_owned();
        if !bindings.insert(id.clone()) {
            return Err(SchemaError::DuplicateBinding { binding_id: id });
        }
    }
    Ok(())
}
