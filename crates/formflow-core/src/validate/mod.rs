//! Field validation.
//!
//! Pure and synchronous: no clock reads, no I/O. Evaluation time comes in
//! through [`ValidationContext`] so age rules are reproducible.
//!
//! Each [`FieldKind`](crate::schema::FieldKind) owns a [`FieldRules`]
//! implementation (see `rules.rs`); this module only sequences them:
//! normalize → required check → kind-specific format check → message lookup.

use chrono::{Local, NaiveDate};

use crate::error::{FieldError, ViolationKind};
use crate::schema::{Field, FormSchema, Section};
use crate::state::{FieldValue, FormState};

mod rules;

pub(crate) use rules::anchored_pattern;

pub use rules::{
    CheckboxRules, ChoiceRules, DateRules, EmailRules, TelRules, TextRules, DEFAULT_MIN_AGE,
};

pub const REQUIRED_MESSAGE: &str = "This field is required";
pub const FORMAT_MESSAGE: &str = "Invalid format";
pub const OPTION_MESSAGE: &str = "Please select a valid option";

/// Inputs validation needs besides the field and its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationContext {
    /// Calendar date age rules are evaluated against.
    pub today: NaiveDate,
}

impl ValidationContext {
    pub fn at(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Context for the local calendar date.
    pub fn now() -> Self {
        Self::at(Local::now().date_naive())
    }
}

/// A kind-specific rule failure before message resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    /// Message that takes precedence over the field's declared one.
    pub detail: Option<String>,
}

impl Violation {
    pub fn new(kind: ViolationKind) -> Self {
        Self { kind, detail: None }
    }

    pub fn with_detail(kind: ViolationKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: Some(detail.into()),
        }
    }
}

/// Behavior one field kind carries: what it accepts, how its value is
/// normalized, when it counts as empty, and its format check.
pub trait FieldRules: Send + Sync {
    /// Type name used in mismatch errors.
    fn expected(&self) -> &'static str {
        "text"
    }

    /// Whether the state may hold `value` for this kind.
    fn accepts(&self, value: &FieldValue) -> bool {
        matches!(value, FieldValue::Empty | FieldValue::Text(_))
    }

    fn default_value(&self) -> FieldValue {
        FieldValue::Empty
    }

    /// Canonical form used for checks and submission.
    fn normalize(&self, value: &FieldValue) -> FieldValue {
        value.trimmed()
    }

    /// "Not provided" for the purpose of `required`.
    fn is_missing(&self, normalized: &FieldValue) -> bool {
        normalized.is_blank()
    }

    /// Format check for a provided, normalized value.
    fn check(
        &self,
        field: &Field,
        normalized: &FieldValue,
        ctx: &ValidationContext,
    ) -> Result<(), Violation>;
}

/// Outcome for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(FieldError),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn error(&self) -> Option<&FieldError> {
        match self {
            Self::Valid => None,
            Self::Invalid(e) => Some(e),
        }
    }

    pub fn into_error(self) -> Option<FieldError> {
        match self {
            Self::Valid => None,
            Self::Invalid(e) => Some(e),
        }
    }
}

/// Validate one field's value.
pub fn validate_field(
    field: &Field,
    value: &FieldValue,
    ctx: &ValidationContext,
) -> ValidationResult {
    let rules = field.kind.rules();
    let normalized = rules.normalize(value);

    let violation = if rules.is_missing(&normalized) {
        if field.required {
            Some(Violation::new(ViolationKind::Required))
        } else {
            None
        }
    } else {
        rules.check(field, &normalized, ctx).err()
    };

    match violation {
        None => ValidationResult::Valid,
        Some(v) => ValidationResult::Invalid(FieldError {
            field_id: field.field_id.clone(),
            kind: v.kind,
            message: resolve_message(field, v),
        }),
    }
}

/// Every failing field of a section, in display order.
pub fn validate_section(
    section: &Section,
    state: &FormState,
    ctx: &ValidationContext,
) -> Vec<FieldError> {
    section
        .fields
        .iter()
        .filter_map(|f| validate_field(f, &state.value(&f.field_id), ctx).into_error())
        .collect()
}

/// Every failing field of the whole schema, in display order.
pub fn validate_schema(
    schema: &FormSchema,
    state: &FormState,
    ctx: &ValidationContext,
) -> Vec<FieldError> {
    schema
        .sections
        .iter()
        .flat_map(|s| validate_section(s, state, ctx))
        .collect()
}

fn resolve_message(field: &Field, violation: Violation) -> String {
    if let Some(detail) = violation.detail {
        return detail;
    }
    if let Some(declared) = field.message() {
        return declared.to_string();
    }
    match violation.kind {
        ViolationKind::Required => REQUIRED_MESSAGE.to_string(),
        ViolationKind::Option => OPTION_MESSAGE.to_string(),
        ViolationKind::Length => length_message(field),
        ViolationKind::Format | ViolationKind::Age => FORMAT_MESSAGE.to_string(),
    }
}

fn length_message(field: &Field) -> String {
    let bounds = field
        .validation
        .as_ref()
        .map(|v| (v.min_length, v.max_length));
    match bounds {
        Some((Some(min), Some(max))) => format!("Must be between {} and {} characters", min, max),
        Some((Some(min), None)) => format!("Must be at least {} characters", min),
        Some((None, Some(max))) => format!("Must be at most {} characters", max),
        _ => FORMAT_MESSAGE.to_string(),
    }
}
