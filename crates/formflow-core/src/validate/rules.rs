//! Rule sets, one per field kind.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use super::{FieldRules, ValidationContext, Violation};
use crate::error::ViolationKind;
use crate::schema::{Field, FieldKind, FieldRole};
use crate::state::FieldValue;

/// Minimum age for a date-of-birth field that declares none.
pub const DEFAULT_MIN_AGE: u32 = 16;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
const DATE_FORMAT: &str = "%Y-%m-%d";
const TEL_DIGITS: usize = 10;

impl FieldKind {
    /// Behavior attached to this kind.
    pub fn rules(&self) -> &'static dyn FieldRules {
        match self {
            Self::Text | Self::Textarea => &TextRules,
            Self::Email => &EmailRules,
            Self::Tel => &TelRules,
            Self::Date => &DateRules,
            Self::Radio | Self::Dropdown => &ChoiceRules,
            Self::Checkbox => &CheckboxRules,
        }
    }
}

/// Free text: declared length bounds and pattern only.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRules;

impl FieldRules for TextRules {
    fn check(
        &self,
        field: &Field,
        normalized: &FieldValue,
        _ctx: &ValidationContext,
    ) -> Result<(), Violation> {
        declared_constraints(field, text_of(normalized))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EmailRules;

impl FieldRules for EmailRules {
    fn check(
        &self,
        field: &Field,
        normalized: &FieldValue,
        _ctx: &ValidationContext,
    ) -> Result<(), Violation> {
        let text = text_of(normalized);
        match email_pattern() {
            Some(re) if re.is_match(text) => declared_constraints(field, text),
            _ => Err(Violation::new(ViolationKind::Format)),
        }
    }
}

/// Ten-digit phone number.
#[derive(Debug, Clone, Copy, Default)]
pub struct TelRules;

impl FieldRules for TelRules {
    fn check(
        &self,
        field: &Field,
        normalized: &FieldValue,
        _ctx: &ValidationContext,
    ) -> Result<(), Violation> {
        let text = text_of(normalized);
        if text.len() != TEL_DIGITS || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Violation::new(ViolationKind::Format));
        }
        declared_constraints(field, text)
    }
}

/// Calendar date in `YYYY-MM-DD`; date-of-birth fields enforce a minimum age.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRules;

impl FieldRules for DateRules {
    fn check(
        &self,
        field: &Field,
        normalized: &FieldValue,
        ctx: &ValidationContext,
    ) -> Result<(), Violation> {
        let date = NaiveDate::parse_from_str(text_of(normalized), DATE_FORMAT)
            .map_err(|_| Violation::new(ViolationKind::Format))?;

        if field.role() == Some(&FieldRole::DateOfBirth) {
            let min_age = field
                .validation
                .as_ref()
                .and_then(|v| v.min_age)
                .unwrap_or(DEFAULT_MIN_AGE);
            if age_on(date, ctx.today) < i64::from(min_age) {
                return Err(Violation::with_detail(
                    ViolationKind::Age,
                    format!("You must be at least {} years old", min_age),
                ));
            }
        }
        Ok(())
    }
}

/// Radio and dropdown: the value must be one of the declared options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChoiceRules;

impl FieldRules for ChoiceRules {
    fn check(
        &self,
        field: &Field,
        normalized: &FieldValue,
        _ctx: &ValidationContext,
    ) -> Result<(), Violation> {
        if field.has_option(text_of(normalized)) {
            Ok(())
        } else {
            Err(Violation::new(ViolationKind::Option))
        }
    }
}

/// Checked or not; `required` means it must be checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckboxRules;

impl FieldRules for CheckboxRules {
    fn expected(&self) -> &'static str {
        "boolean"
    }

    fn accepts(&self, value: &FieldValue) -> bool {
        matches!(value, FieldValue::Empty | FieldValue::Bool(_))
    }

    fn default_value(&self) -> FieldValue {
        FieldValue::Bool(false)
    }

    fn normalize(&self, value: &FieldValue) -> FieldValue {
        FieldValue::Bool(value.as_bool().unwrap_or(false))
    }

    fn is_missing(&self, normalized: &FieldValue) -> bool {
        normalized.as_bool() != Some(true)
    }

    fn check(
        &self,
        _field: &Field,
        _normalized: &FieldValue,
        _ctx: &ValidationContext,
    ) -> Result<(), Violation> {
        Ok(())
    }
}

fn text_of(value: &FieldValue) -> &str {
    value.as_text().unwrap_or_default()
}

fn email_pattern() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).ok()).as_ref()
}

/// Full-match regex for a declared `validation.pattern`, compiled once per
/// distinct pattern and shared by every later validation.
pub(crate) fn anchored_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    static COMPILED: OnceLock<Mutex<HashMap<String, Result<Regex, regex::Error>>>> =
        OnceLock::new();

    let mut compiled = COMPILED
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(cached) = compiled.get(pattern) {
        return cached.clone();
    }
    let result = Regex::new(&format!("^(?:{})$", pattern));
    compiled.insert(pattern.to_string(), result.clone());
    result
}

/// Length bounds (in characters) and full-match pattern from `validation`.
fn declared_constraints(field: &Field, text: &str) -> Result<(), Violation> {
    let Some(validation) = field.validation.as_ref() else {
        return Ok(());
    };

    let len = text.chars().count();
    if validation.min_length.is_some_and(|min| len < min)
        || validation.max_length.is_some_and(|max| len > max)
    {
        return Err(Violation::new(ViolationKind::Length));
    }

    if let Some(pattern) = &validation.pattern {
        match anchored_pattern(pattern) {
            Ok(re) if re.is_match(text) => {}
            _ => return Err(Violation::new(ViolationKind::Format)),
        }
    }
    Ok(())
}

/// Whole years between `birth` and `today`; negative for future dates.
pub(crate) fn age_on(birth: NaiveDate, today: NaiveDate) -> i64 {
    let mut age = i64::from(today.year()) - i64::from(birth.year());
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}
