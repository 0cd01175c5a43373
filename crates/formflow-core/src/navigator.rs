//! Section state machine.
//!
//! ```text
//!            Next (section valid)            Submit (valid + sent)
//! Section(0) ───────────────▶ ... Section(N-1) ──────────────────▶ Submitted
//!     ▲  ◀───────────────────        │
//!     │      Previous (always)       │ Next/Submit with invalid input:
//!     └──── JumpTo(j) (always) ──────┘ stay, expose per-field errors
//! ```
//!
//! The navigator never fetches and never writes form values; it only reads
//! them to decide whether a forward move is allowed.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::error::{FieldError, NavigationError};
use crate::schema::FormSchema;
use crate::state::FormState;
use crate::validate::{validate_section, ValidationContext};

/// Where the session is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "index", rename_all = "snake_case")]
pub enum NavState {
    Section(usize),
    Submitted,
}

#[derive(Debug, Clone)]
pub struct SectionNavigator {
    state: NavState,
    section_count: usize,
    errors: BTreeMap<String, FieldError>,
}

impl SectionNavigator {
    /// Navigator positioned on the first section.
    pub fn new(section_count: usize) -> Self {
        Self {
            state: NavState::Section(0),
            section_count,
            errors: BTreeMap::new(),
        }
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    /// Current section index; `None` once submitted.
    pub fn current(&self) -> Option<usize> {
        match self.state {
            NavState::Section(i) => Some(i),
            NavState::Submitted => None,
        }
    }

    pub fn section_count(&self) -> usize {
        self.section_count
    }

    pub fn is_submitted(&self) -> bool {
        self.state == NavState::Submitted
    }

    pub fn is_last_section(&self) -> bool {
        self.current() == Some(self.section_count.saturating_sub(1))
    }

    /// Errors currently shown, keyed by field id.
    pub fn errors(&self) -> &BTreeMap<String, FieldError> {
        &self.errors
    }

    pub fn error_for(&self, field_id: &str) -> Option<&str> {
        self.errors.get(field_id).map(|e| e.message.as_str())
    }

    /// Hide a field's error after the user edits it.
    pub fn clear_error(&mut self, field_id: &str) {
        self.errors.remove(field_id);
    }

    /// Show errors from a failed final sweep.
    pub fn show_errors(&mut self, errors: &[FieldError]) {
        for e in errors {
            self.errors.insert(e.field_id.clone(), e.clone());
        }
    }

    /// Validate the current section and move to the next one.
    pub fn next(
        &mut self,
        schema: &FormSchema,
        state: &FormState,
        ctx: &ValidationContext,
    ) -> Result<usize, NavigationError> {
        let current = self.active()?;
        if current + 1 >= self.section_count {
            return Err(NavigationError::AtLastSection);
        }
        self.gate(current, schema, state, ctx)?;
        Ok(self.enter(current + 1))
    }

    /// Move back one section without validating.
    pub fn previous(&mut self) -> Result<usize, NavigationError> {
        let current = self.active()?;
        if current == 0 {
            return Err(NavigationError::AtFirstSection);
        }
        Ok(self.enter(current - 1))
    }

    /// Go straight to `index` without validating the section being left.
    pub fn jump_to(&mut self, index: usize) -> Result<usize, NavigationError> {
        self.active()?;
        if index >= self.section_count {
            return Err(NavigationError::OutOfRange {
                index,
                count: self.section_count,
            });
        }
        Ok(self.enter(index))
    }

    /// Check that Submit is allowed: on the last section and that section valid.
    pub fn gate_submit(
        &mut self,
        schema: &FormSchema,
        state: &FormState,
        ctx: &ValidationContext,
    ) -> Result<(), NavigationError> {
        let current = self.active()?;
        if !self.is_last_section() {
            return Err(NavigationError::NotLastSection { section: current });
        }
        self.gate(current, schema, state, ctx)
    }

    pub fn mark_submitted(&mut self) {
        debug!("form submitted");
        self.errors.clear();
        self.state = NavState::Submitted;
    }

    /// Start over on a schema with a different section count.
    pub fn reshape(&mut self, section_count: usize) {
        self.section_count = section_count;
        self.errors.clear();
        self.state = NavState::Section(0);
    }

    /// Progress indicator for the current position.
    pub fn progress(&self, schema: &FormSchema) -> Progress {
        let total = schema.section_count();
        let current = self.current().unwrap_or(total.saturating_sub(1));
        let ratio = if self.is_submitted() || total <= 1 {
            1.0
        } else {
            current as f64 / (total - 1) as f64
        };

        let steps = schema
            .sections
            .iter()
            .enumerate()
            .map(|(i, s)| ProgressStep {
                number: i + 1,
                title: s.title.clone(),
                state: if self.is_submitted() || i < current {
                    StepState::Completed
                } else if i == current {
                    StepState::Current
                } else {
                    StepState::Upcoming
                },
            })
            .collect();

        Progress {
            current,
            total,
            ratio,
            steps,
        }
    }

    fn active(&self) -> Result<usize, NavigationError> {
        self.current().ok_or(NavigationError::AlreadySubmitted)
    }

    fn gate(
        &mut self,
        section: usize,
        schema: &FormSchema,
        state: &FormState,
        ctx: &ValidationContext,
    ) -> Result<(), NavigationError> {
        let errors = schema
            .section(section)
            .map(|s| validate_section(s, state, ctx))
            .unwrap_or_default();

        if errors.is_empty() {
            return Ok(());
        }

        debug!(section, invalid = errors.len(), "transition blocked");
        self.errors = errors
            .iter()
            .map(|e| (e.field_id.clone(), e.clone()))
            .collect();
        Err(NavigationError::Blocked { section, errors })
    }

    fn enter(&mut self, index: usize) -> usize {
        debug!(from = ?self.state, to = index, "section transition");
        self.errors.clear();
        self.state = NavState::Section(index);
        index
    }
}

/// Numbered section controls plus a linear bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progress {
    /// Zero-based index of the current section.
    pub current: usize,
    pub total: usize,
    /// `current / (total - 1)`; 1.0 for a single-section form or after submit.
    pub ratio: f64,
    pub steps: Vec<ProgressStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressStep {
    /// One-based number shown on the control.
    pub number: usize,
    pub title: String,
    pub state: StepState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Completed,
    Current,
    Upcoming,
}
