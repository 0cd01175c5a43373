//! One user's pass through a form.
//!
//! A session borrows the shared [`SchemaLoader`], keeps its own values and
//! navigation position, and hands the final sweep to the
//! [`SubmissionCoordinator`]. Mutating methods take `&mut self`.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{FieldError, NavigationError, SessionError, StateError, SubmissionError};
use crate::loader::SchemaLoader;
use crate::navigator::{NavState, Progress, SectionNavigator};
use crate::schema::{Binding, FieldKind, FormSchema, ShapeParams};
use crate::state::{FieldValue, FormState};
use crate::submit::{SubmissionAck, SubmissionCoordinator, SubmitTransport};
use crate::validate::ValidationContext;

pub struct FormSession {
    id: Uuid,
    loader: Arc<SchemaLoader>,
    schema: Arc<FormSchema>,
    state: FormState,
    navigator: SectionNavigator,
    coordinator: SubmissionCoordinator,
    clock: Option<ValidationContext>,
    ack: Option<SubmissionAck>,
}

impl std::fmt::Debug for FormSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormSession")
            .field("id", &self.id)
            .field("shape", &self.schema.shape)
            .field("state", &self.navigator.state())
            .finish_non_exhaustive()
    }
}

impl FormSession {
    /// Load the schema for `params` and position on the first section.
    pub async fn start(
        loader: Arc<SchemaLoader>,
        params: ShapeParams,
        transport: Arc<dyn SubmitTransport>,
    ) -> Result<Self, SessionError> {
        let schema = loader.load(params).await?;
        let id = Uuid::new_v4();
        info!(
            session_id = %id,
            %params,
            sections = schema.section_count(),
            "form session started"
        );

        Ok(Self {
            id,
            state: FormState::for_schema(&schema),
            navigator: SectionNavigator::new(schema.section_count()),
            coordinator: SubmissionCoordinator::new(transport),
            loader,
            schema,
            clock: None,
            ack: None,
        })
    }

    /// Evaluate date rules against a fixed calendar date instead of today.
    pub fn with_context(mut self, ctx: ValidationContext) -> Self {
        self.clock = Some(ctx);
        self
    }

    fn ctx(&self) -> ValidationContext {
        self.clock.unwrap_or_else(ValidationContext::now)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn schema(&self) -> &Arc<FormSchema> {
        &self.schema
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn nav_state(&self) -> NavState {
        self.navigator.state()
    }

    /// Current section index; `None` once submitted.
    pub fn current_section(&self) -> Option<usize> {
        self.navigator.current()
    }

    pub fn is_submitted(&self) -> bool {
        self.navigator.is_submitted()
    }

    pub fn progress(&self) -> Progress {
        self.navigator.progress(&self.schema)
    }

    /// Errors currently displayed, keyed by field id.
    pub fn errors(&self) -> &BTreeMap<String, FieldError> {
        self.navigator.errors()
    }

    pub fn error_for(&self, field_id: &str) -> Option<&str> {
        self.navigator.error_for(field_id)
    }

    pub fn value(&self, field_id: &str) -> FieldValue {
        self.state.value(field_id)
    }

    /// Fetches the shared loader has started.
    pub fn fetch_count(&self) -> u64 {
        self.loader.fetch_count()
    }

    /// Acknowledgement of the successful submission.
    pub fn ack(&self) -> Option<&SubmissionAck> {
        self.ack.as_ref()
    }

    pub fn set(&mut self, field_id: &str, value: impl Into<FieldValue>) -> Result<(), SessionError> {
        self.editable()?;
        self.state.set(field_id, value)?;
        self.navigator.clear_error(field_id);
        Ok(())
    }

    pub fn set_text(&mut self, field_id: &str, text: impl Into<String>) -> Result<(), SessionError> {
        self.set(field_id, FieldValue::Text(text.into()))
    }

    pub fn set_checked(&mut self, field_id: &str, checked: bool) -> Result<(), SessionError> {
        self.set(field_id, FieldValue::Bool(checked))
    }

    pub fn clear(&mut self, field_id: &str) -> Result<(), SessionError> {
        self.editable()?;
        self.state.clear(field_id)?;
        self.navigator.clear_error(field_id);
        Ok(())
    }

    /// Act on the control bound to `binding_id`: an option binding selects
    /// that option, a checkbox binding toggles the box. Other controls take
    /// input through [`FormSession::set`] and are left unchanged.
    pub fn activate_control(&mut self, binding_id: &str) -> Result<(), SessionError> {
        let (field_id, value) = {
            let binding = self.schema.resolve_binding(binding_id).ok_or_else(|| {
                StateError::UnknownControl {
                    binding_id: binding_id.to_string(),
                }
            })?;

            match binding {
                Binding::Option { field, option, .. } => {
                    (field.field_id.clone(), FieldValue::from(option.value.as_str()))
                }
                Binding::Field { field, .. } if field.kind == FieldKind::Checkbox => {
                    let checked = self.state.value(&field.field_id).as_bool().unwrap_or(false);
                    (field.field_id.clone(), FieldValue::Bool(!checked))
                }
                Binding::Field { field, .. } => {
                    debug!(binding_id, kind = %field.kind, "control has no activation action");
                    return Ok(());
                }
            }
        };
        self.set(&field_id, value)
    }

    /// Validate the current section and advance.
    pub fn next(&mut self) -> Result<usize, SessionError> {
        let ctx = self.ctx();
        let next = self
            .navigator
            .next(&self.schema, &self.state, &ctx)
            .inspect_err(|e| {
                if let NavigationError::Blocked { section, errors } = e {
                    warn!(session_id = %self.id, section, invalid = errors.len(), "next blocked");
                }
            })?;
        Ok(next)
    }

    pub fn previous(&mut self) -> Result<usize, SessionError> {
        Ok(self.navigator.previous()?)
    }

    pub fn jump_to(&mut self, index: usize) -> Result<usize, SessionError> {
        Ok(self.navigator.jump_to(index)?)
    }

    /// Submit from the last section.
    ///
    /// The last section is gated like Next; the coordinator then re-validates
    /// every section. On any failure the session stays on the last section
    /// with its values intact. On success the values are discarded and the
    /// session becomes `Submitted`.
    pub async fn submit(&mut self) -> Result<SubmissionAck, SessionError> {
        let ctx = self.ctx();
        self.navigator.gate_submit(&self.schema, &self.state, &ctx)?;

        match self.coordinator.submit(&self.state, &self.schema, &ctx).await {
            Ok(ack) => {
                info!(session_id = %self.id, ack_id = ?ack.id, "session submitted");
                self.navigator.mark_submitted();
                self.state.reset();
                self.ack = Some(ack.clone());
                Ok(ack)
            }
            Err(e) => {
                if let SubmissionError::Invalid(errors) = &e {
                    self.navigator.show_errors(errors);
                }
                Err(e.into())
            }
        }
    }

    /// Switch to a differently shaped schema. Values of fields that survive
    /// the change are kept, fields the new schema lacks are dropped and the
    /// session restarts on the first section.
    /// A failed load leaves the session untouched.
    pub async fn reshape(&mut self, params: ShapeParams) -> Result<(), SessionError> {
        self.editable()?;
        let schema = self.loader.load(params).await?;
        if Arc::ptr_eq(&schema, &self.schema) {
            return Ok(());
        }

        info!(
            session_id = %self.id,
            %params,
            sections = schema.section_count(),
            "session reshaped"
        );
        self.state.adopt(&schema);
        self.navigator.reshape(schema.section_count());
        self.schema = schema;
        Ok(())
    }

    fn editable(&self) -> Result<(), NavigationError> {
        if self.navigator.is_submitted() {
            return Err(NavigationError::AlreadySubmitted);
        }
        Ok(())
    }
}
