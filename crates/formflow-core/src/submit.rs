//! Final validation sweep and hand-off to the submit transport.
//!
//! The sweep covers every section, not just the last one: jump-to-section
//! lets a user reach Submit without passing the earlier gates.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::SubmissionError;
use crate::schema::FormSchema;
use crate::state::{FieldValue, FormState};
use crate::validate::{validate_schema, ValidationContext};

/// Body sent on submit: normalized values of every field in the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub values: BTreeMap<String, FieldValue>,
}

/// Acknowledgement returned by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionAck {
    /// Server-assigned id, when the server returns one.
    #[serde(default)]
    pub id: Option<String>,
}

/// Delivers a validated payload.
#[async_trait]
pub trait SubmitTransport: Send + Sync {
    async fn send(&self, payload: &SubmissionPayload) -> Result<SubmissionAck, SubmissionError>;
}

#[derive(Clone)]
pub struct SubmissionCoordinator {
    transport: Arc<dyn SubmitTransport>,
}

impl std::fmt::Debug for SubmissionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionCoordinator").finish_non_exhaustive()
    }
}

impl SubmissionCoordinator {
    pub fn new(transport: Arc<dyn SubmitTransport>) -> Self {
        Self { transport }
    }

    /// Validate every field of every section and build the payload.
    pub fn prepare(
        state: &FormState,
        schema: &FormSchema,
        ctx: &ValidationContext,
    ) -> Result<SubmissionPayload, SubmissionError> {
        let errors = validate_schema(schema, state, ctx);
        if !errors.is_empty() {
            return Err(SubmissionError::Invalid(errors));
        }

        let values = schema
            .fields()
            .map(|f| {
                let value = f.kind.rules().normalize(&state.value(&f.field_id));
                (f.field_id.clone(), value)
            })
            .collect();
        Ok(SubmissionPayload { values })
    }

    /// Final sweep, then send. Nothing is sent if any field is invalid.
    pub async fn submit(
        &self,
        state: &FormState,
        schema: &FormSchema,
        ctx: &ValidationContext,
    ) -> Result<SubmissionAck, SubmissionError> {
        let payload = match Self::prepare(state, schema, ctx) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "final validation sweep failed");
                return Err(e);
            }
        };

        let ack = self.transport.send(&payload).await.inspect_err(|e| {
            warn!(error = %e, "submission transport failed");
        })?;
        info!(fields = payload.values.len(), ack_id = ?ack.id, "form submitted");
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViolationKind;
    use crate::schema::{Field, FieldKind, Section};
    use chrono::NaiveDate;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<SubmissionPayload>>,
        fail: bool,
    }

    #[async_trait]
    impl SubmitTransport for Recorder {
        async fn send(
            &self,
            payload: &SubmissionPayload,
        ) -> Result<SubmissionAck, SubmissionError> {
            if self.fail {
                return Err(SubmissionError::Transport {
                    message: "connection refused".into(),
                    retryable: true,
                });
            }
            self.sent.lock().unwrap().push(payload.clone());
            Ok(SubmissionAck {
                id: Some("sub-1".into()),
            })
        }
    }

    fn ctx() -> ValidationContext {
        ValidationContext::at(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap())
    }

    fn field(id: &str, kind: FieldKind, required: bool) -> Field {
        Field {
            field_id: id.into(),
            kind,
            label: None,
            required,
            options: vec![],
            validation: None,
            data_test_id: None,
        }
    }

    fn schema() -> FormSchema {
        FormSchema::new(vec![
            Section {
                title: "A".into(),
                description: None,
                fields: vec![field("name", FieldKind::Text, true)],
            },
            Section {
                title: "B".into(),
                description: None,
                fields: vec![
                    field("email", FieldKind::Email, true),
                    field("terms", FieldKind::Checkbox, false),
                ],
            },
        ])
    }

    #[tokio::test]
    async fn test_sweep_covers_skipped_sections() {
        let schema = schema();
        let mut state = FormState::for_schema(&schema);
        state.set("email", "ada@example.com").unwrap();

        let recorder = Arc::new(Recorder::default());
        let coordinator = SubmissionCoordinator::new(recorder.clone());
        let err = coordinator.submit(&state, &schema, &ctx()).await.unwrap_err();

        assert_eq!(err.field_errors().len(), 1);
        assert_eq!(err.field_errors()[0].field_id, "name");
        assert_eq!(err.field_errors()[0].kind, ViolationKind::Required);
        assert!(recorder.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sends_normalized_values() {
        let schema = schema();
        let mut state = FormState::for_schema(&schema);
        state.set("name", "  Ada ").unwrap();
        state.set("email", "ada@example.com").unwrap();

        let recorder = Arc::new(Recorder::default());
        let coordinator = SubmissionCoordinator::new(recorder.clone());
        let ack = coordinator.submit(&state, &schema, &ctx()).await.unwrap();
        assert_eq!(ack.id.as_deref(), Some("sub-1"));

        let sent = recorder.sent.lock().unwrap();
        let values = &sent[0].values;
        assert_eq!(values["name"], FieldValue::from("Ada"));
        assert_eq!(values["terms"], FieldValue::Bool(false));
        assert_eq!(
            serde_json::to_value(&sent[0]).unwrap(),
            serde_json::json!({
                "values": { "email": "ada@example.com", "name": "Ada", "terms": false }
            })
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported() {
        let schema = schema();
        let mut state = FormState::for_schema(&schema);
        state.set("name", "Ada").unwrap();
        state.set("email", "ada@example.com").unwrap();

        let coordinator = SubmissionCoordinator::new(Arc::new(Recorder {
            fail: true,
            ..Default::default()
        }));
        let err = coordinator.submit(&state, &schema, &ctx()).await.unwrap_err();
        assert!(matches!(err, SubmissionError::Transport { retryable: true, .. }));
    }
}
