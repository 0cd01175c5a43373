//! In-memory fetcher and transport used by the unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::error::{LoadError, LoadResult, SubmissionError};
use crate::loader::SchemaFetcher;
use crate::schema::{
    Field, FieldKind, FieldOption, FieldRole, FieldValidation, FormSchema, Section, ShapeParams,
};
use crate::submit::{SubmissionAck, SubmissionPayload, SubmitTransport};

type Build = Box<dyn Fn(&ShapeParams) -> FormSchema + Send + Sync>;

/// Fetcher that records every call and builds the response from the params.
/// A gated fetcher holds each response until [`ScriptedFetcher::release`].
pub(crate) struct ScriptedFetcher {
    build: Build,
    calls: Mutex<Vec<ShapeParams>>,
    gate: Option<Semaphore>,
    failing: AtomicBool,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::building(grid_schema)
    }

    pub fn building(build: impl Fn(&ShapeParams) -> FormSchema + Send + Sync + 'static) -> Self {
        Self {
            build: Box::new(build),
            calls: Mutex::new(Vec::new()),
            gate: None,
            failing: AtomicBool::new(false),
        }
    }

    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    pub fn release(&self, responses: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(responses);
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<ShapeParams> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SchemaFetcher for ScriptedFetcher {
    async fn fetch(&self, params: &ShapeParams) -> LoadResult<FormSchema> {
        self.calls.lock().unwrap().push(*params);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(LoadError::Fetch {
                message: "HTTP 500".into(),
                retryable: true,
            });
        }
        Ok((self.build)(params))
    }
}

/// Transport that keeps every payload it is given.
#[derive(Default)]
pub(crate) struct RecordingTransport {
    pub sent: Mutex<Vec<SubmissionPayload>>,
    failing: AtomicBool,
}

impl RecordingTransport {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SubmissionPayload> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubmitTransport for RecordingTransport {
    async fn send(&self, payload: &SubmissionPayload) -> Result<SubmissionAck, SubmissionError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SubmissionError::Transport {
                message: "HTTP 503".into(),
                retryable: true,
            });
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(payload.clone());
        Ok(SubmissionAck {
            id: Some(format!("sub-{}", sent.len())),
        })
    }
}

pub(crate) fn field(id: &str, kind: FieldKind, required: bool) -> Field {
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

/// `section_count` sections (default 3) of `field_count` required text
/// fields (default 2), ids `s{section}f{field}`.
pub(crate) fn grid_schema(params: &ShapeParams) -> FormSchema {
    let sections = params.section_count.unwrap_or(3);
    let fields = params.field_count.unwrap_or(2);
    FormSchema::new(
        (0..sections)
            .map(|s| Section {
                title: format!("Section {}", s + 1),
                description: None,
                fields: (0..fields)
                    .map(|f| field(&format!("s{s}f{f}"), FieldKind::Text, true))
                    .collect(),
            })
            .collect(),
    )
}

/// Three-section sign-up form exercising every rule family.
pub(crate) fn signup_schema(_: &ShapeParams) -> FormSchema {
    let mut dob = field("dateOfBirth", FieldKind::Date, true);
    dob.validation = Some(FieldValidation {
        role: Some(FieldRole::DateOfBirth),
        ..Default::default()
    });

    let mut country = field("country", FieldKind::Radio, true);
    country.options = ["nl", "be"]
        .into_iter()
        .map(|v| FieldOption {
            value: v.into(),
            label: v.to_uppercase(),
            data_test_id: None,
        })
        .collect();

    let mut terms = field("terms", FieldKind::Checkbox, true);
    terms.data_test_id = Some("accept-terms".into());

    FormSchema::new(vec![
        Section {
            title: "Personal".into(),
            description: None,
            fields: vec![field("firstName", FieldKind::Text, true), dob],
        },
        Section {
            title: "Contact".into(),
            description: None,
            fields: vec![field("email", FieldKind::Email, true), country],
        },
        Section {
            title: "Confirm".into(),
            description: None,
            fields: vec![terms, field("comments", FieldKind::Textarea, false)],
        },
    ])
}
