//! Multi-section form engine.
//!
//! A form session loads a [`FormSchema`] once, keeps user input in a
//! [`FormState`], and walks the schema's sections with a [`SectionNavigator`]
//! that refuses to move forward past invalid input. The final section hands
//! off to a [`SubmissionCoordinator`], which re-validates everything before
//! anything leaves the process.
//!
//! - [`loader`]: schema fetching with a shape-keyed cache, in-flight
//!   de-duplication and stale-response discard
//! - [`validate`]: pure per-field rules, one rule set per field kind
//! - [`state`]: field values, durable across navigation
//! - [`navigator`]: section state machine and progress indicator
//! - [`submit`]: final sweep and transport hand-off
//! - [`session`]: the facade tying the above together
//!
//! Transport is pluggable: the engine talks to the network only through the
//! [`SchemaFetcher`] and [`SubmitTransport`] traits.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use formflow_core::{FormSession, SchemaFetcher, SchemaLoader, ShapeParams, SubmitTransport};
//!
//! # async fn example(
//! #     fetcher: Arc<dyn SchemaFetcher>,
//! #     transport: Arc<dyn SubmitTransport>,
//! # ) -> Result<(), formflow_core::SessionError> {
//! let loader = Arc::new(SchemaLoader::new(fetcher));
//! let mut session = FormSession::start(loader, ShapeParams::default(), transport).await?;
//!
//! session.set_text("firstName", "Ada")?;
//! session.next()?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;
pub mod navigator;
pub mod schema;
pub mod session;
pub mod state;
pub mod submit;
pub mod validate;

#[cfg(test)]
mod testing;

pub use error::{
    FieldError, LoadError, LoadResult, NavigationError, SessionError, StateError,
    SubmissionError, ViolationKind,
};
pub use loader::{LoaderConfig, SchemaCache, SchemaFetcher, SchemaLoader};
pub use navigator::{NavState, Progress, ProgressStep, SectionNavigator, StepState};
pub use schema::{
    Binding, Field, FieldKind, FieldOption, FieldRole, FieldValidation, FormSchema, SchemaEnvelope,
    Section, ShapeParams,
};
pub use session::FormSession;
pub use state::{FieldValue, FormState};
pub use submit::{SubmissionAck, SubmissionCoordinator, SubmissionPayload, SubmitTransport};
pub use validate::{validate_field, validate_section, FieldRules, ValidationContext, ValidationResult};
