//! HTTP adapters connecting the formflow engine to a form server.
//!
//! - [`FormClient`]: `GET /api/form` and `POST /api/form/submit` with retry
//! - [`HttpSchemaFetcher`] / [`HttpSubmitTransport`]: the engine's
//!   [`SchemaFetcher`](formflow_core::SchemaFetcher) and
//!   [`SubmitTransport`](formflow_core::SubmitTransport) over that client
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use formflow_client::{FormClient, HttpSchemaFetcher, HttpSubmitTransport};
//! use formflow_core::{FormSession, SchemaLoader, ShapeParams};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = FormClient::from_env()?;
//! let loader = Arc::new(SchemaLoader::new(Arc::new(HttpSchemaFetcher::new(client.clone()))));
//! let session = FormSession::start(
//!     loader,
//!     ShapeParams::default(),
//!     Arc::new(HttpSubmitTransport::new(client)),
//! )
//! .await?;
//! println!("{} sections", session.schema().section_count());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `FORMFLOW_BASE_URL` | Form server base URL (default: `http://localhost:3000`) |
//! | `FORMFLOW_TIMEOUT` | Request timeout in seconds (default: 30) |
//! | `FORMFLOW_MAX_RETRIES` | Max retries for transient failures (default: 3) |

pub mod adapters;
pub mod client;
pub mod config;
pub mod error;

pub use adapters::{HttpSchemaFetcher, HttpSubmitTransport};
pub use client::FormClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};

/// User-Agent sent with every request.
pub const CLIENT_USER_AGENT: &str = client::USER_AGENT_VALUE;
