//! `formflow-core` trait implementations backed by [`FormClient`].

use async_trait::async_trait;
use formflow_core::{
    FormSchema, LoadResult, SchemaFetcher, ShapeParams, SubmissionAck, SubmissionError,
    SubmissionPayload, SubmitTransport,
};

use crate::client::FormClient;

/// Fetches schemas from `GET /api/form`.
#[derive(Debug, Clone)]
pub struct HttpSchemaFetcher {
    client: FormClient,
}

impl HttpSchemaFetcher {
    pub fn new(client: FormClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SchemaFetcher for HttpSchemaFetcher {
    async fn fetch(&self, params: &ShapeParams) -> LoadResult<FormSchema> {
        Ok(self.client.fetch_schema(params).await?)
    }
}

/// Sends submissions to `POST /api/form/submit`.
#[derive(Debug, Clone)]
pub struct HttpSubmitTransport {
    client: FormClient,
}

impl HttpSubmitTransport {
    pub fn new(client: FormClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SubmitTransport for HttpSubmitTransport {
    async fn send(&self, payload: &SubmissionPayload) -> Result<SubmissionAck, SubmissionError> {
        Ok(self.client.submit(payload).await?)
    }
}
