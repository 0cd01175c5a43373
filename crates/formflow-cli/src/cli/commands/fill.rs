use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use formflow_client::{HttpSchemaFetcher, HttpSubmitTransport};
use formflow_core::{
    FieldValue, FormSession, SchemaLoader, SessionError, SubmissionAck, SubmissionError,
    SubmissionPayload, SubmitTransport,
};
use tracing::info;

use crate::cli::args::{FillArgs, GlobalArgs};
use crate::cli::helpers;
use crate::exit_codes;

/// Prints the payload instead of sending it.
struct DryRunTransport;

#[async_trait]
impl SubmitTransport for DryRunTransport {
    async fn send(&self, payload: &SubmissionPayload) -> Result<SubmissionAck, SubmissionError> {
        let body = serde_json::to_string_pretty(payload).map_err(|e| SubmissionError::Transport {
            message: format!("failed to encode payload: {e}"),
            retryable: false,
        })?;
        println!("{body}");
        Ok(SubmissionAck::default())
    }
}

pub async fn run(args: FillArgs, global: &GlobalArgs) -> anyhow::Result<i32> {
    let setup = helpers::load_answers(&args.answers).and_then(|answers| {
        let client = helpers::client(global)?;
        Ok((answers, client))
    });
    let (answers, client) = match setup {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e:#}");
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    let loader = Arc::new(SchemaLoader::new(Arc::new(HttpSchemaFetcher::new(
        client.clone(),
    ))));
    let transport: Arc<dyn SubmitTransport> = if args.dry_run {
        Arc::new(DryRunTransport)
    } else {
        Arc::new(HttpSubmitTransport::new(client))
    };

    let mut session = match FormSession::start(loader, args.shape.params(), transport).await {
        Ok(s) => s.with_context(helpers::context(args.today)),
        Err(e) => {
            eprintln!("error: {e}");
            return Ok(helpers::session_exit_code(&e));
        }
    };

    let code = match fill_and_submit(&mut session, &answers).await {
        Ok(ack) => {
            match (args.dry_run, ack.id) {
                (true, _) => println!("dry run: not submitted"),
                (false, Some(id)) => println!("submitted (id {id})"),
                (false, None) => println!("submitted"),
            }
            exit_codes::OK
        }
        Err(e) => {
            report(&session, &e);
            helpers::session_exit_code(&e)
        }
    };

    println!("schema fetches: {}", session.fetch_count());
    Ok(code)
}

async fn fill_and_submit(
    session: &mut FormSession,
    answers: &BTreeMap<String, FieldValue>,
) -> Result<SubmissionAck, SessionError> {
    let schema = Arc::clone(session.schema());
    for (index, section) in schema.sections.iter().enumerate() {
        for field in &section.fields {
            if let Some(value) = answers.get(&field.field_id) {
                session.set(&field.field_id, value.clone())?;
            }
        }

        if index + 1 < schema.section_count() {
            session.next()?;
            info!(section = index + 1, title = %section.title, "section completed");
        }
    }
    session.submit().await
}

fn report(session: &FormSession, err: &SessionError) {
    eprintln!("error: {err}");
    let errors = err.field_errors();
    if !errors.is_empty() {
        helpers::print_field_errors(session.schema(), errors);
    }
}
