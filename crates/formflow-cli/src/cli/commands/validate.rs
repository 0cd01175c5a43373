use formflow_core::{SubmissionCoordinator, SubmissionError};
use serde_json::json;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::cli::helpers;
use crate::exit_codes;

pub fn run(args: ValidateArgs) -> anyhow::Result<i32> {
    // 1. Load schema and answers
    let loaded = helpers::load_schema(&args.schema).and_then(|schema| {
        let answers = helpers::load_answers(&args.answers)?;
        let state = helpers::state_with_answers(&schema, &answers)?;
        Ok((schema, state))
    });
    let (schema, state) = match loaded {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e:#}");
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    // 2. Final sweep over every section
    let ctx = helpers::context(args.today);
    let errors = match SubmissionCoordinator::prepare(&state, &schema, &ctx) {
        Ok(_) => Vec::new(),
        Err(SubmissionError::Invalid(errors)) => errors,
        Err(e) => return Err(e.into()),
    };

    // 3. Report
    match args.format {
        OutputFormat::Json => {
            let report = json!({ "valid": errors.is_empty(), "errors": errors });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text if errors.is_empty() => {
            println!("valid: {} fields checked", schema.field_count());
        }
        OutputFormat::Text => {
            println!("invalid: {} field(s)", errors.len());
            helpers::print_field_errors(&schema, &errors);
        }
    }

    Ok(if errors.is_empty() {
        exit_codes::OK
    } else {
        exit_codes::VALIDATION_FAILED
    })
}
