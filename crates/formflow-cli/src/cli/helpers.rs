//! File loading and client construction shared by the commands.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context};
use formflow_client::{ClientConfig, FormClient};
use formflow_core::{FieldError, FieldValue, FormSchema, FormState, SessionError, ValidationContext};

use super::args::GlobalArgs;
use crate::exit_codes;

/// Config file, then environment, then `--base-url`.
pub(crate) fn client_config(global: &GlobalArgs) -> anyhow::Result<ClientConfig> {
    let mut config = ClientConfig::load(global.config.as_deref())?;
    if let Some(url) = &global.base_url {
        config = config.with_base_url(url);
    }
    Ok(config)
}

pub(crate) fn client(global: &GlobalArgs) -> anyhow::Result<FormClient> {
    Ok(FormClient::new(client_config(global)?)?)
}

/// Read and structurally check a schema file.
pub(crate) fn load_schema(path: &Path) -> anyhow::Result<FormSchema> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema {}", path.display()))?;
    let schema = FormSchema::from_json_str(&text)
        .with_context(|| format!("failed to parse schema {}", path.display()))?;
    schema
        .check()
        .with_context(|| format!("invalid schema {}", path.display()))?;
    Ok(schema)
}

/// Read an answers file (YAML or JSON). Numbers are taken as their decimal
/// text, so values with leading zeros must be quoted.
pub(crate) fn load_answers(path: &Path) -> anyhow::Result<BTreeMap<String, FieldValue>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answers {}", path.display()))?;
    let raw: BTreeMap<String, serde_yaml::Value> =
        serde_yaml::from_str(&text).with_context(|| {
            format!("answers {} must map field ids to values", path.display())
        })?;

    raw.into_iter()
        .map(|(field_id, value)| {
            let value = match value {
                serde_yaml::Value::Null => FieldValue::Empty,
                serde_yaml::Value::Bool(b) => FieldValue::Bool(b),
                serde_yaml::Value::String(s) => FieldValue::Text(s),
                serde_yaml::Value::Number(n) => FieldValue::Text(n.to_string()),
                other => bail!("answer for {field_id} must be text, boolean or null, got {other:?}"),
            };
            Ok((field_id, value))
        })
        .collect()
}

/// Fresh state for `schema` with `answers` applied. Answers for fields the
/// schema does not have are reported and skipped.
pub(crate) fn state_with_answers(
    schema: &FormSchema,
    answers: &BTreeMap<String, FieldValue>,
) -> anyhow::Result<FormState> {
    let mut state = FormState::for_schema(schema);
    for (field_id, value) in answers {
        if !state.contains(field_id) {
            tracing::warn!(field_id = %field_id, "answer for unknown field ignored");
            continue;
        }
        state.set(field_id, value.clone())?;
    }
    Ok(state)
}

pub(crate) fn context(today: Option<chrono::NaiveDate>) -> ValidationContext {
    today.map_or_else(ValidationContext::now, ValidationContext::at)
}

/// `  2. Contact › email: Invalid format`
pub(crate) fn print_field_errors(schema: &FormSchema, errors: &[FieldError]) {
    for e in errors {
        let section = schema
            .section_of(&e.field_id)
            .and_then(|i| schema.section(i).map(|s| (i, s)));
        match section {
            Some((i, section)) => {
                println!("  {}. {} › {}: {}", i + 1, section.title, e.field_id, e.message)
            }
            None => println!("  {}: {}", e.field_id, e.message),
        }
    }
}

pub(crate) fn session_exit_code(err: &SessionError) -> i32 {
    match err {
        SessionError::Load(_) => exit_codes::NETWORK_ERROR,
        SessionError::Navigation(_) => exit_codes::VALIDATION_FAILED,
        SessionError::State(_) => exit_codes::CONFIG_ERROR,
        SessionError::Submission(e) if e.field_errors().is_empty() => exit_codes::NETWORK_ERROR,
        SessionError::Submission(_) => exit_codes::VALIDATION_FAILED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_answers_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "firstName: Ada\nphone: '0612345678'\nterms: true\nnickname: ~\nage: 42"
        )
        .unwrap();

        let answers = load_answers(file.path()).unwrap();
        assert_eq!(answers["firstName"], FieldValue::from("Ada"));
        assert_eq!(answers["phone"], FieldValue::from("0612345678"));
        assert_eq!(answers["terms"], FieldValue::Bool(true));
        assert_eq!(answers["nickname"], FieldValue::Empty);
        assert_eq!(answers["age"], FieldValue::from("42"));
    }

    #[test]
    fn test_load_answers_rejects_nested() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"address\": {{\"city\": \"Utrecht\"}}}}").unwrap();
        assert!(load_answers(file.path()).is_err());
    }
}
