use formflow_core::Binding;
use serde::Serialize;

use crate::cli::args::{BindingsArgs, OutputFormat};
use crate::cli::helpers;
use crate::exit_codes;

#[derive(Serialize)]
struct BindingRow<'a> {
    binding: &'a str,
    section: usize,
    field: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    option: Option<&'a str>,
}

pub fn run(args: BindingsArgs) -> anyhow::Result<i32> {
    let schema = match helpers::load_schema(&args.schema) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e:#}");
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    let bindings = schema.binding_ids();
    let rows: Vec<BindingRow<'_>> = bindings
        .iter()
        .map(|(id, binding)| BindingRow {
            binding: id,
            section: binding.section(),
            field: &binding.field().field_id,
            option: match binding {
                Binding::Option { option, .. } => Some(option.value.as_str()),
                Binding::Field { .. } => None,
            },
        })
        .collect();

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Text => {
            for row in &rows {
                match row.option {
                    Some(value) => println!("{:<30} {} = {}", row.binding, row.field, value),
                    None => println!("{:<30} {}", row.binding, row.field),
                }
            }
        }
    }
    Ok(exit_codes::OK)
}
