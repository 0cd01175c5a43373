use std::sync::Arc;

use formflow_client::HttpSchemaFetcher;
use formflow_core::{FormSchema, SchemaLoader};

use crate::cli::args::{FetchArgs, GlobalArgs, OutputFormat};
use crate::cli::helpers;
use crate::exit_codes;

pub async fn run(args: FetchArgs, global: &GlobalArgs) -> anyhow::Result<i32> {
    let client = match helpers::client(global) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e:#}");
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    let loader = SchemaLoader::new(Arc::new(HttpSchemaFetcher::new(client)));
    let params = args.shape.params();
    let schema = match loader.load(params).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: failed to load schema ({params}): {e}");
            return Ok(exit_codes::NETWORK_ERROR);
        }
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&*schema)?),
        OutputFormat::Text => print_outline(&schema),
    }
    Ok(exit_codes::OK)
}

fn print_outline(schema: &FormSchema) {
    println!(
        "Form ({}): {} sections, {} fields",
        schema.shape,
        schema.section_count(),
        schema.field_count()
    );
    for (i, section) in schema.sections.iter().enumerate() {
        println!("  {}. {}", i + 1, section.title);
        for field in &section.fields {
            let required = if field.required { "required" } else { "optional" };
            println!(
                "     - {:<20} {:<9} {}",
                field.field_id,
                field.kind.as_str(),
                required
            );
        }
    }
}
