//! Validate command - check a configuration document against a schema

use std::path::Path;

use console::style;

use crate::commands::{KindArg, kind_type_name, read_document};
use crate::context::GlobalArgs;
use crate::display::{self, OutputFormat};
use crate::error::{CliError, Result};

pub fn run(
    globals: &GlobalArgs,
    type_name: &str,
    kind: KindArg,
    file: &Path,
    json_output: bool,
) -> Result<()> {
    let provider = globals.offline_provider()?;
    let document = read_document(file)?;

    let type_name = kind_type_name(type_name, kind);
    let diagnostics = provider.validate_config(&type_name, kind.into(), &document);
    let errors = diagnostics.iter().filter(|d| d.is_error()).count();

    if json_output {
        let output = serde_json::json!({
            "valid": errors == 0,
            "type": type_name,
            "diagnostics": diagnostics,
        });
        display::print_value(&output, OutputFormat::Json)?;
    } else {
        println!(
            "{} Validating {} against {}",
            style("→").blue(),
            file.display(),
            style(&type_name).cyan()
        );
        display::print_diagnostics(&diagnostics);
        if errors == 0 {
            println!("{} Configuration is valid", style("✓").green().bold());
        }
    }

    if errors > 0 {
        return Err(CliError::validation(format!(
            "{} error(s) in {}",
            errors,
            file.display()
        )));
    }
    Ok(())
}
