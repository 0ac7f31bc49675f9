//! Render command - print the YAML manifest of a configuration document

use std::path::Path;

use console::style;

use crate::commands::{manifest_type_name, read_document};
use crate::context::GlobalArgs;
use crate::display;
use crate::error::{CliError, Result};

pub fn run(globals: &GlobalArgs, type_name: &str, file: &Path, output: Option<&Path>) -> Result<()> {
    let provider = globals.offline_provider()?;
    let document = read_document(file)?;

    let manifest_type = manifest_type_name(type_name);
    let state = provider.read_manifest(&manifest_type, &document)?;
    let yaml = state
        .get("yaml")
        .and_then(|v| v.as_str())
        .ok_or_else(|| CliError::internal("manifest state has no yaml attribute"))?;

    match output {
        Some(path) => {
            std::fs::write(path, yaml)?;
            eprintln!(
                "{} Wrote {} to {}",
                style("✓").green().bold(),
                state["id"].as_str().unwrap_or_default(),
                path.display()
            );
        }
        None => display::write_stdout(yaml)?,
    }
    Ok(())
}
