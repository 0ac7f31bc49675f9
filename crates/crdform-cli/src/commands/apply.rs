//! Apply command - create or update an object with server-side apply

use std::path::Path;

use console::style;
use serde_json::Value;

use crate::commands::read_document;
use crate::context::GlobalArgs;
use crate::display::{self, OutputFormat};
use crate::error::Result;

pub async fn run(
    globals: &GlobalArgs,
    type_name: &str,
    file: &Path,
    format: OutputFormat,
) -> Result<()> {
    let document = read_document(file)?;
    let provider = globals.provider().await?;

    // Server-side apply is idempotent, so create covers updates too
    let state = provider.create(type_name, &document).await?;

    eprintln!(
        "{} Applied {} {} (field manager {})",
        style("✓").green().bold(),
        style(type_name).cyan(),
        style(state["id"].as_str().unwrap_or_default()).yellow(),
        effective_field_manager(&state, &provider.config().field_manager)
    );
    display::print_value(&state, format)
}

/// The document's `field_manager` wins over the provider config
fn effective_field_manager<'a>(state: &'a Value, configured: &'a str) -> &'a str {
    state
        .get("field_manager")
        .and_then(Value::as_str)
        .unwrap_or(configured)
}
