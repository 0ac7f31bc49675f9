//! Display formatting for CLI output
//!
//! Provides structured display for:
//! - Provider diagnostics (errors and warnings)
//! - The served type names
//! - Schema attribute trees

use console::style;
use crdform_core::{Attribute, AttributeMode, RegisteredType, Schema, TypeKind};
use crdform_provider::{Diagnostic, Diagnostics, Severity};
use serde::Serialize;
use std::io::Write;

use crate::error::{CliError, Result};

/// Output format for state documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

/// Print a state document or any serializable value
pub fn print_value<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|e| CliError::internal(e.to_string()))?
        }
        OutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|e| CliError::internal(e.to_string()))?,
    };
    write_stdout(&format!("{}\n", rendered.trim_end()))
}

/// Write to stdout; a closed pipe (`crdform ... | head`) is not an error
pub fn write_stdout(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    match stdout.write_all(text.as_bytes()).and_then(|_| stdout.flush()) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Print diagnostics to stderr
pub fn print_diagnostics(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics.iter() {
        print_diagnostic(diagnostic);
    }
}

fn print_diagnostic(diagnostic: &Diagnostic) {
    let marker = match diagnostic.severity {
        Severity::Error => style("✗").red().bold(),
        Severity::Warning => style("⚠").yellow(),
    };
    match &diagnostic.attribute {
        Some(path) => eprintln!(
            "  {} {}: {}",
            marker,
            style(path).cyan(),
            diagnostic.detail
        ),
        None => {
            eprintln!("  {} {}", marker, style(&diagnostic.summary).bold());
            for line in diagnostic.detail.lines() {
                eprintln!("    {}", line);
            }
        }
    }
}

/// Print the served types, one line per CRD version
pub fn print_types<'a>(types: impl Iterator<Item = &'a RegisteredType>) {
    for registered in types {
        let crd_type = &registered.crd_type;
        let mut line = format!(
            "{}  {}  {}",
            style(crd_type.type_name(TypeKind::Resource)).cyan(),
            crd_type,
            style(crd_type.scope).dim()
        );
        if registered.version.as_ref().is_some_and(|v| v.storage) {
            line.push_str(&format!("  {}", style("storage").green()));
        }
        if registered.is_deprecated() {
            line.push_str(&format!("  {}", style("deprecated").yellow()));
        }
        println!("{}", line);
        println!(
            "    {} {}",
            style("manifest:").dim(),
            crd_type.type_name(TypeKind::Manifest)
        );
    }
}

/// Print a schema as an indented attribute tree
pub fn print_schema(schema: &Schema) {
    println!(
        "{} {} ({})",
        style("→").blue(),
        style(&schema.type_name).cyan().bold(),
        schema.kind
    );
    if !schema.description.is_empty() {
        println!("  {}", style(&schema.description).dim());
    }
    println!();
    print_attributes(schema.attributes.iter(), 1);
}

fn print_attributes<'a>(attributes: impl Iterator<Item = (&'a String, &'a Attribute)>, depth: usize) {
    for (name, attribute) in attributes {
        let indent = "  ".repeat(depth);
        println!(
            "{}{} {} {}",
            indent,
            name,
            style(attribute.type_.describe()).dim(),
            mode_label(attribute)
        );
        if let Some(nested) = attribute.type_.nested() {
            print_attributes(nested.iter(), depth + 1);
        }
    }
}

fn mode_label(attribute: &Attribute) -> console::StyledObject<&'static str> {
    match attribute.mode {
        AttributeMode::Required => style("required").red(),
        AttributeMode::Optional => style("optional").green(),
        AttributeMode::Computed => style("computed").blue(),
    }
}
