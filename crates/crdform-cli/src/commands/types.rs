//! Types command - list the served type names

use console::style;

use crate::context::GlobalArgs;
use crate::display::{self, OutputFormat};
use crate::error::Result;

pub fn run(globals: &GlobalArgs, json: bool) -> Result<()> {
    let provider = globals.offline_provider()?;

    if json {
        return display::print_value(&provider.metadata(), OutputFormat::Json);
    }

    println!(
        "{} {} type(s) registered",
        style("→").blue(),
        provider.registry().len()
    );
    display::print_types(provider.registry().iter());
    Ok(())
}
