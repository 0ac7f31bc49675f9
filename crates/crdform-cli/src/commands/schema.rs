//! Schema command - show the attributes of a type

use crate::commands::{KindArg, kind_type_name};
use crate::context::GlobalArgs;
use crate::display::{self, OutputFormat};
use crate::error::Result;

pub fn run(globals: &GlobalArgs, type_name: &str, kind: KindArg, json: bool) -> Result<()> {
    let provider = globals.offline_provider()?;
    let schema = provider.schema(&kind_type_name(type_name, kind), kind.into())?;

    if json {
        display::print_value(&schema, OutputFormat::Json)
    } else {
        display::print_schema(&schema);
        Ok(())
    }
}
