//! Import command - print the state of an existing object

use crate::context::GlobalArgs;
use crate::display::{self, OutputFormat};
use crate::error::Result;

pub async fn run(globals: &GlobalArgs, type_name: &str, id: &str, format: OutputFormat) -> Result<()> {
    let provider = globals.provider().await?;
    let state = provider.import_state(type_name, id).await?;
    display::print_value(&state, format)
}
