//! Get command - read an existing object through the data source variant

use crdform_core::TypeKind;

use crate::commands::metadata_for;
use crate::context::GlobalArgs;
use crate::display::{self, OutputFormat};
use crate::error::Result;

pub async fn run(globals: &GlobalArgs, type_name: &str, id: &str, format: OutputFormat) -> Result<()> {
    let provider = globals.provider().await?;
    let registered = provider.registry().get(type_name, TypeKind::DataSource)?;
    let (namespace, name) = registered.crd_type.parse_id(id)?;

    let state = provider
        .read_data_source(type_name, &metadata_for(namespace, name))
        .await?;
    display::print_value(&state, format)
}
