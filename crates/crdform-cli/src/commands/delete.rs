//! Delete command - remove an object from the cluster

use console::style;
use crdform_core::TypeKind;

use crate::commands::metadata_for;
use crate::context::GlobalArgs;
use crate::error::Result;

pub async fn run(
    globals: &GlobalArgs,
    type_name: &str,
    id: &str,
    propagation: Option<&str>,
) -> Result<()> {
    let provider = globals.provider().await?;
    let registered = provider.registry().get(type_name, TypeKind::Resource)?;
    let (namespace, name) = registered.crd_type.parse_id(id)?;

    let mut state = metadata_for(namespace, name);
    if let Some(policy) = propagation {
        state["deletion_propagation"] = serde_json::Value::String(policy.to_string());
    }

    provider.delete(type_name, &state).await?;
    eprintln!(
        "{} Deleted {} {}",
        style("✓").green().bold(),
        style(type_name).cyan(),
        style(id).yellow()
    );
    Ok(())
}
