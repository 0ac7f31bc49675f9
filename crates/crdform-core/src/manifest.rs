//! Offline manifest rendering
//!
//! Turns a typed object into the YAML document `kubectl apply -f` would
//! accept. No cluster access is involved.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{CoreError, Result};
use crate::object::Object;
use crate::target::CrdType;

/// Render an object as a YAML manifest
///
/// apiVersion and kind are always taken from `crd_type`, whatever the
/// object carried before.
pub fn render_manifest<S>(crd_type: &CrdType, object: &Object<S>) -> Result<String>
where
    S: Serialize + Clone,
{
    let mut stamped = object.clone();
    stamped.stamp(crd_type);
    serde_yaml::to_string(&stamped).map_err(CoreError::marshal)
}

/// Parse a single YAML manifest into a typed object
pub fn parse_manifest<S>(yaml: &str) -> Result<Object<S>>
where
    S: DeserializeOwned,
{
    let value: serde_json::Value = serde_yaml::from_str(yaml).map_err(CoreError::unmarshal)?;
    Object::from_json(value)
}
