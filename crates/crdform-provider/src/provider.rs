//! The provider surface
//!
//! A [`Provider`] serves every registered type under three names (resource,
//! data source, manifest). Operations take and return snake_case state
//! documents; failures come back as [`Diagnostics`].

use serde::Serialize;
use serde_json::{Map, Value};

use crdform_core::{
    CrdType, Object, RegisteredType, Schema, TypeKind, TypeRegistry, object_to_state,
    state_to_object, validate_config,
};
use crdform_kube::{ApplyParams, Connection, CrdAdapter, KubeError, Propagation, ProviderConfig};

use crate::diagnostics::{Diagnostic, Diagnostics, Operation};

/// Result of a provider operation
pub type OpResult<T> = std::result::Result<T, Diagnostics>;

/// Type names served by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderMetadata {
    pub resources: Vec<String>,
    pub data_sources: Vec<String>,
    pub manifests: Vec<String>,
}

pub struct Provider {
    registry: TypeRegistry,
    config: ProviderConfig,
    connection: Connection,
}

impl Provider {
    /// Create a provider
    ///
    /// `config.offline` wins over an online `connection`.
    pub fn new(registry: TypeRegistry, config: ProviderConfig, connection: Connection) -> Self {
        let connection = if config.offline {
            Connection::Offline
        } else {
            connection
        };
        tracing::debug!(
            types = registry.len(),
            offline = connection.is_offline(),
            field_manager = %config.field_manager,
            "provider configured"
        );
        Self {
            registry,
            config,
            connection,
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn is_offline(&self) -> bool {
        self.connection.is_offline()
    }

    pub fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            resources: self.registry.type_names(TypeKind::Resource),
            data_sources: self.registry.type_names(TypeKind::DataSource),
            manifests: self.registry.type_names(TypeKind::Manifest),
        }
    }

    /// Schema of one type name
    pub fn schema(&self, type_name: &str, kind: TypeKind) -> OpResult<Schema> {
        let registered = self
            .registry
            .get(type_name, kind)
            .map_err(|e| Diagnostic::from_core_error(Operation::Read, &e))?;
        Ok(registered.schema(kind))
    }

    /// Validate a configuration document
    ///
    /// Returns warnings as well as errors; check [`Diagnostics::has_errors`].
    pub fn validate_config(&self, type_name: &str, kind: TypeKind, config: &Value) -> Diagnostics {
        let registered = match self.registry.get(type_name, kind) {
            Ok(registered) => registered,
            Err(e) => return Diagnostic::from_core_error(Operation::Read, &e).into(),
        };

        let mut diagnostics = Diagnostics::new();
        if registered.is_deprecated() {
            let detail = registered
                .version
                .as_ref()
                .and_then(|v| v.deprecation_warning.clone())
                .unwrap_or_else(|| format!("{} is deprecated", registered.crd_type));
            diagnostics.push(Diagnostic::warning("Deprecated API Version", detail));
        }

        let schema = registered.schema(kind);
        for issue in validate_config(&schema, &configurable(&schema, config)) {
            diagnostics.push(Diagnostic::from_validation_issue(&issue));
        }
        diagnostics
    }

    /// Read an existing object through the data source variant
    pub async fn read_data_source(&self, type_name: &str, config: &Value) -> OpResult<Value> {
        let op = Operation::ReadDataSource;
        self.ensure_online(op)?;
        let (registered, schema) = self.lookup(type_name, TypeKind::DataSource, op)?;
        self.check(type_name, TypeKind::DataSource, config)?;

        let crd_type = &registered.crd_type;
        let wanted = state_to_object(&schema, crd_type, config)
            .map_err(|e| Diagnostic::from_core_error(op, &e))?;

        let object = self
            .adapter(crd_type)
            .read(wanted.metadata.namespace.as_deref(), &wanted.metadata.name)
            .await
            .map_err(|e| Diagnostic::from_kube_error(op, &e))?;

        to_state(&schema, crd_type, &object, None, op)
    }

    /// Render the manifest variant; never touches the cluster
    pub fn read_manifest(&self, type_name: &str, config: &Value) -> OpResult<Value> {
        let op = Operation::RenderManifest;
        let (registered, schema) = self.lookup(type_name, TypeKind::Manifest, op)?;
        self.check(type_name, TypeKind::Manifest, config)?;

        let crd_type = &registered.crd_type;
        let object = state_to_object(&schema, crd_type, config)
            .map_err(|e| Diagnostic::from_core_error(op, &e))?;
        let yaml = crdform_core::render_manifest(crd_type, &object)
            .map_err(|e| Diagnostic::from_core_error(op, &e))?;

        let mut state = to_state(&schema, crd_type, &object, Some(config), op)?;
        if let Some(map) = state.as_object_mut() {
            map.insert("yaml".to_string(), Value::String(yaml));
        }
        Ok(state)
    }

    /// Create a resource with server-side apply
    pub async fn create(&self, type_name: &str, planned: &Value) -> OpResult<Value> {
        let op = Operation::Create;
        self.ensure_online(op)?;
        let (registered, schema) = self.lookup(type_name, TypeKind::Resource, op)?;
        self.check(type_name, TypeKind::Resource, planned)?;

        self.apply(registered, &schema, planned, op).await
    }

    /// Refresh a resource from the cluster
    ///
    /// `Ok(None)` means the object is gone and should be removed from state.
    pub async fn read(&self, type_name: &str, state: &Value) -> OpResult<Option<Value>> {
        let op = Operation::Read;
        self.ensure_online(op)?;
        let (registered, schema) = self.lookup(type_name, TypeKind::Resource, op)?;

        let crd_type = &registered.crd_type;
        let current = state_to_object(&schema, crd_type, state)
            .map_err(|e| Diagnostic::from_core_error(op, &e))?;

        match self
            .adapter(crd_type)
            .read(current.metadata.namespace.as_deref(), &current.metadata.name)
            .await
        {
            Ok(object) => to_state(&schema, crd_type, &object, Some(state), op).map(Some),
            Err(e) if e.is_not_found() => {
                tracing::warn!(
                    type_name,
                    id = %current.id(crd_type),
                    "object no longer exists, removing from state"
                );
                Ok(None)
            }
            Err(e) => Err(Diagnostic::from_kube_error(op, &e).into()),
        }
    }

    /// Update a resource in place with server-side apply
    pub async fn update(&self, type_name: &str, prior: &Value, planned: &Value) -> OpResult<Value> {
        let op = Operation::Update;
        self.ensure_online(op)?;
        let (registered, schema) = self.lookup(type_name, TypeKind::Resource, op)?;
        self.check(type_name, TypeKind::Resource, planned)?;

        for field in ["name", "namespace"] {
            let before = &prior["metadata"][field];
            let after = &planned["metadata"][field];
            if before != after {
                return Err(Diagnostic::error(
                    "Resource Replacement Required",
                    format!(
                        "metadata.{} cannot change in place (from {} to {}); the resource must be replaced.",
                        field, before, after
                    ),
                )
                .with_attribute(format!("metadata.{}", field))
                .into());
            }
        }

        self.apply(registered, &schema, planned, op).await
    }

    /// Delete a resource
    pub async fn delete(&self, type_name: &str, state: &Value) -> OpResult<()> {
        let op = Operation::Delete;
        self.ensure_online(op)?;
        let (registered, schema) = self.lookup(type_name, TypeKind::Resource, op)?;

        let propagation = match state.get("deletion_propagation").and_then(Value::as_str) {
            Some(policy) => Some(
                policy
                    .parse::<Propagation>()
                    .map_err(|e| Diagnostic::from_kube_error(op, &e))?,
            ),
            None => None,
        };

        let crd_type = &registered.crd_type;
        let current = state_to_object(&schema, crd_type, state)
            .map_err(|e| Diagnostic::from_core_error(op, &e))?;

        self.adapter(crd_type)
            .delete(
                current.metadata.namespace.as_deref(),
                &current.metadata.name,
                propagation,
            )
            .await
            .map_err(|e| Diagnostic::from_kube_error(op, &e))?;
        Ok(())
    }

    /// Adopt an existing object by id
    pub async fn import_state(&self, type_name: &str, id: &str) -> OpResult<Value> {
        let op = Operation::Import;
        self.ensure_online(op)?;
        let (registered, schema) = self.lookup(type_name, TypeKind::Resource, op)?;

        let crd_type = &registered.crd_type;
        let (namespace, name) = crd_type
            .parse_id(id)
            .map_err(|e| Diagnostic::from_core_error(op, &e))?;

        let object = self
            .adapter(crd_type)
            .read(namespace.as_deref(), &name)
            .await
            .map_err(|e| Diagnostic::from_kube_error(op, &e))?;

        tracing::info!(type_name, id, "imported");
        to_state(&schema, crd_type, &object, None, op)
    }

    async fn apply(
        &self,
        registered: &RegisteredType,
        schema: &Schema,
        planned: &Value,
        op: Operation,
    ) -> OpResult<Value> {
        let crd_type = &registered.crd_type;
        let object = state_to_object(schema, crd_type, planned)
            .map_err(|e| Diagnostic::from_core_error(op, &e))?;

        let applied = self
            .adapter(crd_type)
            .apply(&object, &self.apply_params(planned))
            .await
            .map_err(|e| Diagnostic::from_kube_error(op, &e))?;

        to_state(schema, crd_type, &applied, Some(planned), op)
    }

    fn apply_params(&self, state: &Value) -> ApplyParams {
        ApplyParams {
            field_manager: state
                .get("field_manager")
                .and_then(Value::as_str)
                .unwrap_or(&self.config.field_manager)
                .to_string(),
            force_conflicts: state
                .get("force_conflicts")
                .and_then(Value::as_bool)
                .unwrap_or(self.config.force_conflicts),
        }
    }

    fn adapter(&self, crd_type: &CrdType) -> CrdAdapter<Value> {
        CrdAdapter::new(crd_type.clone(), self.connection.clone())
    }

    fn lookup(
        &self,
        type_name: &str,
        kind: TypeKind,
        op: Operation,
    ) -> OpResult<(&RegisteredType, Schema)> {
        let registered = self
            .registry
            .get(type_name, kind)
            .map_err(|e| Diagnostic::from_core_error(op, &e))?;
        Ok((registered, registered.schema(kind)))
    }

    fn ensure_online(&self, op: Operation) -> OpResult<()> {
        self.connection
            .cluster(op.action())
            .map(|_| ())
            .map_err(|e: KubeError| Diagnostic::from_kube_error(op, &e).into())
    }

    fn check(&self, type_name: &str, kind: TypeKind, config: &Value) -> OpResult<()> {
        let diagnostics = self.validate_config(type_name, kind, config);
        for warning in diagnostics.iter().filter(|d| !d.is_error()) {
            tracing::warn!(type_name, "{}", warning.detail);
        }
        if diagnostics.has_errors() {
            return Err(diagnostics);
        }
        Ok(())
    }
}

/// Drop top-level computed attributes carried over from prior state
fn configurable(schema: &Schema, config: &Value) -> Value {
    match config {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(name, _)| schema.attribute(name).is_none_or(|a| !a.is_computed()))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect::<Map<String, Value>>(),
        ),
        other => other.clone(),
    }
}

fn to_state(
    schema: &Schema,
    crd_type: &CrdType,
    object: &Object<Value>,
    prior: Option<&Value>,
    op: Operation,
) -> OpResult<Value> {
    object_to_state(schema, crd_type, object, prior)
        .map_err(|e| Diagnostic::from_core_error(op, &e).into())
}
