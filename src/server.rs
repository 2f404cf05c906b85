//! The provider side of the plugin protocol.
//!
//! This module defines the [`ProviderService`] trait: one method per protocol
//! operation, using the request/response types from [`crate::types`]. The RPC
//! layer that hosts a provider decodes wire messages into these types, calls
//! the trait, and encodes the responses; a [`ProviderError`] converts into a
//! `tonic::Status` at that boundary.
//!
//! Operations a provider can leave alone have default implementations:
//!
//! - validation hooks accept every input and report nothing
//! - `stop` and `close` succeed without doing anything
//! - import and move report [`ProviderError::Unsupported`]
//! - state-store and action operations report [`ProviderError::Unreachable`],
//!   because an engine only issues them to providers that advertise them

use tracing::error;

use crate::error::ProviderError;
use crate::schema::{Diagnostic, ProviderSchema};
use crate::types::{
    ApplyResourceChangeRequest, ApplyResourceChangeResponse, CallFunctionRequest,
    CloseEphemeralResourceRequest, ImportResourceStateRequest, ImportResourceStateResponse,
    ListResourceRequest, ListResourceResponse, MoveResourceStateRequest, MoveResourceStateResponse,
    OpenEphemeralResourceRequest, OpenEphemeralResourceResponse, PlanResourceChangeRequest,
    PlanResourceChangeResponse, ProviderMetadata, ReadDataSourceRequest, ReadDataSourceResponse,
    ReadResourceRequest, ReadResourceResponse, RenewEphemeralResourceRequest,
    RenewEphemeralResourceResponse, ResourceIdentitySchemas, UpgradeResourceIdentityRequest,
    UpgradeResourceIdentityResponse, UpgradeResourceStateRequest, UpgradeResourceStateResponse,
};
use crate::value::Value;

/// Trait that provider implementations must implement.
///
/// Every method is a function of its request and the provider's own
/// immutable data, so implementations are expected to be shareable across
/// concurrent calls without locking.
///
/// # Example
///
/// ```ignore
/// use hemmer_simple_provider::{ProviderService, ProviderError, ProviderSchema};
/// use hemmer_simple_provider::schema::Diagnostic;
/// use hemmer_simple_provider::value::Value;
///
/// struct MyProvider {
///     schema: ProviderSchema,
/// }
///
/// #[async_trait::async_trait]
/// impl ProviderService for MyProvider {
///     fn schema(&self) -> &ProviderSchema {
///         &self.schema
///     }
///
///     async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
///         Ok(vec![])
///     }
///
///     // ... implement the resource operations
/// }
/// ```
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    // =========================================================================
    // Schema & Metadata
    // =========================================================================

    /// Return the provider's schema.
    fn schema(&self) -> &ProviderSchema;

    /// Return provider metadata. By default, this is derived from the schema.
    fn metadata(&self) -> ProviderMetadata {
        let schema = self.schema();
        ProviderMetadata {
            resources: schema.resources.keys().cloned().collect(),
            data_sources: schema.data_sources.keys().cloned().collect(),
            ephemeral_resources: schema.ephemeral_resources.keys().cloned().collect(),
            list_resources: schema.list_resources.keys().cloned().collect(),
            functions: schema.functions.keys().cloned().collect(),
            capabilities: schema.capabilities,
        }
    }

    /// Return the identity schema of every resource type that declares one.
    fn resource_identity_schemas(&self) -> ResourceIdentitySchemas {
        ResourceIdentitySchemas {
            identity_types: self
                .schema()
                .resources
                .iter()
                .filter_map(|(name, schema)| {
                    schema
                        .identity
                        .as_ref()
                        .map(|identity| (name.clone(), identity.clone()))
                })
                .collect(),
        }
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate the provider configuration before configuring.
    async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Configure the provider.
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Stop any in-flight work.
    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Release everything the provider holds. Called once, last.
    async fn close(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource's configuration before planning.
    async fn validate_resource_config(
        &self,
        type_name: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (type_name, config);
        Ok(vec![])
    }

    /// Upgrade stored resource state to the current schema.
    async fn upgrade_resource_state(
        &self,
        request: UpgradeResourceStateRequest,
    ) -> Result<UpgradeResourceStateResponse, ProviderError>;

    /// Upgrade a stored resource identity to the current identity schema.
    async fn upgrade_resource_identity(
        &self,
        request: UpgradeResourceIdentityRequest,
    ) -> Result<UpgradeResourceIdentityResponse, ProviderError>;

    /// Refresh the state of a resource.
    async fn read_resource(
        &self,
        request: ReadResourceRequest,
    ) -> Result<ReadResourceResponse, ProviderError>;

    /// Plan a create, update or destroy.
    async fn plan_resource_change(
        &self,
        request: PlanResourceChangeRequest,
    ) -> Result<PlanResourceChangeResponse, ProviderError>;

    /// Apply a previously planned change.
    async fn apply_resource_change(
        &self,
        request: ApplyResourceChangeRequest,
    ) -> Result<ApplyResourceChangeResponse, ProviderError>;

    /// Import existing infrastructure into management.
    ///
    /// Import and move fail with "unsupported" and yield no state. Unlike the
    /// state-store and action calls this is a plain error, not
    /// [`ProviderError::Unreachable`]: users can request an import, so the
    /// engine must be able to report the failure and carry on.
    async fn import_resource_state(
        &self,
        request: ImportResourceStateRequest,
    ) -> Result<ImportResourceStateResponse, ProviderError> {
        let _ = request;
        Err(ProviderError::unsupported())
    }

    /// Move state from another resource type into one of ours.
    async fn move_resource_state(
        &self,
        request: MoveResourceStateRequest,
    ) -> Result<MoveResourceStateResponse, ProviderError> {
        let _ = request;
        Err(ProviderError::unsupported())
    }

    // =========================================================================
    // Data Source Operations
    // =========================================================================

    /// Validate a data source's configuration.
    async fn validate_data_source_config(
        &self,
        type_name: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (type_name, config);
        Ok(vec![])
    }

    /// Read data from an external source.
    async fn read_data_source(
        &self,
        request: ReadDataSourceRequest,
    ) -> Result<ReadDataSourceResponse, ProviderError> {
        Err(ProviderError::UnknownResource(request.type_name))
    }

    // =========================================================================
    // Ephemeral Resource Operations
    // =========================================================================

    /// Validate an ephemeral resource's configuration.
    async fn validate_ephemeral_resource_config(
        &self,
        type_name: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (type_name, config);
        Ok(vec![])
    }

    /// Open an ephemeral resource session.
    async fn open_ephemeral_resource(
        &self,
        request: OpenEphemeralResourceRequest,
    ) -> Result<OpenEphemeralResourceResponse, ProviderError> {
        Err(ProviderError::UnknownResource(request.type_name))
    }

    /// Extend an open ephemeral resource session.
    async fn renew_ephemeral_resource(
        &self,
        request: RenewEphemeralResourceRequest,
    ) -> Result<RenewEphemeralResourceResponse, ProviderError> {
        Err(ProviderError::UnknownResource(request.type_name))
    }

    /// End an ephemeral resource session.
    async fn close_ephemeral_resource(
        &self,
        request: CloseEphemeralResourceRequest,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Err(ProviderError::UnknownResource(request.type_name))
    }

    // =========================================================================
    // Functions
    // =========================================================================

    /// Call a provider function.
    async fn call_function(&self, request: CallFunctionRequest) -> Result<Value, ProviderError> {
        Err(ProviderError::UndefinedFunction(request.function_name))
    }

    // =========================================================================
    // List Resource Operations
    // =========================================================================

    /// Validate a list resource's configuration.
    async fn validate_list_resource_config(
        &self,
        type_name: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (type_name, config);
        Ok(vec![])
    }

    /// List resources of a type.
    async fn list_resource(
        &self,
        request: ListResourceRequest,
    ) -> Result<ListResourceResponse, ProviderError> {
        Err(ProviderError::UnknownResource(request.type_name))
    }

    // =========================================================================
    // State Store Operations
    // =========================================================================

    /// Validate a state store's configuration.
    async fn validate_state_store_config(
        &self,
        type_name: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Err(unreachable_call("ValidateStateStoreConfig", type_name))
    }

    /// Configure a state store.
    async fn configure_state_store(
        &self,
        type_name: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Err(unreachable_call("ConfigureStateStore", type_name))
    }

    /// List the state IDs held by a state store.
    async fn get_states(&self, type_name: &str) -> Result<Vec<String>, ProviderError> {
        Err(unreachable_call("GetStates", type_name))
    }

    /// Delete a state from a state store.
    async fn delete_state(
        &self,
        type_name: &str,
        state_id: &str,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = state_id;
        Err(unreachable_call("DeleteState", type_name))
    }

    // =========================================================================
    // Action Operations
    // =========================================================================

    /// Validate an action's configuration.
    async fn validate_action_config(
        &self,
        action_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Err(unreachable_call("ValidateActionConfig", action_type))
    }

    /// Plan an action.
    async fn plan_action(
        &self,
        action_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Err(unreachable_call("PlanAction", action_type))
    }

    /// Invoke an action.
    async fn invoke_action(
        &self,
        action_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Err(unreachable_call("InvokeAction", action_type))
    }
}

/// Build the fatal error for an operation whose capability was never advertised.
pub(crate) fn unreachable_call(operation: &str, type_name: &str) -> ProviderError {
    error!(operation, type_name, "call for a capability the provider does not advertise");
    ProviderError::Unreachable(format!(
        "{} for {:?} on provider that didn't declare it",
        operation, type_name
    ))
}
