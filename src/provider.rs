//! The simple provider.
//!
//! [`SimpleProvider`] declares one kind of everything, all named
//! `simple_resource` (plus the function `noop`), and implements every
//! operation of [`ProviderService`] against them. It talks to no remote
//! system: "apply" is a pure value transformation, which makes it useful for
//! exercising an engine's side of the protocol.
//!
//! The contract it holds the engine to:
//!
//! - A destroy plan attaches [`PrivateData::DestroyPlanned`]; the matching
//!   apply must hand exactly that back.
//! - An ephemeral resource is opened with [`PrivateData::EphemeralSession`];
//!   every renew and close must present the same token.
//!
//! A violation of either is reported as an error diagnostic while the
//! operation still completes.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::ProviderError;
use crate::schema::{
    Attribute, AttributeType, Diagnostic, FunctionDecl, FunctionParam, IdentitySchema,
    ProviderSchema, Schema,
};
use crate::server::ProviderService;
use crate::types::{
    ApplyResourceChangeRequest, ApplyResourceChangeResponse, CallFunctionRequest,
    CloseEphemeralResourceRequest, ImportResourceStateRequest, ImportResourceStateResponse,
    ListResourceRequest, ListResourceResponse, MoveResourceStateRequest, MoveResourceStateResponse,
    OpenEphemeralResourceRequest, OpenEphemeralResourceResponse, PlanResourceChangeRequest,
    PlanResourceChangeResponse, PrivateData, ReadDataSourceRequest, ReadDataSourceResponse,
    ReadResourceRequest, ReadResourceResponse, RenewEphemeralResourceRequest,
    RenewEphemeralResourceResponse, ServerCapabilities, UpgradeResourceIdentityRequest,
    UpgradeResourceIdentityResponse, UpgradeResourceStateRequest, UpgradeResourceStateResponse,
};
use crate::value::Value;

/// Name shared by the resource, data source, ephemeral and list resource.
pub const SIMPLE_RESOURCE: &str = "simple_resource";

/// The only function the provider declares.
pub const NOOP_FUNCTION: &str = "noop";

/// `id` every data source read and list entry resolves to.
pub const STATIC_ID: &str = "static_id";

/// Effective list value when the list configuration sets none.
pub const STATIC_VALUE: &str = "static_value";

/// Display name of the single list entry.
pub const STATIC_DISPLAY_NAME: &str = "static_display_name";

/// `id` of every opened ephemeral resource.
pub const EPHEMERAL_SECRET: &str = "ephemeral secret";

const DEFAULT_RENEW_INTERVAL: Duration = Duration::from_secs(1);

/// Options for the simple provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOptions {
    /// How far in the future an ephemeral resource asks to be renewed.
    /// Default: 1 second.
    pub renew_interval: Duration,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            renew_interval: DEFAULT_RENEW_INTERVAL,
        }
    }
}

impl ProviderOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ephemeral renewal interval.
    pub fn with_renew_interval(mut self, interval: Duration) -> Self {
        self.renew_interval = interval;
        self
    }
}

/// A provider with one toy resource type and no remote system.
#[derive(Debug, Clone)]
pub struct SimpleProvider {
    schema: ProviderSchema,
    options: ProviderOptions,
}

impl SimpleProvider {
    /// Create the provider with default options.
    pub fn new() -> Self {
        Self::with_options(ProviderOptions::default())
    }

    /// Create the provider with custom options.
    pub fn with_options(options: ProviderOptions) -> Self {
        Self {
            schema: simple_schema(),
            options,
        }
    }

    /// The options the provider was built with.
    pub fn options(&self) -> &ProviderOptions {
        &self.options
    }

    fn renew_at(&self) -> Option<chrono::DateTime<Utc>> {
        let now = Utc::now();
        let fallback = chrono::Duration::seconds(1);
        // Intervals past the representable time range fall back to one second.
        let interval = chrono::Duration::from_std(self.options.renew_interval).unwrap_or(fallback);
        now.checked_add_signed(interval)
            .or_else(|| now.checked_add_signed(fallback))
    }
}

impl Default for SimpleProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn simple_schema() -> ProviderSchema {
    let identity = IdentitySchema::single().with_attribute("id", Attribute::required_string());
    let simple_resource = Schema::v0()
        .with_attribute("id", Attribute::computed_string())
        .with_attribute("value", Attribute::optional_string())
        .with_identity(identity);

    ProviderSchema::new()
        .with_provider_config(Schema::v0())
        .with_resource(SIMPLE_RESOURCE, simple_resource.clone())
        .with_data_source(SIMPLE_RESOURCE, simple_resource.clone())
        .with_ephemeral_resource(SIMPLE_RESOURCE, simple_resource)
        .with_list_resource(
            SIMPLE_RESOURCE,
            Schema::v0().with_attribute("value", Attribute::optional_string()),
        )
        .with_function(
            NOOP_FUNCTION,
            FunctionDecl::new(AttributeType::Dynamic)
                .with_parameter(
                    FunctionParam::new(NOOP_FUNCTION, AttributeType::Dynamic)
                        .allow_null()
                        .allow_unknown()
                        .with_description("any value"),
                )
                .with_description("noop takes any single argument and returns the same value"),
        )
        .with_capabilities(ServerCapabilities {
            plan_destroy: true,
            get_provider_schema_optional: true,
            move_resource_state: false,
        })
}

/// Whether `id` holds a usable value (present, non-null and known).
fn has_id(attrs: &std::collections::BTreeMap<String, Value>) -> bool {
    attrs
        .get("id")
        .is_some_and(|id| !id.is_null() && id.is_known())
}

#[async_trait::async_trait]
impl ProviderService for SimpleProvider {
    fn schema(&self) -> &ProviderSchema {
        &self.schema
    }

    #[instrument(skip(self, _config), name = "provider.configure")]
    async fn configure(&self, _config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        debug!("Configure called");
        Ok(vec![])
    }

    #[instrument(skip(self, request), fields(type_name = %request.type_name), name = "provider.upgrade_resource_state")]
    async fn upgrade_resource_state(
        &self,
        request: UpgradeResourceStateRequest,
    ) -> Result<UpgradeResourceStateResponse, ProviderError> {
        debug!(version = request.version, "UpgradeResourceState called");
        let schema = self
            .schema
            .resources
            .get(&request.type_name)
            .ok_or_else(|| ProviderError::UnknownResource(request.type_name.clone()))?;

        // Only one schema version has ever existed: decoding is the upgrade.
        match Value::decode_json(&request.raw_state_json, &schema.block.implied_type()) {
            Ok(upgraded_state) => Ok(UpgradeResourceStateResponse {
                upgraded_state,
                diagnostics: vec![],
            }),
            Err(e) => {
                warn!(error = %e, "UpgradeResourceState could not decode state");
                Ok(UpgradeResourceStateResponse {
                    upgraded_state: Value::Null,
                    diagnostics: vec![Diagnostic::error("Failed to decode resource state")
                        .with_detail(e.to_string())],
                })
            },
        }
    }

    #[instrument(skip(self, request), fields(type_name = %request.type_name), name = "provider.upgrade_resource_identity")]
    async fn upgrade_resource_identity(
        &self,
        request: UpgradeResourceIdentityRequest,
    ) -> Result<UpgradeResourceIdentityResponse, ProviderError> {
        debug!(version = request.version, "UpgradeResourceIdentity called");
        let identity = self
            .schema
            .resources
            .get(&request.type_name)
            .and_then(|schema| schema.identity.as_ref())
            .ok_or_else(|| ProviderError::UnknownResource(request.type_name.clone()))?;

        match Value::decode_json(&request.raw_identity_json, &identity.implied_type()) {
            Ok(upgraded_identity) => Ok(UpgradeResourceIdentityResponse {
                upgraded_identity,
                diagnostics: vec![],
            }),
            Err(e) => {
                warn!(error = %e, "UpgradeResourceIdentity could not decode identity");
                Ok(UpgradeResourceIdentityResponse {
                    upgraded_identity: Value::Null,
                    diagnostics: vec![Diagnostic::error("Failed to decode resource identity")
                        .with_detail(e.to_string())],
                })
            },
        }
    }

    #[instrument(skip(self, request), fields(type_name = %request.type_name), name = "provider.read_resource")]
    async fn read_resource(
        &self,
        request: ReadResourceRequest,
    ) -> Result<ReadResourceResponse, ProviderError> {
        debug!("ReadResource called");
        // Nothing remote can drift, so the recorded state is the current state.
        Ok(ReadResourceResponse {
            new_state: request.prior_state,
            private: request.private,
            identity: request.current_identity,
            diagnostics: vec![],
        })
    }

    #[instrument(skip(self, request), fields(type_name = %request.type_name), name = "provider.plan_resource_change")]
    async fn plan_resource_change(
        &self,
        request: PlanResourceChangeRequest,
    ) -> Result<PlanResourceChangeResponse, ProviderError> {
        if request.proposed_new_state.is_null() {
            debug!("PlanResourceChange planning destroy");
            // Apply checks for this marker to confirm the destroy was
            // planned rather than inferred.
            return Ok(PlanResourceChangeResponse {
                planned_state: request.proposed_new_state,
                planned_private: PrivateData::DestroyPlanned,
                planned_identity: request.prior_identity,
                ..Default::default()
            });
        }

        let mut attrs = request.proposed_new_state.into_attributes();
        if !attrs.get("id").is_some_and(|id| !id.is_null()) {
            attrs.insert("id".to_string(), Value::Unknown);
        }
        debug!(attributes = attrs.len(), "PlanResourceChange planning create/update");

        Ok(PlanResourceChangeResponse {
            planned_state: Value::Object(attrs),
            planned_identity: request.prior_identity,
            ..Default::default()
        })
    }

    #[instrument(skip(self, request), fields(type_name = %request.type_name), name = "provider.apply_resource_change")]
    async fn apply_resource_change(
        &self,
        request: ApplyResourceChangeRequest,
    ) -> Result<ApplyResourceChangeResponse, ProviderError> {
        if request.planned_state.is_null() {
            let mut diagnostics = vec![];
            if request.planned_private != PrivateData::DestroyPlanned {
                warn!(private = %request.planned_private, "ApplyResourceChange destroy was not planned");
                diagnostics.push(Diagnostic::error(format!(
                    "resource not planned for destroy, private data {}",
                    request.planned_private
                )));
            }
            info!("ApplyResourceChange destroyed resource");
            return Ok(ApplyResourceChangeResponse {
                new_state: request.planned_state,
                new_identity: request.planned_identity,
                diagnostics,
                ..Default::default()
            });
        }

        let mut attrs = request.planned_state.into_attributes();
        if !has_id(&attrs) {
            attrs.insert("id".to_string(), Value::String(Utc::now().to_string()));
        }
        let id = attrs.get("id").cloned().unwrap_or_default();

        let new_identity = if request.planned_identity.is_wholly_known()
            && !request.planned_identity.is_null()
        {
            request.planned_identity
        } else {
            Value::object([("id", id)])
        };
        info!("ApplyResourceChange applied resource");

        Ok(ApplyResourceChangeResponse {
            new_state: Value::Object(attrs),
            new_identity,
            ..Default::default()
        })
    }

    #[instrument(skip(self, request), fields(type_name = %request.type_name), name = "provider.import_resource_state")]
    async fn import_resource_state(
        &self,
        request: ImportResourceStateRequest,
    ) -> Result<ImportResourceStateResponse, ProviderError> {
        warn!(id = %request.id, "ImportResourceState is not supported");
        Err(ProviderError::unsupported())
    }

    #[instrument(skip(self, request), fields(source = %request.source_type_name, target = %request.target_type_name), name = "provider.move_resource_state")]
    async fn move_resource_state(
        &self,
        request: MoveResourceStateRequest,
    ) -> Result<MoveResourceStateResponse, ProviderError> {
        // move_resource_state is not advertised; reaching this is an engine bug.
        warn!(schema_version = request.source_schema_version, "MoveResourceState is not supported");
        Err(ProviderError::unsupported())
    }

    #[instrument(skip(self, request), fields(type_name = %request.type_name), name = "provider.read_data_source")]
    async fn read_data_source(
        &self,
        request: ReadDataSourceRequest,
    ) -> Result<ReadDataSourceResponse, ProviderError> {
        debug!("ReadDataSource called");
        let mut attrs = request.config.into_attributes();
        attrs.insert("id".to_string(), Value::string(STATIC_ID));

        Ok(ReadDataSourceResponse {
            state: Value::Object(attrs),
            diagnostics: vec![],
        })
    }

    #[instrument(skip(self, request), fields(type_name = %request.type_name), name = "provider.open_ephemeral_resource")]
    async fn open_ephemeral_resource(
        &self,
        request: OpenEphemeralResourceRequest,
    ) -> Result<OpenEphemeralResourceResponse, ProviderError> {
        let mut attrs = request.config.into_attributes();
        attrs.insert("id".to_string(), Value::string(EPHEMERAL_SECRET));
        let renew_at = self.renew_at();
        info!(renew_at = ?renew_at, "OpenEphemeralResource opened session");

        Ok(OpenEphemeralResourceResponse {
            result: Value::Object(attrs),
            private: PrivateData::EphemeralSession,
            renew_at,
            diagnostics: vec![],
        })
    }

    #[instrument(skip(self, request), fields(type_name = %request.type_name), name = "provider.renew_ephemeral_resource")]
    async fn renew_ephemeral_resource(
        &self,
        request: RenewEphemeralResourceRequest,
    ) -> Result<RenewEphemeralResourceResponse, ProviderError> {
        debug!("renewing ephemeral resource");
        let mut diagnostics = vec![];
        if request.private != PrivateData::EphemeralSession {
            warn!(private = %request.private, "RenewEphemeralResource got an invalid token");
            diagnostics.push(Diagnostic::error(format!(
                "invalid private data {}, cannot renew ephemeral resource",
                request.private
            )));
        }

        Ok(RenewEphemeralResourceResponse {
            private: request.private,
            renew_at: self.renew_at(),
            diagnostics,
        })
    }

    #[instrument(skip(self, request), fields(type_name = %request.type_name), name = "provider.close_ephemeral_resource")]
    async fn close_ephemeral_resource(
        &self,
        request: CloseEphemeralResourceRequest,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        debug!("closing ephemeral resource");
        let mut diagnostics = vec![];
        if request.private != PrivateData::EphemeralSession {
            warn!(private = %request.private, "CloseEphemeralResource got an invalid token");
            diagnostics.push(Diagnostic::error(format!(
                "invalid private data {}, cannot close ephemeral resource",
                request.private
            )));
        }
        info!("CloseEphemeralResource closed session");
        Ok(diagnostics)
    }

    #[instrument(skip(self, request), fields(function = %request.function_name), name = "provider.call_function")]
    async fn call_function(&self, request: CallFunctionRequest) -> Result<Value, ProviderError> {
        if request.function_name != NOOP_FUNCTION {
            warn!("CallFunction for undefined function");
            return Err(ProviderError::UndefinedFunction(request.function_name));
        }

        let mut arguments = request.arguments.into_iter();
        match (arguments.next(), arguments.next()) {
            (Some(argument), None) => Ok(argument),
            (None, _) => Err(ProviderError::InvalidArguments(
                "noop takes exactly one argument, got none".to_string(),
            )),
            (Some(_), Some(_)) => Err(ProviderError::InvalidArguments(format!(
                "noop takes exactly one argument, got {}",
                2 + arguments.count()
            ))),
        }
    }

    #[instrument(skip(self, request), fields(type_name = %request.type_name), name = "provider.list_resource")]
    async fn list_resource(
        &self,
        request: ListResourceRequest,
    ) -> Result<ListResourceResponse, ProviderError> {
        debug!(
            include_resource_object = request.include_resource_object,
            "ListResource called"
        );
        let value = match request.config.get("value") {
            Some(value) if !value.is_null() => value.clone(),
            _ => Value::string(STATIC_VALUE),
        };

        let mut entry = vec![
            ("display_name", Value::string(STATIC_DISPLAY_NAME)),
            ("identity", Value::object([("id", Value::string(STATIC_ID))])),
        ];
        if request.include_resource_object {
            entry.push((
                "state",
                Value::object([("id", Value::string(STATIC_ID)), ("value", value)]),
            ));
        }

        Ok(ListResourceResponse {
            result: Value::object([
                ("data", Value::List(vec![Value::object(entry)])),
                ("config", request.config),
            ]),
            diagnostics: vec![],
        })
    }
}
