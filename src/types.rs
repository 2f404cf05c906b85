//! Request and response types of the provider protocol.
//!
//! Every lifecycle operation of [`ProviderService`](crate::ProviderService)
//! takes one of the request types below and answers with the matching
//! response. Responses carry recoverable [`Diagnostic`]s next to whatever
//! result could still be produced; unrecoverable failures are reported through
//! [`ProviderError`](crate::ProviderError) instead.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::{Diagnostic, IdentitySchema};
use crate::value::Value;

/// Raw marker a plan attaches when it plans a destroy.
pub const DESTROY_PLANNED_MARKER: &[u8] = b"destroy planned";

/// Raw token an ephemeral resource session is opened with.
pub const EPHEMERAL_SESSION_TOKEN: &[u8] = b"private data";

/// Opaque provider-private data carried from one call to a later one.
///
/// The engine only stores and returns these bytes; the typed variants exist
/// so the provider never compares raw byte strings. Conversion to and from
/// bytes is lossless, and equality compares the bytes, so a payload built
/// as [`PrivateData::Other`] still equals the variant it encodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<u8>", into = "Vec<u8>")]
pub enum PrivateData {
    /// No private data.
    #[default]
    Empty,
    /// The change was planned as a destroy.
    DestroyPlanned,
    /// Session token of an open ephemeral resource.
    EphemeralSession,
    /// Any other payload.
    Other(Vec<u8>),
}

impl PrivateData {
    /// Decode private data received from the engine.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        if bytes.is_empty() {
            Self::Empty
        } else if bytes == DESTROY_PLANNED_MARKER {
            Self::DestroyPlanned
        } else if bytes == EPHEMERAL_SESSION_TOKEN {
            Self::EphemeralSession
        } else {
            Self::Other(bytes)
        }
    }

    /// The raw bytes sent to the engine.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Empty => &[],
            Self::DestroyPlanned => DESTROY_PLANNED_MARKER,
            Self::EphemeralSession => EPHEMERAL_SESSION_TOKEN,
            Self::Other(bytes) => bytes,
        }
    }
}

impl PartialEq for PrivateData {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for PrivateData {}

impl From<Vec<u8>> for PrivateData {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<&[u8]> for PrivateData {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<PrivateData> for Vec<u8> {
    fn from(private: PrivateData) -> Self {
        match private {
            PrivateData::Other(bytes) => bytes,
            other => other.as_bytes().to_vec(),
        }
    }
}

/// Renders the payload as a quoted string.
impl fmt::Display for PrivateData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.as_bytes()))
    }
}

/// Server capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServerCapabilities {
    /// Whether the provider supports planning destroy operations.
    pub plan_destroy: bool,
    /// Whether the engine may skip fetching the schema on every start.
    pub get_provider_schema_optional: bool,
    /// Whether the provider can move state between resource types.
    pub move_resource_state: bool,
}

/// Provider metadata returned by GetMetadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// Resource type names.
    pub resources: Vec<String>,
    /// Data source type names.
    pub data_sources: Vec<String>,
    /// Ephemeral resource type names.
    pub ephemeral_resources: Vec<String>,
    /// List resource type names.
    pub list_resources: Vec<String>,
    /// Function names.
    pub functions: Vec<String>,
    /// Server capabilities.
    pub capabilities: ServerCapabilities,
}

/// Identity schemas keyed by resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResourceIdentitySchemas {
    /// Identity schema of every resource type that declares one.
    pub identity_types: BTreeMap<String, IdentitySchema>,
}

/// Request to upgrade stored resource state to the current schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpgradeResourceStateRequest {
    /// The resource type.
    pub type_name: String,
    /// Schema version the state was written with.
    pub version: u64,
    /// The stored state as JSON.
    pub raw_state_json: Vec<u8>,
}

/// Upgraded resource state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpgradeResourceStateResponse {
    /// State decoded against the current schema.
    pub upgraded_state: Value,
    /// Diagnostics, including decode failures.
    pub diagnostics: Vec<Diagnostic>,
}

/// Request to upgrade a stored resource identity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpgradeResourceIdentityRequest {
    /// The resource type.
    pub type_name: String,
    /// Identity schema version the identity was written with.
    pub version: u64,
    /// The stored identity as JSON.
    pub raw_identity_json: Vec<u8>,
}

/// Upgraded resource identity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpgradeResourceIdentityResponse {
    /// Identity decoded against the current identity schema.
    pub upgraded_identity: Value,
    /// Diagnostics, including decode failures.
    pub diagnostics: Vec<Diagnostic>,
}

/// Request to refresh a resource.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReadResourceRequest {
    /// The resource type.
    pub type_name: String,
    /// State recorded by the last apply or read.
    pub prior_state: Value,
    /// Private data recorded with the state.
    pub private: PrivateData,
    /// Identity recorded with the state.
    pub current_identity: Value,
}

/// Refreshed resource.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReadResourceResponse {
    /// The current state.
    pub new_state: Value,
    /// Private data to store with the state.
    pub private: PrivateData,
    /// The current identity.
    pub identity: Value,
    /// Diagnostics.
    pub diagnostics: Vec<Diagnostic>,
}

/// Request to plan a change to a resource.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlanResourceChangeRequest {
    /// The resource type.
    pub type_name: String,
    /// The current state, null when creating.
    pub prior_state: Value,
    /// The state the configuration asks for, null when destroying.
    pub proposed_new_state: Value,
    /// The resource configuration.
    pub config: Value,
    /// Private data recorded with the prior state.
    pub prior_private: PrivateData,
    /// Identity recorded with the prior state.
    pub prior_identity: Value,
}

/// A planned change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlanResourceChangeResponse {
    /// The state apply is expected to produce.
    pub planned_state: Value,
    /// Attribute paths whose change forces replacement.
    pub requires_replace: Vec<String>,
    /// Private data handed back to apply.
    pub planned_private: PrivateData,
    /// The identity apply is expected to produce.
    pub planned_identity: Value,
    /// Diagnostics.
    pub diagnostics: Vec<Diagnostic>,
}

/// Request to apply a planned change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApplyResourceChangeRequest {
    /// The resource type.
    pub type_name: String,
    /// The current state, null when creating.
    pub prior_state: Value,
    /// The planned state, null when destroying.
    pub planned_state: Value,
    /// The resource configuration.
    pub config: Value,
    /// Private data the plan produced.
    pub planned_private: PrivateData,
    /// The planned identity.
    pub planned_identity: Value,
}

/// Result of an applied change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApplyResourceChangeResponse {
    /// The state after apply.
    pub new_state: Value,
    /// Private data to store with the state.
    pub private: PrivateData,
    /// The identity after apply.
    pub new_identity: Value,
    /// Diagnostics.
    pub diagnostics: Vec<Diagnostic>,
}

/// Request to import existing infrastructure.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportResourceStateRequest {
    /// The resource type.
    pub type_name: String,
    /// Import ID given by the user.
    pub id: String,
    /// Identity given by the user, if importing by identity.
    pub identity: Value,
}

/// An imported resource.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportedResource {
    /// The resource type.
    pub type_name: String,
    /// The imported state.
    pub state: Value,
    /// Private data to store with the state.
    pub private: PrivateData,
    /// The imported identity.
    pub identity: Value,
}

/// Result of an import.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportResourceStateResponse {
    /// The imported resources.
    pub imported_resources: Vec<ImportedResource>,
    /// Diagnostics.
    pub diagnostics: Vec<Diagnostic>,
}

/// Request to move state from one resource type to another.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MoveResourceStateRequest {
    /// Provider address of the source resource.
    pub source_provider_address: String,
    /// Source resource type.
    pub source_type_name: String,
    /// Source schema version.
    pub source_schema_version: u64,
    /// Source state as JSON.
    pub source_state_json: Vec<u8>,
    /// Source private data.
    pub source_private: PrivateData,
    /// Target resource type.
    pub target_type_name: String,
}

/// Result of a state move.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MoveResourceStateResponse {
    /// State for the target resource type.
    pub target_state: Value,
    /// Private data for the target resource.
    pub target_private: PrivateData,
    /// Identity for the target resource.
    pub target_identity: Value,
    /// Diagnostics.
    pub diagnostics: Vec<Diagnostic>,
}

/// Request to read a data source.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReadDataSourceRequest {
    /// The data source type.
    pub type_name: String,
    /// The data source configuration.
    pub config: Value,
}

/// Data source result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReadDataSourceResponse {
    /// The data source state.
    pub state: Value,
    /// Diagnostics.
    pub diagnostics: Vec<Diagnostic>,
}

/// Request to open an ephemeral resource.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OpenEphemeralResourceRequest {
    /// The ephemeral resource type.
    pub type_name: String,
    /// The ephemeral resource configuration.
    pub config: Value,
}

/// An opened ephemeral resource.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OpenEphemeralResourceResponse {
    /// The ephemeral value.
    pub result: Value,
    /// Session token expected back on renew and close.
    pub private: PrivateData,
    /// When the engine should renew, if renewal is needed.
    pub renew_at: Option<DateTime<Utc>>,
    /// Diagnostics.
    pub diagnostics: Vec<Diagnostic>,
}

/// Request to renew an open ephemeral resource.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenewEphemeralResourceRequest {
    /// The ephemeral resource type.
    pub type_name: String,
    /// Session token returned by open or the previous renew.
    pub private: PrivateData,
}

/// A renewed ephemeral resource.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenewEphemeralResourceResponse {
    /// Session token expected on the next renew or close.
    pub private: PrivateData,
    /// When the engine should renew again.
    pub renew_at: Option<DateTime<Utc>>,
    /// Diagnostics.
    pub diagnostics: Vec<Diagnostic>,
}

/// Request to close an ephemeral resource.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CloseEphemeralResourceRequest {
    /// The ephemeral resource type.
    pub type_name: String,
    /// Session token returned by open or the last renew.
    pub private: PrivateData,
}

/// Request to call a provider function.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallFunctionRequest {
    /// The function name.
    pub function_name: String,
    /// Positional arguments.
    pub arguments: Vec<Value>,
}

/// Request to list resources of a type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListResourceRequest {
    /// The list resource type.
    pub type_name: String,
    /// The list configuration.
    pub config: Value,
    /// Whether each entry should carry the full resource state.
    pub include_resource_object: bool,
    /// Maximum number of entries the engine wants.
    pub limit: u64,
}

/// Listed resources.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListResourceResponse {
    /// `{data: [entry, ...], config: <request config>}`.
    pub result: Value,
    /// Diagnostics.
    pub diagnostics: Vec<Diagnostic>,
}
