//! Schema types for describing provider, resource and function structure.
//!
//! A [`ProviderSchema`] is built once when a provider is constructed and is
//! read-only afterwards. Besides documenting the shape of configuration and
//! state, each body and identity shape implies a concrete [`AttributeType`]
//! that raw state is decoded against during upgrades.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::ServerCapabilities;

/// The type of an attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    /// A string value.
    String,
    /// A number.
    Number,
    /// A boolean value.
    Bool,
    /// A list of values of a single type.
    List(Box<AttributeType>),
    /// A set of unique values of a single type.
    Set(Box<AttributeType>),
    /// A map from string keys to values of a single type.
    Map(Box<AttributeType>),
    /// An object with a fixed set of attributes.
    Object(BTreeMap<String, AttributeType>),
    /// A dynamic type that can hold any value.
    Dynamic,
}

impl AttributeType {
    /// Create a list type.
    pub fn list(element_type: AttributeType) -> Self {
        Self::List(Box::new(element_type))
    }

    /// Create a set type.
    pub fn set(element_type: AttributeType) -> Self {
        Self::Set(Box::new(element_type))
    }

    /// Create a map type.
    pub fn map(element_type: AttributeType) -> Self {
        Self::Map(Box::new(element_type))
    }

    /// Create an object type.
    pub fn object(attributes: impl IntoIterator<Item = (String, AttributeType)>) -> Self {
        Self::Object(attributes.into_iter().collect())
    }

    /// Short name of the type, used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Bool => "bool",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
            Self::Object(_) => "object",
            Self::Dynamic => "dynamic",
        }
    }
}

/// Describes how an attribute can be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AttributeFlags {
    /// The attribute is required in configuration.
    pub required: bool,
    /// The attribute is optional in configuration.
    pub optional: bool,
    /// The attribute is computed by the provider (read-only).
    pub computed: bool,
}

impl AttributeFlags {
    /// Create flags for a required attribute.
    pub fn required() -> Self {
        Self {
            required: true,
            ..Default::default()
        }
    }

    /// Create flags for an optional attribute.
    pub fn optional() -> Self {
        Self {
            optional: true,
            ..Default::default()
        }
    }

    /// Create flags for a computed attribute (read-only, set by provider).
    pub fn computed() -> Self {
        Self {
            computed: true,
            ..Default::default()
        }
    }
}

/// Describes a single attribute in a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// The type of the attribute.
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    /// Flags describing how the attribute can be used.
    #[serde(flatten)]
    pub flags: AttributeFlags,
}

impl Attribute {
    /// Create a new attribute with the given type and flags.
    pub fn new(attr_type: AttributeType, flags: AttributeFlags) -> Self {
        Self { attr_type, flags }
    }

    /// Create a required string attribute.
    pub fn required_string() -> Self {
        Self::new(AttributeType::String, AttributeFlags::required())
    }

    /// Create an optional string attribute.
    pub fn optional_string() -> Self {
        Self::new(AttributeType::String, AttributeFlags::optional())
    }

    /// Create a computed string attribute.
    pub fn computed_string() -> Self {
        Self::new(AttributeType::String, AttributeFlags::computed())
    }
}

/// A set of named attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Block {
    /// The attributes within this block.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Attribute>,
}

impl Block {
    /// Create a new empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute to this block.
    pub fn with_attribute(mut self, name: impl Into<String>, attr: Attribute) -> Self {
        self.attributes.insert(name.into(), attr);
        self
    }

    /// The object type a value conforming to this block has.
    pub fn implied_type(&self) -> AttributeType {
        AttributeType::Object(
            self.attributes
                .iter()
                .map(|(name, attr)| (name.clone(), attr.attr_type.clone()))
                .collect(),
        )
    }
}

/// How a nested object is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NestingMode {
    /// Exactly one object.
    #[default]
    Single,
    /// An ordered list of objects.
    List,
    /// An unordered set of objects.
    Set,
    /// Objects keyed by string.
    Map,
}

/// Schema for a resource identity.
///
/// An identity is a stable external identifier kept apart from the mutable
/// body of a resource and upgraded through its own path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySchema {
    /// The version of this identity schema.
    #[serde(default)]
    pub version: u64,
    /// The identity attributes.
    pub attributes: BTreeMap<String, Attribute>,
    /// How the identity object is nested.
    #[serde(default)]
    pub nesting: NestingMode,
}

impl IdentitySchema {
    /// Create a single-nested identity schema at version 0.
    pub fn single() -> Self {
        Self {
            version: 0,
            attributes: BTreeMap::new(),
            nesting: NestingMode::Single,
        }
    }

    /// Add an attribute to the identity.
    pub fn with_attribute(mut self, name: impl Into<String>, attr: Attribute) -> Self {
        self.attributes.insert(name.into(), attr);
        self
    }

    /// The type an identity value conforming to this schema has.
    pub fn implied_type(&self) -> AttributeType {
        let object = AttributeType::Object(
            self.attributes
                .iter()
                .map(|(name, attr)| (name.clone(), attr.attr_type.clone()))
                .collect(),
        );
        match self.nesting {
            NestingMode::Single => object,
            NestingMode::List => AttributeType::list(object),
            NestingMode::Set => AttributeType::set(object),
            NestingMode::Map => AttributeType::map(object),
        }
    }
}

/// Schema for a resource, data source, ephemeral resource or list resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Schema {
    /// The version of this schema (for state upgrades).
    #[serde(default)]
    pub version: u64,
    /// The body: all attributes of the value.
    #[serde(flatten)]
    pub block: Block,
    /// The identity shape, if the kind declares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentitySchema>,
}

impl Schema {
    /// Create a new schema with the given version.
    pub fn new(version: u64) -> Self {
        Self {
            version,
            ..Default::default()
        }
    }

    /// Create a schema at version 0.
    pub fn v0() -> Self {
        Self::new(0)
    }

    /// Add an attribute to the schema.
    pub fn with_attribute(mut self, name: impl Into<String>, attr: Attribute) -> Self {
        self.block.attributes.insert(name.into(), attr);
        self
    }

    /// Declare an identity for the schema.
    pub fn with_identity(mut self, identity: IdentitySchema) -> Self {
        self.identity = Some(identity);
        self
    }
}

/// Schema for an action. Kept so the protocol surface is complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ActionSchema {
    /// The action's configuration block.
    #[serde(flatten)]
    pub block: Block,
}

/// Markup used by a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionKind {
    /// Plain text.
    #[default]
    Plain,
}

/// A single parameter of a provider function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionParam {
    /// Parameter name.
    pub name: String,
    /// Parameter type.
    #[serde(rename = "type")]
    pub param_type: AttributeType,
    /// Whether a null argument may be passed.
    #[serde(default)]
    pub allow_null_value: bool,
    /// Whether an unknown argument may be passed.
    #[serde(default)]
    pub allow_unknown_values: bool,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Markup of the description.
    #[serde(default)]
    pub description_kind: DescriptionKind,
}

impl FunctionParam {
    /// Create a parameter that accepts neither null nor unknown values.
    pub fn new(name: impl Into<String>, param_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            param_type,
            allow_null_value: false,
            allow_unknown_values: false,
            description: String::new(),
            description_kind: DescriptionKind::Plain,
        }
    }

    /// Accept null arguments.
    pub fn allow_null(mut self) -> Self {
        self.allow_null_value = true;
        self
    }

    /// Accept unknown arguments.
    pub fn allow_unknown(mut self) -> Self {
        self.allow_unknown_values = true;
        self
    }

    /// Set a plain-text description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Declaration of a callable provider function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDecl {
    /// Positional parameters.
    pub parameters: Vec<FunctionParam>,
    /// The type of the returned value.
    pub return_type: AttributeType,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Markup of the description.
    #[serde(default)]
    pub description_kind: DescriptionKind,
}

impl FunctionDecl {
    /// Declare a function with the given return type and no parameters.
    pub fn new(return_type: AttributeType) -> Self {
        Self {
            parameters: Vec::new(),
            return_type,
            description: String::new(),
            description_kind: DescriptionKind::Plain,
        }
    }

    /// Append a positional parameter.
    pub fn with_parameter(mut self, param: FunctionParam) -> Self {
        self.parameters.push(param);
        self
    }

    /// Set a plain-text description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// The complete schema a provider advertises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderSchema {
    /// Schema for provider configuration.
    #[serde(default)]
    pub provider: Schema,
    /// Schemas for each resource type.
    #[serde(default)]
    pub resources: BTreeMap<String, Schema>,
    /// Schemas for each data source type.
    #[serde(default)]
    pub data_sources: BTreeMap<String, Schema>,
    /// Schemas for each ephemeral resource type.
    #[serde(default)]
    pub ephemeral_resources: BTreeMap<String, Schema>,
    /// Schemas for each list resource type.
    #[serde(default)]
    pub list_resources: BTreeMap<String, Schema>,
    /// Schemas for each action type.
    #[serde(default)]
    pub actions: BTreeMap<String, ActionSchema>,
    /// Declarations of callable functions.
    #[serde(default)]
    pub functions: BTreeMap<String, FunctionDecl>,
    /// Protocol capabilities of the provider.
    #[serde(default)]
    pub capabilities: ServerCapabilities,
}

impl ProviderSchema {
    /// Create a new empty provider schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the provider configuration schema.
    pub fn with_provider_config(mut self, schema: Schema) -> Self {
        self.provider = schema;
        self
    }

    /// Add a resource schema.
    pub fn with_resource(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.resources.insert(name.into(), schema);
        self
    }

    /// Add a data source schema.
    pub fn with_data_source(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.data_sources.insert(name.into(), schema);
        self
    }

    /// Add an ephemeral resource schema.
    pub fn with_ephemeral_resource(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.ephemeral_resources.insert(name.into(), schema);
        self
    }

    /// Add a list resource schema.
    pub fn with_list_resource(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.list_resources.insert(name.into(), schema);
        self
    }

    /// Declare a function.
    pub fn with_function(mut self, name: impl Into<String>, decl: FunctionDecl) -> Self {
        self.functions.insert(name.into(), decl);
        self
    }

    /// Set the server capabilities.
    pub fn with_capabilities(mut self, capabilities: ServerCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    /// An error that prevents the operation from completing.
    Error,
    /// A warning that doesn't prevent the operation but should be addressed.
    Warning,
}

/// A diagnostic message from the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity of the diagnostic.
    pub severity: DiagnosticSeverity,
    /// A short summary of the issue.
    pub summary: String,
    /// A detailed description of the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// The attribute path where the issue occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    /// Create a warning diagnostic.
    pub fn warning(summary: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    /// Add detail to this diagnostic.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Set the attribute path for this diagnostic.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Whether this diagnostic is an error.
    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

/// Whether any diagnostic in the slice is an error.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_type_constructors() {
        let list = AttributeType::list(AttributeType::String);
        assert!(matches!(list, AttributeType::List(_)));

        let map = AttributeType::map(AttributeType::Number);
        assert!(matches!(map, AttributeType::Map(_)));
        assert_eq!(map.name(), "map");
    }

    #[test]
    fn test_attribute_flags() {
        let required = AttributeFlags::required();
        assert!(required.required);
        assert!(!required.optional);
        assert!(!required.computed);

        let computed = Attribute::computed_string();
        assert!(computed.flags.computed);
        assert!(!computed.flags.optional);
    }

    #[test]
    fn test_block_implied_type() {
        let block = Block::new()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("value", Attribute::optional_string());

        assert_eq!(
            block.implied_type(),
            AttributeType::object([
                ("id".to_string(), AttributeType::String),
                ("value".to_string(), AttributeType::String),
            ])
        );
    }

    #[test]
    fn test_identity_implied_type_follows_nesting() {
        let identity = IdentitySchema::single().with_attribute("id", Attribute::required_string());
        let object = AttributeType::object([("id".to_string(), AttributeType::String)]);
        assert_eq!(identity.implied_type(), object);

        let listed = IdentitySchema {
            nesting: NestingMode::List,
            ..identity
        };
        assert_eq!(listed.implied_type(), AttributeType::list(object));
    }

    #[test]
    fn test_provider_schema_builder() {
        let schema = ProviderSchema::new()
            .with_resource(
                "example_resource",
                Schema::v0()
                    .with_attribute("id", Attribute::computed_string())
                    .with_identity(
                        IdentitySchema::single().with_attribute("id", Attribute::required_string()),
                    ),
            )
            .with_list_resource(
                "example_resource",
                Schema::v0().with_attribute("value", Attribute::optional_string()),
            )
            .with_function(
                "noop",
                FunctionDecl::new(AttributeType::Dynamic)
                    .with_parameter(FunctionParam::new("noop", AttributeType::Dynamic)),
            );

        assert!(schema.resources["example_resource"].identity.is_some());
        assert!(schema.list_resources["example_resource"].identity.is_none());
        assert_eq!(schema.functions["noop"].parameters.len(), 1);
        assert!(schema.actions.is_empty());
    }

    #[test]
    fn test_schema_serializes_flat_body() {
        let schema = Schema::v0().with_attribute("value", Attribute::optional_string());
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["attributes"]["value"]["type"], "string");
        assert_eq!(json["attributes"]["value"]["optional"], true);
        assert!(json.get("identity").is_none());
    }

    #[test]
    fn test_diagnostic() {
        let err = Diagnostic::error("Invalid configuration")
            .with_detail("The value must be positive")
            .with_attribute("count");

        assert_eq!(err.severity, DiagnosticSeverity::Error);
        assert_eq!(err.summary, "Invalid configuration");
        assert_eq!(err.detail, Some("The value must be positive".to_string()));
        assert_eq!(err.attribute, Some("count".to_string()));
        assert!(has_errors(&[Diagnostic::warning("w"), err]));
        assert!(!has_errors(&[Diagnostic::warning("w")]));
    }
}
