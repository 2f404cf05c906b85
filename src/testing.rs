//! Testing utilities for provider implementations.
//!
//! [`ProviderTester`] drives a [`ProviderService`] through whole resource
//! lifecycles the way an engine would, threading planned private data and
//! identities from one call to the next, without any RPC layer.
//!
//! # Example
//!
//! ```ignore
//! use hemmer_simple_provider::testing::ProviderTester;
//! use hemmer_simple_provider::{SimpleProvider, Value};
//!
//! #[tokio::test]
//! async fn test_create_resource() {
//!     let tester = ProviderTester::new(SimpleProvider::new());
//!     tester.configure(Value::Null).await.unwrap();
//!
//!     let created = tester
//!         .lifecycle_create("simple_resource", Value::object([("value", Value::string("x"))]))
//!         .await
//!         .unwrap();
//!     assert!(created.state.get("id").is_some());
//! }
//! ```

use thiserror::Error;

use crate::error::ProviderError;
use crate::schema::{Diagnostic, ProviderSchema};
use crate::server::ProviderService;
use crate::types::{
    ApplyResourceChangeRequest, ApplyResourceChangeResponse, CallFunctionRequest,
    CloseEphemeralResourceRequest, ListResourceRequest, OpenEphemeralResourceRequest,
    OpenEphemeralResourceResponse, PlanResourceChangeRequest, PlanResourceChangeResponse,
    PrivateData, ReadDataSourceRequest, ReadResourceRequest, RenewEphemeralResourceRequest,
    UpgradeResourceStateRequest,
};
use crate::value::Value;

/// What an engine records about a managed resource between operations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ManagedResource {
    /// Current state.
    pub state: Value,
    /// Private data the provider asked to keep.
    pub private: PrivateData,
    /// Current identity.
    pub identity: Value,
}

/// A test harness for provider implementations.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Create a new tester for the given provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Get a reference to the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    // =========================================================================
    // Schema & Provider Lifecycle
    // =========================================================================

    /// Get the provider's schema.
    pub fn schema(&self) -> &ProviderSchema {
        self.provider.schema()
    }

    /// Get the list of managed resource type names.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    /// Validate provider configuration, failing on error diagnostics.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.validate_provider_config(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Configure the provider, failing on error diagnostics.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Stop the provider.
    pub async fn stop(&self) -> Result<(), ProviderError> {
        self.provider.stop().await
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Upgrade raw stored state at the current schema version.
    pub async fn upgrade_resource_state(
        &self,
        type_name: &str,
        raw_state_json: &[u8],
    ) -> Result<Value, TestError> {
        let version = self
            .schema()
            .resources
            .get(type_name)
            .map(|schema| schema.version)
            .unwrap_or_default();
        let response = self
            .provider
            .upgrade_resource_state(UpgradeResourceStateRequest {
                type_name: type_name.to_string(),
                version,
                raw_state_json: raw_state_json.to_vec(),
            })
            .await?;
        check_diagnostics(response.diagnostics)?;
        Ok(response.upgraded_state)
    }

    /// Refresh a managed resource.
    pub async fn read(
        &self,
        type_name: &str,
        resource: ManagedResource,
    ) -> Result<ManagedResource, TestError> {
        let response = self
            .provider
            .read_resource(ReadResourceRequest {
                type_name: type_name.to_string(),
                prior_state: resource.state,
                private: resource.private,
                current_identity: resource.identity,
            })
            .await?;
        check_diagnostics(response.diagnostics)?;
        Ok(ManagedResource {
            state: response.new_state,
            private: response.private,
            identity: response.identity,
        })
    }

    /// Plan a resource creation (no prior state).
    pub async fn plan_create(
        &self,
        type_name: &str,
        config: Value,
    ) -> Result<PlanResourceChangeResponse, TestError> {
        self.plan(type_name, &ManagedResource::default(), config).await
    }

    /// Plan an update of an existing resource to `config`.
    ///
    /// Attributes the configuration leaves out are carried over from the
    /// prior state, as an engine does for computed attributes.
    pub async fn plan_update(
        &self,
        type_name: &str,
        prior: &ManagedResource,
        config: Value,
    ) -> Result<PlanResourceChangeResponse, TestError> {
        self.plan(type_name, prior, config).await
    }

    /// Plan the destruction of an existing resource.
    pub async fn plan_destroy(
        &self,
        type_name: &str,
        prior: &ManagedResource,
    ) -> Result<PlanResourceChangeResponse, TestError> {
        self.plan(type_name, prior, Value::Null).await
    }

    async fn plan(
        &self,
        type_name: &str,
        prior: &ManagedResource,
        config: Value,
    ) -> Result<PlanResourceChangeResponse, TestError> {
        let proposed_new_state = if config.is_null() {
            Value::Null
        } else {
            let mut attrs = prior.state.clone().into_attributes();
            attrs.extend(config.clone().into_attributes());
            Value::Object(attrs)
        };
        let response = self
            .provider
            .plan_resource_change(PlanResourceChangeRequest {
                type_name: type_name.to_string(),
                prior_state: prior.state.clone(),
                proposed_new_state,
                config,
                prior_private: prior.private.clone(),
                prior_identity: prior.identity.clone(),
            })
            .await?;
        check_diagnostics(response.diagnostics.clone())?;
        Ok(response)
    }

    /// Apply a plan to a prior resource.
    ///
    /// Diagnostics are returned rather than checked, so callers can inspect
    /// contract violations the provider reports while still completing.
    pub async fn apply(
        &self,
        type_name: &str,
        prior: &ManagedResource,
        plan: PlanResourceChangeResponse,
        config: Value,
    ) -> Result<ApplyResourceChangeResponse, TestError> {
        let response = self
            .provider
            .apply_resource_change(ApplyResourceChangeRequest {
                type_name: type_name.to_string(),
                prior_state: prior.state.clone(),
                planned_state: plan.planned_state,
                config,
                planned_private: plan.planned_private,
                planned_identity: plan.planned_identity,
            })
            .await?;
        Ok(response)
    }

    // =========================================================================
    // Lifecycle Helpers
    // =========================================================================

    /// Run a full create lifecycle: plan → apply → read.
    pub async fn lifecycle_create(
        &self,
        type_name: &str,
        config: Value,
    ) -> Result<ManagedResource, TestError> {
        let prior = ManagedResource::default();
        let plan = self.plan_create(type_name, config.clone()).await?;
        let applied = self.apply(type_name, &prior, plan, config).await?;
        self.finish_apply(type_name, applied).await
    }

    /// Run a full update lifecycle: plan → apply → read.
    pub async fn lifecycle_update(
        &self,
        type_name: &str,
        prior: &ManagedResource,
        config: Value,
    ) -> Result<ManagedResource, TestError> {
        let plan = self.plan_update(type_name, prior, config.clone()).await?;
        let applied = self.apply(type_name, prior, plan, config).await?;
        self.finish_apply(type_name, applied).await
    }

    /// Run a full destroy lifecycle: plan → apply.
    pub async fn lifecycle_destroy(
        &self,
        type_name: &str,
        prior: &ManagedResource,
    ) -> Result<(), TestError> {
        let plan = self.plan_destroy(type_name, prior).await?;
        let applied = self.apply(type_name, prior, plan, Value::Null).await?;
        check_diagnostics(applied.diagnostics)
    }

    async fn finish_apply(
        &self,
        type_name: &str,
        applied: ApplyResourceChangeResponse,
    ) -> Result<ManagedResource, TestError> {
        check_diagnostics(applied.diagnostics)?;
        self.read(
            type_name,
            ManagedResource {
                state: applied.new_state,
                private: applied.private,
                identity: applied.new_identity,
            },
        )
        .await
    }

    // =========================================================================
    // Data Sources, Ephemeral Resources, Functions, Lists
    // =========================================================================

    /// Read a data source.
    pub async fn read_data_source(&self, type_name: &str, config: Value) -> Result<Value, TestError> {
        let response = self
            .provider
            .read_data_source(ReadDataSourceRequest {
                type_name: type_name.to_string(),
                config,
            })
            .await?;
        check_diagnostics(response.diagnostics)?;
        Ok(response.state)
    }

    /// Run a full ephemeral lifecycle: open → renew → close.
    ///
    /// Returns the opened response; every step must be free of errors.
    pub async fn ephemeral_lifecycle(
        &self,
        type_name: &str,
        config: Value,
    ) -> Result<OpenEphemeralResourceResponse, TestError> {
        let opened = self
            .provider
            .open_ephemeral_resource(OpenEphemeralResourceRequest {
                type_name: type_name.to_string(),
                config,
            })
            .await?;
        check_diagnostics(opened.diagnostics.clone())?;

        let renewed = self
            .provider
            .renew_ephemeral_resource(RenewEphemeralResourceRequest {
                type_name: type_name.to_string(),
                private: opened.private.clone(),
            })
            .await?;
        check_diagnostics(renewed.diagnostics)?;

        let closed = self
            .provider
            .close_ephemeral_resource(CloseEphemeralResourceRequest {
                type_name: type_name.to_string(),
                private: renewed.private,
            })
            .await?;
        check_diagnostics(closed)?;
        Ok(opened)
    }

    /// Call a provider function.
    pub async fn call_function(
        &self,
        function_name: &str,
        arguments: Vec<Value>,
    ) -> Result<Value, ProviderError> {
        self.provider
            .call_function(CallFunctionRequest {
                function_name: function_name.to_string(),
                arguments,
            })
            .await
    }

    /// List instances of a resource type, including their state.
    pub async fn list_resource(&self, type_name: &str, config: Value) -> Result<Value, TestError> {
        let response = self
            .provider
            .list_resource(ListResourceRequest {
                type_name: type_name.to_string(),
                config,
                include_resource_object: true,
                limit: u64::MAX,
            })
            .await?;
        check_diagnostics(response.diagnostics)?;
        Ok(response.result)
    }
}

/// Error type for test operations that may fail with diagnostics.
#[derive(Debug, Error)]
pub enum TestError {
    /// The operation failed with diagnostics.
    #[error("{}", format_diagnostics(.0))]
    Diagnostics(Vec<Diagnostic>),
    /// The operation failed with a provider error.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl TestError {
    /// The failure as diagnostics, with a provider error rendered as one
    /// error diagnostic.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            TestError::Diagnostics(diags) => diags.clone(),
            TestError::Provider(err) => vec![err.to_diagnostic()],
        }
    }
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    let mut out = format!("Operation failed with {} diagnostic(s):", diagnostics.len());
    for diag in diagnostics {
        out.push_str(&format!("\n  [{:?}] {}", diag.severity, diag.summary));
        if let Some(detail) = &diag.detail {
            out.push_str(&format!(": {}", detail));
        }
        if let Some(attr) = &diag.attribute {
            out.push_str(&format!(" (at {})", attr));
        }
    }
    out
}

/// Keep only error diagnostics; fail if there are any.
fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

// =========================================================================
// Assertion Helpers
// =========================================================================

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics.iter().filter(|d| d.is_error()).collect();

    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain at least one error.
///
/// # Panics
///
/// Panics if there are no error diagnostics.
pub fn assert_has_errors(diagnostics: &[Diagnostic]) {
    assert!(
        crate::schema::has_errors(diagnostics),
        "Expected at least one error, but got none"
    );
}

/// Assert that diagnostics contain an error whose summary contains `substring`.
///
/// # Panics
///
/// Panics if no error diagnostic matches.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let errors: Vec<_> = diagnostics.iter().filter(|d| d.is_error()).collect();

    assert!(
        errors.iter().any(|d| d.summary.contains(substring)),
        "Expected an error containing '{}', but no matching error found. Errors: {:?}",
        substring,
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}
