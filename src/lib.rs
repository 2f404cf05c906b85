//! Hemmer Simple Provider
//!
//! A minimal provider that implements every lifecycle operation of the
//! provider plugin protocol against a single toy resource type,
//! `simple_resource`. It touches no remote system, which makes it a
//! conformance fixture: an engine can drive it through plan, apply, read,
//! destroy, data source reads, ephemeral sessions, function calls and list
//! queries, and check that it honours the protocol's contracts.
//!
//! # Overview
//!
//! - **[`Value`]**: the structured value model, including unknown values
//! - **Schema types**: schemas for resources, identities and functions
//! - **[`ProviderService`]**: the trait covering every protocol operation
//! - **[`SimpleProvider`]**: the provider itself
//! - **Error types**: [`ProviderError`], convertible into a `tonic::Status`
//! - **Logging**: `tracing` set-up writing to stderr
//! - **[`testing`]**: a harness that runs whole lifecycles in tests
//!
//! # Quick Start
//!
//! ```ignore
//! use hemmer_simple_provider::{
//!     init_logging, PlanResourceChangeRequest, ProviderService, SimpleProvider, Value,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging();
//!     let provider = SimpleProvider::new();
//!
//!     let plan = provider
//!         .plan_resource_change(PlanResourceChangeRequest {
//!             type_name: "simple_resource".to_string(),
//!             proposed_new_state: Value::object([("value", Value::string("x"))]),
//!             ..Default::default()
//!         })
//!         .await?;
//!     assert!(!plan.planned_state.is_wholly_known());
//!     Ok(())
//! }
//! ```
//!
//! # Private data contract
//!
//! A destroy plan carries `destroy planned` as private data, and an opened
//! ephemeral resource carries `private data`. Apply, renew and close report
//! an error diagnostic when handed anything else.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod hooks;
pub mod logging;
pub mod provider;
pub mod schema;
pub mod server;
pub mod testing;
pub mod types;
pub mod value;

// Re-export main types at crate root
pub use error::ProviderError;
pub use hooks::ProvisionerStatus;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::{ProviderOptions, SimpleProvider};
pub use schema::{Diagnostic, ProviderSchema};
pub use server::ProviderService;
pub use types::*;
pub use value::Value;

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tonic;
pub use tracing;
