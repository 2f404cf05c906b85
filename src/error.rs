//! Error types for provider operations.
//!
//! Recoverable problems are returned as [`Diagnostic`]s inside a response.
//! A [`ProviderError`] means the operation produced no usable result at all.

use thiserror::Error;

use crate::schema::Diagnostic;

/// Errors that can occur when a provider handles a request.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The operation is not supported by this provider.
    #[error("{0}")]
    Unsupported(String),

    /// A function that the provider does not declare was called.
    #[error("CallFunction for undefined function {0:?}")]
    UndefinedFunction(String),

    /// A function was called with arguments that do not match its declaration.
    #[error("Invalid function arguments: {0}")]
    InvalidArguments(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A call arrived for a capability the provider never advertised.
    ///
    /// This is a protocol-dispatch defect in the calling engine, not
    /// something a user can correct. It must not be retried.
    #[error("Unreachable call: {0}")]
    Unreachable(String),
}

impl ProviderError {
    /// Create a [`ProviderError::Unsupported`] error with the standard message.
    pub fn unsupported() -> Self {
        Self::Unsupported("unsupported".to_string())
    }

    /// Whether this error signals a contract violation by the caller.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }

    /// Render this error as an error diagnostic for a response.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.to_string())
    }
}

impl From<ProviderError> for tonic::Status {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Unsupported(msg) => tonic::Status::unimplemented(msg),
            err @ ProviderError::UndefinedFunction(_) => tonic::Status::not_found(err.to_string()),
            ProviderError::InvalidArguments(msg) => tonic::Status::invalid_argument(msg),
            ProviderError::UnknownResource(msg) => tonic::Status::not_found(msg),
            ProviderError::Unreachable(msg) => tonic::Status::internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DiagnosticSeverity;

    #[test]
    fn test_error_display() {
        assert_eq!(ProviderError::unsupported().to_string(), "unsupported");

        let err = ProviderError::UndefinedFunction("nope".to_string());
        assert_eq!(err.to_string(), "CallFunction for undefined function \"nope\"");

        let err = ProviderError::UnknownResource("custom_resource".to_string());
        assert_eq!(err.to_string(), "Unknown resource type: custom_resource");

        let err = ProviderError::Unreachable("PlanAction".to_string());
        assert_eq!(err.to_string(), "Unreachable call: PlanAction");
    }

    #[test]
    fn test_only_unreachable_is_fatal() {
        assert!(ProviderError::Unreachable("GetStates".to_string()).is_fatal());
        assert!(!ProviderError::unsupported().is_fatal());
        assert!(!ProviderError::UndefinedFunction("f".to_string()).is_fatal());
    }

    #[test]
    fn test_error_to_status() {
        let status: tonic::Status = ProviderError::unsupported().into();
        assert_eq!(status.code(), tonic::Code::Unimplemented);
        assert_eq!(status.message(), "unsupported");

        let status: tonic::Status = ProviderError::Unreachable("DeleteState".to_string()).into();
        assert_eq!(status.code(), tonic::Code::Internal);

        let status: tonic::Status = ProviderError::UndefinedFunction("f".to_string()).into();
        assert_eq!(status.code(), tonic::Code::NotFound);
        assert!(status.message().contains("\"f\""));

        let status: tonic::Status = ProviderError::InvalidArguments("arity".to_string()).into();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }

    #[test]
    fn test_error_to_diagnostic() {
        let diag = ProviderError::unsupported().to_diagnostic();
        assert_eq!(diag.severity, DiagnosticSeverity::Error);
        assert_eq!(diag.summary, "unsupported");
    }
}
