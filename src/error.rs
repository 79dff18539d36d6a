//! Error types for the ingress shim
//!
//! Errors carry enough context (ingress name, offending value) to be useful
//! in `kubectl describe` output and controller logs.

use thiserror::Error;

/// Main error type for ingress shim operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Kubernetes API error from a lookup or create call
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// An Ingress TLS entry cannot be turned into a Certificate
    #[error("validation error for ingress {ingress}: {message}")]
    Validation {
        /// Name of the Ingress with the invalid TLS entry
        ingress: String,
        /// Description of what's invalid
        message: String,
    },

    /// Issuer or challenge configuration is missing or invalid
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of what's misconfigured
        message: String,
    },

    /// Internal/operational error
    #[error("internal error [{context}]: {message}")]
    Internal {
        /// Description of what failed
        message: String,
        /// Context where the error occurred (e.g., "controller", "owner-ref")
        context: String,
    },
}

impl Error {
    /// Create a validation error for the given ingress
    pub fn validation(ingress: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            ingress: ingress.into(),
            message: msg.into(),
        }
    }

    /// Create a configuration error with the given message
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    /// Create an internal error with context
    pub fn internal(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// Create the 404 error a lookup reports for a missing object
    ///
    /// Cache misses use this so they classify exactly like an API server 404.
    pub fn not_found(kind: &str, name: &str) -> Self {
        Self::Kube {
            source: kube::Error::Api(kube::core::ErrorResponse {
                status: "Failure".to_string(),
                message: format!("{kind} {name:?} not found"),
                reason: "NotFound".to_string(),
                code: 404,
            }),
        }
    }

    /// Returns true if the API server answered 404 Not Found
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Kube { source: kube::Error::Api(e) } if e.code == 404)
    }

    /// Returns true if retrying the same sync could succeed without a spec change
    ///
    /// Store failures (including create conflicts) are transient; validation and
    /// configuration errors need the Ingress, an Issuer or the process flags fixed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Kube { .. } | Self::Internal { .. })
    }
}
