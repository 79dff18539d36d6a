//! ingress-shim - creates cert-manager Certificates for annotated Ingresses
//!
//! An Ingress opts in through annotations (`kubernetes.io/tls-acme: "true"`,
//! `certmanager.k8s.io/issuer`, ...). For every `spec.tls` entry the shim
//! creates a Certificate named after the entry's secret, referencing the
//! resolved Issuer or ClusterIssuer and, for ACME issuers, the HTTP01 or DNS01
//! challenge to solve. Existing Certificates are never modified.
//!
//! # Modules
//!
//! - [`annotations`] - Recognised Ingress annotations and the opt-in check
//! - [`issuer`] - Issuer resolution and lookup
//! - [`challenge`] - ACME challenge configuration
//! - [`certificate`] - Certificate generation from Ingress TLS entries
//! - [`cache`] - Informer-backed read caches for Certificates and issuers
//! - [`controller`] - Sync entry point and kube-runtime reconciler
//! - [`crd`] - cert-manager Custom Resource Definitions
//! - [`config`] - Process-wide defaults
//! - [`events`] - Kubernetes Event publishing
//! - [`error`] - Error types

#![deny(missing_docs)]

pub mod annotations;
pub mod cache;
pub mod certificate;
pub mod challenge;
pub mod config;
pub mod controller;
pub mod crd;
pub mod error;
pub mod events;
pub mod issuer;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;
