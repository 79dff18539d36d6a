//! cert-manager Certificate Custom Resource Definition
//!
//! Only the fields the shim writes are modelled. The shim creates
//! Certificates and never reads back their status.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::IssuerRef;

/// Desired state of a cert-manager Certificate
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "certmanager.k8s.io",
    version = "v1alpha1",
    kind = "Certificate",
    plural = "certificates",
    shortname = "cert",
    namespaced,
    printcolumn = r#"{"name":"Secret","type":"string","jsonPath":".spec.secretName"}"#,
    printcolumn = r#"{"name":"Issuer","type":"string","jsonPath":".spec.issuerRef.name"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct CertificateSpec {
    /// DNS subject alternative names, in the order the Ingress lists them
    #[serde(default)]
    pub dns_names: Vec<String>,

    /// Secret the signed certificate is stored in
    pub secret_name: String,

    /// Issuer that should sign this certificate
    pub issuer_ref: IssuerRef,

    /// ACME challenge configuration, present only for ACME issuers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acme: Option<AcmeCertificateConfig>,
}

/// ACME solver configuration for a Certificate
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct AcmeCertificateConfig {
    /// Per-domain solver configuration
    pub config: Vec<AcmeCertificateDomainConfig>,
}

/// Solver configuration for a set of domains
///
/// Exactly one of `http01` or `dns01` is set.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct AcmeCertificateDomainConfig {
    /// Domains solved with this configuration
    pub domains: Vec<String>,

    /// Serve the HTTP01 token through an Ingress
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http01: Option<AcmeHttp01Config>,

    /// Publish the DNS01 token through a named DNS provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns01: Option<AcmeDns01Config>,
}

/// HTTP01 solver settings
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct AcmeHttp01Config {
    /// Name of the Ingress that serves the challenge response
    pub ingress: String,
}

/// DNS01 solver settings
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct AcmeDns01Config {
    /// Name of the DNS01 provider configured on the issuer
    pub provider: String,
}
