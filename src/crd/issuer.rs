//! cert-manager Issuer and ClusterIssuer Custom Resource Definitions
//!
//! The shim only needs to know whether an issuer speaks ACME, so most of the
//! issuer configuration is modelled loosely. Both kinds share [`IssuerConfig`].

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::SecretKeySelector;

/// Namespace-scoped issuer
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "certmanager.k8s.io",
    version = "v1alpha1",
    kind = "Issuer",
    plural = "issuers",
    namespaced
)]
pub struct IssuerSpec {
    /// Issuer backend configuration
    #[serde(flatten)]
    pub config: IssuerConfig,
}

/// Cluster-scoped issuer, usable from every namespace
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "certmanager.k8s.io",
    version = "v1alpha1",
    kind = "ClusterIssuer",
    plural = "clusterissuers"
)]
pub struct ClusterIssuerSpec {
    /// Issuer backend configuration
    #[serde(flatten)]
    pub config: IssuerConfig,
}

/// Backend configuration common to Issuer and ClusterIssuer
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IssuerConfig {
    /// ACME (e.g. Let's Encrypt) issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acme: Option<AcmeIssuer>,

    /// CA issuer backed by a keypair in a Secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca: Option<CaIssuer>,

    /// Self-signing issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_signed: Option<SelfSignedIssuer>,
}

/// ACME account and solver configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AcmeIssuer {
    /// ACME directory URL
    pub server: String,

    /// Contact email for the ACME account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Secret holding the ACME account private key
    pub private_key_secret_ref: SecretKeySelector,

    /// Skip TLS verification of the ACME server
    #[serde(default)]
    pub skip_tls_verify: bool,

    /// DNS01 providers available to Certificates using this issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns01: Option<AcmeIssuerDns01Config>,
}

/// DNS01 providers configured on an ACME issuer
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct AcmeIssuerDns01Config {
    /// Named providers; Certificates select one by name
    #[serde(default)]
    pub providers: Vec<AcmeIssuerDns01Provider>,
}

/// A single named DNS01 provider
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct AcmeIssuerDns01Provider {
    /// Provider name referenced from `acme-dns01-provider`
    pub name: String,
}

/// CA issuer configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CaIssuer {
    /// Secret containing the CA keypair
    pub secret_name: String,
}

/// Self-signed issuer configuration (no fields)
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct SelfSignedIssuer {}

/// Protocol family of a resolved issuer
///
/// Resolved once per sync so the ACME branch is not re-inspected per TLS entry.
#[derive(Clone, Debug, PartialEq)]
pub enum IssuerProtocol {
    /// ACME issuer; Certificates need a challenge configuration
    Acme(AcmeIssuer),
    /// Any other issuer; Certificates carry no issuer-specific configuration
    Generic,
}

impl IssuerConfig {
    /// Classify this issuer by protocol family
    pub fn protocol(&self) -> IssuerProtocol {
        match &self.acme {
            Some(acme) => IssuerProtocol::Acme(acme.clone()),
            None => IssuerProtocol::Generic,
        }
    }
}

impl IssuerProtocol {
    /// Returns true for ACME issuers
    pub fn is_acme(&self) -> bool {
        matches!(self, Self::Acme(_))
    }
}

impl From<&Issuer> for IssuerProtocol {
    fn from(issuer: &Issuer) -> Self {
        issuer.spec.config.protocol()
    }
}

impl From<&ClusterIssuer> for IssuerProtocol {
    fn from(issuer: &ClusterIssuer) -> Self {
        issuer.spec.config.protocol()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acme_issuer_is_classified_as_acme() {
        let spec: IssuerSpec = serde_json::from_value(serde_json::json!({
            "acme": {
                "server": "https://acme-v02.api.letsencrypt.org/directory",
                "email": "ops@example.com",
                "privateKeySecretRef": {"name": "letsencrypt-account"},
                "dns01": {"providers": [{"name": "route53"}]}
            }
        }))
        .unwrap();

        let protocol = spec.config.protocol();
        assert!(protocol.is_acme());
        match protocol {
            IssuerProtocol::Acme(acme) => {
                assert_eq!(acme.private_key_secret_ref.name, "letsencrypt-account");
                assert_eq!(acme.dns01.unwrap().providers[0].name, "route53");
            }
            IssuerProtocol::Generic => panic!("expected ACME issuer"),
        }
    }

    #[test]
    fn ca_issuer_is_generic() {
        let spec: ClusterIssuerSpec = serde_json::from_value(serde_json::json!({
            "ca": {"secretName": "root-ca"}
        }))
        .unwrap();
        assert_eq!(spec.config.protocol(), IssuerProtocol::Generic);
    }
}
