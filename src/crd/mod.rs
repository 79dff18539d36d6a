//! cert-manager Custom Resource Definitions used by the shim
//!
//! The shim reads Issuers and ClusterIssuers and creates Certificates in the
//! `certmanager.k8s.io/v1alpha1` API group.

mod certificate;
mod issuer;
mod types;

pub use certificate::{
    AcmeCertificateConfig, AcmeCertificateDomainConfig, AcmeDns01Config, AcmeHttp01Config,
    Certificate, CertificateSpec,
};
pub use issuer::{
    AcmeIssuer, AcmeIssuerDns01Config, AcmeIssuerDns01Provider, CaIssuer, ClusterIssuer,
    ClusterIssuerSpec, Issuer, IssuerConfig, IssuerProtocol, IssuerSpec, SelfSignedIssuer,
};
pub use types::{IssuerRef, IssuerScope, SecretKeySelector};
