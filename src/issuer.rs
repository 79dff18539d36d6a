//! Issuer resolution for Ingresses
//!
//! Picks the issuer a Certificate should reference (annotation overrides over
//! process defaults) and fetches it so the shim knows whether it speaks ACME.

use async_trait::async_trait;
use kube::runtime::reflector::Store;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::annotations::{Annotations, CLUSTER_ISSUER_NAME_ANNOTATION, ISSUER_NAME_ANNOTATION};
use crate::cache::lookup;
use crate::config::IssuerDefaults;
use crate::crd::{ClusterIssuer, Issuer, IssuerProtocol, IssuerRef, IssuerScope};
use crate::Error;

/// Read access to namespace-scoped Issuers
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IssuerLister: Send + Sync {
    /// Get an Issuer by namespace and name
    ///
    /// A missing Issuer is an error; 404 is returned as-is.
    async fn get_issuer(&self, namespace: &str, name: &str) -> Result<Issuer, Error>;
}

/// Read access to ClusterIssuers
///
/// Only wired in when the shim watches all namespaces.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterIssuerLister: Send + Sync {
    /// Get a ClusterIssuer by name
    async fn get_cluster_issuer(&self, name: &str) -> Result<ClusterIssuer, Error>;
}

#[async_trait]
impl IssuerLister for Store<Issuer> {
    async fn get_issuer(&self, namespace: &str, name: &str) -> Result<Issuer, Error> {
        lookup(self, Some(namespace), name).ok_or_else(|| Error::not_found("Issuer", name))
    }
}

#[async_trait]
impl ClusterIssuerLister for Store<ClusterIssuer> {
    async fn get_cluster_issuer(&self, name: &str) -> Result<ClusterIssuer, Error> {
        lookup(self, None, name).ok_or_else(|| Error::not_found("ClusterIssuer", name))
    }
}

/// Determine which issuer Certificates for an Ingress should reference
///
/// The cluster-issuer annotation is applied after the issuer annotation, so
/// it wins when both are set.
pub fn resolve_issuer_ref(annotations: &Annotations, defaults: &IssuerDefaults) -> IssuerRef {
    let mut issuer_ref = defaults.issuer_ref();
    if let Some(name) = annotations.get(ISSUER_NAME_ANNOTATION) {
        issuer_ref = IssuerRef::new(name.clone(), IssuerScope::Namespaced);
    }
    if let Some(name) = annotations.get(CLUSTER_ISSUER_NAME_ANNOTATION) {
        issuer_ref = IssuerRef::new(name.clone(), IssuerScope::Cluster);
    }
    issuer_ref
}

/// Fetch the referenced issuer and classify it by protocol
pub async fn fetch_issuer(
    namespace: &str,
    issuer_ref: &IssuerRef,
    issuers: &dyn IssuerLister,
    cluster_issuers: Option<&dyn ClusterIssuerLister>,
) -> Result<IssuerProtocol, Error> {
    let protocol = match issuer_ref.kind {
        IssuerScope::Namespaced => {
            let issuer = issuers.get_issuer(namespace, &issuer_ref.name).await?;
            IssuerProtocol::from(&issuer)
        }
        IssuerScope::Cluster => {
            let lister = cluster_issuers.ok_or_else(|| {
                Error::configuration(format!(
                    "cannot get ClusterIssuer for {:?} as ingress-shim is scoped to a single namespace",
                    issuer_ref.name
                ))
            })?;
            let issuer = lister.get_cluster_issuer(&issuer_ref.name).await?;
            IssuerProtocol::from(&issuer)
        }
    };

    debug!(
        issuer = %issuer_ref,
        namespace = %namespace,
        acme = protocol.is_acme(),
        "resolved issuer"
    );
    Ok(protocol)
}
