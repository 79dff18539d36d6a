//! Certificate generation from Ingress TLS entries
//!
//! Each `spec.tls` entry of an Ingress becomes one Certificate named after
//! its secret. The secret name is the idempotency key: an existing
//! Certificate with that name is left alone.

use async_trait::async_trait;
use k8s_openapi::api::networking::v1::{Ingress, IngressTLS};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::api::{Api, PostParams};
use kube::runtime::reflector::Store;
use kube::{Client, Resource, ResourceExt};
use tracing::info;

#[cfg(test)]
use mockall::automock;

use crate::annotations::Annotations;
use crate::cache::lookup;
use crate::challenge::acme_config_for;
use crate::config::IssuerDefaults;
use crate::crd::{Certificate, CertificateSpec, IssuerProtocol, IssuerRef};
use crate::Error;

/// Field manager recorded on Certificates created by the shim
pub const FIELD_MANAGER: &str = "ingress-shim";

/// Lookup and create operations for Certificates
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CertificateClient: Send + Sync {
    /// Get a Certificate by namespace and name, `None` if it doesn't exist
    async fn get_certificate(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Certificate>, Error>;

    /// Create a Certificate; an existing one with the same name is a conflict error
    async fn create_certificate(&self, certificate: &Certificate) -> Result<Certificate, Error>;
}

/// Real Kubernetes client implementation
///
/// Lookups are served from the Certificate cache; creates go to the API server.
pub struct KubeCertificateClient {
    client: Client,
    cache: Store<Certificate>,
}

impl KubeCertificateClient {
    /// Create a new KubeCertificateClient reading through the given cache
    pub fn new(client: Client, cache: Store<Certificate>) -> Self {
        Self { client, cache }
    }
}

#[async_trait]
impl CertificateClient for KubeCertificateClient {
    async fn get_certificate(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Certificate>, Error> {
        Ok(lookup(&self.cache, Some(namespace), name))
    }

    async fn create_certificate(&self, certificate: &Certificate) -> Result<Certificate, Error> {
        let namespace = certificate.namespace().ok_or_else(|| {
            Error::internal("certificate", "cannot create Certificate without a namespace")
        })?;
        let api: Api<Certificate> = Api::namespaced(self.client.clone(), &namespace);
        let params = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };
        Ok(api.create(&params, certificate).await?)
    }
}

/// Check a TLS entry has the hosts and secret a Certificate needs
///
/// Returns the hosts and secret name on success.
pub fn validate_tls<'a>(
    ingress_name: &str,
    index: usize,
    tls: &'a IngressTLS,
) -> Result<(&'a [String], &'a str), Error> {
    let hosts = tls.hosts.as_deref().unwrap_or_default();
    let secret_name = tls.secret_name.as_deref().unwrap_or_default();

    if hosts.is_empty() {
        return Err(Error::validation(
            ingress_name,
            format!("secret {secret_name:?} (TLS entry {index}) has no hosts specified"),
        ));
    }
    if secret_name.is_empty() {
        return Err(Error::validation(
            ingress_name,
            format!("TLS entry {index} must specify a secretName"),
        ));
    }
    Ok((hosts, secret_name))
}

/// Controller owner reference pointing at the Ingress
///
/// Lets the garbage collector delete generated Certificates with their Ingress.
pub fn ingress_owner_ref(ingress: &Ingress) -> Result<OwnerReference, Error> {
    let uid = ingress
        .meta()
        .uid
        .clone()
        .ok_or_else(|| Error::internal("owner-ref", "ingress has no uid"))?;

    Ok(OwnerReference {
        api_version: Ingress::api_version(&()).to_string(),
        kind: Ingress::kind(&()).to_string(),
        name: ingress.name_any(),
        uid,
        controller: Some(true),
        block_owner_deletion: Some(true),
    })
}

/// Build the Certificates an Ingress in `namespace` still needs
///
/// Entries whose Certificate already exists are skipped. Any validation,
/// lookup or challenge error aborts the whole build, so either every missing
/// Certificate is returned or none is.
pub async fn build_certificates(
    ingress: &Ingress,
    namespace: &str,
    issuer_ref: &IssuerRef,
    issuer: &IssuerProtocol,
    defaults: &IssuerDefaults,
    certificates: &dyn CertificateClient,
) -> Result<Vec<Certificate>, Error> {
    let name = ingress.name_any();
    let empty = Annotations::new();
    let annotations = ingress.metadata.annotations.as_ref().unwrap_or(&empty);
    let tls_entries = ingress
        .spec
        .as_ref()
        .and_then(|s| s.tls.as_deref())
        .unwrap_or_default();

    let mut certs = Vec::new();
    for (index, tls) in tls_entries.iter().enumerate() {
        let (hosts, secret_name) = validate_tls(&name, index, tls)?;

        if certificates
            .get_certificate(namespace, secret_name)
            .await?
            .is_some()
        {
            info!(
                ingress = %name,
                certificate = %secret_name,
                "certificate already exists, not re-creating"
            );
            continue;
        }

        let cert = Certificate {
            metadata: ObjectMeta {
                name: Some(secret_name.to_string()),
                namespace: Some(namespace.to_string()),
                owner_references: Some(vec![ingress_owner_ref(ingress)?]),
                ..Default::default()
            },
            spec: CertificateSpec {
                dns_names: hosts.to_vec(),
                secret_name: secret_name.to_string(),
                issuer_ref: issuer_ref.clone(),
                acme: acme_config_for(issuer, annotations, defaults, &name, hosts)?,
            },
        };
        certs.push(cert);
    }

    Ok(certs)
}
