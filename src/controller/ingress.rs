//! Ingress controller implementation
//!
//! Turns annotated Ingresses into cert-manager Certificates. A sync first
//! builds every missing Certificate and only then creates them, so a bad TLS
//! entry never leaves half an Ingress provisioned by the same call.

use std::sync::Arc;
use std::time::Duration;

use k8s_openapi::api::networking::v1::Ingress;
use kube::runtime::controller::Action;
use kube::runtime::events::EventType;
use kube::{Client, Resource, ResourceExt};
use tracing::{debug, error, info, instrument};

use crate::annotations::{should_sync, Annotations};
use crate::cache::Caches;
use crate::certificate::{build_certificates, CertificateClient, KubeCertificateClient};
use crate::config::IssuerDefaults;
use crate::events::{actions, reasons, EventPublisher, KubeEventPublisher};
use crate::issuer::{fetch_issuer, resolve_issuer_ref, ClusterIssuerLister, IssuerLister};
use crate::Error;

/// Controller name reported on Events
pub const CONTROLLER_NAME: &str = "ingress-shim";

/// Requeue delay for errors that may clear up on their own
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Requeue delay for errors that need a user to change something
const MISCONFIGURED_RETRY_DELAY: Duration = Duration::from_secs(300);

/// Controller context for Ingress reconciliation
///
/// Use [`ContextBuilder`] to construct instances:
///
/// ```ignore
/// let caches = Caches::start(client.clone(), None);
/// let ctx = Context::builder(client, caches)
///     .defaults(defaults)
///     .build();
/// ```
pub struct Context {
    /// Certificate lookup and creation
    pub certificates: Arc<dyn CertificateClient>,
    /// Namespace-scoped Issuer lookup
    pub issuers: Arc<dyn IssuerLister>,
    /// ClusterIssuer lookup, absent when the shim is scoped to one namespace
    pub cluster_issuers: Option<Arc<dyn ClusterIssuerLister>>,
    /// Event sink for Certificate creations
    pub events: Arc<dyn EventPublisher>,
    /// Process-wide issuer and challenge defaults
    pub defaults: IssuerDefaults,
}

impl Context {
    /// Create a builder for constructing a Context
    pub fn builder(client: Client, caches: Caches) -> ContextBuilder {
        ContextBuilder::new(client, caches)
    }

    /// Create a context from explicit collaborators
    ///
    /// Used by tests and by callers that bring their own stores.
    pub fn from_parts(
        certificates: Arc<dyn CertificateClient>,
        issuers: Arc<dyn IssuerLister>,
        cluster_issuers: Option<Arc<dyn ClusterIssuerLister>>,
        events: Arc<dyn EventPublisher>,
        defaults: IssuerDefaults,
    ) -> Self {
        Self {
            certificates,
            issuers,
            cluster_issuers,
            events,
            defaults,
        }
    }
}

/// Builder for [`Context`]
///
/// Lookups read from `caches`. When the caches carry no ClusterIssuer store
/// the shim is namespace scoped and ClusterIssuer references fail.
pub struct ContextBuilder {
    client: Client,
    caches: Caches,
    defaults: IssuerDefaults,
}

impl ContextBuilder {
    fn new(client: Client, caches: Caches) -> Self {
        Self {
            client,
            caches,
            defaults: IssuerDefaults::default(),
        }
    }

    /// Set the process-wide defaults
    pub fn defaults(mut self, defaults: IssuerDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Build the Context
    pub fn build(self) -> Context {
        let Caches {
            certificates,
            issuers,
            cluster_issuers,
        } = self.caches;
        let cluster_issuers =
            cluster_issuers.map(|store| Arc::new(store) as Arc<dyn ClusterIssuerLister>);
        let events = Arc::new(KubeEventPublisher::new(
            self.client.clone(),
            CONTROLLER_NAME,
        ));

        Context {
            certificates: Arc::new(KubeCertificateClient::new(self.client, certificates)),
            issuers: Arc::new(issuers),
            cluster_issuers,
            events,
            defaults: self.defaults,
        }
    }
}

/// Create any missing Certificates for an Ingress
///
/// Ingresses without a recognised annotation are ignored. Certificates are
/// created in TLS entry order; the first failure stops the sync and leaves
/// already-created Certificates in place. Re-running is safe since existing
/// Certificates are skipped.
pub async fn sync(ingress: &Ingress, ctx: &Context) -> Result<(), Error> {
    let name = ingress.name_any();
    let namespace = ingress
        .namespace()
        .ok_or_else(|| Error::internal("controller", format!("ingress {name} has no namespace")))?;
    let empty = Annotations::new();
    let annotations = ingress.metadata.annotations.as_ref().unwrap_or(&empty);

    if !should_sync(annotations) {
        info!(
            ingress = %name,
            namespace = %namespace,
            "not syncing ingress as it does not contain necessary annotations"
        );
        return Ok(());
    }

    let issuer_ref = resolve_issuer_ref(annotations, &ctx.defaults);
    let issuer = fetch_issuer(
        &namespace,
        &issuer_ref,
        ctx.issuers.as_ref(),
        ctx.cluster_issuers.as_deref(),
    )
    .await?;

    let certs = build_certificates(
        ingress,
        &namespace,
        &issuer_ref,
        &issuer,
        &ctx.defaults,
        ctx.certificates.as_ref(),
    )
    .await?;
    debug!(ingress = %name, count = certs.len(), "certificates to create");

    let ingress_ref = ingress.object_ref(&());
    for cert in &certs {
        let created = ctx.certificates.create_certificate(cert).await?;
        let cert_name = created.name_any();
        info!(
            ingress = %name,
            namespace = %namespace,
            certificate = %cert_name,
            issuer = %issuer_ref,
            "created certificate"
        );
        ctx.events
            .publish(
                &ingress_ref,
                EventType::Normal,
                reasons::CREATE_CERTIFICATE,
                actions::CREATE,
                Some(format!("Successfully created Certificate {cert_name:?}")),
            )
            .await;
    }

    Ok(())
}

/// Reconcile an Ingress
///
/// Certificates are never updated, so there is nothing to requeue for on
/// success; the watch on owned Certificates re-triggers the Ingress if one
/// is deleted.
#[instrument(skip(ingress, ctx), fields(ingress = %ingress.name_any(), namespace = ?ingress.namespace()))]
pub async fn reconcile(ingress: Arc<Ingress>, ctx: Arc<Context>) -> Result<Action, Error> {
    sync(&ingress, &ctx).await?;
    Ok(Action::await_change())
}

/// Error policy for the Ingress controller
pub fn error_policy(ingress: Arc<Ingress>, error: &Error, _ctx: Arc<Context>) -> Action {
    error!(
        ?error,
        ingress = %ingress.name_any(),
        namespace = ?ingress.namespace(),
        "sync failed"
    );

    if error.is_retryable() {
        Action::requeue(RETRY_DELAY)
    } else {
        Action::requeue(MISCONFIGURED_RETRY_DELAY)
    }
}
