//! Integration tests for the Ingress sync flow
//!
//! These tests tell the story of an Ingress being synced repeatedly against
//! an in-memory Certificate store, the way the controller runtime would
//! invoke it after every watch event.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use k8s_openapi::api::networking::v1::{Ingress, IngressSpec, IngressTLS};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::runtime::events::EventType;
use kube::ResourceExt;

use ingress_shim::annotations::TLS_ACME_ANNOTATION;
use ingress_shim::certificate::CertificateClient;
use ingress_shim::config::IssuerDefaults;
use ingress_shim::controller::{sync, Context};
use ingress_shim::crd::{
    AcmeIssuer, Certificate, Issuer, IssuerConfig, IssuerRef, IssuerScope, IssuerSpec,
};
use ingress_shim::events::EventPublisher;
use ingress_shim::issuer::IssuerLister;
use ingress_shim::Error;

// =============================================================================
// In-memory collaborators
// =============================================================================

/// Certificate store keyed by (namespace, name)
#[derive(Default)]
struct MemoryCertificates {
    items: Mutex<BTreeMap<(String, String), Certificate>>,
    create_calls: Mutex<u32>,
}

impl MemoryCertificates {
    fn get(&self, namespace: &str, name: &str) -> Option<Certificate> {
        self.items
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    fn create_calls(&self) -> u32 {
        *self.create_calls.lock().unwrap()
    }
}

#[async_trait]
impl CertificateClient for MemoryCertificates {
    async fn get_certificate(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Certificate>, Error> {
        Ok(self.get(namespace, name))
    }

    async fn create_certificate(&self, certificate: &Certificate) -> Result<Certificate, Error> {
        *self.create_calls.lock().unwrap() += 1;
        let key = (
            certificate.namespace().unwrap_or_default(),
            certificate.name_any(),
        );
        let mut items = self.items.lock().unwrap();
        if items.contains_key(&key) {
            return Err(Error::from(kube::Error::Api(kube::core::ErrorResponse {
                status: "Failure".to_string(),
                message: format!("certificates {:?} already exists", key.1),
                reason: "AlreadyExists".to_string(),
                code: 409,
            })));
        }
        items.insert(key, certificate.clone());
        Ok(certificate.clone())
    }
}

/// Issuer store that knows a single ACME issuer
struct SingleAcmeIssuer {
    name: String,
}

#[async_trait]
impl IssuerLister for SingleAcmeIssuer {
    async fn get_issuer(&self, _namespace: &str, name: &str) -> Result<Issuer, Error> {
        if name != self.name {
            return Err(Error::from(kube::Error::Api(kube::core::ErrorResponse {
                status: "Failure".to_string(),
                message: format!("issuers {name:?} not found"),
                reason: "NotFound".to_string(),
                code: 404,
            })));
        }
        Ok(Issuer::new(
            name,
            IssuerSpec {
                config: IssuerConfig {
                    acme: Some(AcmeIssuer {
                        server: "https://acme-v02.api.letsencrypt.org/directory".to_string(),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            },
        ))
    }
}

/// Event sink that counts events by reason
#[derive(Default)]
struct CountingEvents {
    reasons: Mutex<Vec<String>>,
}

#[async_trait]
impl EventPublisher for CountingEvents {
    async fn publish(
        &self,
        _resource_ref: &ObjectReference,
        _type_: EventType,
        reason: &str,
        _action: &str,
        _note: Option<String>,
    ) {
        self.reasons.lock().unwrap().push(reason.to_string());
    }
}

// =============================================================================
// Test Fixtures
// =============================================================================

struct Harness {
    certificates: Arc<MemoryCertificates>,
    events: Arc<CountingEvents>,
    ctx: Context,
}

fn harness() -> Harness {
    let certificates = Arc::new(MemoryCertificates::default());
    let events = Arc::new(CountingEvents::default());
    let ctx = Context::from_parts(
        certificates.clone(),
        Arc::new(SingleAcmeIssuer {
            name: "letsencrypt".to_string(),
        }),
        None,
        events.clone(),
        IssuerDefaults {
            issuer_name: "letsencrypt".to_string(),
            issuer_scope: IssuerScope::Namespaced,
            challenge_type: "http01".to_string(),
            dns01_provider: String::new(),
        },
    );
    Harness {
        certificates,
        events,
        ctx,
    }
}

fn tls(hosts: &[&str], secret: &str) -> IngressTLS {
    IngressTLS {
        hosts: Some(hosts.iter().map(|h| h.to_string()).collect()),
        secret_name: Some(secret.to_string()),
    }
}

fn ingress(name: &str, tls: Vec<IngressTLS>) -> Ingress {
    Ingress {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("ns".to_string()),
            uid: Some(format!("uid-{name}")),
            annotations: Some(BTreeMap::from([(
                TLS_ACME_ANNOTATION.to_string(),
                "true".to_string(),
            )])),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            tls: Some(tls),
            ..Default::default()
        }),
        status: None,
    }
}

// =============================================================================
// Stories
// =============================================================================

/// Story: a kube-lego style Ingress gets one Certificate with the defaults
#[tokio::test]
async fn story_tls_acme_ingress_gets_certificate() {
    let h = harness();
    let ing = ingress("web", vec![tls(&["a.example.com", "b.example.com"], "tls-a")]);

    sync(&ing, &h.ctx).await.unwrap();

    let cert = h.certificates.get("ns", "tls-a").expect("certificate created");
    assert_eq!(cert.spec.dns_names, vec!["a.example.com", "b.example.com"]);
    assert_eq!(cert.spec.secret_name, "tls-a");
    assert_eq!(
        cert.spec.issuer_ref,
        IssuerRef::new("letsencrypt", IssuerScope::Namespaced)
    );
    let acme = cert.spec.acme.expect("acme block for ACME issuer");
    assert_eq!(acme.config[0].http01.as_ref().unwrap().ingress, "web");
    assert_eq!(
        cert.metadata.owner_references.unwrap()[0].uid,
        "uid-web".to_string()
    );
    assert_eq!(*h.events.reasons.lock().unwrap(), vec!["CreateCertificate"]);
}

/// Story: the controller resyncs the same Ingress; nothing is created twice
#[tokio::test]
async fn story_repeated_sync_is_idempotent() {
    let h = harness();
    let ing = ingress(
        "web",
        vec![tls(&["a.example.com"], "tls-a"), tls(&["b.example.com"], "tls-b")],
    );

    sync(&ing, &h.ctx).await.unwrap();
    sync(&ing, &h.ctx).await.unwrap();

    assert_eq!(h.certificates.len(), 2);
    assert_eq!(h.certificates.create_calls(), 2);
    assert_eq!(h.events.reasons.lock().unwrap().len(), 2);
}

/// Story: a second Ingress claims a secret another Ingress already owns
///
/// The existing Certificate is left untouched and no error is reported.
#[tokio::test]
async fn story_existing_secret_target_is_left_alone() {
    let h = harness();
    sync(&ingress("first", vec![tls(&["a.example.com"], "shared")]), &h.ctx)
        .await
        .unwrap();
    sync(&ingress("second", vec![tls(&["b.example.com"], "shared")]), &h.ctx)
        .await
        .unwrap();

    let cert = h.certificates.get("ns", "shared").unwrap();
    assert_eq!(cert.spec.dns_names, vec!["a.example.com"]);
    assert_eq!(cert.metadata.owner_references.unwrap()[0].name, "first");
    assert_eq!(h.certificates.create_calls(), 1);
}

/// Story: a broken TLS entry blocks the whole Ingress until it is fixed
#[tokio::test]
async fn story_invalid_entry_blocks_all_creates_then_recovers() {
    let h = harness();
    let broken = ingress(
        "web",
        vec![tls(&["a.example.com"], "tls-a"), tls(&[], "tls-b")],
    );

    let err = sync(&broken, &h.ctx).await.unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
    assert_eq!(h.certificates.len(), 0);

    let fixed = ingress(
        "web",
        vec![tls(&["a.example.com"], "tls-a"), tls(&["b.example.com"], "tls-b")],
    );
    sync(&fixed, &h.ctx).await.unwrap();
    assert_eq!(h.certificates.len(), 2);
}

/// Story: the default issuer doesn't exist yet; the sync fails and retries later
#[tokio::test]
async fn story_missing_issuer_fails_without_creating() {
    let mut h = harness();
    h.ctx.defaults.issuer_name = "not-installed".to_string();

    let err = sync(&ingress("web", vec![tls(&["a.example.com"], "tls-a")]), &h.ctx)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(err.is_retryable());
    assert_eq!(h.certificates.len(), 0);
}
