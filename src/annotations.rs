//! Ingress annotations recognised by the shim
//!
//! An Ingress opts in by carrying any of the override annotations, or by
//! setting the kube-lego compatible `kubernetes.io/tls-acme: "true"`.

use std::collections::BTreeMap;

/// kube-lego compatibility flag. When true, a Certificate using the process
/// defaults is created.
pub const TLS_ACME_ANNOTATION: &str = "kubernetes.io/tls-acme";

/// Overrides the issuer with a namespace-scoped Issuer of this name
pub const ISSUER_NAME_ANNOTATION: &str = "certmanager.k8s.io/issuer";

/// Overrides the issuer with a ClusterIssuer of this name
pub const CLUSTER_ISSUER_NAME_ANNOTATION: &str = "certmanager.k8s.io/cluster-issuer";

/// Overrides the default ACME challenge type (`http01` or `dns01`)
pub const ACME_CHALLENGE_TYPE_ANNOTATION: &str = "certmanager.k8s.io/acme-challenge-type";

/// Overrides the default DNS01 provider when the challenge type is `dns01`
pub const ACME_DNS01_PROVIDER_ANNOTATION: &str = "certmanager.k8s.io/acme-dns01-provider";

/// Annotation map as exposed by `ObjectMeta`
pub type Annotations = BTreeMap<String, String>;

/// Returns true if an Ingress with these annotations should get Certificates
pub fn should_sync(annotations: &Annotations) -> bool {
    if annotations.contains_key(ISSUER_NAME_ANNOTATION)
        || annotations.contains_key(CLUSTER_ISSUER_NAME_ANNOTATION)
    {
        return true;
    }
    if annotations
        .get(TLS_ACME_ANNOTATION)
        .and_then(|v| parse_bool(v))
        .unwrap_or(false)
    {
        return true;
    }
    annotations.contains_key(ACME_CHALLENGE_TYPE_ANNOTATION)
        || annotations.contains_key(ACME_DNS01_PROVIDER_ANNOTATION)
}

/// Parse the boolean spellings accepted by Kubernetes tooling
///
/// Returns `None` for anything unrecognised so callers can treat it as false.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
