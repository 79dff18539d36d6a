//! Supporting types shared by the cert-manager CRDs

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Scope of the issuer a Certificate refers to
///
/// Serialized with cert-manager's kind names so it can be used directly as
/// `spec.issuerRef.kind`.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum IssuerScope {
    /// Namespace-scoped `Issuer`
    #[default]
    #[serde(rename = "Issuer")]
    Namespaced,
    /// Cluster-scoped `ClusterIssuer`
    #[serde(rename = "ClusterIssuer")]
    Cluster,
}

impl IssuerScope {
    /// Kind name of the issuer resource for this scope
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Namespaced => "Issuer",
            Self::Cluster => "ClusterIssuer",
        }
    }
}

impl std::str::FromStr for IssuerScope {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Issuer" => Ok(Self::Namespaced),
            "ClusterIssuer" => Ok(Self::Cluster),
            _ => Err(crate::Error::configuration(format!(
                "invalid value {s:?} for issuer kind. Must be \"Issuer\" or \"ClusterIssuer\""
            ))),
        }
    }
}

impl std::fmt::Display for IssuerScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.kind())
    }
}

/// Reference from a Certificate to the issuer that should sign it
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IssuerRef {
    /// Name of the Issuer or ClusterIssuer
    pub name: String,
    /// Which kind of issuer `name` refers to
    pub kind: IssuerScope,
}

impl IssuerRef {
    /// Create a reference to an issuer of the given scope
    pub fn new(name: impl Into<String>, kind: IssuerScope) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

impl std::fmt::Display for IssuerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// Reference to a key within a Secret
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct SecretKeySelector {
    /// Secret name
    pub name: String,
    /// Key within the secret data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_parses_cert_manager_kind_names() {
        assert_eq!("Issuer".parse::<IssuerScope>().unwrap(), IssuerScope::Namespaced);
        assert_eq!(
            "ClusterIssuer".parse::<IssuerScope>().unwrap(),
            IssuerScope::Cluster
        );
    }

    #[test]
    fn unknown_scope_is_a_configuration_error() {
        let err = "issuer".parse::<IssuerScope>().unwrap_err();
        assert!(matches!(err, crate::Error::Configuration { .. }));
        assert!(err.to_string().contains("\"issuer\""));

        assert!("".parse::<IssuerScope>().is_err());
    }

    #[test]
    fn issuer_ref_serializes_kind_name() {
        let r = IssuerRef::new("letsencrypt", IssuerScope::Cluster);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "letsencrypt", "kind": "ClusterIssuer"})
        );
        assert_eq!(r.to_string(), "ClusterIssuer/letsencrypt");
    }
}
