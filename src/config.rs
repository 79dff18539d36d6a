//! Process-wide defaults applied when an Ingress carries no override

use crate::crd::{IssuerRef, IssuerScope};

/// Default ACME challenge type
pub const DEFAULT_ACME_CHALLENGE_TYPE: &str = "http01";

/// Defaults used to fill in anything an Ingress does not annotate
///
/// Built once at startup and shared read-only by every sync.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuerDefaults {
    /// Issuer name used when no issuer annotation is present
    pub issuer_name: String,
    /// Issuer scope used when no issuer annotation is present
    pub issuer_scope: IssuerScope,
    /// ACME challenge type used when no challenge-type annotation is present
    pub challenge_type: String,
    /// DNS01 provider used when no provider annotation is present
    pub dns01_provider: String,
}

impl Default for IssuerDefaults {
    fn default() -> Self {
        Self {
            issuer_name: String::new(),
            issuer_scope: IssuerScope::Namespaced,
            challenge_type: DEFAULT_ACME_CHALLENGE_TYPE.to_string(),
            dns01_provider: String::new(),
        }
    }
}

impl IssuerDefaults {
    /// Create defaults from raw flag values
    ///
    /// The issuer kind is validated here so an invalid value fails at startup.
    pub fn from_flags(
        issuer_name: impl Into<String>,
        issuer_kind: &str,
        challenge_type: impl Into<String>,
        dns01_provider: impl Into<String>,
    ) -> crate::Result<Self> {
        Ok(Self {
            issuer_name: issuer_name.into(),
            issuer_scope: issuer_kind.parse()?,
            challenge_type: challenge_type.into(),
            dns01_provider: dns01_provider.into(),
        })
    }

    /// Issuer reference used when no annotation overrides it
    pub fn issuer_ref(&self) -> IssuerRef {
        IssuerRef::new(self.issuer_name.clone(), self.issuer_scope)
    }
}
