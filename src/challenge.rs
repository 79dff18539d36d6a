//! ACME challenge configuration for generated Certificates
//!
//! Only ACME issuers need a solver block; for every other issuer the
//! Certificate is created without one.

use tracing::debug;

use crate::annotations::{
    Annotations, ACME_CHALLENGE_TYPE_ANNOTATION, ACME_DNS01_PROVIDER_ANNOTATION,
};
use crate::config::IssuerDefaults;
use crate::crd::{
    AcmeCertificateConfig, AcmeCertificateDomainConfig, AcmeDns01Config, AcmeHttp01Config,
    IssuerProtocol,
};
use crate::Error;

/// Challenge type value selecting HTTP01
pub const HTTP01: &str = "http01";

/// Challenge type value selecting DNS01
pub const DNS01: &str = "dns01";

/// How an ACME issuer proves control of the requested domains
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChallengeConfig {
    /// Serve the token through the named Ingress
    Http01 {
        /// Ingress the HTTP01 solver routes through
        ingress: String,
    },
    /// Publish the token through a DNS provider configured on the issuer
    Dns01 {
        /// Provider name, never empty
        provider: String,
    },
}

impl ChallengeConfig {
    /// Resolve the challenge for an Ingress from its annotations and the defaults
    pub fn resolve(
        annotations: &Annotations,
        defaults: &IssuerDefaults,
        ingress_name: &str,
    ) -> Result<Self, Error> {
        let challenge_type = annotations
            .get(ACME_CHALLENGE_TYPE_ANNOTATION)
            .unwrap_or(&defaults.challenge_type);

        match challenge_type.as_str() {
            HTTP01 => Ok(Self::Http01 {
                ingress: ingress_name.to_string(),
            }),
            DNS01 => {
                let provider = annotations
                    .get(ACME_DNS01_PROVIDER_ANNOTATION)
                    .unwrap_or(&defaults.dns01_provider);
                if provider.is_empty() {
                    return Err(Error::configuration(
                        "no acme issuer dns01 challenge provider specified",
                    ));
                }
                Ok(Self::Dns01 {
                    provider: provider.clone(),
                })
            }
            other => Err(Error::configuration(format!(
                "invalid acme issuer challenge type specified {other:?}"
            ))),
        }
    }

    /// Solver block for the given domains
    pub fn domain_config(&self, domains: Vec<String>) -> AcmeCertificateDomainConfig {
        let mut cfg = AcmeCertificateDomainConfig {
            domains,
            ..Default::default()
        };
        match self {
            Self::Http01 { ingress } => {
                cfg.http01 = Some(AcmeHttp01Config {
                    ingress: ingress.clone(),
                })
            }
            Self::Dns01 { provider } => {
                cfg.dns01 = Some(AcmeDns01Config {
                    provider: provider.clone(),
                })
            }
        }
        cfg
    }
}

/// Build the issuer-specific Certificate configuration for one TLS entry
///
/// Returns `Ok(None)` for non-ACME issuers. For ACME issuers the challenge
/// type and provider are validated even if the caller ends up not needing them.
pub fn acme_config_for(
    issuer: &IssuerProtocol,
    annotations: &Annotations,
    defaults: &IssuerDefaults,
    ingress_name: &str,
    hosts: &[String],
) -> Result<Option<AcmeCertificateConfig>, Error> {
    if !issuer.is_acme() {
        return Ok(None);
    }

    let challenge = ChallengeConfig::resolve(annotations, defaults, ingress_name)?;
    debug!(ingress = %ingress_name, ?challenge, "resolved acme challenge");

    Ok(Some(AcmeCertificateConfig {
        config: vec![challenge.domain_config(hosts.to_vec())],
    }))
}
