//! ingress-shim - creates cert-manager Certificates for annotated Ingresses

use std::sync::Arc;

use clap::Parser;
use futures::StreamExt;
use k8s_openapi::api::networking::v1::Ingress;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::{Api, Client, CustomResourceExt};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ingress_shim::cache::Caches;
use ingress_shim::config::{IssuerDefaults, DEFAULT_ACME_CHALLENGE_TYPE};
use ingress_shim::controller::{error_policy, reconcile, Context};
use ingress_shim::crd::{Certificate, ClusterIssuer, Issuer};

/// ingress-shim - creates cert-manager Certificates for annotated Ingresses
#[derive(Parser, Debug)]
#[command(name = "ingress-shim", version, about, long_about = None)]
struct Cli {
    /// Print the cert-manager CRD manifests the shim relies on and exit
    #[arg(long)]
    crd: bool,

    /// Only watch Ingresses in this namespace
    ///
    /// ClusterIssuers cannot be used when the shim is scoped to a namespace.
    #[arg(long, env = "INGRESS_SHIM_NAMESPACE")]
    namespace: Option<String>,

    /// Issuer used when an Ingress doesn't name one
    #[arg(long, env = "DEFAULT_ISSUER_NAME", default_value = "")]
    default_issuer_name: String,

    /// Kind of the default issuer (Issuer or ClusterIssuer)
    #[arg(long, env = "DEFAULT_ISSUER_KIND", default_value = "Issuer")]
    default_issuer_kind: String,

    /// ACME challenge type used when an Ingress doesn't set one (http01 or dns01)
    #[arg(
        long,
        env = "DEFAULT_ACME_ISSUER_CHALLENGE_TYPE",
        default_value = DEFAULT_ACME_CHALLENGE_TYPE
    )]
    default_acme_issuer_challenge_type: String,

    /// DNS01 provider used when an Ingress doesn't set one
    #[arg(long, env = "DEFAULT_ACME_ISSUER_DNS01_PROVIDER_NAME", default_value = "")]
    default_acme_issuer_dns01_provider_name: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.crd {
        for crd in [Certificate::crd(), Issuer::crd(), ClusterIssuer::crd()] {
            let yaml = serde_yaml::to_string(&crd)
                .map_err(|e| anyhow::anyhow!("Failed to serialize CRD: {}", e))?;
            println!("---\n{yaml}");
        }
        return Ok(());
    }

    run_controller(cli).await
}

/// Run the Ingress controller until a shutdown signal arrives
async fn run_controller(cli: Cli) -> anyhow::Result<()> {
    tracing::info!("ingress-shim starting...");

    let defaults = IssuerDefaults::from_flags(
        cli.default_issuer_name,
        &cli.default_issuer_kind,
        cli.default_acme_issuer_challenge_type,
        cli.default_acme_issuer_dns01_provider_name,
    )
    .map_err(|e| anyhow::anyhow!("Invalid defaults: {}", e))?;

    tracing::info!(
        issuer = %defaults.issuer_ref(),
        challenge_type = %defaults.challenge_type,
        dns01_provider = %defaults.dns01_provider,
        "using default issuer configuration"
    );

    let client = Client::try_default()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create Kubernetes client: {}", e))?;

    let (ingresses, certificates): (Api<Ingress>, Api<Certificate>) = match cli.namespace {
        Some(ref ns) => {
            tracing::info!(namespace = %ns, "scoped to a single namespace, ClusterIssuers disabled");
            (
                Api::namespaced(client.clone(), ns),
                Api::namespaced(client.clone(), ns),
            )
        }
        None => (Api::all(client.clone()), Api::all(client.clone())),
    };

    tracing::info!("Waiting for caches to sync...");
    let caches = Caches::start(client.clone(), cli.namespace.as_deref());
    caches
        .wait_until_ready()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to sync caches: {}", e))?;

    let ctx = Arc::new(Context::builder(client, caches).defaults(defaults).build());

    tracing::info!("Starting Ingress controller...");

    Controller::new(ingresses, WatcherConfig::default())
        .owns(certificates, WatcherConfig::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok((obj, action)) => {
                    tracing::debug!(ingress = %obj, ?action, "Ingress reconciliation completed");
                }
                Err(e) => {
                    tracing::error!(error = ?e, "Ingress reconciliation error");
                }
            }
        })
        .await;

    tracing::info!("ingress-shim shutting down");
    Ok(())
}
