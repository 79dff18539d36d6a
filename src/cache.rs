//! Informer-backed read caches
//!
//! Certificates and issuers are read from reflector stores that background
//! watches keep up to date, so looking them up during a sync never costs an
//! API round trip. Writes still go straight to the API server.
//!
//! A store can briefly lag behind the API server. A Certificate created by
//! the previous sync may not be visible yet, in which case the next create
//! hits a 409 conflict and the sync is retried once the watch catches up.

use std::fmt::Debug;

use futures::{future, StreamExt};
use kube::api::Api;
use kube::runtime::reflector::{self, ObjectRef, Store};
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::crd::{Certificate, ClusterIssuer, Issuer};
use crate::Error;

/// Reflector stores for every resource a sync reads
#[derive(Clone)]
pub struct Caches {
    /// Certificates, keyed by namespace and name
    pub certificates: Store<Certificate>,
    /// Namespaced Issuers
    pub issuers: Store<Issuer>,
    /// ClusterIssuers, absent when the shim is scoped to one namespace
    pub cluster_issuers: Option<Store<ClusterIssuer>>,
}

impl Caches {
    /// Start background watches feeding the caches
    ///
    /// With a namespace, Certificates and Issuers are only watched there and
    /// ClusterIssuers are not watched at all.
    pub fn start(client: Client, namespace: Option<&str>) -> Self {
        match namespace {
            Some(ns) => Self {
                certificates: spawn_reflector(Api::namespaced(client.clone(), ns)),
                issuers: spawn_reflector(Api::namespaced(client, ns)),
                cluster_issuers: None,
            },
            None => Self {
                certificates: spawn_reflector(Api::all(client.clone())),
                issuers: spawn_reflector(Api::all(client.clone())),
                cluster_issuers: Some(spawn_reflector(Api::all(client))),
            },
        }
    }

    /// Wait until every cache has completed its initial list
    pub async fn wait_until_ready(&self) -> Result<(), Error> {
        let not_ready = |e: reflector::store::WriterDropped| Error::internal("cache", e.to_string());

        self.certificates.wait_until_ready().await.map_err(not_ready)?;
        self.issuers.wait_until_ready().await.map_err(not_ready)?;
        if let Some(cluster_issuers) = &self.cluster_issuers {
            cluster_issuers.wait_until_ready().await.map_err(not_ready)?;
        }
        debug!("caches synced");
        Ok(())
    }
}

/// Run a watch for `api` in the background and return the store it fills
fn spawn_reflector<K>(api: Api<K>) -> Store<K>
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
{
    let (reader, writer) = reflector::store();
    let stream = reflector::reflector(
        writer,
        watcher(api, watcher::Config::default()).default_backoff(),
    );

    tokio::spawn(stream.for_each(|event| {
        if let Err(e) = event {
            warn!(kind = %K::kind(&()), error = %e, "cache watch failed, retrying");
        }
        future::ready(())
    }));

    reader
}

/// Look up an object in a store
///
/// Pass `None` as the namespace for cluster-scoped resources.
pub fn lookup<K>(store: &Store<K>, namespace: Option<&str>, name: &str) -> Option<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    let mut key = ObjectRef::new(name);
    if let Some(ns) = namespace {
        key = key.within(ns);
    }
    store.get(&key).map(|obj| (*obj).clone())
}
