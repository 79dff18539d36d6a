//! Controller implementations for the ingress shim
//!
//! Controllers follow the Kubernetes controller pattern: observe the Ingress,
//! determine the desired Certificates, and create the ones that are missing.

mod ingress;

pub use ingress::{error_policy, reconcile, sync, Context, ContextBuilder, CONTROLLER_NAME};
