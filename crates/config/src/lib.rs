//! Configuration types for the proxy deployer.
//!
//! This crate provides:
//! - The network registry (endpoint ids, companion networks, RPC and credentials)
//! - Deployment profiles unifying per-environment parameters

pub mod network;
pub mod profile;

pub use network::{
    CredentialSource, NetworkDescriptor, NetworkError, NetworkRegistry, NetworkRole,
};
pub use profile::{DeploymentProfile, ForeignProfile, HomeProfile};
