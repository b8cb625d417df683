//! Deployment bookkeeping and submission.
//!
//! Records of deployed contracts live in an append-only store, one per network. Later steps
//! resolve their dependencies from it by logical name.

pub mod artifact;
pub mod record;
pub mod resolver;
pub mod skip;
pub mod store;
pub mod submit;

pub use artifact::{ArtifactError, Artifacts};
pub use record::{ConstructorArg, DeploymentRecord};
pub use resolver::{ResolveError, Resolver};
pub use skip::should_skip;
pub use store::{DeploymentStore, FileStore, MemoryStore, StoreError};
pub use submit::{ChainSubmitter, DeployRequest, SubmitError, Submission, Submitter};
