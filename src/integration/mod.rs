mod registry;
mod verifier;

pub use registry::{FlagSpec, IntegrationProvider, IntegrationRegistry, ProviderContext, SecretKind};
pub use verifier::IntegrationVerifier;
