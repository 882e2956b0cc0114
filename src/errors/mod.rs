pub mod cluster;

use thiserror::Error;

pub use cluster::{ClusterError, ErrorMessageVerbosity};

/// Errors raised while loading, decoding or validating a [`crate::config::ConfigDocument`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("configuration payload is empty")]
    EmptyConfig,

    #[error("failed to unmarshal configuration: {reason}")]
    UnmarshalConfig { reason: String },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("key `{path}` not found")]
    KeyNotFound { path: String },

    #[error("array index {index} out of bounds for `{path}` (length {length})")]
    IndexOutOfBounds { path: String, index: usize, length: usize },

    #[error("cannot navigate through `{path}`: node is a {kind}, not a mapping or sequence")]
    CannotNavigate { path: String, kind: String },

    #[error("product `{name}` not found")]
    ProductNotFound { name: String },
}

/// Sub-reason carried by [`CollectionError::Invalid`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectionErrorReason {
    #[error("duplicate chart name `{0}`")]
    DuplicateChart(String),

    #[error("duplicate product name `{name}` declared by both `{first_chart}` and `{second_chart}`")]
    DuplicateProductName {
        name: String,
        first_chart: String,
        second_chart: String,
    },

    #[error("chart `{chart}` declares a non-integer weight `{value}`")]
    BadWeight { chart: String, value: String },
}

/// Errors raised while constructing a [`crate::dependency::Collection`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid dependency collection: {reason}")]
pub struct CollectionError {
    pub reason: CollectionErrorReason,
}

impl CollectionError {
    pub fn new(reason: CollectionErrorReason) -> Self {
        CollectionError { reason }
    }
}

/// Errors raised by [`crate::config::ConfigStore`] while reading or writing the cluster-resident
/// singleton configuration object (§4.3, invariant 1).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigStoreError {
    #[error("no configuration object labelled `config=true` found in the cluster")]
    ConfigMapNotFound,

    #[error("multiple configuration objects labelled `config=true` found: {}", .locations.join(", "))]
    MultipleConfigMapFound { locations: Vec<String> },

    #[error("configuration object is missing or has an empty `{key}` payload key")]
    IncompleteConfigMap { key: String },
}

/// Errors raised while resolving a [`crate::topology::Topology`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    #[error("product `{product}` has no chart declaring product-name `{product}`")]
    ProductDependencyNotFound { product: String },

    #[error("chart `{chart}` depends on unknown chart `{depends_on}`")]
    DependencyNotFound { chart: String, depends_on: String },

    #[error("circular dependency detected while resolving `{chart}`")]
    CircularDependency { chart: String },
}

/// Errors raised by [`crate::cel::CelEvaluator`] and [`crate::integration::IntegrationVerifier`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrationError {
    #[error("invalid integration expression `{expression}`: {reason}")]
    InvalidExpression { expression: String, reason: String },

    #[error("expression `{expression}` is missing integrations: {}", .missing.join(", "))]
    MissingIntegrations { expression: String, missing: Vec<String> },

    #[error("chart `{chart}` provides unknown integration `{integration}`")]
    UnknownIntegration { chart: String, integration: String },

    #[error("chart `{chart}` is missing prerequisite integrations ({}) required by `{expression}`", .missing.join(", "))]
    PrerequisiteIntegration {
        chart: String,
        expression: String,
        missing: Vec<String>,
    },
}

/// Errors raised while materializing integration Secrets.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecretError {
    #[error("secret `{name}` already exists")]
    SecretAlreadyExists { name: String },
}

/// Aggregate error returned by [`crate::topology_builder::TopologyBuilder::build`]: either the
/// resolver failed to place a chart, or the verifier found an unmet prerequisite.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error(transparent)]
    Resolver(#[from] ResolverError),

    #[error(transparent)]
    Integration(#[from] IntegrationError),
}

/// Top-level error returned by [`crate::phase::PhaseObserver::compute`], covering every layer it
/// reaches through: the config store, the topology builder, and the cluster client.
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Store(#[from] ConfigStoreError),

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Cluster(#[from] ClusterError),
}

impl From<ResolverError> for CoreError {
    fn from(err: ResolverError) -> Self {
        CoreError::Build(BuildError::Resolver(err))
    }
}

impl From<IntegrationError> for CoreError {
    fn from(err: IntegrationError) -> Self {
        CoreError::Build(BuildError::Integration(err))
    }
}
