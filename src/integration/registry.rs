use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::errors::IntegrationError;
use crate::kube_client::KubeClient;
use crate::settings::InstallerSettings;

/// A single CLI flag an [`IntegrationProvider`] needs the outer command-line layer to register.
/// The core never parses flags itself (§1 out-of-scope: CLI command parsing); this is a plain
/// description the consumer's flag library turns into whatever it wants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSpec {
    pub name: String,
    pub required: bool,
    pub help: String,
}

impl FlagSpec {
    pub fn new(name: impl Into<String>, required: bool, help: impl Into<String>) -> Self {
        FlagSpec {
            name: name.into(),
            required,
            help: help.into(),
        }
    }
}

/// The Kubernetes Secret type an [`IntegrationProvider`] materializes (§6.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    Opaque,
    DockerConfigJson,
}

impl SecretKind {
    pub fn as_kubernetes_type(&self) -> &'static str {
        match self {
            SecretKind::Opaque => "Opaque",
            SecretKind::DockerConfigJson => "kubernetes.io/dockerconfigjson",
        }
    }
}

/// Context passed to a provider when it materializes its Secret payload — currently just the
/// installer's own identity; providers that need cluster access hold their own client handle.
pub struct ProviderContext<'a> {
    pub settings: &'a InstallerSettings,
}

/// An integration credential provider (§4.11). The transport each concrete provider speaks to a
/// third party (GitHub App provisioning, a container registry, …) is out of this crate's scope
/// (§1); only the shape below is.
#[async_trait]
pub trait IntegrationProvider: Send + Sync {
    fn name(&self) -> &str;
    fn persistent_flags(&self) -> Vec<FlagSpec>;
    fn validate(&self) -> Result<(), IntegrationError>;
    fn kind(&self) -> SecretKind;
    async fn data(&self, ctx: &ProviderContext<'_>) -> Result<BTreeMap<String, Vec<u8>>, IntegrationError>;
    fn set_argument(&mut self, key: &str, value: &str) -> Result<(), IntegrationError>;
}

/// Named set of integration providers (§4.11). Registration is a startup-time operation performed
/// by the consumer process and injected here — there is no process-global provider registry.
#[derive(Default)]
pub struct IntegrationRegistry {
    providers: BTreeMap<String, Box<dyn IntegrationProvider>>,
}

impl IntegrationRegistry {
    pub fn new() -> Self {
        IntegrationRegistry { providers: BTreeMap::new() }
    }

    pub fn register(&mut self, provider: Box<dyn IntegrationProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    pub fn get(&self, name: &str) -> Option<&dyn IntegrationProvider> {
        self.providers.get(name).map(AsRef::as_ref)
    }

    /// Names of every provider with a Secret already present in the cluster.
    pub async fn configured_names(&self, client: &dyn KubeClient, settings: &InstallerSettings) -> Vec<String> {
        let mut found = Vec::new();
        for name in self.names() {
            let secret_name = settings.integration_secret_name(name);
            if let Ok(Some(_)) = client.get_secret(&settings.installer_namespace, &secret_name).await {
                found.push(name.to_string());
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubProvider {
        name: String,
    }

    #[async_trait]
    impl IntegrationProvider for StubProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn persistent_flags(&self) -> Vec<FlagSpec> {
            vec![FlagSpec::new("client-id", true, "OAuth client id")]
        }

        fn validate(&self) -> Result<(), IntegrationError> {
            Ok(())
        }

        fn kind(&self) -> SecretKind {
            SecretKind::Opaque
        }

        async fn data(&self, _ctx: &ProviderContext<'_>) -> Result<BTreeMap<String, Vec<u8>>, IntegrationError> {
            Ok(BTreeMap::new())
        }

        fn set_argument(&mut self, _key: &str, _value: &str) -> Result<(), IntegrationError> {
            Ok(())
        }
    }

    #[test]
    fn register_and_lookup_by_name() {
        let mut registry = IntegrationRegistry::new();
        registry.register(Box::new(StubProvider { name: "github".to_string() }));
        assert_eq!(registry.names(), vec!["github"]);
        assert!(registry.get("github").is_some());
        assert!(registry.get("gitlab").is_none());
    }
}
