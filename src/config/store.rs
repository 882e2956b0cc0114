use std::collections::BTreeMap;

use crate::constants::{CONFIG_PAYLOAD_KEY, LABEL_CONFIG};
use crate::errors::{ConfigError, ConfigStoreError};
use crate::kube_client::{ConfigMapObject, KubeClient};
use crate::settings::InstallerSettings;

use super::document::ConfigDocument;

/// Cluster-resident persistence of the singleton [`ConfigDocument`] (§4.3, invariant 1). Name is
/// `<app_name>-config`; label `config=true`; single data key `config.yaml`.
pub struct ConfigStore<'a> {
    client: &'a dyn KubeClient,
    settings: &'a InstallerSettings,
}

impl<'a> ConfigStore<'a> {
    pub fn new(client: &'a dyn KubeClient, settings: &'a InstallerSettings) -> Self {
        ConfigStore { client, settings }
    }

    /// Lists every object labelled `config=true` across all namespaces. Zero ⇒ `ConfigMapNotFound`;
    /// two or more ⇒ `MultipleConfigMapFound` naming every `namespace/name`; exactly one ⇒ parses
    /// its payload and returns it alongside the namespace it lives in.
    pub async fn get(&self) -> Result<(ConfigDocument, String), CoreConfigStoreError> {
        let selector = format!("{LABEL_CONFIG}=true");
        let matches = self
            .client
            .list_configmaps(&selector)
            .await
            .map_err(CoreConfigStoreError::Cluster)?;

        match matches.len() {
            0 => Err(CoreConfigStoreError::Store(ConfigStoreError::ConfigMapNotFound)),
            1 => {
                let configmap = &matches[0];
                let payload = configmap.data.get(CONFIG_PAYLOAD_KEY).filter(|payload| !payload.is_empty()).ok_or_else(|| {
                    CoreConfigStoreError::Store(ConfigStoreError::IncompleteConfigMap {
                        key: CONFIG_PAYLOAD_KEY.to_string(),
                    })
                })?;
                let document = ConfigDocument::from_bytes(payload.as_bytes(), configmap.namespace.clone())
                    .map_err(CoreConfigStoreError::Config)?;
                Ok((document, configmap.namespace.clone()))
            }
            _ => {
                let locations: Vec<String> = matches.iter().map(|cm| format!("{}/{}", cm.namespace, cm.name)).collect();
                Err(CoreConfigStoreError::Store(ConfigStoreError::MultipleConfigMapFound { locations }))
            }
        }
    }

    pub async fn create(&self, document: &ConfigDocument) -> Result<(), CoreConfigStoreError> {
        let configmap = self.to_configmap(document).map_err(CoreConfigStoreError::Config)?;
        self.client.create_configmap(configmap).await.map_err(CoreConfigStoreError::Cluster)
    }

    pub async fn update(&self, document: &ConfigDocument) -> Result<(), CoreConfigStoreError> {
        let configmap = self.to_configmap(document).map_err(CoreConfigStoreError::Config)?;
        self.client.update_configmap(configmap).await.map_err(CoreConfigStoreError::Cluster)
    }

    pub async fn delete(&self) -> Result<(), CoreConfigStoreError> {
        self.client
            .delete_configmap(&self.settings.installer_namespace, &self.settings.config_map_name())
            .await
            .map_err(CoreConfigStoreError::Cluster)
    }

    fn to_configmap(&self, document: &ConfigDocument) -> Result<ConfigMapObject, ConfigError> {
        let payload = String::from_utf8(document.marshal()?).expect("serde_yaml always emits valid utf-8");
        let mut data = BTreeMap::new();
        data.insert(CONFIG_PAYLOAD_KEY.to_string(), payload);
        let mut labels = BTreeMap::new();
        labels.insert(LABEL_CONFIG.to_string(), "true".to_string());
        Ok(ConfigMapObject {
            namespace: self.settings.installer_namespace.clone(),
            name: self.settings.config_map_name(),
            labels,
            data,
        })
    }
}

/// Union of the failure modes `ConfigStore` can surface: a cluster read/write failure, a
/// singleton-invariant violation, or a payload that failed to parse.
#[derive(Debug, Clone)]
pub enum CoreConfigStoreError {
    Cluster(crate::errors::ClusterError),
    Store(ConfigStoreError),
    Config(ConfigError),
}

impl std::fmt::Display for CoreConfigStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreConfigStoreError::Cluster(err) => write!(f, "{err}"),
            CoreConfigStoreError::Store(err) => write!(f, "{err}"),
            CoreConfigStoreError::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CoreConfigStoreError {}

impl From<CoreConfigStoreError> for crate::errors::CoreError {
    fn from(err: CoreConfigStoreError) -> Self {
        match err {
            CoreConfigStoreError::Cluster(err) => crate::errors::CoreError::Cluster(err),
            CoreConfigStoreError::Store(err) => crate::errors::CoreError::Store(err),
            CoreConfigStoreError::Config(err) => crate::errors::CoreError::Config(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kube_client::fake::FakeKubeClient;

    fn settings() -> InstallerSettings {
        InstallerSettings::new("tssc", "tssc-installer", "github.com/example/tssc")
    }

    #[tokio::test]
    async fn get_reports_not_found_when_empty() {
        let client = FakeKubeClient::default();
        let settings = settings();
        let store = ConfigStore::new(&client, &settings);
        let err = store.get().await.unwrap_err();
        assert!(matches!(err, CoreConfigStoreError::Store(ConfigStoreError::ConfigMapNotFound)));
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let client = FakeKubeClient::default();
        let settings = settings();
        let store = ConfigStore::new(&client, &settings);

        let document = ConfigDocument::from_bytes(
            b"tssc:\n  settings: {}\n  products: []\n",
            settings.installer_namespace.clone(),
        )
        .unwrap();
        store.create(&document).await.unwrap();

        let (loaded, namespace) = store.get().await.unwrap();
        assert_eq!(namespace, settings.installer_namespace);
        assert!(loaded.enabled_products().is_empty());
    }

    #[tokio::test]
    async fn get_reports_multiple_when_two_exist() {
        let client = FakeKubeClient::default();
        let mut labels = BTreeMap::new();
        labels.insert(LABEL_CONFIG.to_string(), "true".to_string());
        for namespace in ["ns-a", "ns-b"] {
            client
                .create_configmap(ConfigMapObject {
                    namespace: namespace.to_string(),
                    name: "tssc-config".to_string(),
                    labels: labels.clone(),
                    data: BTreeMap::new(),
                })
                .await
                .unwrap();
        }
        let settings = settings();
        let store = ConfigStore::new(&client, &settings);
        let err = store.get().await.unwrap_err();
        assert!(matches!(err, CoreConfigStoreError::Store(ConfigStoreError::MultipleConfigMapFound { .. })));
    }
}
