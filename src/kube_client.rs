use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::batch::v1::Job as K8sJob;
use k8s_openapi::api::core::v1::{ConfigMap as K8sConfigMap, Secret as K8sSecret};
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::Client;

use crate::errors::ClusterError;

/// A labelled Kubernetes ConfigMap, trimmed to what this crate reads and writes (§6.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigMapObject {
    pub namespace: String,
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub data: BTreeMap<String, String>,
}

/// A Kubernetes Secret, trimmed to what this crate reads and writes (§6.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretObject {
    pub namespace: String,
    pub name: String,
    pub secret_type: String,
    pub data: BTreeMap<String, Vec<u8>>,
}

/// Coarse Job lifecycle state relevant to [`crate::phase::InstallerPhase`] (§4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Active,
    Failed,
    Succeeded,
    Unknown,
}

/// The deployment Job (§6.4). `command` is inspected for the dry-run marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobObject {
    pub namespace: String,
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub command: Vec<String>,
    pub state: JobState,
}

impl JobObject {
    pub fn is_dry_run(&self) -> bool {
        self.command.iter().any(|arg| arg == crate::constants::DRY_RUN_MARKER)
    }
}

/// The cluster-facing collaborator consumed by [`crate::config::ConfigStore`] and
/// [`crate::phase::InstallerPhase`] (§6.5). Construction, authentication and retry policy are out
/// of scope (§1) — this trait only names the operations this crate calls.
#[async_trait]
pub trait KubeClient: Send + Sync {
    async fn list_configmaps(&self, label_selector: &str) -> Result<Vec<ConfigMapObject>, ClusterError>;
    async fn create_configmap(&self, configmap: ConfigMapObject) -> Result<(), ClusterError>;
    async fn update_configmap(&self, configmap: ConfigMapObject) -> Result<(), ClusterError>;
    async fn delete_configmap(&self, namespace: &str, name: &str) -> Result<(), ClusterError>;

    async fn list_secrets_all_namespaces(&self, label_selector: &str) -> Result<Vec<SecretObject>, ClusterError>;
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<SecretObject>, ClusterError>;
    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<(), ClusterError>;
    async fn create_secret(&self, secret: SecretObject) -> Result<(), ClusterError>;

    async fn list_jobs(&self, namespace: &str, label_selector: &str) -> Result<Vec<JobObject>, ClusterError>;
    async fn get_cluster_ingress_domain(&self) -> Result<String, ClusterError>;
    async fn ensure_namespace(&self, name: &str) -> Result<(), ClusterError>;
}

/// `kube`-backed implementation used in production (§6.5 consumer-provided collaborator).
pub struct KubernetesClient {
    client: Client,
}

impl KubernetesClient {
    pub fn new(client: Client) -> Self {
        KubernetesClient { client }
    }
}

#[async_trait]
impl KubeClient for KubernetesClient {
    async fn list_configmaps(&self, label_selector: &str) -> Result<Vec<ConfigMapObject>, ClusterError> {
        let api: Api<K8sConfigMap> = Api::all(self.client.clone());
        let params = ListParams::default().labels(label_selector);
        let list = api.list(&params).await?;
        Ok(list
            .into_iter()
            .filter_map(|cm| {
                let metadata = cm.metadata.clone();
                Some(ConfigMapObject {
                    namespace: metadata.namespace?,
                    name: metadata.name?,
                    labels: metadata.labels.unwrap_or_default().into_iter().collect(),
                    data: cm.data.unwrap_or_default().into_iter().collect(),
                })
            })
            .collect())
    }

    async fn create_configmap(&self, configmap: ConfigMapObject) -> Result<(), ClusterError> {
        let api: Api<K8sConfigMap> = Api::namespaced(self.client.clone(), &configmap.namespace);
        let resource = K8sConfigMap {
            metadata: kube::api::ObjectMeta {
                name: Some(configmap.name),
                namespace: Some(configmap.namespace.clone()),
                labels: Some(configmap.labels.into_iter().collect()),
                ..Default::default()
            },
            data: Some(configmap.data.into_iter().collect()),
            ..Default::default()
        };
        api.create(&PostParams::default(), &resource).await?;
        Ok(())
    }

    async fn update_configmap(&self, configmap: ConfigMapObject) -> Result<(), ClusterError> {
        let api: Api<K8sConfigMap> = Api::namespaced(self.client.clone(), &configmap.namespace);
        let resource = K8sConfigMap {
            metadata: kube::api::ObjectMeta {
                name: Some(configmap.name.clone()),
                namespace: Some(configmap.namespace.clone()),
                labels: Some(configmap.labels.into_iter().collect()),
                ..Default::default()
            },
            data: Some(configmap.data.into_iter().collect()),
            ..Default::default()
        };
        api.replace(&configmap.name, &PostParams::default(), &resource).await?;
        Ok(())
    }

    async fn delete_configmap(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        let api: Api<K8sConfigMap> = Api::namespaced(self.client.clone(), namespace);
        api.delete(name, &DeleteParams::default()).await?;
        Ok(())
    }

    async fn list_secrets_all_namespaces(&self, label_selector: &str) -> Result<Vec<SecretObject>, ClusterError> {
        let api: Api<K8sSecret> = Api::all(self.client.clone());
        let params = ListParams::default().labels(label_selector);
        let list = api.list(&params).await?;
        Ok(list
            .into_iter()
            .filter_map(|secret| {
                let metadata = secret.metadata.clone();
                Some(SecretObject {
                    namespace: metadata.namespace?,
                    name: metadata.name?,
                    secret_type: secret.type_.unwrap_or_default(),
                    data: secret
                        .data
                        .unwrap_or_default()
                        .into_iter()
                        .map(|(k, v)| (k, v.0))
                        .collect(),
                })
            })
            .collect())
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<SecretObject>, ClusterError> {
        let api: Api<K8sSecret> = Api::namespaced(self.client.clone(), namespace);
        match api.get_opt(name).await? {
            None => Ok(None),
            Some(secret) => Ok(Some(SecretObject {
                namespace: namespace.to_string(),
                name: name.to_string(),
                secret_type: secret.type_.unwrap_or_default(),
                data: secret
                    .data
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(k, v)| (k, v.0))
                    .collect(),
            })),
        }
    }

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        let api: Api<K8sSecret> = Api::namespaced(self.client.clone(), namespace);
        api.delete(name, &DeleteParams::default()).await?;
        Ok(())
    }

    async fn create_secret(&self, secret: SecretObject) -> Result<(), ClusterError> {
        let api: Api<K8sSecret> = Api::namespaced(self.client.clone(), &secret.namespace);
        let resource = K8sSecret {
            metadata: kube::api::ObjectMeta {
                name: Some(secret.name),
                namespace: Some(secret.namespace.clone()),
                ..Default::default()
            },
            type_: Some(secret.secret_type),
            data: Some(
                secret
                    .data
                    .into_iter()
                    .map(|(k, v)| (k, k8s_openapi::ByteString(v)))
                    .collect(),
            ),
            ..Default::default()
        };
        api.create(&PostParams::default(), &resource).await?;
        Ok(())
    }

    async fn list_jobs(&self, namespace: &str, label_selector: &str) -> Result<Vec<JobObject>, ClusterError> {
        let api: Api<K8sJob> = Api::namespaced(self.client.clone(), namespace);
        let params = ListParams::default().labels(label_selector);
        let list = api.list(&params).await?;
        Ok(list.into_iter().map(job_from_k8s).collect())
    }

    async fn get_cluster_ingress_domain(&self) -> Result<String, ClusterError> {
        // Cluster-specific ingress/route discovery lives with the consumer; here we only define
        // the contract this core depends on.
        Err(ClusterError::new("get_cluster_ingress_domain is not implemented by this client", None))
    }

    async fn ensure_namespace(&self, name: &str) -> Result<(), ClusterError> {
        use k8s_openapi::api::core::v1::Namespace;
        let api: Api<Namespace> = Api::all(self.client.clone());
        if api.get_opt(name).await?.is_some() {
            return Ok(());
        }
        let resource = Namespace {
            metadata: kube::api::ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        api.create(&PostParams::default(), &resource).await?;
        Ok(())
    }
}

fn job_from_k8s(job: K8sJob) -> JobObject {
    let metadata = job.metadata.clone();
    let command = job
        .spec
        .as_ref()
        .and_then(|spec| spec.template.spec.as_ref())
        .and_then(|pod_spec| pod_spec.containers.first())
        .and_then(|container| container.command.clone())
        .unwrap_or_default();

    let status = job.status.as_ref();
    let state = if status.and_then(|s| s.succeeded).unwrap_or(0) > 0 {
        JobState::Succeeded
    } else if status.and_then(|s| s.failed).unwrap_or(0) > 0 {
        JobState::Failed
    } else if status.and_then(|s| s.active).unwrap_or(0) > 0 {
        JobState::Active
    } else {
        JobState::Unknown
    };

    JobObject {
        namespace: metadata.namespace.unwrap_or_default(),
        name: metadata.name.unwrap_or_default(),
        labels: metadata.labels.unwrap_or_default().into_iter().collect(),
        command,
        state,
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod fake {
    //! In-memory [`KubeClient`] fake (§10.4 ambient test tooling) so Resolver, IntegrationVerifier
    //! and InstallerPhase are exercised without a live cluster.
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct FakeKubeClient {
        pub configmaps: Mutex<Vec<ConfigMapObject>>,
        pub secrets: Mutex<Vec<SecretObject>>,
        pub jobs: Mutex<Vec<JobObject>>,
        pub ingress_domain: Mutex<String>,
    }

    #[async_trait]
    impl KubeClient for FakeKubeClient {
        async fn list_configmaps(&self, label_selector: &str) -> Result<Vec<ConfigMapObject>, ClusterError> {
            let (key, value) = parse_selector(label_selector);
            Ok(self
                .configmaps
                .lock()
                .unwrap()
                .iter()
                .filter(|cm| cm.labels.get(&key).map(String::as_str) == Some(value.as_str()))
                .cloned()
                .collect())
        }

        async fn create_configmap(&self, configmap: ConfigMapObject) -> Result<(), ClusterError> {
            self.configmaps.lock().unwrap().push(configmap);
            Ok(())
        }

        async fn update_configmap(&self, configmap: ConfigMapObject) -> Result<(), ClusterError> {
            let mut guard = self.configmaps.lock().unwrap();
            if let Some(existing) = guard
                .iter_mut()
                .find(|cm| cm.namespace == configmap.namespace && cm.name == configmap.name)
            {
                *existing = configmap;
            } else {
                guard.push(configmap);
            }
            Ok(())
        }

        async fn delete_configmap(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
            self.configmaps.lock().unwrap().retain(|cm| !(cm.namespace == namespace && cm.name == name));
            Ok(())
        }

        async fn list_secrets_all_namespaces(&self, label_selector: &str) -> Result<Vec<SecretObject>, ClusterError> {
            let _ = label_selector;
            Ok(self.secrets.lock().unwrap().clone())
        }

        async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<SecretObject>, ClusterError> {
            Ok(self
                .secrets
                .lock()
                .unwrap()
                .iter()
                .find(|secret| secret.namespace == namespace && secret.name == name)
                .cloned())
        }

        async fn delete_secret(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
            self.secrets.lock().unwrap().retain(|secret| !(secret.namespace == namespace && secret.name == name));
            Ok(())
        }

        async fn create_secret(&self, secret: SecretObject) -> Result<(), ClusterError> {
            self.secrets.lock().unwrap().push(secret);
            Ok(())
        }

        async fn list_jobs(&self, namespace: &str, label_selector: &str) -> Result<Vec<JobObject>, ClusterError> {
            let _ = label_selector;
            Ok(self.jobs.lock().unwrap().iter().filter(|job| job.namespace == namespace).cloned().collect())
        }

        async fn get_cluster_ingress_domain(&self) -> Result<String, ClusterError> {
            Ok(self.ingress_domain.lock().unwrap().clone())
        }

        async fn ensure_namespace(&self, _name: &str) -> Result<(), ClusterError> {
            Ok(())
        }
    }

    fn parse_selector(label_selector: &str) -> (String, String) {
        let mut parts = label_selector.splitn(2, '=');
        let key = parts.next().unwrap_or_default().to_string();
        let value = parts.next().unwrap_or_default().to_string();
        (key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeKubeClient;
    use super::*;

    #[tokio::test]
    async fn fake_client_roundtrips_a_configmap() {
        let client = FakeKubeClient::default();
        let mut labels = BTreeMap::new();
        labels.insert("config".to_string(), "true".to_string());
        client
            .create_configmap(ConfigMapObject {
                namespace: "installer".to_string(),
                name: "app-config".to_string(),
                labels,
                data: BTreeMap::new(),
            })
            .await
            .unwrap();

        let found = client.list_configmaps("config=true").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "app-config");
    }

    #[test]
    fn job_is_dry_run_detects_marker() {
        let job = JobObject {
            namespace: "installer".to_string(),
            name: "deploy".to_string(),
            labels: BTreeMap::new(),
            command: vec!["installer".to_string(), "--dry-run".to_string()],
            state: JobState::Active,
        };
        assert!(job.is_dry_run());
    }
}
