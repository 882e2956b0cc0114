use crate::config::{ConfigStore, CoreConfigStoreError};
use crate::dependency::Collection;
use crate::errors::{ConfigStoreError, CoreError};
use crate::integration::{IntegrationRegistry, IntegrationVerifier};
use crate::kube_client::{JobState, KubeClient};
use crate::settings::InstallerSettings;
use crate::topology_builder::TopologyBuilder;

/// One of five forward-progressing states plus the error state, derived from cluster
/// observations (§4.10). This is the façade the interactive assistant surface observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallerPhase {
    AwaitingConfiguration,
    AwaitingIntegrations,
    ReadyToDeploy,
    Deploying,
    Completed,
    InstallerError,
}

/// Derives [`InstallerPhase`] from the triple (ConfigStore state, TopologyBuilder result,
/// deployment-job state) — a pure function of cluster observations, re-run on every poll.
pub struct PhaseObserver<'a> {
    client: &'a dyn KubeClient,
    settings: &'a InstallerSettings,
    collection: &'a Collection,
    registry: &'a IntegrationRegistry,
}

impl<'a> PhaseObserver<'a> {
    pub fn new(
        client: &'a dyn KubeClient,
        settings: &'a InstallerSettings,
        collection: &'a Collection,
        registry: &'a IntegrationRegistry,
    ) -> Self {
        PhaseObserver {
            client,
            settings,
            collection,
            registry,
        }
    }

    /// Derives the current phase. `previous` is the last phase observed by the caller, if any —
    /// used only to log the transition (§10.1); it plays no role in the derivation itself, which
    /// is a pure function of cluster state (§4.10).
    pub async fn compute(&self, previous: Option<InstallerPhase>) -> (InstallerPhase, Option<CoreError>) {
        let (phase, err) = self.compute_inner().await;
        tracing::info!(?previous, new = ?phase, "installer phase transition");
        (phase, err)
    }

    async fn compute_inner(&self) -> (InstallerPhase, Option<CoreError>) {
        let store = ConfigStore::new(self.client, self.settings);
        let document = match store.get().await {
            Err(CoreConfigStoreError::Store(ConfigStoreError::ConfigMapNotFound)) => {
                return (InstallerPhase::AwaitingConfiguration, Some(CoreError::Store(ConfigStoreError::ConfigMapNotFound)))
            }
            Err(err) => return (InstallerPhase::InstallerError, Some(err.into())),
            Ok((document, _namespace)) => document,
        };

        let known_names: Vec<String> = self.registry.names().into_iter().map(str::to_string).collect();
        let mut verifier = IntegrationVerifier::new(self.client, self.settings, known_names).await;
        let topology = match TopologyBuilder::new(self.collection).build(&document, &mut verifier) {
            Err(err) => return (InstallerPhase::AwaitingIntegrations, Some(err.into())),
            Ok(topology) => topology,
        };
        let _ = topology;

        let selector = self.settings.deployment_job_label_selector();
        let jobs = match self.client.list_jobs(&self.settings.installer_namespace, &selector).await {
            Err(err) => return (InstallerPhase::InstallerError, Some(err.into())),
            Ok(jobs) => jobs,
        };

        let deployment_job = jobs.into_iter().find(|job| !job.is_dry_run());
        let phase = match deployment_job.map(|job| job.state) {
            Some(JobState::Active) | Some(JobState::Failed) => InstallerPhase::Deploying,
            Some(JobState::Succeeded) => InstallerPhase::Completed,
            Some(JobState::Unknown) | None => InstallerPhase::ReadyToDeploy,
        };
        (phase, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart_source::{Chart, ChartMetadata};
    use crate::kube_client::fake::FakeKubeClient;
    use crate::kube_client::JobObject;
    use std::collections::{BTreeMap, HashMap};
    use std::path::PathBuf;

    fn chart(name: &str, annotations: &[(&str, &str)]) -> Chart {
        let mut map = HashMap::new();
        for (k, v) in annotations {
            map.insert(format!("installer.tssc.dev/{k}"), v.to_string());
        }
        Chart::new(
            ChartMetadata {
                name: name.to_string(),
                annotations: map,
                ..Default::default()
            },
            PathBuf::from(name),
        )
    }

    fn settings() -> InstallerSettings {
        InstallerSettings::new("tssc", "tssc-installer", "github.com/example/tssc")
    }

    #[tokio::test]
    async fn no_config_object_is_awaiting_configuration() {
        let client = FakeKubeClient::default();
        let settings = settings();
        let collection = Collection::new(vec![]).unwrap();
        let registry = IntegrationRegistry::new();
        let observer = PhaseObserver::new(&client, &settings, &collection, &registry);
        let (phase, err) = observer.compute(None).await;
        assert_eq!(phase, InstallerPhase::AwaitingConfiguration);
        assert!(err.is_some());
    }

    #[tokio::test]
    async fn built_topology_with_no_job_is_ready_to_deploy() {
        let client = FakeKubeClient::default();
        let settings = settings();
        let collection = Collection::new(vec![chart("A", &[("product-name", "Product A")])]).unwrap();
        let registry = IntegrationRegistry::new();

        let mut labels = BTreeMap::new();
        labels.insert("config".to_string(), "true".to_string());
        let mut data = BTreeMap::new();
        data.insert(
            "config.yaml".to_string(),
            "tssc:\n  settings: {}\n  products:\n    - name: \"Product A\"\n      enabled: true\n      namespace: app-a\n".to_string(),
        );
        client
            .create_configmap(crate::kube_client::ConfigMapObject {
                namespace: settings.installer_namespace.clone(),
                name: settings.config_map_name(),
                labels,
                data,
            })
            .await
            .unwrap();

        let observer = PhaseObserver::new(&client, &settings, &collection, &registry);
        let (phase, err) = observer.compute(None).await;
        assert_eq!(phase, InstallerPhase::ReadyToDeploy);
        assert!(err.is_none());
    }

    #[tokio::test]
    async fn dry_run_job_is_treated_as_absent() {
        let client = FakeKubeClient::default();
        let settings = settings();
        let collection = Collection::new(vec![chart("A", &[("product-name", "Product A")])]).unwrap();
        let registry = IntegrationRegistry::new();

        let mut labels = BTreeMap::new();
        labels.insert("config".to_string(), "true".to_string());
        let mut data = BTreeMap::new();
        data.insert(
            "config.yaml".to_string(),
            "tssc:\n  settings: {}\n  products:\n    - name: \"Product A\"\n      enabled: true\n      namespace: app-a\n".to_string(),
        );
        client
            .create_configmap(crate::kube_client::ConfigMapObject {
                namespace: settings.installer_namespace.clone(),
                name: settings.config_map_name(),
                labels,
                data,
            })
            .await
            .unwrap();

        client.jobs.lock().unwrap().push(JobObject {
            namespace: settings.installer_namespace.clone(),
            name: "deploy-dry-run".to_string(),
            labels: BTreeMap::new(),
            command: vec!["installer".to_string(), "--dry-run".to_string()],
            state: crate::kube_client::JobState::Active,
        });

        let observer = PhaseObserver::new(&client, &settings, &collection, &registry);
        let (phase, _err) = observer.compute(None).await;
        assert_eq!(phase, InstallerPhase::ReadyToDeploy);
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn compute_logs_the_phase_transition() {
        let client = FakeKubeClient::default();
        let settings = settings();
        let collection = Collection::new(vec![]).unwrap();
        let registry = IntegrationRegistry::new();
        let observer = PhaseObserver::new(&client, &settings, &collection, &registry);
        observer.compute(Some(InstallerPhase::AwaitingConfiguration)).await;
        assert!(logs_contain("installer phase transition"));
    }
}
