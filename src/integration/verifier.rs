use std::collections::HashMap;

use crate::cel::CelEvaluator;
use crate::errors::IntegrationError;
use crate::kube_client::KubeClient;
use crate::settings::InstallerSettings;
use crate::topology::Topology;

/// Walks a built [`Topology`], threading a `configured` integration-name → bool map through it:
/// evaluating each chart's required-integrations expression against the current state, then
/// marking its provided integrations as satisfied for everything deployed after it (§4.8).
pub struct IntegrationVerifier {
    configured: HashMap<String, bool>,
    evaluator: CelEvaluator,
    known_names: std::collections::HashSet<String>,
}

impl IntegrationVerifier {
    /// Seeds `configured` from which known integration Secrets already exist in the cluster.
    pub async fn new(
        client: &dyn KubeClient,
        settings: &InstallerSettings,
        known_names: impl IntoIterator<Item = String>,
    ) -> Self {
        let known_names: std::collections::HashSet<String> = known_names.into_iter().collect();
        let mut configured = HashMap::new();
        for name in &known_names {
            let secret_name = settings.integration_secret_name(name);
            let exists = client
                .get_secret(&settings.installer_namespace, &secret_name)
                .await
                .ok()
                .flatten()
                .is_some();
            configured.insert(name.clone(), exists);
        }
        let evaluator = CelEvaluator::new(known_names.iter().cloned());
        IntegrationVerifier {
            configured,
            evaluator,
            known_names,
        }
    }

    /// Constructs a verifier from an already-seeded `configured` map, bypassing cluster I/O — used
    /// by tests and anywhere the caller has already resolved Secret existence.
    pub fn from_configured(configured: HashMap<String, bool>, known_names: impl IntoIterator<Item = String>) -> Self {
        let known_names: std::collections::HashSet<String> = known_names.into_iter().collect();
        let evaluator = CelEvaluator::new(known_names.iter().cloned());
        IntegrationVerifier {
            configured,
            evaluator,
            known_names,
        }
    }

    pub fn configured(&self) -> &HashMap<String, bool> {
        &self.configured
    }

    /// Walks `topology` in its established order (§4.8). Order matters: a chart that provides an
    /// integration must appear before any chart that requires it — that's the resolver's
    /// responsibility; this only checks it holds.
    pub fn inspect(&mut self, topology: &Topology) -> Result<(), IntegrationError> {
        for dependency in topology.iter() {
            let expression = dependency.integrations_required();
            tracing::info!(
                chart = %dependency.chart_name(),
                required = %expression,
                provided = ?dependency.integrations_provided(),
                "checking chart integrations"
            );
            if !expression.trim().is_empty() {
                self.evaluator.evaluate(&self.configured, expression).map_err(|err| match err {
                    IntegrationError::MissingIntegrations { missing, .. } => IntegrationError::PrerequisiteIntegration {
                        chart: dependency.chart_name().to_string(),
                        expression: expression.to_string(),
                        missing,
                    },
                    other => other,
                })?;
            }

            for provided in dependency.integrations_provided() {
                if !self.known_names.contains(&provided) {
                    return Err(IntegrationError::UnknownIntegration {
                        chart: dependency.chart_name().to_string(),
                        integration: provided,
                    });
                }
                self.configured.entry(provided).and_modify(|v| *v = true).or_insert(true);
            }
        }
        Ok(())
    }
}
