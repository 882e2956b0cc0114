use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::config::Product;
use crate::errors::ClusterError;
use crate::settings::InstallerSettings;

/// The OpenShift/Kubernetes distribution facts a values template may need (§6.5).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenShiftVariables {
    pub version: String,
    pub ingress_domain: String,
    pub minor_version: String,
}

/// The aggregate passed to a [`TemplateEngine`] render call — everything a chart's values
/// template may reference about the installer and the cluster it targets (§6.5).
#[derive(Debug, Clone, Default)]
pub struct Variables {
    pub installer_namespace: String,
    pub installer_settings: Option<InstallerSettings>,
    pub products: Vec<Product>,
    pub openshift: OpenShiftVariables,
}

/// Renders a values template against [`Variables`] (§6.5). The template language itself is out of
/// scope (§1 Non-goals: "chart templating engine implementation") — this is purely the contract a
/// consumer-provided engine (e.g. one backed by `tera`) must satisfy.
pub trait TemplateEngine: Send + Sync {
    fn render(&self, template: &str, variables: &Variables) -> Result<String, ClusterError>;
}

/// Resource kinds a [`HelmClient::visit_release_resources`] visitor is handed, trimmed to what the
/// post-deploy cleanup pass (chart annotation `post-deploy=delete`) needs to know about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseResource {
    pub kind: String,
    pub namespace: String,
    pub name: String,
    pub labels: BTreeMap<String, String>,
}

/// The Helm-invoking collaborator consumed by the deployment loop (§6.5). Install/upgrade/verify
/// mechanics are out of scope (§1) — this trait only names the operations this crate calls.
#[async_trait]
pub trait HelmClient: Send + Sync {
    async fn deploy(&self, chart_path: &str, namespace: &str, values: &str) -> Result<(), ClusterError>;
    async fn verify(&self, chart_name: &str, namespace: &str) -> Result<(), ClusterError>;
    async fn get_notes(&self, chart_name: &str, namespace: &str) -> Result<String, ClusterError>;
    async fn visit_release_resources(
        &self,
        chart_name: &str,
        namespace: &str,
        visitor: &mut dyn FnMut(ReleaseResource),
    ) -> Result<(), ClusterError>;
}
