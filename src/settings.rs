/// Process-level bootstrap parameters every core component is constructed with. Distinct from
/// [`crate::config::ConfigDocument`], which is the user-editable installer configuration: this
/// struct is the installer's own identity, fixed for the lifetime of the process and supplied by
/// the consumer (who owns CLI flag / env var parsing — out of scope here).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerSettings {
    /// Short name used to derive the ConfigMap (`<app_name>-config`) and Secret
    /// (`<app_name>-<integration>-integration`) naming scheme.
    pub app_name: String,
    /// Default namespace for infrastructure-level charts; the fallback for any chart that does
    /// not resolve to a product namespace.
    pub installer_namespace: String,
    /// Repository URI embedded in the deployment Job label selector (`type=installer-job.<uri>`).
    pub repo_uri: String,
}

impl InstallerSettings {
    pub fn new(app_name: impl Into<String>, installer_namespace: impl Into<String>, repo_uri: impl Into<String>) -> Self {
        InstallerSettings {
            app_name: app_name.into(),
            installer_namespace: installer_namespace.into(),
            repo_uri: repo_uri.into(),
        }
    }

    pub fn config_map_name(&self) -> String {
        format!("{}-config", self.app_name)
    }

    pub fn integration_secret_name(&self, integration_name: &str) -> String {
        format!("{}-{}-{}", self.app_name, integration_name, crate::constants::INTEGRATION_SECRET_SUFFIX)
    }

    pub fn deployment_job_label_selector(&self) -> String {
        format!("{}=installer-job.{}", crate::constants::LABEL_INSTALLER_JOB_TYPE, self.repo_uri)
    }
}
