/// Reverse-domain prefix for every chart annotation this core reads. A chart annotation key is
/// always `{ANNOTATION_PREFIX}/{suffix}`, e.g. `installer.tssc.dev/depends-on`.
pub const ANNOTATION_PREFIX: &str = "installer.tssc.dev";

pub const ANNOTATION_PRODUCT_NAME: &str = "product-name";
pub const ANNOTATION_DEPENDS_ON: &str = "depends-on";
pub const ANNOTATION_WEIGHT: &str = "weight";
pub const ANNOTATION_USE_PRODUCT_NAMESPACE: &str = "use-product-namespace";
pub const ANNOTATION_INTEGRATIONS_PROVIDED: &str = "integrations-provided";
pub const ANNOTATION_INTEGRATIONS_REQUIRED: &str = "integrations-required";
pub const ANNOTATION_POST_DEPLOY: &str = "post-deploy";
pub const ANNOTATION_CONFIG: &str = "config";

pub const POST_DEPLOY_DELETE: &str = "delete";

/// Name of the Helm chart manifest file a directory must contain to be considered a chart.
pub const CHART_MANIFEST_FILE: &str = "Chart.yaml";

/// Top-level key of the installer configuration document.
pub const CONFIG_ROOT_KEY: &str = "tssc";

/// Payload key under which the configuration document is stored inside the cluster ConfigMap.
pub const CONFIG_PAYLOAD_KEY: &str = "config.yaml";

/// Label marking the singleton configuration ConfigMap, and the integration Secrets.
pub const LABEL_CONFIG: &str = "config";
pub const LABEL_INSTALLER_JOB_TYPE: &str = "type";

/// Suffix appended to a chart name to build an integration Secret name: `<appName>-<name>-integration`.
pub const INTEGRATION_SECRET_SUFFIX: &str = "integration";

/// Marker on a deployment Job's command line identifying a dry-run invocation.
pub const DRY_RUN_MARKER: &str = "--dry-run";

/// Default CPU-bound recursion guard: resolving a dependency chain longer than the collection
/// itself can only mean a cycle.
pub const fn max_resolution_depth(collection_len: usize) -> usize {
    collection_len
}
