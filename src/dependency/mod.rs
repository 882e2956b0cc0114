mod collection;

pub use collection::Collection;

use crate::chart_source::Chart;
use crate::constants::{
    ANNOTATION_DEPENDS_ON, ANNOTATION_INTEGRATIONS_PROVIDED, ANNOTATION_INTEGRATIONS_REQUIRED, ANNOTATION_POST_DEPLOY,
    ANNOTATION_PRODUCT_NAME, ANNOTATION_USE_PRODUCT_NAMESPACE, ANNOTATION_WEIGHT, POST_DEPLOY_DELETE,
};

/// A Helm chart together with its assigned namespace and decoded annotation metadata (§3.1).
///
/// The namespace starts empty and is filled in by the [`crate::resolver::Resolver`] as the chart
/// is placed into a [`crate::topology::Topology`] — invariant 2 in §3.3 requires every chart in a
/// *built* topology to carry a non-empty one, but a freshly-constructed `Dependency` makes no such
/// promise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    chart: Chart,
    namespace: String,
}

impl Dependency {
    pub fn new(chart: Chart) -> Self {
        Dependency {
            chart,
            namespace: String::new(),
        }
    }

    pub fn with_namespace(chart: Chart, namespace: impl Into<String>) -> Self {
        Dependency {
            chart,
            namespace: namespace.into(),
        }
    }

    pub fn chart_name(&self) -> &str {
        self.chart.name()
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn set_namespace(&mut self, namespace: impl Into<String>) {
        self.namespace = namespace.into();
    }

    pub fn product_name(&self) -> &str {
        self.chart.annotation(ANNOTATION_PRODUCT_NAME)
    }

    pub fn use_product_namespace(&self) -> &str {
        self.chart.annotation(ANNOTATION_USE_PRODUCT_NAMESPACE)
    }

    /// Parses the `weight` annotation as an integer, defaulting to `0` when absent (§3.1).
    /// Returns `Err` with the raw string when the annotation is present but not an integer —
    /// Collection construction turns this into `CollectionErrorReason::BadWeight` (§4.5).
    pub fn weight(&self) -> Result<i64, String> {
        let raw = self.chart.annotation(ANNOTATION_WEIGHT);
        if raw.is_empty() {
            return Ok(0);
        }
        raw.parse::<i64>().map_err(|_| raw.to_string())
    }

    /// Comma-separated, whitespace-trimmed, empties skipped (§4.4).
    pub fn depends_on(&self) -> Vec<String> {
        split_list(self.chart.annotation(ANNOTATION_DEPENDS_ON))
    }

    pub fn integrations_provided(&self) -> Vec<String> {
        split_list(self.chart.annotation(ANNOTATION_INTEGRATIONS_PROVIDED))
    }

    /// Raw CEL expression; an empty string means "no prerequisite" (§4.8, trivially `Ok`).
    pub fn integrations_required(&self) -> &str {
        self.chart.annotation(ANNOTATION_INTEGRATIONS_REQUIRED)
    }

    /// Whether this chart's release resources are marked for garbage collection between
    /// deployments — `post-deploy: delete` (§3.1). The actual sweep (listing and deleting the
    /// labelled resources) is a `HelmClient::visit_release_resources` consumer concern (§1,
    /// §6.5); this accessor only surfaces the chart's own declared intent.
    pub fn post_deploy_delete(&self) -> bool {
        self.chart.annotation(ANNOTATION_POST_DEPLOY) == POST_DEPLOY_DELETE
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart_source::ChartMetadata;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn chart_with_annotations(name: &str, annotations: &[(&str, &str)]) -> Chart {
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

    #[test]
    fn depends_on_trims_and_skips_empties() {
        let dep = Dependency::new(chart_with_annotations("b", &[("depends-on", "a, , c ")]));
        assert_eq!(dep.depends_on(), vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn weight_defaults_to_zero() {
        let dep = Dependency::new(chart_with_annotations("a", &[]));
        assert_eq!(dep.weight(), Ok(0));
    }

    #[test]
    fn weight_rejects_non_integer() {
        let dep = Dependency::new(chart_with_annotations("a", &[("weight", "not-a-number")]));
        assert_eq!(dep.weight(), Err("not-a-number".to_string()));
    }

    #[test]
    fn post_deploy_delete_only_true_for_the_delete_value() {
        let marked = Dependency::new(chart_with_annotations("a", &[("post-deploy", "delete")]));
        assert!(marked.post_deploy_delete());

        let unmarked = Dependency::new(chart_with_annotations("a", &[]));
        assert!(!unmarked.post_deploy_delete());

        let other_value = Dependency::new(chart_with_annotations("a", &[("post-deploy", "keep")]));
        assert!(!other_value.post_deploy_delete());
    }
}
