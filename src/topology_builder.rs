use crate::config::ConfigDocument;
use crate::dependency::Collection;
use crate::errors::BuildError;
use crate::integration::IntegrationVerifier;
use crate::resolver::Resolver;
use crate::topology::Topology;

/// Thin orchestrator: runs [`Resolver`] then [`IntegrationVerifier`] and returns the single
/// resulting [`Topology`], or the first error either raised (§4.9). This is the unit
/// [`crate::phase::InstallerPhase`] reaches through.
pub struct TopologyBuilder<'a> {
    collection: &'a Collection,
}

impl<'a> TopologyBuilder<'a> {
    pub fn new(collection: &'a Collection) -> Self {
        TopologyBuilder { collection }
    }

    pub fn build(&self, config: &ConfigDocument, verifier: &mut IntegrationVerifier) -> Result<Topology, BuildError> {
        let topology = Resolver::new(self.collection).build(config)?;
        verifier.inspect(&topology)?;
        Ok(topology)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart_source::{Chart, ChartMetadata};
    use std::collections::{HashMap, HashSet};
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

    #[test]
    fn build_runs_resolver_then_verifier() {
        let collection = Collection::new(vec![
            chart("A", &[("integrations-provided", "i1")]),
            chart("B", &[("depends-on", "A"), ("integrations-required", "i1"), ("product-name", "Product B")]),
        ])
        .unwrap();

        let config = ConfigDocument::from_bytes(
            br#"
tssc:
  settings: {}
  products:
    - name: "Product B"
      enabled: true
      namespace: ns-b
"#,
            "inst-ns",
        )
        .unwrap();

        let mut verifier = IntegrationVerifier::from_configured(HashMap::new(), HashSet::from(["i1".to_string()]));
        let topology = TopologyBuilder::new(&collection).build(&config, &mut verifier).unwrap();
        let names: Vec<&str> = topology.iter().map(crate::dependency::Dependency::chart_name).collect();
        assert_eq!(names, vec!["A", "B"]);
    }
}
