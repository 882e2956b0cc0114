use std::collections::HashSet;

use crate::config::{ConfigDocument, Product};
use crate::constants::max_resolution_depth;
use crate::dependency::{Collection, Dependency};
use crate::errors::ResolverError;
use crate::topology::Topology;

/// Consumes a [`Collection`] and a [`ConfigDocument`] and produces a [`Topology`] satisfying every
/// `depends-on` edge, respecting weight for tie-breaking, and assigning namespaces (§4.6).
pub struct Resolver<'a> {
    collection: &'a Collection,
}

impl<'a> Resolver<'a> {
    pub fn new(collection: &'a Collection) -> Self {
        Resolver { collection }
    }

    pub fn build(&self, config: &ConfigDocument) -> Result<Topology, ResolverError> {
        let enabled = config.enabled_products();
        let mut topology = Topology::new();

        for product in &enabled {
            let primary = self.primary_chart(product)?;
            let namespace = product.namespace.clone().unwrap_or_else(|| config.namespace().to_string());
            topology.push_back(Dependency::with_namespace(primary.chart().clone(), namespace));
        }

        for product in &enabled {
            let primary = self.primary_chart(product)?;
            let mut visiting = HashSet::new();
            visiting.insert(primary.chart_name().to_string());
            self.process(primary.chart_name().to_string(), &mut topology, &enabled, config.namespace(), &mut visiting, 0)?;
        }

        let resolved: Vec<&str> = topology.iter().map(Dependency::chart_name).collect();
        tracing::info!(resolved = ?resolved, "topology resolved");

        Ok(topology)
    }

    fn primary_chart(&self, product: &Product) -> Result<&'a Dependency, ResolverError> {
        self.collection
            .product_dependency(&product.name)
            .ok_or_else(|| ResolverError::ProductDependencyNotFound { product: product.name.clone() })
    }

    fn process(
        &self,
        chart_name: String,
        topology: &mut Topology,
        enabled: &[&Product],
        installer_namespace: &str,
        visiting: &mut HashSet<String>,
        depth: usize,
    ) -> Result<(), ResolverError> {
        // Backstop bound: a genuine cycle is caught below via `visiting` before recursion depth
        // can exceed the collection size, but this guards against a correctness regression in
        // that tracking ever turning a cycle into unbounded recursion.
        if depth > max_resolution_depth(self.collection.len()) {
            return Err(ResolverError::CircularDependency { chart: chart_name });
        }

        let dependency = self
            .collection
            .get(&chart_name)
            .expect("chart_name was already placed into the topology from this collection");

        for predecessor_name in dependency.depends_on() {
            // Check the in-flight recursion stack before topology membership: a predecessor that
            // is a back-edge to an ancestor currently being expanded is a cycle even though that
            // ancestor was already placed into the topology when its own expansion began (§4.6
            // step 5, §3.3 invariant 3).
            if visiting.contains(&predecessor_name) {
                return Err(ResolverError::CircularDependency { chart: predecessor_name });
            }
            if topology.contains(&predecessor_name) {
                continue;
            }

            let predecessor = self.collection.get(&predecessor_name).ok_or_else(|| ResolverError::DependencyNotFound {
                chart: chart_name.clone(),
                depends_on: predecessor_name.clone(),
            })?;

            let namespace = namespace_for(predecessor, enabled, installer_namespace);
            tracing::debug!(chart = %predecessor_name, before = %chart_name, namespace = %namespace, "inserting dependency");
            let new_dependency = Dependency::with_namespace(predecessor.chart().clone(), namespace);
            topology.prepend_before(&chart_name, vec![new_dependency]);

            visiting.insert(predecessor_name.clone());
            self.process(predecessor_name.clone(), topology, enabled, installer_namespace, visiting, depth + 1)?;
            visiting.remove(&predecessor_name);
        }

        Ok(())
    }
}

/// If `dependency` pins itself to an enabled product's namespace via `use-product-namespace`, uses
/// that product's namespace; otherwise falls back to the installer namespace (§4.6 scenario 4).
fn namespace_for(dependency: &Dependency, enabled: &[&Product], installer_namespace: &str) -> String {
    let pinned_product = dependency.use_product_namespace();
    if pinned_product.is_empty() {
        return installer_namespace.to_string();
    }
    enabled
        .iter()
        .find(|product| product.name == pinned_product)
        .and_then(|product| product.namespace.clone())
        .unwrap_or_else(|| installer_namespace.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart_source::{Chart, ChartMetadata};
    use std::collections::HashMap;
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

    fn config(yaml: &str) -> ConfigDocument {
        ConfigDocument::from_bytes(yaml.as_bytes(), "inst-ns").unwrap()
    }

    #[test]
    fn linear_chain_resolves_in_dependency_order() {
        let collection = Collection::new(vec![
            chart("A", &[]),
            chart("B", &[("depends-on", "A")]),
            chart("C", &[("depends-on", "B"), ("product-name", "Product C")]),
        ])
        .unwrap();

        let doc = config(
            r#"
tssc:
  settings: {}
  products:
    - name: "Product C"
      enabled: true
      namespace: ns-c
"#,
        );

        let topology = Resolver::new(&collection).build(&doc).unwrap();
        let names: Vec<&str> = topology.iter().map(Dependency::chart_name).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn weight_tiebreak_orders_siblings_by_weight() {
        let collection = Collection::new(vec![
            chart("F", &[("weight", "0")]),
            chart("O", &[("weight", "10"), ("depends-on", "F")]),
            chart("I", &[("weight", "5"), ("depends-on", "F")]),
            chart("P", &[("depends-on", "I,O"), ("product-name", "Product P")]),
        ])
        .unwrap();

        let doc = config(
            r#"
tssc:
  settings: {}
  products:
    - name: "Product P"
      enabled: true
      namespace: ns-p
"#,
        );

        let topology = Resolver::new(&collection).build(&doc).unwrap();
        let names: Vec<&str> = topology.iter().map(Dependency::chart_name).collect();
        assert_eq!(names, vec!["F", "I", "O", "P"]);
    }

    #[test]
    fn product_namespace_pinning() {
        let collection = Collection::new(vec![
            chart("X", &[("use-product-namespace", "Product A")]),
            chart("Primary", &[("depends-on", "X"), ("product-name", "Product A")]),
        ])
        .unwrap();

        let doc = config(
            r#"
tssc:
  settings: {}
  products:
    - name: "Product A"
      enabled: true
      namespace: app-a
"#,
        );

        let topology = Resolver::new(&collection).build(&doc).unwrap();
        assert_eq!(topology.get("X").unwrap().namespace(), "app-a");
    }

    #[test]
    fn unknown_dependency_name_is_an_error() {
        let collection = Collection::new(vec![chart("C", &[("depends-on", "missing"), ("product-name", "Product C")])]).unwrap();
        let doc = config(
            r#"
tssc:
  settings: {}
  products:
    - name: "Product C"
      enabled: true
      namespace: ns-c
"#,
        );
        let err = Resolver::new(&collection).build(&doc).unwrap_err();
        assert!(matches!(err, ResolverError::DependencyNotFound { .. }));
    }

    #[test]
    fn circular_dependency_is_detected() {
        let collection = Collection::new(vec![
            chart("A", &[("depends-on", "B"), ("product-name", "Product P")]),
            chart("B", &[("depends-on", "C")]),
            chart("C", &[("depends-on", "A")]),
        ])
        .unwrap();
        let doc = config(
            r#"
tssc:
  settings: {}
  products:
    - name: "Product P"
      enabled: true
      namespace: ns-p
"#,
        );
        let err = Resolver::new(&collection).build(&doc).unwrap_err();
        assert!(matches!(err, ResolverError::CircularDependency { .. }));
    }

    #[test]
    fn missing_product_dependency_is_an_error() {
        let collection = Collection::new(vec![chart("Unrelated", &[])]).unwrap();
        let doc = config(
            r#"
tssc:
  settings: {}
  products:
    - name: "Product C"
      enabled: true
      namespace: ns-c
"#,
        );
        let err = Resolver::new(&collection).build(&doc).unwrap_err();
        assert!(matches!(err, ResolverError::ProductDependencyNotFound { .. }));
    }

    #[tracing_test::traced_test]
    #[test]
    fn resolution_emits_the_resolved_sequence_at_info_level() {
        let collection = Collection::new(vec![
            chart("A", &[]),
            chart("B", &[("depends-on", "A"), ("product-name", "Product B")]),
        ])
        .unwrap();
        let doc = config(
            r#"
tssc:
  settings: {}
  products:
    - name: "Product B"
      enabled: true
      namespace: ns-b
"#,
        );
        Resolver::new(&collection).build(&doc).unwrap();
        assert!(logs_contain("topology resolved"));
    }
}
