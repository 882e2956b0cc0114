use std::collections::BTreeMap;

use crate::chart_source::Chart;
use crate::errors::{CollectionError, CollectionErrorReason};

use super::Dependency;

/// An immutable, keyed set of [`Dependency`] built once from a chart list (§4.5). Backed by a
/// `BTreeMap` so iteration is always in sorted chart-name order — §5 requires this determinism
/// for reproducible topology output.
#[derive(Debug, Clone)]
pub struct Collection {
    by_chart_name: BTreeMap<String, Dependency>,
}

impl Collection {
    /// Builds a `Collection` from a chart list, rejecting duplicate chart names, duplicate
    /// product names, and non-integer weights (§3.3 invariant 5, §4.5).
    pub fn new(charts: Vec<Chart>) -> Result<Self, CollectionError> {
        let mut by_chart_name = BTreeMap::new();
        let mut product_owner: BTreeMap<String, String> = BTreeMap::new();

        for chart in charts {
            let dependency = Dependency::new(chart);
            let chart_name = dependency.chart_name().to_string();

            if by_chart_name.contains_key(&chart_name) {
                return Err(CollectionError::new(CollectionErrorReason::DuplicateChart(chart_name)));
            }

            dependency.weight().map_err(|value| {
                CollectionError::new(CollectionErrorReason::BadWeight {
                    chart: chart_name.clone(),
                    value,
                })
            })?;

            let product_name = dependency.product_name().to_string();
            if !product_name.is_empty() {
                if let Some(existing) = product_owner.get(&product_name) {
                    return Err(CollectionError::new(CollectionErrorReason::DuplicateProductName {
                        name: product_name,
                        first_chart: existing.clone(),
                        second_chart: chart_name,
                    }));
                }
                product_owner.insert(product_name, chart_name.clone());
            }

            by_chart_name.insert(chart_name, dependency);
        }

        Ok(Collection { by_chart_name })
    }

    pub fn len(&self) -> usize {
        self.by_chart_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_chart_name.is_empty()
    }

    pub fn get(&self, chart_name: &str) -> Option<&Dependency> {
        self.by_chart_name.get(chart_name)
    }

    pub fn contains(&self, chart_name: &str) -> bool {
        self.by_chart_name.contains_key(chart_name)
    }

    /// Sorted chart-name order (§4.5, §5).
    pub fn iter(&self) -> impl Iterator<Item = &Dependency> {
        self.by_chart_name.values()
    }

    /// First chart whose `product-name` annotation matches (§4.5).
    pub fn product_dependency(&self, product_name: &str) -> Option<&Dependency> {
        self.iter().find(|dep| dep.product_name() == product_name)
    }

    /// First chart whose `integrations-provided` list contains `integration_name`, or `""` when
    /// none does (§4.5).
    pub fn product_for_integration(&self, integration_name: &str) -> String {
        self.iter()
            .find(|dep| dep.integrations_provided().iter().any(|name| name == integration_name))
            .map(|dep| dep.product_name().to_string())
            .unwrap_or_default()
    }
}
