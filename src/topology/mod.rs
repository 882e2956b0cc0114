use comfy_table::{ContentArrangement, Table};

use crate::dependency::Dependency;

/// The ordered deployment sequence produced by the [`crate::resolver::Resolver`] (§4.6). Backed by
/// a plain `Vec` — unlike [`crate::dependency::Collection`], order here is meaningful and is the
/// whole point of the type.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    entries: Vec<Dependency>,
}

impl Topology {
    pub fn new() -> Self {
        Topology { entries: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, chart_name: &str) -> bool {
        self.position(chart_name).is_some()
    }

    pub fn position(&self, chart_name: &str) -> Option<usize> {
        self.entries.iter().position(|dep| dep.chart_name() == chart_name)
    }

    pub fn get(&self, chart_name: &str) -> Option<&Dependency> {
        self.position(chart_name).map(|idx| &self.entries[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dependency> {
        self.entries.iter()
    }

    /// Appends a dependency with no weight-aware placement — used by the resolver to seed the
    /// topology with an enabled product's primary chart (§4.6 step 3).
    pub fn push_back(&mut self, dependency: Dependency) {
        self.entries.push(dependency);
    }

    /// Inserts each of `dependencies`, in order, immediately before `anchor` — walking left past
    /// any immediate predecessor whose weight is strictly greater than the dependency's own, so
    /// heavier siblings sink towards `anchor` and lighter ones rise towards the front (§4.6).
    ///
    /// Each `D` starts its walk at `anchor`'s *current* index, re-read fresh for every `D` rather
    /// than carried over from the previous insertion — `anchor`'s index naturally shifts right as
    /// earlier `D`s are placed in front of it, and re-reading it is what makes a later, heavier
    /// `D` still compare against everything between the previous insertion point and `anchor`.
    ///
    /// When `anchor` is absent from the topology the insertion point starts at index 0; later
    /// entries in `dependencies` still compare their weight against the ones just inserted, so a
    /// lighter later entry can still overtake an earlier one.
    pub fn prepend_before(&mut self, anchor: &str, dependencies: Vec<Dependency>) {
        let anchor_present = self.contains(anchor);
        let mut next_front = 0usize;
        for dependency in dependencies {
            let frontier = if anchor_present {
                self.position(anchor).expect("anchor was present when prepend_before started and is never removed")
            } else {
                next_front
            };
            let weight = dependency.weight().unwrap_or(0);
            let mut idx = frontier;
            while idx > 0 && self.entries[idx - 1].weight().unwrap_or(0) > weight {
                idx -= 1;
            }
            self.entries.insert(idx, dependency);
            next_front = idx + 1;
        }
    }

    /// Inserts each of `dependencies`, in order, immediately after `anchor` — walking right past
    /// any immediate successor whose weight is strictly less than the dependency's own (§4.6).
    /// Mirrors [`Self::prepend_before`]: `anchor`'s index is re-read fresh for every `D`.
    ///
    /// When `anchor` is absent the insertion point starts at the end of the topology.
    pub fn append_after(&mut self, anchor: &str, dependencies: Vec<Dependency>) {
        let anchor_present = self.contains(anchor);
        let mut next_front = self.entries.len();
        for dependency in dependencies {
            let frontier = if anchor_present {
                self.position(anchor).expect("anchor was present when append_after started and is never removed") + 1
            } else {
                next_front
            };
            let weight = dependency.weight().unwrap_or(0);
            let mut idx = frontier;
            while idx < self.entries.len() && self.entries[idx].weight().unwrap_or(0) < weight {
                idx += 1;
            }
            self.entries.insert(idx, dependency);
            next_front = idx + 1;
        }
    }

    /// Renders the deployment order as a table: Index | Dependency | Namespace | Product |
    /// Depends-On | Provided-Integrations | Required-Integrations (§4.6).
    pub fn print(&self) -> String {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic).set_header(vec![
            "Index",
            "Dependency",
            "Namespace",
            "Product",
            "Depends-On",
            "Provided-Integrations",
            "Required-Integrations",
        ]);

        for (index, dependency) in self.entries.iter().enumerate() {
            table.add_row(vec![
                index.to_string(),
                dependency.chart_name().to_string(),
                dependency.namespace().to_string(),
                dependency.product_name().to_string(),
                dependency.depends_on().join(", "),
                dependency.integrations_provided().join(", "),
                dependency.integrations_required().to_string(),
            ]);
        }

        table.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart_source::{Chart, ChartMetadata};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn dep(name: &str, weight: &str) -> Dependency {
        let mut annotations = HashMap::new();
        if !weight.is_empty() {
            annotations.insert("installer.tssc.dev/weight".to_string(), weight.to_string());
        }
        Dependency::new(Chart::new(
            ChartMetadata {
                name: name.to_string(),
                annotations,
                ..Default::default()
            },
            PathBuf::from(name),
        ))
    }

    #[test]
    fn prepend_before_walks_left_past_heavier_siblings() {
        let mut topology = Topology::new();
        topology.push_back(dep("p", ""));
        topology.prepend_before("p", vec![dep("i", "5"), dep("o", "10")]);
        let names: Vec<&str> = topology.iter().map(Dependency::chart_name).collect();
        assert_eq!(names, vec!["i", "o", "p"]);

        topology.prepend_before("i", vec![dep("f", "0")]);
        let names: Vec<&str> = topology.iter().map(Dependency::chart_name).collect();
        assert_eq!(names, vec!["f", "i", "o", "p"]);
    }

    #[test]
    fn prepend_before_recomputes_anchor_index_for_each_dependency() {
        let mut topology = Topology::new();
        topology.push_back(dep("h", "100"));
        topology.push_back(dep("z", "0"));
        topology.prepend_before("z", vec![dep("a", "0"), dep("b", "200")]);
        let names: Vec<&str> = topology.iter().map(Dependency::chart_name).collect();
        assert_eq!(names, vec!["a", "h", "b", "z"]);
    }

    #[test]
    fn prepend_before_with_absent_anchor_inserts_at_front_in_input_order() {
        let mut topology = Topology::new();
        topology.push_back(dep("a", ""));
        topology.prepend_before("missing", vec![dep("x", ""), dep("y", "")]);
        let names: Vec<&str> = topology.iter().map(Dependency::chart_name).collect();
        assert_eq!(names, vec!["x", "y", "a"]);
    }

    #[test]
    fn append_after_walks_right_past_lighter_successors() {
        let mut topology = Topology::new();
        topology.push_back(dep("a", ""));
        topology.push_back(dep("z", "20"));
        topology.append_after("a", vec![dep("m", "10")]);
        let names: Vec<&str> = topology.iter().map(Dependency::chart_name).collect();
        assert_eq!(names, vec!["a", "m", "z"]);
    }

    #[test]
    fn append_after_recomputes_anchor_index_for_each_dependency() {
        let mut topology = Topology::new();
        topology.push_back(dep("z", "0"));
        topology.push_back(dep("h", "100"));
        topology.append_after("z", vec![dep("b", "200"), dep("a", "0")]);
        let names: Vec<&str> = topology.iter().map(Dependency::chart_name).collect();
        assert_eq!(names, vec!["z", "a", "h", "b"]);
    }

    #[test]
    fn append_after_with_absent_anchor_appends_in_input_order() {
        let mut topology = Topology::new();
        topology.push_back(dep("a", ""));
        topology.append_after("missing", vec![dep("x", ""), dep("y", "")]);
        let names: Vec<&str> = topology.iter().map(Dependency::chart_name).collect();
        assert_eq!(names, vec!["a", "x", "y"]);
    }

    #[test]
    fn print_renders_a_header_row() {
        let mut topology = Topology::new();
        topology.push_back(dep("a", ""));
        let rendered = topology.print();
        assert!(rendered.contains("Dependency"));
        assert!(rendered.contains('a'));
    }
}
