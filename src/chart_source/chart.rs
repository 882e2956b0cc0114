use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::constants::ANNOTATION_PREFIX;

/// The subset of a Helm `Chart.yaml` this core cares about: its identity and the domain-metadata
/// annotations carried under the fixed `installer.tssc.dev/` prefix (§6.1).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct ChartMetadata {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, rename = "appVersion")]
    pub app_version: String,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

/// A loaded Helm chart: its manifest metadata and the directory it was loaded from, relative to
/// the [`super::ChartSource`] it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chart {
    pub metadata: ChartMetadata,
    pub path: PathBuf,
}

impl Chart {
    pub fn new(metadata: ChartMetadata, path: PathBuf) -> Self {
        Chart { metadata, path }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Reads the annotation `installer.tssc.dev/{suffix}`, defaulting to the empty string when
    /// absent (§4.4: "Accessors read annotations with empty-string defaults").
    pub fn annotation(&self, suffix: &str) -> &str {
        let key = format!("{ANNOTATION_PREFIX}/{suffix}");
        self.metadata.annotations.get(&key).map(String::as_str).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_defaults_to_empty_string() {
        let chart = Chart::new(ChartMetadata::default(), PathBuf::from("charts/x"));
        assert_eq!(chart.annotation("weight"), "");
    }

    #[test]
    fn annotation_reads_prefixed_key() {
        let mut annotations = HashMap::new();
        annotations.insert("installer.tssc.dev/weight".to_string(), "5".to_string());
        let chart = Chart::new(
            ChartMetadata {
                name: "x".to_string(),
                annotations,
                ..Default::default()
            },
            PathBuf::from("charts/x"),
        );
        assert_eq!(chart.annotation("weight"), "5");
    }
}
