use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use rust_embed::RustEmbed;
use walkdir::WalkDir;

use crate::constants::CHART_MANIFEST_FILE;

use super::chart::{Chart, ChartMetadata};
use super::{ChartSource, ChartSourceError};

/// The chart bundle baked into the installer binary at compile time. Consumers that ship a
/// different bundle define their own `#[derive(RustEmbed)]` type and build
/// `OverlayChartSource<TheirBundle>` instead.
#[derive(RustEmbed)]
#[folder = "embedded_charts"]
pub struct BundledCharts;

/// Overlay of an embedded (compile-time) chart bundle and a local directory of operator
/// overrides. Embedded is consulted first; local is consulted only when embedded reports
/// [`ChartSourceError::NotFound`] (§4.1) — any other embedded error (there is none today, since
/// embedded reads cannot fail beyond "not found", but the local fallback is written generically)
/// surfaces immediately.
pub struct OverlayChartSource<E: RustEmbed + Send + Sync + 'static> {
    local_dir: Option<PathBuf>,
    prefix: String,
    _embedded: PhantomData<E>,
}

impl<E: RustEmbed + Send + Sync + 'static> OverlayChartSource<E> {
    pub fn new(local_dir: Option<PathBuf>) -> Self {
        OverlayChartSource {
            local_dir,
            prefix: String::new(),
            _embedded: PhantomData,
        }
    }

    fn scoped_path(&self, path: &str) -> String {
        if self.prefix.is_empty() {
            path.trim_start_matches('/').to_string()
        } else {
            format!("{}/{}", self.prefix.trim_end_matches('/'), path.trim_start_matches('/'))
        }
    }

    fn read_embedded(&self, full_path: &str) -> Option<Vec<u8>> {
        E::get(full_path).map(|file| file.data.into_owned())
    }

    fn read_local(&self, full_path: &str) -> Result<Vec<u8>, ChartSourceError> {
        let local_dir = self.local_dir.as_ref().ok_or_else(|| ChartSourceError::NotFound {
            path: full_path.to_string(),
        })?;
        let candidate = local_dir.join(full_path);
        std::fs::read(&candidate).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => ChartSourceError::NotFound {
                path: full_path.to_string(),
            },
            _ => ChartSourceError::Io {
                path: full_path.to_string(),
                reason: err.to_string(),
            },
        })
    }

    fn parse_chart_yaml(path: &str, bytes: &[u8]) -> Result<Chart, ChartSourceError> {
        let metadata: ChartMetadata = serde_yaml::from_slice(bytes).map_err(|err| ChartSourceError::InvalidManifest {
            path: path.to_string(),
            reason: err.to_string(),
        })?;
        let dir = Path::new(path).parent().unwrap_or_else(|| Path::new(""));
        Ok(Chart::new(metadata, dir.to_path_buf()))
    }

    fn local_chart_dirs(&self) -> Vec<String> {
        let Some(local_dir) = &self.local_dir else {
            return Vec::new();
        };
        let root = local_dir.join(&self.prefix);
        if !root.exists() {
            return Vec::new();
        }
        WalkDir::new(&root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name() == CHART_MANIFEST_FILE)
            .filter_map(|entry| {
                let rel = entry.path().strip_prefix(local_dir).ok()?;
                Some(rel.to_string_lossy().replace('\\', "/"))
            })
            .collect()
    }

    fn embedded_chart_dirs(&self) -> Vec<String> {
        E::iter()
            .filter(|file| {
                file.ends_with(CHART_MANIFEST_FILE)
                    && (self.prefix.is_empty() || file.starts_with(self.prefix.as_str()))
            })
            .map(|file| file.to_string())
            .collect()
    }
}

impl<E: RustEmbed + Send + Sync + 'static> ChartSource for OverlayChartSource<E> {
    fn read_file(&self, path: &str) -> Result<Vec<u8>, ChartSourceError> {
        let full_path = self.scoped_path(path);
        if let Some(bytes) = self.read_embedded(&full_path) {
            return Ok(bytes);
        }
        self.read_local(&full_path)
    }

    fn load_chart(&self, path: &str) -> Result<Chart, ChartSourceError> {
        let manifest_path = format!("{}/{}", path.trim_end_matches('/'), CHART_MANIFEST_FILE);
        tracing::debug!(path = %manifest_path, "loading chart manifest");
        let bytes = self.read_file(&manifest_path)?;
        Self::parse_chart_yaml(&manifest_path, &bytes)
    }

    fn list_all_charts(&self) -> Result<Vec<Chart>, ChartSourceError> {
        let mut manifest_paths: Vec<String> = self.embedded_chart_dirs();
        manifest_paths.extend(self.local_chart_dirs());
        manifest_paths.sort();
        manifest_paths.dedup();

        manifest_paths
            .into_iter()
            .map(|manifest_path| {
                let bytes = self
                    .read_embedded(&manifest_path)
                    .map(Ok)
                    .unwrap_or_else(|| self.read_local(&manifest_path))?;
                Self::parse_chart_yaml(&manifest_path, &bytes)
            })
            .collect()
    }

    fn subtree(&self, prefix: &str) -> Box<dyn ChartSource> {
        let combined = self.scoped_path(prefix);
        Box::new(OverlayChartSource::<E> {
            local_dir: self.local_dir.clone(),
            prefix: combined,
            _embedded: PhantomData,
        })
    }
}
