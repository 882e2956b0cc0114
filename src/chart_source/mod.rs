mod chart;
mod overlay;

pub use chart::{Chart, ChartMetadata};
pub use overlay::OverlayChartSource;

use thiserror::Error;

/// Errors raised by a [`ChartSource`]. `NotFound` is a typed condition, not a generic IO failure,
/// so the embedded/local overlay (§4.1) can distinguish "try the next layer" from "something is
/// actually broken".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChartSourceError {
    #[error("not found: {path}")]
    NotFound { path: String },

    #[error("io error reading `{path}`: {reason}")]
    Io { path: String, reason: String },

    #[error("failed to parse chart manifest at `{path}`: {reason}")]
    InvalidManifest { path: String, reason: String },
}

/// A read-only, content-addressed filesystem yielding parsed Helm charts and auxiliary files
/// (values template, configuration document, MCP instructions). See §4.1.
pub trait ChartSource: Send + Sync {
    /// Reads the raw bytes of a file at `path`, relative to this source's root.
    fn read_file(&self, path: &str) -> Result<Vec<u8>, ChartSourceError>;

    /// Loads and parses the chart manifest rooted at `path` (a directory containing
    /// `Chart.yaml`).
    fn load_chart(&self, path: &str) -> Result<Chart, ChartSourceError>;

    /// Walks the combined tree and loads every directory containing a chart manifest.
    fn list_all_charts(&self) -> Result<Vec<Chart>, ChartSourceError>;

    /// Returns a view of this source scoped to `prefix`; reads and listings are relative to it.
    fn subtree(&self, prefix: &str) -> Box<dyn ChartSource>;
}
