use derivative::Derivative;
use thiserror::Error;

/// Verbosity a [`ClusterError`] message is rendered at. Mirrors the split kept throughout this
/// codebase between what is safe to show in an assistant transcript and what belongs only in a
/// debug log: a Kubernetes object payload can itself quote Secret data, so the default rendering
/// never includes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMessageVerbosity {
    SafeOnly,
    FullDetails,
}

/// Error wrapping a cluster read/write failure (ConfigMap, Secret, Job operations). Keeps the
/// underlying client error out of the `Display` output by default so that callers logging at
/// info/warn level never leak cluster object bodies.
#[derive(Derivative, Clone, Error)]
#[derivative(Debug)]
pub struct ClusterError {
    message_safe: String,
    #[derivative(Debug = "ignore")]
    full_details: Option<String>,
}

impl ClusterError {
    pub fn new(message_safe: impl Into<String>, full_details: Option<String>) -> Self {
        ClusterError {
            message_safe: message_safe.into(),
            full_details,
        }
    }

    pub fn message(&self, verbosity: ErrorMessageVerbosity) -> String {
        match (verbosity, &self.full_details) {
            (ErrorMessageVerbosity::SafeOnly, _) | (_, None) => self.message_safe.clone(),
            (ErrorMessageVerbosity::FullDetails, Some(details)) => {
                format!("{} / details: {}", self.message_safe, details)
            }
        }
    }
}

impl std::fmt::Display for ClusterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message(ErrorMessageVerbosity::SafeOnly))
    }
}

impl PartialEq for ClusterError {
    fn eq(&self, other: &Self) -> bool {
        self.message_safe == other.message_safe
    }
}
impl Eq for ClusterError {}

impl From<kube::Error> for ClusterError {
    fn from(err: kube::Error) -> Self {
        ClusterError::new("cluster request failed", Some(err.to_string()))
    }
}
