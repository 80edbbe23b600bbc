//! Workflow configuration.

use serde::Deserialize;

/// Configuration for the permit service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Dispatch motive classification after each creation (default: true).
    pub annotate_motives: bool,
    /// Upper bound for a single classification call in seconds (default: 10).
    pub annotation_timeout_secs: u64,
    /// Re-read and re-apply attempts after a concurrent write (default: 3).
    pub max_write_retries: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            annotate_motives: true,
            annotation_timeout_secs: 10,
            max_write_retries: 3,
        }
    }
}
