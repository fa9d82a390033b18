use serde::Serialize;

/// Where the release pipeline currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    /// Waiting for the next tick or an explicit trigger.
    Idle,
    /// Loading config and listing Staging.
    Evaluating,
    /// Moving a bounded batch into PrintQueue.
    Releasing,
}

/// Result of moving one file from Staging to PrintQueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Moved,
    /// The destination name was already present in PrintQueue.
    AlreadyReleased,
}

/// Summary of one release operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReleaseReport {
    /// Number of photos seen in Staging when the batch was chosen.
    pub staged: usize,
    pub batch_size: usize,
    pub moved: Vec<String>,
    pub already_released: Vec<String>,
    /// Identities whose move failed, with the error message.
    pub failed: Vec<(String, String)>,
}

impl ReleaseReport {
    pub fn is_noop(&self) -> bool {
        self.moved.is_empty() && self.already_released.is_empty() && self.failed.is_empty()
    }
}
