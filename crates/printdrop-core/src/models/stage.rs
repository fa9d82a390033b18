use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// The three directories a photo can be stored in.
///
/// Staging and PrintQueue are pipeline positions: a photo lives in exactly one
/// of them. Backup holds an independent permanent copy and is never moved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Staging,
    PrintQueue,
    Backup,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Staging, Stage::PrintQueue, Stage::Backup];
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Stage::Staging => write!(f, "staging"),
            Stage::PrintQueue => write!(f, "print_queue"),
            Stage::Backup => write!(f, "backup"),
        }
    }
}
