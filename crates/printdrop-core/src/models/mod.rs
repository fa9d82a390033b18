mod photo;
mod release;
mod stage;

pub use photo::PhotoFile;
pub use release::{PipelinePhase, ReleaseOutcome, ReleaseReport};
pub use stage::Stage;
