//! Printdrop Worker Library
//!
//! Release side of the photo pipeline. [`PipelineCoordinator`] is the single
//! entry point that moves photos from Staging to PrintQueue; the periodic
//! [`ReleaseScheduler`] and post-upload triggers both go through it.

pub mod coordinator;
pub mod scheduler;

pub use coordinator::PipelineCoordinator;
pub use scheduler::{ReleaseScheduler, ReleaseTrigger};
