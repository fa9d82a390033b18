mod service;
mod types;
mod validator;

pub use service::{IngestError, IngestFailure, IngestionService};
pub use types::{IngestReport, UploadedFile};
pub use validator::{UploadValidator, ValidationError};
