mod environment;
mod error;
mod extractors;

pub use environment::{Environment, REQUEST_TIMEOUT};
pub use error::{ApiErrorResponse, AppError};
pub use extractors::JsonPayload;
