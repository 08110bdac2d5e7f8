pub mod upload_error;

pub use upload_error::{UploadError, UploadErrorKind, UploadResult};
