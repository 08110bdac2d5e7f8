pub mod file;
pub mod progress;
pub mod upload;

pub use file::{UploadFile, UploadMetadata};
pub use progress::{ProgressEvent, UploadEvent, UploadHandle};
pub use upload::{DriveClient, DriveClientBuilder, SuccessPolicy};
