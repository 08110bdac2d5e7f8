// Handlers do receptor local do redirect OAuth2
pub mod callback;
pub mod health;

pub use callback::{router, CallbackServer, CallbackState};
pub use health::*;
