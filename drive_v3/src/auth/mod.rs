pub mod authorize;
pub mod fragment;
pub mod token;

pub use authorize::{authorization_url, AuthRequest, ParamEncoding};
pub use fragment::extract_access_token;
pub use token::{ImplicitError, ImplicitToken};
