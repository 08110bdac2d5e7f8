//! # Google Drive v3 Rust Crate
//!
//! Biblioteca mínima para enviar um arquivo ao Google Drive usando o fluxo
//! OAuth2 implícito (`response_type=token`).
//!
//! ## Features
//!
//! - URL de autorização com escopo `drive.file` e `prompt=consent`
//! - Extração do `access_token` a partir do fragmento da URL de retorno
//! - Upload multipart com eventos de progresso por bytes
//! - Erros tipados (status HTTP vs. falha de transporte)
//!
//! ## Exemplo
//!
//! ```no_run
//! use drive_v3::{authorization_url, extract_access_token, DriveClient, UploadFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let url = authorization_url("my-client-id", "http://localhost:8888/callback");
//!     println!("Abra: {}", url);
//!
//!     let token = extract_access_token("#access_token=ya29.abc&token_type=Bearer")
//!         .ok_or("token ausente")?;
//!
//!     let client = DriveClient::new();
//!     let file = UploadFile::new("notes.txt", "text/plain", "hello");
//!     let created = client
//!         .upload_with_progress(&token, file, |p| println!("{}/{}", p.loaded, p.total))
//!         .await?;
//!     println!("Arquivo criado: {}", created["id"]);
//!     Ok(())
//! }
//! ```

/// Módulo de autorização OAuth2 (fluxo implícito)
pub mod auth;

/// Módulo de cliente de upload
pub mod client;

/// Módulo de tratamento de erros
pub mod error;

// Re-exportações para conveniência
pub use auth::fragment::extract_access_token;
pub use auth::token::{ImplicitError, ImplicitToken};
pub use auth::authorize::{authorization_url, AuthRequest, ParamEncoding};
pub use client::file::{UploadFile, UploadMetadata};
pub use client::progress::{ProgressEvent, UploadEvent, UploadHandle};
pub use client::upload::{DriveClient, DriveClientBuilder, SuccessPolicy};
pub use error::{UploadError, UploadErrorKind, UploadResult};
