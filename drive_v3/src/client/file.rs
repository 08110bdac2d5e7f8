use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::UploadResult;

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Metadados enviados na primeira parte do multipart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub name: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

/// Arquivo a ser enviado: nome, tipo MIME e conteúdo em memória
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub mime_type: String,
    pub content: Bytes,
}

impl UploadFile {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            content: content.into(),
        }
    }

    /// Lê um arquivo do disco; o tipo MIME é inferido pela extensão
    pub async fn from_path(path: impl AsRef<Path>) -> UploadResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        tracing::debug!("Arquivo lido: {} ({} bytes)", path.display(), content.len());

        Ok(Self::new(name, guess_mime_type(path), content))
    }

    /// Sobrescreve o nome enviado nos metadados
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn metadata(&self) -> UploadMetadata {
        UploadMetadata {
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
        }
    }

    pub fn len(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Tipos MIME das extensões mais comuns; o resto vira `application/octet-stream`
pub fn guess_mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("txt") => "text/plain",
        Some("csv") => "text/csv",
        Some("html") | Some("htm") => "text/html",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("mp3") => "audio/mpeg",
        Some("mp4") => "video/mp4",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => DEFAULT_MIME_TYPE,
    }
}
