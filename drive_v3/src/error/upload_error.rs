use thiserror::Error;

/// Erros do upload.
///
/// As variantes de upload compartilham o mesmo formato de mensagem
/// (`Failed to upload file: ...`); use [`UploadError::kind`] para distinguir
/// a origem sem inspecionar o texto.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Failed to upload file: {status_text}")]
    HttpStatus { status: u16, status_text: String },

    #[error("Failed to upload file: {cause}")]
    Transport { cause: String },

    #[error("Failed to upload file: invalid JSON response: {cause}")]
    InvalidResponse { cause: String },

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

/// Categoria de um [`UploadError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadErrorKind {
    HttpStatus,
    Transport,
    InvalidResponse,
    Io,
}

impl UploadError {
    pub fn http_status(status: reqwest::StatusCode) -> Self {
        let status_text = status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| status.as_u16().to_string());

        Self::HttpStatus {
            status: status.as_u16(),
            status_text,
        }
    }

    pub fn transport(cause: impl std::fmt::Display) -> Self {
        Self::Transport {
            cause: cause.to_string(),
        }
    }

    pub fn invalid_response(cause: impl std::fmt::Display) -> Self {
        Self::InvalidResponse {
            cause: cause.to_string(),
        }
    }

    pub fn kind(&self) -> UploadErrorKind {
        match self {
            Self::HttpStatus { .. } => UploadErrorKind::HttpStatus,
            Self::Transport { .. } => UploadErrorKind::Transport,
            Self::InvalidResponse { .. } => UploadErrorKind::InvalidResponse,
            Self::Io(_) => UploadErrorKind::Io,
        }
    }

    /// Status HTTP, quando a falha veio de uma resposta do servidor
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Tipo de resultado padrão para operações de upload
pub type UploadResult<T> = Result<T, UploadError>;
