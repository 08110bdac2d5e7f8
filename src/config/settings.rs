use serde::{Deserialize, Serialize};
use config::{Config, ConfigError, Environment, File};

use drive_v3::auth::authorize::AUTH_ENDPOINT;
use drive_v3::client::upload::{DEFAULT_CHUNK_SIZE, UPLOAD_ENDPOINT};
use drive_v3::{AuthRequest, DriveClient, ParamEncoding, SuccessPolicy};

use crate::utils::{AppError, AppResult};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub google: GoogleSettings,
    #[serde(default)]
    pub upload: UploadSettings,
}

/// Receptor local do redirect OAuth2
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_callback_timeout")]
    pub callback_timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GoogleSettings {
    #[serde(default)]
    pub client_id: String,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    #[serde(default = "default_auth_endpoint")]
    pub auth_endpoint: String,
    #[serde(default = "default_upload_endpoint")]
    pub upload_endpoint: String,
    pub access_token: Option<String>,  // Token já obtido (opcional)
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UploadSettings {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default)]
    pub accept_any_success: bool,  // false: apenas 200 é sucesso
    #[serde(default = "default_true")]
    pub encode_all_params: bool,  // false: client_id/redirect_uri sem encoding
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8888
}

fn default_callback_timeout() -> u64 {
    300
}

fn default_redirect_uri() -> String {
    "http://localhost:8888/callback".to_string()
}

fn default_auth_endpoint() -> String {
    AUTH_ENDPOINT.to_string()
}

fn default_upload_endpoint() -> String {
    UPLOAD_ENDPOINT.to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_true() -> bool {
    true
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            callback_timeout_secs: default_callback_timeout(),
        }
    }
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            redirect_uri: default_redirect_uri(),
            auth_endpoint: default_auth_endpoint(),
            upload_endpoint: default_upload_endpoint(),
            access_token: None,
        }
    }
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            accept_any_success: false,
            encode_all_params: true,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            // Arquivo de configuração base
            .add_source(File::with_name("config/default").required(false))
            // Arquivo específico do ambiente
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false));

        // Variáveis no formato usado pelo console do Google Cloud
        if let Ok(client_id) = std::env::var("GOOGLE_CLIENT_ID") {
            builder = builder.set_override("google.client_id", client_id)?;
        }
        if let Ok(redirect_uri) = std::env::var("GOOGLE_REDIRECT_URI") {
            builder = builder.set_override("google.redirect_uri", redirect_uri)?;
        }
        if let Ok(token) = std::env::var("GOOGLE_ACCESS_TOKEN") {
            if !token.is_empty() {
                builder = builder.set_override("google.access_token", token)?;
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("DRIVE_UPLOAD")
                .separator("__")
                .try_parsing(true),
        );

        let s = builder.build()?;

        s.try_deserialize()
    }

    /// Valida a configuração; `client_id` só é exigido para o fluxo OAuth2
    pub fn validate(&self, require_client_id: bool) -> AppResult<()> {
        if require_client_id && self.google.client_id.trim().is_empty() {
            return Err(AppError::ConfigError(
                "google.client_id é obrigatório (GOOGLE_CLIENT_ID)".to_string(),
            ));
        }

        let redirect = &self.google.redirect_uri;
        if !redirect.starts_with("http://") && !redirect.starts_with("https://") {
            return Err(AppError::ConfigError(format!(
                "google.redirect_uri deve ser uma URL http(s): {}",
                redirect
            )));
        }

        if self.upload.chunk_size == 0 {
            return Err(AppError::ConfigError(
                "upload.chunk_size deve ser maior que zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn param_encoding(&self) -> ParamEncoding {
        if self.upload.encode_all_params {
            ParamEncoding::Strict
        } else {
            ParamEncoding::Verbatim
        }
    }

    pub fn success_policy(&self) -> SuccessPolicy {
        if self.upload.accept_any_success {
            SuccessPolicy::AnySuccess
        } else {
            SuccessPolicy::ExactlyOk
        }
    }

    pub fn auth_request(&self) -> AuthRequest {
        AuthRequest::new(&self.google.client_id, &self.google.redirect_uri)
            .with_endpoint(&self.google.auth_endpoint)
            .with_encoding(self.param_encoding())
    }

    pub fn drive_client(&self) -> DriveClient {
        DriveClient::builder()
            .upload_url(&self.google.upload_endpoint)
            .chunk_size(self.upload.chunk_size)
            .success_policy(self.success_policy())
            .build()
    }

    /// Endereço de bind do receptor local
    pub fn callback_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
