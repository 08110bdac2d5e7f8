use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, StatusCode};
use serde_json::Value;
use tokio::sync::mpsc;

use super::file::UploadFile;
use super::progress::{ProgressEvent, UploadEvent, UploadHandle};
use crate::auth::token::token_preview;
use crate::error::{UploadError, UploadResult};

/// Endpoint de upload da API v3 do Google Drive
pub const UPLOAD_ENDPOINT: &str = "https://www.googleapis.com/upload/drive/v3/files";

/// Tamanho padrão dos pedaços entregues ao transporte (256 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

/// Quais status HTTP contam como sucesso
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuccessPolicy {
    /// Apenas 200 OK; qualquer outro status (inclusive 201) é falha
    #[default]
    ExactlyOk,
    /// Qualquer status 2xx
    AnySuccess,
}

impl SuccessPolicy {
    pub fn accepts(&self, status: StatusCode) -> bool {
        match self {
            SuccessPolicy::ExactlyOk => status == StatusCode::OK,
            SuccessPolicy::AnySuccess => status.is_success(),
        }
    }
}

/// Cliente HTTP para upload multipart no Google Drive
#[derive(Debug, Clone)]
pub struct DriveClient {
    client: Client,
    upload_url: String,
    chunk_size: usize,
    success_policy: SuccessPolicy,
}

/// Builder para DriveClient
#[derive(Debug, Default)]
pub struct DriveClientBuilder {
    client: Option<Client>,
    upload_url: Option<String>,
    chunk_size: Option<usize>,
    success_policy: SuccessPolicy,
}

impl DriveClientBuilder {
    /// Usa um `reqwest::Client` já configurado
    pub fn http_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn upload_url(mut self, url: impl Into<String>) -> Self {
        self.upload_url = Some(url.into());
        self
    }

    /// Tamanho de cada pedaço do corpo; define a granularidade do progresso
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = Some(size.max(1));
        self
    }

    pub fn success_policy(mut self, policy: SuccessPolicy) -> Self {
        self.success_policy = policy;
        self
    }

    pub fn build(self) -> DriveClient {
        DriveClient {
            // Sem timeout: o upload espera o que o transporte esperar
            client: self.client.unwrap_or_default(),
            upload_url: self
                .upload_url
                .unwrap_or_else(|| UPLOAD_ENDPOINT.to_string()),
            chunk_size: self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
            success_policy: self.success_policy,
        }
    }
}

impl Default for DriveClient {
    fn default() -> Self {
        Self::new()
    }
}

impl DriveClient {
    /// Cria um cliente com o endpoint oficial e a política `ExactlyOk`
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> DriveClientBuilder {
        DriveClientBuilder::default()
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    pub fn success_policy(&self) -> SuccessPolicy {
        self.success_policy
    }

    /// URL do POST com `uploadType=multipart`
    fn build_url(&self) -> String {
        let separator = if self.upload_url.contains('?') { '&' } else { '?' };
        format!("{}{}uploadType=multipart", self.upload_url, separator)
    }

    /// Monta o corpo: `metadata` (JSON) seguido de `file` (bytes crus)
    fn build_form(
        &self,
        file: UploadFile,
        progress: mpsc::UnboundedSender<ProgressEvent>,
    ) -> UploadResult<Form> {
        let metadata = serde_json::to_string(&file.metadata())
            .map_err(|e| UploadError::transport(format!("metadata serialization: {}", e)))?;

        let metadata_part = Part::text(metadata)
            .mime_str("application/json")
            .map_err(UploadError::transport)?;

        let total = file.len();
        let chunks = split_chunks(&file.content, self.chunk_size);
        let mut loaded = 0u64;

        let body = Body::wrap_stream(stream::iter(chunks).map(move |chunk| {
            loaded += chunk.len() as u64;
            // Receptor ausente significa que ninguém está observando
            let _ = progress.send(ProgressEvent::new(loaded, total));
            Ok::<Bytes, std::io::Error>(chunk)
        }));

        let mut file_part = Part::stream_with_length(body, total).file_name(file.name.clone());
        if !file.mime_type.is_empty() {
            file_part = file_part
                .mime_str(&file.mime_type)
                .map_err(UploadError::transport)?;
        }

        Ok(Form::new()
            .part("metadata", metadata_part)
            .part("file", file_part))
    }

    /// Executa o POST e interpreta a resposta
    async fn send_upload(
        &self,
        token: &str,
        file: UploadFile,
        progress: mpsc::UnboundedSender<ProgressEvent>,
    ) -> UploadResult<Value> {
        let url = self.build_url();
        let name = file.name.clone();
        let size = file.len();
        let form = self.build_form(file, progress)?;

        tracing::info!(
            "📤 Enviando '{}' ({} bytes) para {} (token: {})",
            name,
            size,
            url,
            token_preview(token)
        );

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("❌ Falha de transporte no upload: {}", e);
                UploadError::transport(e)
            })?;

        let status = response.status();

        if !self.success_policy.accepts(status) {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("❌ Upload recusado - Status: {}, body: {}", status, body);
            return Err(UploadError::http_status(status));
        }

        let response_text = response.text().await.map_err(UploadError::transport)?;

        tracing::debug!("Response status: {}, body: {}", status, response_text);

        serde_json::from_str(&response_text).map_err(UploadError::invalid_response)
    }

    /// Envia o arquivo sem observar o progresso
    pub async fn upload(&self, token: &str, file: UploadFile) -> UploadResult<Value> {
        self.upload_with_progress(token, file, |_| {}).await
    }

    /// Envia o arquivo chamando `on_progress` durante a transmissão do corpo.
    ///
    /// O callback nunca é chamado depois que este future completa.
    pub async fn upload_with_progress<F>(
        &self,
        token: &str,
        file: UploadFile,
        mut on_progress: F,
    ) -> UploadResult<Value>
    where
        F: FnMut(ProgressEvent),
    {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let request = self.send_upload(token, file, tx);
        tokio::pin!(request);

        loop {
            tokio::select! {
                biased;

                Some(event) = rx.recv() => on_progress(event),
                result = &mut request => {
                    // Eventos emitidos antes da resposta ainda na fila
                    while let Ok(event) = rx.try_recv() {
                        on_progress(event);
                    }
                    return result;
                }
            }
        }
    }

    /// Inicia o upload em uma task e devolve o handle de eventos.
    ///
    /// Precisa ser chamado dentro de um runtime Tokio.
    pub fn start_upload(&self, token: impl Into<String>, file: UploadFile) -> UploadHandle {
        let client = self.clone();
        let token = token.into();
        let (tx, rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            let progress_tx = tx.clone();
            let result = client
                .upload_with_progress(&token, file, |event| {
                    let _ = progress_tx.send(UploadEvent::Progress(event));
                })
                .await;

            let terminal = match result {
                Ok(value) => UploadEvent::Completed(value),
                Err(error) => UploadEvent::Failed(error),
            };
            let _ = tx.send(terminal);
        });

        UploadHandle::new(rx, task)
    }
}

fn split_chunks(content: &Bytes, chunk_size: usize) -> Vec<Bytes> {
    let chunk_size = chunk_size.max(1);
    (0..content.len())
        .step_by(chunk_size)
        .map(|start| content.slice(start..(start + chunk_size).min(content.len())))
        .collect()
}
