use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use drive_upload::config::Settings;
use drive_upload::handlers::CallbackServer;
use drive_upload::utils::logging::*;
use drive_v3::auth::token::token_preview;
use drive_v3::{extract_access_token, ImplicitToken, ParamEncoding, SuccessPolicy, UploadEvent, UploadFile};

/// Drive Upload CLI - autenticação implícita e upload para o Google Drive
#[derive(Parser)]
#[command(name = "drive-upload")]
#[command(version)]
#[command(about = "CLI para upload de arquivos no Google Drive v3", long_about = None)]
struct Cli {
    /// Token de acesso do Google (ou use GOOGLE_ACCESS_TOKEN env var)
    #[arg(short = 't', long, env = "GOOGLE_ACCESS_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// Formato de saída (json, pretty)
    #[arg(short = 'o', long, default_value = "pretty", global = true)]
    output: OutputFormat,

    /// Modo verbose para debug
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Comando a executar
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, PartialEq)]
enum OutputFormat {
    Json,
    Pretty,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "pretty" => Ok(OutputFormat::Pretty),
            _ => Err(format!("Formato desconhecido: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Gera a URL de autorização OAuth2 (fluxo implícito)
    AuthUrl {
        /// Client ID (padrão: google.client_id / GOOGLE_CLIENT_ID)
        #[arg(short = 'c', long)]
        client_id: Option<String>,

        /// Redirect URI (padrão: google.redirect_uri)
        #[arg(short = 'r', long)]
        redirect_uri: Option<String>,

        /// Não codifica client_id e redirect_uri
        #[arg(long)]
        verbatim: bool,

        /// Abre a URL no navegador
        #[arg(long)]
        open: bool,
    },

    /// Extrai o access_token de uma URL de retorno ou fragmento
    ParseToken {
        /// URL completa ou fragmento (`#access_token=...`)
        input: String,
    },

    /// Abre o navegador e aguarda o redirect no receptor local
    Login {
        /// Client ID (padrão: google.client_id / GOOGLE_CLIENT_ID)
        #[arg(short = 'c', long)]
        client_id: Option<String>,

        /// Apenas imprime a URL, sem abrir o navegador
        #[arg(long)]
        no_browser: bool,
    },

    /// Envia um arquivo para o Google Drive
    Upload {
        /// Caminho do arquivo
        path: PathBuf,

        /// Nome do arquivo no Drive (padrão: nome local)
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// MIME type (padrão: inferido pela extensão)
        #[arg(short = 'm', long)]
        mime_type: Option<String>,

        /// Aceita qualquer status 2xx como sucesso
        #[arg(long)]
        accept_any_success: bool,

        /// Não mostra o progresso
        #[arg(short = 'q', long)]
        quiet: bool,
    },
}

/// Estrutura para resposta padronizada
#[derive(serde::Serialize)]
struct CliResponse {
    success: bool,
    data: Option<serde_json::Value>,
    error: Option<String>,
}

impl CliResponse {
    fn success(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn error(msg: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env é opcional
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::new().context("Falha ao carregar configuração")?;
    log_config_loaded(&std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into()));

    let response = execute_command(&cli, settings).await?;
    let success = response.success;
    output_response(response, &cli.output)?;

    if !success {
        std::process::exit(1);
    }

    Ok(())
}

async fn execute_command(cli: &Cli, mut settings: Settings) -> anyhow::Result<CliResponse> {
    match &cli.command {
        Commands::AuthUrl { client_id, redirect_uri, verbatim, open } => {
            if let Some(id) = client_id {
                settings.google.client_id = id.clone();
            }
            if let Some(uri) = redirect_uri {
                settings.google.redirect_uri = uri.clone();
            }
            settings.validate(true)?;

            let mut request = settings.auth_request();
            if *verbatim {
                request = request.with_encoding(ParamEncoding::Verbatim);
            }

            let url = request.authorization_url();
            log_auth_url_generated(&request.client_id);

            if *open {
                open_browser(&url);
            }

            Ok(CliResponse::success(json!({
                "url": url,
                "redirect_uri": request.redirect_uri,
            })))
        }

        Commands::ParseToken { input } => match extract_access_token(input) {
            Some(token) => {
                let details = ImplicitToken::from_fragment(input);
                Ok(CliResponse::success(json!({
                    "access_token": token,
                    "token_type": details.as_ref().map(|t| t.token_type.clone()),
                    "expires_in": details.as_ref().and_then(|t| t.expires_in),
                    "scope": details.and_then(|t| t.scope),
                })))
            }
            None => Ok(CliResponse::error(
                "access_token não encontrado no fragmento".to_string(),
            )),
        },

        Commands::Login { client_id, no_browser } => {
            if let Some(id) = client_id {
                settings.google.client_id = id.clone();
            }
            settings.validate(true)?;
            handle_login(&settings, *no_browser).await
        }

        Commands::Upload { path, name, mime_type, accept_any_success, quiet } => {
            if *accept_any_success {
                settings.upload.accept_any_success = true;
            }
            settings.validate(false)?;

            let token = get_token(cli, &settings)?;

            let mut file = UploadFile::from_path(path)
                .await
                .with_context(|| format!("Falha ao ler {}", path.display()))?;
            if let Some(name) = name {
                file = file.with_name(name.clone());
            }
            if let Some(mime) = mime_type {
                file = file.with_mime_type(mime.clone());
            }

            handle_upload(&settings, token, file, *quiet).await
        }
    }
}

fn get_token(cli: &Cli, settings: &Settings) -> anyhow::Result<String> {
    cli.token
        .clone()
        .or_else(|| settings.google.access_token.clone())
        .ok_or_else(|| anyhow!("Token não fornecido. Use --token, defina GOOGLE_ACCESS_TOKEN ou rode `drive-upload login`"))
}

fn open_browser(url: &str) {
    if let Err(e) = webbrowser::open(url) {
        log_warning(&format!("⚠️ Não foi possível abrir o navegador: {}", e));
    }
}

async fn handle_login(settings: &Settings, no_browser: bool) -> anyhow::Result<CliResponse> {
    // Associa a porta antes de abrir o navegador para não perder o redirect
    let server = CallbackServer::bind(&settings.callback_addr()).await?;

    let url = settings.auth_request().authorization_url();
    log_auth_url_generated(&settings.google.client_id);

    eprintln!("🔐 Iniciando fluxo de autenticação OAuth2...");
    eprintln!("📌 Autorize o acesso em: {}", url);
    if !no_browser {
        open_browser(&url);
    }

    let timeout = Duration::from_secs(settings.server.callback_timeout_secs);
    match server.wait_for_token(timeout).await {
        Ok(token) => Ok(CliResponse::success(json!({
            "message": "Autenticação concluída com sucesso!",
            "access_token": token.access_token,
            "token_preview": token.preview(),
            "expires_in": token.expires_in,
            "note": "Exporte GOOGLE_ACCESS_TOKEN para usar no upload"
        }))),
        Err(e) => Ok(CliResponse::error(e.to_string())),
    }
}

async fn handle_upload(
    settings: &Settings,
    token: String,
    file: UploadFile,
    quiet: bool,
) -> anyhow::Result<CliResponse> {
    let client = settings.drive_client();
    let name = file.name.clone();
    let size = file.len();
    let start_time = Instant::now();

    log_upload_started(&name, size);
    log_info(&format!("🔑 Usando token {}", token_preview(&token)));

    let mut handle = client.start_upload(token, file);

    let outcome = loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(UploadEvent::Progress(progress)) => {
                    log_upload_progress(&progress);
                    if !quiet {
                        eprint!("\r📤 {}/{} bytes ({:.1}%)", progress.loaded, progress.total, progress.percent());
                    }
                }
                Some(UploadEvent::Completed(value)) => break Ok(value),
                Some(UploadEvent::Failed(err)) => break Err((err.status(), err.to_string())),
                None => break Err((None, "Upload interrompido".to_string())),
            },
            _ = tokio::signal::ctrl_c() => {
                handle.cancel();
                break Err((None, "Upload cancelado pelo usuário".to_string()));
            }
        }
    };

    if !quiet {
        eprintln!();
    }

    let duration_ms = start_time.elapsed().as_millis() as u64;
    match outcome {
        Ok(created) => {
            let file_id = created.get("id").and_then(|v| v.as_str());
            log_upload_finished(&name, file_id, duration_ms);

            Ok(CliResponse::success(json!({
                "message": "Arquivo enviado com sucesso!",
                "file": created,
                "bytes": size,
                "duration_ms": duration_ms,
                "accepted_any_success": settings.success_policy() == SuccessPolicy::AnySuccess,
            })))
        }
        Err((status, message)) => {
            log_upload_failed(&name, status, &message);
            Ok(CliResponse::error(message))
        }
    }
}

fn output_response(response: CliResponse, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(&response)?);
        }
        OutputFormat::Pretty => {
            if response.success {
                if let Some(data) = response.data {
                    println!("✅ Sucesso!");
                    println!("{}", serde_json::to_string_pretty(&data)?);
                }
            } else if let Some(error) = response.error {
                eprintln!("❌ Erro: {}", error);
            }
        }
    }

    Ok(())
}
