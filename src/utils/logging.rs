use tracing::{info, warn, error, debug};
use tracing_subscriber::EnvFilter;

use drive_v3::auth::token::token_preview;
use drive_v3::ProgressEvent;

/// Inicializa o subscriber; `RUST_LOG` tem prioridade sobre `verbose`
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout fica livre para a saída do CLI
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn log_config_loaded(env: &str) {
    info!("Configuration loaded successfully for environment: {}", env);
}

pub fn log_auth_url_generated(client_id: &str) {
    info!("🌐 Authorization URL generated for client: {}", client_id);
}

pub fn log_callback_server_ready(addr: &str) {
    info!("✅ OAuth2 callback receiver listening on http://{}", addr);
}

pub fn log_callback_received(endpoint: &str) {
    info!("Callback request received: {}", endpoint);
}

pub fn log_token_received(token: &str) {
    info!("🔑 Access token received: {}", token_preview(token));
}

pub fn log_upload_started(name: &str, size: u64) {
    info!("📤 Upload started: {} ({} bytes)", name, size);
}

pub fn log_upload_progress(event: &ProgressEvent) {
    debug!("Upload progress: {}/{} bytes ({:.1}%)", event.loaded, event.total, event.percent());
}

pub fn log_upload_finished(name: &str, file_id: Option<&str>, duration_ms: u64) {
    info!("✅ Upload finished: {} - File ID: {:?} - Duration: {}ms", name, file_id, duration_ms);
}

pub fn log_upload_failed(name: &str, status: Option<u16>, error: &str) {
    error!("Upload failed: {} - Status: {:?} - Error: {}", name, status, error);
}

pub fn log_health_check() {
    debug!("Health check requested");
}

pub fn log_info(message: &str) {
    info!("{}", message);
}

pub fn log_warning(message: &str) {
    warn!("{}", message);
}
