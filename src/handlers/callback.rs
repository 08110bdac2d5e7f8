//! Receptor local do redirect OAuth2 (fluxo implícito).
//!
//! O navegador nunca envia o fragmento (`#access_token=...`) ao servidor,
//! então `/callback` devolve uma página que reenvia `location.hash` para
//! `POST /token`, onde o token é extraído e entregue a quem aguarda.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use drive_v3::{ImplicitError, ImplicitToken};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;

use super::health::health_check;
use crate::config::Settings;
use crate::utils::logging::*;
use crate::utils::{AppError, AppResult};

type TokenSender = oneshot::Sender<Result<ImplicitToken, String>>;

/// Estado compartilhado: entrega apenas o primeiro resultado recebido
#[derive(Clone)]
pub struct CallbackState {
    sender: Arc<Mutex<Option<TokenSender>>>,
}

impl CallbackState {
    pub fn new(sender: TokenSender) -> Self {
        Self {
            sender: Arc::new(Mutex::new(Some(sender))),
        }
    }

    fn deliver(&self, result: Result<ImplicitToken, String>) {
        if let Ok(mut sender) = self.sender.lock() {
            if let Some(tx) = sender.take() {
                let _ = tx.send(result);
            }
        }
    }
}

/// Corpo enviado pela página de callback
#[derive(Debug, Deserialize)]
pub struct FragmentPayload {
    pub fragment: String,
}

/// Interpreta o fragmento devolvido pelo Google
pub fn token_from_fragment(fragment: &str) -> Result<ImplicitToken, String> {
    if let Some(error) = ImplicitError::from_fragment(fragment) {
        return Err(if error.is_access_denied() {
            "Acesso negado pelo usuário".to_string()
        } else {
            format!("Erro OAuth2: {}", error)
        });
    }

    ImplicitToken::from_fragment(fragment)
        .ok_or_else(|| "access_token não encontrado no fragmento".to_string())
}

pub fn router(state: CallbackState) -> Router {
    Router::new()
        .route("/callback", get(callback_page))
        .route("/token", post(receive_fragment))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn callback_page() -> Html<&'static str> {
    log_callback_received("/callback");
    Html(CALLBACK_PAGE)
}

async fn receive_fragment(
    State(state): State<CallbackState>,
    payload: Result<Json<FragmentPayload>, JsonRejection>,
) -> AppResult<Json<Value>> {
    log_callback_received("/token");

    let Json(payload) = payload.map_err(|rejection| {
        log_warning(&format!("❌ Corpo inválido em /token: {}", rejection.body_text()));
        AppError::ValidationError(rejection.body_text())
    })?;

    let outcome = token_from_fragment(&payload.fragment);
    let reply = match &outcome {
        Ok(token) => {
            log_token_received(&token.access_token);
            Ok(Json(json!({
                "status": "received",
                "token_preview": token.preview(),
                "expires_in": token.expires_in
            })))
        }
        Err(message) => {
            log_warning(&format!("❌ Callback sem token: {}", message));
            Err(AppError::AuthError(message.clone()))
        }
    };

    state.deliver(outcome);
    reply
}

/// Servidor de callback já associado a uma porta
pub struct CallbackServer {
    listener: TcpListener,
}

impl CallbackServer {
    pub async fn bind(addr: &str) -> AppResult<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to bind {}: {}", addr, e)))?;

        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> AppResult<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| AppError::InternalError(format!("Failed to read local address: {}", e)))
    }

    /// Associa em `server.host:server.port` e aguarda `callback_timeout_secs`
    pub async fn run_until_token(settings: &Settings) -> AppResult<ImplicitToken> {
        let server = Self::bind(&settings.callback_addr()).await?;
        server
            .wait_for_token(Duration::from_secs(settings.server.callback_timeout_secs))
            .await
    }

    /// Serve até receber o fragmento (ou até o timeout) e encerra o servidor
    pub async fn wait_for_token(self, timeout: Duration) -> AppResult<ImplicitToken> {
        let addr = self.local_addr()?;
        let (tx, rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = router(CallbackState::new(tx));

        log_callback_server_ready(&addr.to_string());

        let mut server = tokio::spawn(async move {
            axum::serve(self.listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        let result = tokio::time::timeout(timeout, rx).await;

        let _ = shutdown_tx.send(());
        if tokio::time::timeout(Duration::from_secs(5), &mut server).await.is_err() {
            log_warning("⚠️ Callback receiver did not stop in time, aborting");
            server.abort();
        }

        match result {
            Ok(Ok(Ok(token))) => Ok(token),
            Ok(Ok(Err(message))) => Err(AppError::AuthError(message)),
            Ok(Err(_)) => Err(AppError::InternalError("Canal de comunicação fechado".to_string())),
            Err(_) => Err(AppError::Timeout),
        }
    }
}

const CALLBACK_PAGE: &str = r#"
<!DOCTYPE html>
<html>
<head>
    <title>Google Drive OAuth2 - Autorização</title>
    <meta charset="UTF-8">
    <style>
        body { font-family: Arial, sans-serif; margin: 0; padding: 20px; background: #f5f5f5; text-align: center; }
        .container { max-width: 600px; margin: 50px auto; background: white; padding: 30px; border-radius: 8px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }
        h1 { color: #1a73e8; }
    </style>
</head>
<body>
    <div class="container">
        <h1>🔐 Google Drive OAuth2</h1>
        <p id="status">Enviando token para a aplicação...</p>
    </div>
    <script>
        const status = document.getElementById('status');
        fetch('/token', {
            method: 'POST',
            headers: { 'Content-Type': 'application/json' },
            body: JSON.stringify({ fragment: window.location.hash })
        })
            .then((response) => {
                status.textContent = response.ok
                    ? 'Autorização concluída! Você pode fechar esta janela.'
                    : 'Erro na autorização. Verifique o terminal.';
            })
            .catch(() => {
                status.textContent = 'Não foi possível contatar a aplicação.';
            });
    </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn token_request(fragment: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/token")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "fragment": fragment }).to_string()))
            .unwrap()
    }

    #[test]
    fn test_token_from_fragment() {
        let token = token_from_fragment("#access_token=ya29.abc&token_type=Bearer&expires_in=3599")
            .unwrap();
        assert_eq!(token.access_token, "ya29.abc");
        assert_eq!(token.expires_in, Some(3599));

        let denied = token_from_fragment("#error=access_denied").unwrap_err();
        assert_eq!(denied, "Acesso negado pelo usuário");

        let missing = token_from_fragment("#foo=bar").unwrap_err();
        assert!(missing.contains("access_token"));
    }

    #[tokio::test]
    async fn test_callback_page_relays_fragment() {
        let (tx, _rx) = oneshot::channel();
        let response = router(CallbackState::new(tx))
            .oneshot(Request::builder().uri("/callback").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8_lossy(&body);
        assert!(html.contains("window.location.hash"));
        assert!(html.contains("'/token'"));
    }

    #[tokio::test]
    async fn test_receive_fragment_delivers_token() {
        let (tx, rx) = oneshot::channel();
        let response = router(CallbackState::new(tx))
            .oneshot(token_request("#access_token=ya29.delivered&token_type=Bearer"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let token = rx.await.unwrap().unwrap();
        assert_eq!(token.access_token, "ya29.delivered");
    }

    #[tokio::test]
    async fn test_receive_fragment_without_token() {
        let (tx, rx) = oneshot::channel();
        let response = router(CallbackState::new(tx))
            .oneshot(token_request("#error=access_denied"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(rx.await.unwrap().is_err());
    }

    #[tokio::test]
    async fn test_receive_fragment_rejects_malformed_body() {
        let (tx, mut rx) = oneshot::channel();
        let request = Request::builder()
            .method("POST")
            .uri("/token")
            .header("content-type", "application/json")
            .body(Body::from(r##"{"hash": "#access_token=x"}"##))
            .unwrap();

        let response = router(CallbackState::new(tx)).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert!(body["error"].as_str().unwrap().contains("fragment"));
        // Nada é entregue; a página ainda pode reenviar
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_only_first_result_is_delivered() {
        let (tx, rx) = oneshot::channel();
        let app = router(CallbackState::new(tx));

        app.clone().oneshot(token_request("#access_token=first")).await.unwrap();
        let second = app.oneshot(token_request("#access_token=second")).await.unwrap();

        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(rx.await.unwrap().unwrap().access_token, "first");
    }

    #[tokio::test]
    async fn test_health_route() {
        let (tx, _rx) = oneshot::channel();
        let response = router(CallbackState::new(tx))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_wait_for_token_end_to_end() {
        let server = CallbackServer::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap();
        let waiting = tokio::spawn(server.wait_for_token(Duration::from_secs(10)));

        let response = reqwest::Client::new()
            .post(format!("http://{}/token", addr))
            .json(&json!({ "fragment": "#access_token=ya29.e2e&expires_in=3600" }))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());

        let token = waiting.await.unwrap().unwrap();
        assert_eq!(token.access_token, "ya29.e2e");
    }

    #[tokio::test]
    async fn test_wait_for_token_timeout() {
        let server = CallbackServer::bind("127.0.0.1:0").await.unwrap();
        let result = server.wait_for_token(Duration::from_millis(50)).await;
        assert!(matches!(result, Err(AppError::Timeout)));
    }
}
