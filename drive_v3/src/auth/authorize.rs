use std::borrow::Cow;

/// Endpoint de autorização OAuth2 do Google
pub const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/auth";

/// Escopo de acesso apenas aos arquivos criados/abertos pelo app
pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

/// Como os valores interpolados na query são codificados
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamEncoding {
    /// Percent-encoding em todos os parâmetros (client_id, redirect_uri, scope)
    #[default]
    Strict,
    /// Apenas o scope é codificado; client_id e redirect_uri vão como recebidos
    Verbatim,
}

/// Parâmetros de uma requisição de autorização implícita
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRequest {
    pub client_id: String,
    pub redirect_uri: String,
    endpoint: String,
    encoding: ParamEncoding,
}

impl AuthRequest {
    pub fn new(client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            endpoint: AUTH_ENDPOINT.to_string(),
            encoding: ParamEncoding::default(),
        }
    }

    /// Substitui o endpoint de autorização (útil para testes ou proxies)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_encoding(mut self, encoding: ParamEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn encoding(&self) -> ParamEncoding {
        self.encoding
    }

    /// Monta a URL de autorização do fluxo implícito.
    ///
    /// A ordem dos parâmetros é fixa: `client_id`, `redirect_uri`,
    /// `response_type=token`, `scope`, `prompt=consent`.
    pub fn authorization_url(&self) -> String {
        let (client_id, redirect_uri) = match self.encoding {
            ParamEncoding::Strict => (
                urlencoding::encode(&self.client_id),
                urlencoding::encode(&self.redirect_uri),
            ),
            ParamEncoding::Verbatim => (
                Cow::Borrowed(self.client_id.as_str()),
                Cow::Borrowed(self.redirect_uri.as_str()),
            ),
        };

        format!(
            "{}?client_id={}&redirect_uri={}&response_type=token&scope={}&prompt=consent",
            self.endpoint,
            client_id,
            redirect_uri,
            urlencoding::encode(DRIVE_FILE_SCOPE)
        )
    }
}

/// Atalho para `AuthRequest::new(..).authorization_url()` com encoding estrito
pub fn authorization_url(client_id: &str, redirect_uri: &str) -> String {
    AuthRequest::new(client_id, redirect_uri).authorization_url()
}
