use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use url::form_urlencoded;

use super::fragment::{extract_access_token, fragment_of};

/// Margem de renovação antecipada (5 minutos)
const EXPIRY_MARGIN_SECS: u64 = 300;

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn fragment_params(input: &str) -> HashMap<String, String> {
    form_urlencoded::parse(fragment_of(input).as_bytes())
        .into_owned()
        .collect()
}

/// Token entregue pelo fluxo implícito no fragmento da URL de retorno
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplicitToken {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub received_at: u64,
}

impl ImplicitToken {
    /// Lê o token e os campos auxiliares do fragmento.
    ///
    /// `access_token` segue a mesma regra de [`extract_access_token`]; os
    /// demais campos são decodificados como `application/x-www-form-urlencoded`.
    pub fn from_fragment(input: &str) -> Option<Self> {
        let access_token = extract_access_token(input)?;
        let params = fragment_params(input);

        Some(Self {
            access_token,
            token_type: params
                .get("token_type")
                .cloned()
                .unwrap_or_else(|| "Bearer".to_string()),
            expires_in: params.get("expires_in").and_then(|v| v.parse().ok()),
            scope: params.get("scope").cloned(),
            received_at: now_secs(),
        })
    }

    /// Verifica a expiração em relação a um instante (segundos Unix)
    pub fn is_expired_at(&self, now: u64) -> bool {
        match self.expires_in {
            Some(expires_in) => {
                let expiry = self
                    .received_at
                    .saturating_add(expires_in)
                    .saturating_sub(EXPIRY_MARGIN_SECS);
                now >= expiry
            }
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_secs())
    }

    /// Valor para o header `Authorization`
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// Prévia do token para logs (nunca o token inteiro)
    pub fn preview(&self) -> String {
        token_preview(&self.access_token)
    }
}

/// Prévia `abcd...wxyz` de um token
pub fn token_preview(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() > 10 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "***".to_string()
    }
}

/// Erro OAuth2 devolvido no fragmento (`#error=access_denied`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplicitError {
    pub error: String,
    pub description: Option<String>,
}

impl ImplicitError {
    pub fn from_fragment(input: &str) -> Option<Self> {
        let mut params = fragment_params(input);
        let error = params.remove("error")?;

        Some(Self {
            error,
            description: params.remove("error_description"),
        })
    }

    pub fn is_access_denied(&self) -> bool {
        self.error == "access_denied"
    }
}

impl std::fmt::Display for ImplicitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.description {
            Some(description) => write!(f, "{}: {}", self.error, description),
            None => write!(f, "{}", self.error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_from_fragment() {
        let token = ImplicitToken::from_fragment(
            "#access_token=ya29.token&token_type=Bearer&expires_in=3599\
             &scope=https://www.googleapis.com/auth/drive.file",
        )
        .unwrap();

        assert_eq!(token.access_token, "ya29.token");
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_in, Some(3599));
        assert_eq!(token.scope.as_deref(), Some("https://www.googleapis.com/auth/drive.file"));
        assert!(!token.is_expired());
    }

    #[test]
    fn test_token_from_fragment_without_token() {
        assert!(ImplicitToken::from_fragment("#error=access_denied").is_none());
    }

    #[test]
    fn test_token_defaults() {
        let token = ImplicitToken::from_fragment("#access_token=abc").unwrap();
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_in, None);
        assert!(!token.is_expired_at(u64::MAX));
    }

    #[test]
    fn test_is_expired_at_uses_margin() {
        let token = ImplicitToken {
            access_token: "abc".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: Some(3600),
            scope: None,
            received_at: 1_000,
        };

        assert!(!token.is_expired_at(1_000 + 3_000));
        assert!(token.is_expired_at(1_000 + 3_300));
    }

    #[test]
    fn test_huge_expires_in_does_not_overflow() {
        let token =
            ImplicitToken::from_fragment("#access_token=abc&expires_in=18446744073709551615")
                .unwrap();

        assert_eq!(token.expires_in, Some(u64::MAX));
        assert!(!token.is_expired());
    }

    #[test]
    fn test_authorization_header() {
        let token = ImplicitToken::from_fragment("#access_token=abc123").unwrap();
        assert_eq!(token.authorization_header(), "Bearer abc123");
    }

    #[test]
    fn test_token_preview() {
        assert_eq!(token_preview("ya29.abcdefghijkl"), "ya29...ijkl");
        assert_eq!(token_preview("short"), "***");
    }

    #[test]
    fn test_implicit_error_from_fragment() {
        let error = ImplicitError::from_fragment("#error=access_denied&error_description=User+denied")
            .unwrap();

        assert!(error.is_access_denied());
        assert_eq!(error.description.as_deref(), Some("User denied"));
        assert_eq!(error.to_string(), "access_denied: User denied");
        assert!(ImplicitError::from_fragment("#access_token=x").is_none());
    }
}
