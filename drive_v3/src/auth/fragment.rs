use once_cell::sync::Lazy;
use regex::Regex;

static ACCESS_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"access_token=([^&]*)").expect("regex de access_token inválida")
});

/// Retorna a parte após o primeiro `#`, ou a entrada inteira se não houver `#`
pub(crate) fn fragment_of(input: &str) -> &str {
    input.split_once('#').map(|(_, fragment)| fragment).unwrap_or(input)
}

/// Extrai o `access_token` do fragmento da URL de retorno do OAuth2.
///
/// Aceita tanto o fragmento (`#access_token=...`) quanto a URL completa.
/// Sem `#`, a entrada inteira é pesquisada, inclusive a query string.
/// O valor é devolvido exatamente como aparece, sem percent-decoding;
/// um valor vazio resulta em `Some("")`.
pub fn extract_access_token(input: &str) -> Option<String> {
    ACCESS_TOKEN_RE
        .captures(fragment_of(input))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_token_from_fragment() {
        let token = extract_access_token("#access_token=ABC123&token_type=Bearer");
        assert_eq!(token.as_deref(), Some("ABC123"));
    }

    #[test]
    fn test_extract_token_missing_key() {
        assert!(extract_access_token("#foo=bar").is_none());
        assert!(extract_access_token("").is_none());
        assert!(extract_access_token("#").is_none());
    }

    #[test]
    fn test_extract_token_empty_value() {
        let token = extract_access_token("#access_token=&other=1");
        assert_eq!(token.as_deref(), Some(""));
    }

    #[test]
    fn test_extract_token_from_full_url() {
        let url = "http://localhost:8888/callback#state=x&access_token=ya29.a0Af&expires_in=3599";
        assert_eq!(extract_access_token(url).as_deref(), Some("ya29.a0Af"));
    }

    #[test]
    fn test_extract_token_ignores_query_when_fragment_present() {
        let url = "http://localhost/callback?access_token=from_query#token_type=Bearer";
        assert!(extract_access_token(url).is_none());
    }

    #[test]
    fn test_extract_token_without_hash_prefix() {
        let token = extract_access_token("access_token=xyz&scope=drive");
        assert_eq!(token.as_deref(), Some("xyz"));
    }

    #[test]
    fn test_extract_token_from_query_when_no_fragment() {
        let token = extract_access_token("http://x/cb?access_token=q");
        assert_eq!(token.as_deref(), Some("q"));
    }

    #[test]
    fn test_extract_token_keeps_encoded_value() {
        let token = extract_access_token("#access_token=a%2Fb%3D&x=1");
        assert_eq!(token.as_deref(), Some("a%2Fb%3D"));
    }

    #[test]
    fn test_extract_token_value_runs_to_end() {
        let token = extract_access_token("#token_type=Bearer&access_token=last");
        assert_eq!(token.as_deref(), Some("last"));
    }

    #[test]
    fn test_fragment_of() {
        assert_eq!(fragment_of("http://a/b#x=1#y"), "x=1#y");
        assert_eq!(fragment_of("x=1"), "x=1");
    }
}
