//! Per-request CSP nonce.
//!
//! Templates put the nonce on every `<script>` tag; the security headers
//! middleware puts the same value in `script-src`.

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;

/// Nonce length in bytes before encoding.
const NONCE_BYTES: usize = 16;

/// A base64-encoded, 128-bit random nonce.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CspNonce(pub String);

impl CspNonce {
    /// Generate a fresh nonce from the thread-local CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self(STANDARD.encode(bytes))
    }

    /// Nonce value for templates.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Store a fresh [`CspNonce`] in the request extensions.
///
/// Must run before `security_headers_middleware`, i.e. be layered outside it.
pub async fn csp_nonce_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(CspNonce::generate());
    next.run(request).await
}

impl<S> FromRequestParts<S> for CspNonce
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(nonce) = parts.extensions.get::<Self>() {
            return Ok(nonce.clone());
        }

        // An empty nonce matches nothing, so inline scripts stay blocked
        tracing::warn!("CSP nonce missing from request extensions");
        Ok(Self(String::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_random_and_encoded() {
        let first = CspNonce::generate();
        let second = CspNonce::generate();

        assert_ne!(first, second);
        // 16 bytes -> 24 base64 chars with padding
        assert_eq!(first.value().len(), 24);
        assert!(STANDARD.decode(first.value()).is_ok());
    }
}
