use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::ApiError;
use crate::state::AppState;

/// Accepted bearer tokens. An empty set accepts nothing.
#[derive(Debug, Clone, Default)]
pub struct TokenSet {
    tokens: Vec<String>,
}

impl TokenSet {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TokenSet {
            tokens: tokens
                .into_iter()
                .map(Into::into)
                .filter(|t: &String| !t.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Checks every configured token so the time taken does not depend on
    /// which one matched.
    pub fn contains(&self, candidate: &str) -> bool {
        self.tokens.iter().fold(false, |found, token| {
            constant_time_eq(token.as_bytes(), candidate.as_bytes()) | found
        })
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Extractor guarding routes that need `Authorization: Bearer <token>`.
pub struct ApiToken;

#[async_trait]
impl FromRequestParts<AppState> for ApiToken {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| ApiError::Unauthorized("missing Authorization header".into()))?;
        let value = header
            .to_str()
            .map_err(|_| ApiError::Unauthorized("invalid header string".into()))?;
        let token = value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("expected a bearer token".into()))?;

        if state.tokens.contains(token) {
            Ok(ApiToken)
        } else {
            Err(ApiError::Unauthorized("invalid token".into()))
        }
    }
}
