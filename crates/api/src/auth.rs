//! Bearer-token authorization for the product orchestration routes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;

/// Scope required to read aggregates.
pub const READ_SCOPE: &str = "product:read";

/// Scope required to create or delete aggregates.
pub const WRITE_SCOPE: &str = "product:write";

/// Resolves a bearer token to the scopes it grants.
pub trait TokenVerifier: Send + Sync {
    /// Returns `None` for an unknown token.
    fn scopes(&self, token: &str) -> Option<HashSet<String>>;
}

/// Verifier over a fixed token table.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, HashSet<String>>,
}

impl StaticTokenVerifier {
    /// Parses `token=scope scope;token=scope`. Malformed entries are skipped.
    pub fn parse(raw: &str) -> Self {
        let mut tokens = HashMap::new();
        for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            match entry.split_once('=') {
                Some((token, scopes)) if !token.trim().is_empty() => {
                    tokens.insert(
                        token.trim().to_string(),
                        scopes.split_whitespace().map(str::to_string).collect(),
                    );
                }
                _ => tracing::warn!("skipping malformed AUTH_TOKENS entry"),
            }
        }
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl TokenVerifier for StaticTokenVerifier {
    fn scopes(&self, token: &str) -> Option<HashSet<String>> {
        self.tokens.get(token).cloned()
    }
}

/// Scopes granted to the caller of an authorized request, available to
/// handlers as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub scopes: Vec<String>,
}

impl Caller {
    fn new(scopes: HashSet<String>) -> Self {
        let mut scopes: Vec<String> = scopes.into_iter().collect();
        scopes.sort();
        Self { scopes }
    }
}

#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AuthState {
    pub fn new(verifier: impl TokenVerifier + 'static) -> Self {
        Self {
            verifier: Arc::new(verifier),
        }
    }
}

/// Rejects requests whose token lacks the scope the method requires.
pub async fn authorize(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let required = required_scope(req.method());

    let token = extract_bearer(req.headers()).inspect_err(|_| {
        metrics::counter!("auth_rejections_total", "reason" => "missing_token").increment(1);
    })?;

    let scopes = state.verifier.scopes(token).ok_or_else(|| {
        metrics::counter!("auth_rejections_total", "reason" => "unknown_token").increment(1);
        ApiError::Unauthorized("Invalid bearer token".to_string())
    })?;

    if !scopes.contains(required) {
        metrics::counter!("auth_rejections_total", "reason" => "missing_scope").increment(1);
        tracing::debug!(method = %req.method(), required, "insufficient scope");
        return Err(ApiError::Forbidden(format!("Missing scope: {required}")));
    }

    let caller = Caller::new(scopes);
    tracing::debug!(
        method = %req.method(),
        path = %req.uri().path(),
        scopes = ?caller.scopes,
        "request authorized"
    );
    req.extensions_mut().insert(caller);

    Ok(next.run(req).await)
}

fn required_scope(method: &Method) -> &'static str {
    if *method == Method::GET || *method == Method::HEAD {
        READ_SCOPE
    } else {
        WRITE_SCOPE
    }
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let missing = || ApiError::Unauthorized("Missing bearer token".to_string());

    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(missing)?;
    let header = header.to_str().map_err(|_| missing())?;
    let token = header.strip_prefix("Bearer ").ok_or_else(missing)?.trim();

    if token.is_empty() {
        return Err(missing());
    }
    Ok(token)
}
