//! Authentication middleware for the REST API
//!
//! Every API request must carry the shared token. It is looked up in order:
//! the `X-Auth-Token` header, a `token` field of a urlencoded or multipart
//! body, then the `token` query parameter. The first source present is the
//! one compared; a missing or mismatched token gets 401 Unauthorized.

use crate::error::{Error, Result};
use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Multipart, Request, State},
    http::{HeaderMap, Uri, header::CONTENT_LENGTH, header::CONTENT_TYPE, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Header carrying the token
pub const TOKEN_HEADER: &str = "x-auth-token";

/// Form field and query parameter carrying the token
pub const TOKEN_PARAM: &str = "token";

/// Middleware state: the expected token and the body buffering limit
#[derive(Clone)]
pub struct TokenAuth {
    token: Arc<str>,
    max_body_bytes: usize,
}

impl TokenAuth {
    /// Expect `token`; bodies searched for a form field are capped at `max_body_bytes`
    pub fn new(token: impl Into<String>, max_body_bytes: usize) -> Self {
        Self {
            token: Arc::from(token.into()),
            max_body_bytes,
        }
    }
}

#[derive(Clone, Copy)]
enum FormKind {
    UrlEncoded,
    Multipart,
}

/// Authentication middleware that checks the shared token
///
/// # Examples
///
/// ```no_run
/// use axum::{Router, middleware};
/// use media_dl::api::auth::{TokenAuth, require_token};
///
/// let router: Router = Router::new()
///     .route_layer(middleware::from_fn_with_state(
///         TokenAuth::new("secret-token", 2 * 1024 * 1024),
///         require_token,
///     ));
/// ```
pub async fn require_token(
    State(auth): State<TokenAuth>,
    request: Request,
    next: Next,
) -> Response {
    let (request, provided) = match find_token(request, auth.max_body_bytes).await {
        Found::Intact(request, provided) => (Some(request), provided),
        Found::Oversized(provided) => (None, provided),
    };

    // Uses constant-time comparison to prevent timing side-channel attacks
    match provided {
        Some(provided) if constant_time_eq(provided.as_bytes(), auth.token.as_bytes()) => {
            match request {
                Some(request) => next.run(request).await,
                None => Error::PayloadTooLarge {
                    limit: auth.max_body_bytes,
                }
                .into_response(),
            }
        }
        Some(_) => unauthorized_response("invalid token"),
        None => unauthorized_response("missing token"),
    }
}

/// Outcome of the token lookup
enum Found {
    /// Request with its body intact, plus the token if one was supplied
    Intact(Request, Option<String>),
    /// Form body exceeded the limit and is gone; only the query was searched
    Oversized(Option<String>),
}

/// Locate the token, handing back the request with its body intact
async fn find_token(request: Request, limit: usize) -> Found {
    if let Some(token) = header_token(request.headers()) {
        return Found::Intact(request, Some(token));
    }

    let (request, form_token) = match form_kind(request.headers()) {
        Some(kind) => {
            let (parts, body) = request.into_parts();
            let Ok(bytes) = read_limited(&parts, body, limit).await else {
                return Found::Oversized(query_token(&parts.uri));
            };
            let token = match kind {
                FormKind::UrlEncoded => urlencoded_token(&bytes),
                FormKind::Multipart => multipart_token(&parts, bytes.clone()).await,
            };
            (Request::from_parts(parts, Body::from(bytes)), token)
        }
        None => (request, None),
    };

    if form_token.is_some() {
        return Found::Intact(request, form_token);
    }
    let query = query_token(request.uri());
    Found::Intact(request, query)
}

fn header_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn form_kind(headers: &HeaderMap) -> Option<FormKind> {
    let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?.to_ascii_lowercase();
    if content_type.starts_with("application/x-www-form-urlencoded") {
        Some(FormKind::UrlEncoded)
    } else if content_type.starts_with("multipart/form-data") {
        Some(FormKind::Multipart)
    } else {
        None
    }
}

async fn read_limited(parts: &Parts, body: Body, limit: usize) -> Result<Bytes> {
    let declared = parts
        .headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) {
        return Err(Error::PayloadTooLarge { limit });
    }

    axum::body::to_bytes(body, limit)
        .await
        .map_err(|_| Error::PayloadTooLarge { limit })
}

fn urlencoded_token(body: &[u8]) -> Option<String> {
    url::form_urlencoded::parse(body)
        .find(|(key, _)| key == TOKEN_PARAM)
        .map(|(_, value)| value.into_owned())
}

async fn multipart_token(parts: &Parts, body: Bytes) -> Option<String> {
    let mut probe = Request::new(Body::from(body));
    if let Some(content_type) = parts.headers.get(CONTENT_TYPE) {
        probe.headers_mut().insert(CONTENT_TYPE, content_type.clone());
    }
    // Carries the body limit set by DefaultBodyLimit
    *probe.extensions_mut() = parts.extensions.clone();

    let mut multipart = Multipart::from_request(probe, &()).await.ok()?;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some(TOKEN_PARAM) {
            return field.text().await.ok();
        }
    }
    None
}

fn query_token(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == TOKEN_PARAM)
        .map(|(_, value)| value.into_owned())
}

/// Constant-time byte comparison to prevent timing side-channel attacks.
/// Always compares all bytes regardless of where the first mismatch occurs.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Helper function to create a 401 Unauthorized response with a JSON error message
fn unauthorized_response(message: &str) -> Response {
    tracing::debug!(reason = message, "Rejected unauthorized request");
    Error::Unauthorized(message.to_string()).into_response()
}
