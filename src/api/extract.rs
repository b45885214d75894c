//! Request body extractor accepting either JSON or an urlencoded form

use crate::api::AppState;
use crate::error::Error;
use axum::{
    Form,
    body::Body,
    extract::{FromRef, FromRequest, Request},
    http::{HeaderMap, header::CONTENT_TYPE},
};
use serde::de::DeserializeOwned;

/// Body deserialized from `application/json` or `application/x-www-form-urlencoded`
///
/// An empty body, or one of any other content type, is rejected with
/// "no data".
pub struct JsonOrForm<T>(pub T);

enum BodyKind {
    Json,
    Form,
}

fn body_kind(headers: &HeaderMap) -> Option<BodyKind> {
    let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?.to_ascii_lowercase();
    if content_type.starts_with("application/json") || content_type.contains("+json") {
        Some(BodyKind::Json)
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        Some(BodyKind::Form)
    } else {
        None
    }
}

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonOrForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let limit = AppState::from_ref(state).config.api.max_body_bytes;
        let kind = body_kind(req.headers());

        let (parts, body) = req.into_parts();
        let bytes = axum::body::to_bytes(body, limit)
            .await
            .map_err(|_| Error::PayloadTooLarge { limit })?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(Error::Validation("no data".into()));
        }

        match kind {
            Some(BodyKind::Json) => serde_json::from_slice(&bytes)
                .map(JsonOrForm)
                .map_err(|e| Error::Validation(format!("invalid JSON body: {e}"))),
            Some(BodyKind::Form) => {
                let req = Request::from_parts(parts, Body::from(bytes));
                Form::<T>::from_request(req, state)
                    .await
                    .map(|Form(value)| JsonOrForm(value))
                    .map_err(|rejection| Error::Validation(rejection.body_text()))
            }
            None => Err(Error::Validation("no data".into())),
        }
    }
}
