//! HTTP request/response aliases and response builders.
//!
//! Builders never fail: they start from [`Response::new`] and set status and
//! headers in place, so no builder error needs handling at call sites.

use std::convert::Infallible;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue, X_CONTENT_TYPE_OPTIONS};
use http::{Request, Response, StatusCode};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};
use serde::Serialize;

/// Response body type used throughout the server.
pub type ApiBody = UnsyncBoxBody<Bytes, Infallible>;
/// Request with its body fully buffered.
pub type ApiRequest = Request<Bytes>;
/// Response produced by handlers.
pub type ApiResponse = Response<ApiBody>;

pub(crate) const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub(crate) const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
pub(crate) const WATCH_CONTENT_TYPE: &str = "application/json;stream=watch; charset=utf-8";

/// Wraps bytes in a response body.
pub fn full_body(bytes: impl Into<Bytes>) -> ApiBody {
    Full::new(bytes.into()).boxed_unsync()
}

/// Body with no bytes.
pub fn empty_body() -> ApiBody {
    Empty::new().boxed_unsync()
}

fn with_content_type(status: StatusCode, content_type: &'static str, body: ApiBody) -> ApiResponse {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// Plain text response.
pub fn text_response(status: StatusCode, text: impl Into<String>) -> ApiResponse {
    with_content_type(status, TEXT_CONTENT_TYPE, full_body(text.into()))
}

/// Plain text error: message plus trailing newline, sniffing disabled.
pub fn error_response(status: StatusCode, message: &str) -> ApiResponse {
    let mut response = text_response(status, format!("{message}\n"));
    response
        .headers_mut()
        .insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    response
}

/// JSON document terminated by a newline. Encoding failures become a 500.
pub fn json_response<T>(status: StatusCode, value: &T) -> ApiResponse
where
    T: Serialize + ?Sized,
{
    match serde_json::to_vec(value) {
        Ok(mut encoded) => {
            encoded.push(b'\n');
            with_content_type(status, JSON_CONTENT_TYPE, full_body(encoded))
        }
        Err(error) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("failed to encode response: {error}"),
        ),
    }
}

/// JSON response from bytes encoded ahead of time.
pub(crate) fn encoded_json_response(encoded: Bytes) -> ApiResponse {
    with_content_type(StatusCode::OK, JSON_CONTENT_TYPE, full_body(encoded))
}

/// Streaming watch response.
pub(crate) fn watch_response(body: ApiBody) -> ApiResponse {
    with_content_type(StatusCode::OK, WATCH_CONTENT_TYPE, body)
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    async fn body_text(response: ApiResponse) -> String {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("infallible body")
            .to_bytes();
        String::from_utf8(bytes.to_vec()).expect("utf-8 body")
    }

    #[tokio::test]
    async fn error_response_mirrors_plain_text_errors() {
        let response = error_response(StatusCode::GONE, "too old resource version");
        assert_eq!(response.status(), StatusCode::GONE);
        assert_eq!(response.headers()[CONTENT_TYPE], TEXT_CONTENT_TYPE);
        assert_eq!(response.headers()[X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(body_text(response).await, "too old resource version\n");
    }

    #[tokio::test]
    async fn json_response_appends_newline() {
        let response = json_response(StatusCode::OK, &serde_json::json!({"a": 1}));
        assert_eq!(response.headers()[CONTENT_TYPE], JSON_CONTENT_TYPE);
        assert_eq!(body_text(response).await, "{\"a\":1}\n");
    }
}
