//! Request builders and body readers for in-process dispatch tests.

use bytes::Bytes;
use http::{Method, Request};
use http_body_util::BodyExt;
use serde_json::Value;

use crate::dispatch::{ApiBody, ApiRequest, ApiResponse};

/// Builds a bodiless request.
pub fn request(method: Method, uri: &str) -> ApiRequest {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Bytes::new())
        .expect("request should build")
}

/// Builds a bodiless `GET`.
pub fn get(uri: &str) -> ApiRequest {
    request(Method::GET, uri)
}

/// Collects the full response body as UTF-8.
pub async fn read_text(response: ApiResponse) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body is infallible")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("body should be UTF-8")
}

/// Collects the full response body as JSON.
pub async fn read_json(response: ApiResponse) -> Value {
    let text = read_text(response).await;
    serde_json::from_str(&text).expect("body should be JSON")
}

/// Reads the next watch frame, or `None` once the stream ended.
pub async fn next_json_frame(body: &mut ApiBody) -> Option<Value> {
    let frame = body.frame().await?.expect("body is infallible");
    let data = frame.into_data().expect("watch bodies only carry data");
    assert_eq!(data.last(), Some(&b'\n'), "frames end with a newline");
    Some(serde_json::from_slice(&data).expect("frame should be JSON"))
}
