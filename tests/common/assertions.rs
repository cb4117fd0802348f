//! Assertion helpers for tests.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use super::app::TestResponse;

/// Assert response has expected status code
pub fn assert_status(response: &TestResponse, expected: StatusCode) {
    assert_eq!(
        response.status, expected,
        "Expected status {}, got {}. Body: {}",
        expected,
        response.status,
        response.text()
    );
}

/// Assert response is OK (200)
pub fn assert_ok(response: &TestResponse) {
    assert_status(response, StatusCode::OK);
}

/// Assert response is a valid PNG image
pub fn assert_png(response: &TestResponse) {
    assert_ok(response);
    assert!(
        response.is_png(),
        "Expected PNG image, got {} bytes starting with {:?}",
        response.body.len(),
        &response.body[..8.min(response.body.len())]
    );

    // Check Content-Type header
    let content_type = response
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok());
    assert_eq!(
        content_type,
        Some("image/png"),
        "Expected Content-Type: image/png"
    );
}

/// Assert an error body of the `{"status": N, "error": "..."}` shape,
/// with the message containing `fragment`
pub fn assert_error_body(response: &TestResponse, expected: StatusCode, fragment: &str) {
    assert_status(response, expected);
    let json: serde_json::Value = response.json();
    assert_eq!(
        json["status"].as_u64(),
        Some(expected.as_u16() as u64),
        "JSON status field should mirror the HTTP status. Body: {}",
        response.text()
    );
    let error = json["error"].as_str().unwrap_or_default();
    assert!(
        error.contains(fragment),
        "Expected error containing {fragment:?}, got {error:?}"
    );
}

/// Assert a valid poster response and return the parsed body
pub fn assert_valid_poster_response(response: &TestResponse) -> serde_json::Value {
    assert_ok(response);
    let json: serde_json::Value = response.json();

    assert!(json["theme"].is_string(), "Expected theme name");
    let page_total = json["page_total"].as_u64().expect("page_total");
    let pages = json["pages"].as_array().expect("pages array");
    assert_eq!(pages.len() as u64, page_total, "page_total matches pages");

    for (i, page) in pages.iter().enumerate() {
        assert_eq!(
            page["page_index"].as_u64(),
            Some(i as u64 + 1),
            "pages are 1-based and in order"
        );
        assert_eq!(page["page_total"].as_u64(), Some(page_total));
        assert!(page["png_base64"].is_string(), "page carries PNG data");
    }

    json
}

/// Decode one page's PNG out of a poster response body
pub fn decode_page_png(poster: &serde_json::Value, index: usize) -> Vec<u8> {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

    let b64 = poster["pages"][index]["png_base64"]
        .as_str()
        .expect("png_base64 present");
    BASE64.decode(b64).expect("valid base64")
}
