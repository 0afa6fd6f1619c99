//! Assertions for the `application/problem+json` error contract.
//!
//! Deliberately independent of backend types so the contract is checked
//! from the outside, the way a client sees it.

use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ProblemDetailsLike {
    #[serde(rename = "type")]
    pub type_: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub code: String,
    pub trace_id: String,
}

/// Assert that a service response is a problem-details body with the given
/// status and code, and that `x-trace-id` matches the body's `trace_id`.
/// Returns the parsed body for further checks.
pub async fn assert_problem<B>(
    resp: ServiceResponse<B>,
    expected_status: StatusCode,
    expected_code: &str,
) -> ProblemDetailsLike
where
    B: MessageBody,
{
    assert_eq!(resp.status(), expected_status, "unexpected status");

    let headers = resp.headers().clone();
    let content_type = headers
        .get(actix_web::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(
        content_type.starts_with("application/problem+json"),
        "Content-Type must be application/problem+json (got {content_type})"
    );

    let body = actix_web::body::to_bytes(resp.into_body())
        .await
        .unwrap_or_else(|_| panic!("failed to read response body"));
    let problem: ProblemDetailsLike = serde_json::from_slice(&body).unwrap_or_else(|_| {
        panic!(
            "body is not ProblemDetails: {}",
            String::from_utf8_lossy(&body)
        )
    });

    let header_trace = headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .expect("x-trace-id header should be present");
    assert_eq!(problem.trace_id, header_trace, "trace_id parity");
    assert_eq!(problem.status, expected_status.as_u16());
    assert_eq!(problem.code, expected_code);

    problem
}
