use std::env;

use actix_cors::Cors;
use actix_web::http::header;

/// Browser origins come from `CORS_ALLOWED_ORIGINS` (comma separated,
/// http/https only). With nothing usable configured only the local dev
/// frontend is allowed.
pub fn cors_middleware() -> Cors {
    let configured = env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default();
    let mut origins = parse_origins(&configured);
    if origins.is_empty() {
        origins = vec![
            "http://localhost:3000".to_string(),
            "http://127.0.0.1:3000".to_string(),
        ];
    }

    origins.iter().fold(
        Cors::default()
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::CONTENT_TYPE,
                header::ACCEPT,
            ])
            .expose_headers(vec![
                header::HeaderName::from_static("x-trace-id"),
                header::HeaderName::from_static("x-request-id"),
            ])
            .max_age(3600),
        |cors, origin| cors.allowed_origin(origin),
    )
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "null")
        .filter(|s| s.starts_with("http://") || s.starts_with("https://"))
        .map(str::to_string)
        .collect()
}
