//! Task-local trace id for the request being served.
//!
//! `RequestTrace` opens the scope; anything awaited inside the handler can
//! read the id back without threading it through arguments.

use tokio::task_local;

task_local! {
    static TRACE_ID: String;
}

/// Current trace id, or `"unknown"` outside a request scope (background
/// tasks such as roll workers).
pub fn trace_id() -> String {
    TRACE_ID
        .try_with(|id| id.clone())
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Run `future` with `trace_id` installed as the task-local trace id.
pub async fn with_trace_id<F, R>(trace_id: String, future: F) -> R
where
    F: std::future::Future<Output = R>,
{
    TRACE_ID.scope(trace_id, future).await
}

/// Synchronous counterpart of [`with_trace_id`], for middleware `call`s
/// that build a response before the first await.
pub fn sync_with_trace_id<F, R>(trace_id: String, f: F) -> R
where
    F: FnOnce() -> R,
{
    TRACE_ID.sync_scope(trace_id, f)
}
