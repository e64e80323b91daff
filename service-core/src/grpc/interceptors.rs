//! gRPC interceptors for cross-cutting concerns that do not reject calls.

use tonic::{Request, Status};

/// gRPC metadata key for W3C traceparent header.
pub const TRACEPARENT_KEY: &str = "traceparent";

/// gRPC metadata key for request ID.
pub const REQUEST_ID_KEY: &str = "x-request-id";

/// Correlation data pulled from incoming metadata, stored in the request
/// extensions for handlers that want to log it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: Option<String>,
    pub traceparent: Option<String>,
}

/// Interceptor that lifts the request ID and traceparent out of metadata.
///
/// ```ignore
/// let layer = tonic::service::interceptor(trace_context_interceptor);
/// ```
#[allow(clippy::result_large_err)]
pub fn trace_context_interceptor(mut request: Request<()>) -> Result<Request<()>, Status> {
    let context = RequestContext {
        request_id: extract_request_id(&request),
        traceparent: extract_traceparent(&request),
    };

    if let Some(traceparent) = &context.traceparent {
        tracing::debug!(traceparent = %traceparent, "Received trace context");
    }

    request.extensions_mut().insert(context);
    Ok(request)
}

/// Extract trace context from incoming gRPC request metadata.
pub fn extract_traceparent<T>(request: &Request<T>) -> Option<String> {
    request
        .metadata()
        .get(TRACEPARENT_KEY)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Extract request ID from incoming gRPC request metadata.
pub fn extract_request_id<T>(request: &Request<T>) -> Option<String> {
    request
        .metadata()
        .get(REQUEST_ID_KEY)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
