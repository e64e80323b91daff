//! Token gate in front of every gRPC route.
//!
//! Runs as a tower layer on the tonic server so it sees the method path and
//! can exempt the calls a client makes before it holds a token. Rejected
//! calls are answered with a trailers-only `UNAUTHENTICATED` response and
//! never reach the handler.

use futures::future::BoxFuture;
use http::{header::AUTHORIZATION, HeaderMap, HeaderValue};
use service_core::grpc::RequestContext;
use std::collections::HashSet;
use std::sync::Arc;
use std::task::{Context, Poll};
use tonic::Status;
use tower::{Layer, Service};
use tracing::Instrument;

use crate::services::{metrics, TokenValidator};

/// Methods reachable without a token.
pub const PUBLIC_METHODS: &[&str] = &["/sso.auth.v1.Auth/Register", "/sso.auth.v1.Auth/Login"];

/// Identity of the caller, inserted into request extensions by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(i64);

impl AuthenticatedUser {
    pub(crate) fn new(user_id: i64) -> Self {
        Self(user_id)
    }

    pub fn user_id(&self) -> i64 {
        self.0
    }
}

/// Identity placed on the request by the gate.
#[allow(clippy::result_large_err)]
pub fn authenticated_user<T>(request: &tonic::Request<T>) -> Result<AuthenticatedUser, Status> {
    request
        .extensions()
        .get::<AuthenticatedUser>()
        .copied()
        .ok_or_else(|| Status::unauthenticated("user unauthenticated"))
}

#[derive(Clone)]
pub struct RequestGateLayer {
    validator: Arc<dyn TokenValidator>,
    public_methods: Arc<HashSet<String>>,
}

impl RequestGateLayer {
    /// Gate with no public methods.
    pub fn new(validator: Arc<dyn TokenValidator>) -> Self {
        Self {
            validator,
            public_methods: Arc::new(HashSet::new()),
        }
    }

    /// Gate exempting `Register` and `Login`.
    pub fn sso_defaults(validator: Arc<dyn TokenValidator>) -> Self {
        PUBLIC_METHODS
            .iter()
            .fold(Self::new(validator), |layer, path| layer.with_public_method(*path))
    }

    pub fn with_public_method(mut self, path: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.public_methods).insert(path.into());
        self
    }
}

impl<S> Layer<S> for RequestGateLayer {
    type Service = RequestGate<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestGate {
            inner,
            validator: self.validator.clone(),
            public_methods: self.public_methods.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RequestGate<S> {
    inner: S,
    validator: Arc<dyn TokenValidator>,
    public_methods: Arc<HashSet<String>>,
}

/// Why a call was rejected; the label of the rejection counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rejection {
    MissingMetadata,
    InvalidMetadata,
    InvalidToken,
}

impl Rejection {
    fn label(&self) -> &'static str {
        match self {
            Rejection::MissingMetadata => "missing_metadata",
            Rejection::InvalidMetadata => "invalid_metadata",
            Rejection::InvalidToken => "invalid_token",
        }
    }

    fn into_status(self) -> Status {
        match self {
            Rejection::MissingMetadata => Status::unauthenticated("metadata is not provided"),
            Rejection::InvalidMetadata => Status::unauthenticated("invalid token provided"),
            Rejection::InvalidToken => Status::unauthenticated("user unauthenticated"),
        }
    }
}

/// Pull the bearer token out of the `authorization` header. A `Bearer `
/// prefix is optional.
pub(crate) fn extract_token(headers: &HeaderMap) -> Result<&str, Rejection> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(Rejection::MissingMetadata)?
        .to_str()
        .map_err(|_| Rejection::InvalidMetadata)?
        .trim_start();

    let token = match value.strip_prefix("Bearer ") {
        Some(rest) => rest,
        None if value.trim_end() == "Bearer" => "",
        None => value,
    }
    .trim();
    if token.is_empty() {
        return Err(Rejection::InvalidMetadata);
    }
    Ok(token)
}

fn reject<B: Default>(status: Status) -> http::Response<B> {
    let mut response = http::Response::new(B::default());
    let headers = response.headers_mut();
    headers.insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_static("application/grpc"),
    );
    if let Err(e) = status.add_header(headers) {
        tracing::error!(error = %e, "Failed to encode gRPC status headers");
    }
    response
}

impl<S, ReqBody, ResBody> Service<http::Request<ReqBody>> for RequestGate<S>
where
    S: Service<http::Request<ReqBody>, Response = http::Response<ResBody>>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Default + Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: http::Request<ReqBody>) -> Self::Future {
        // Take the service that was driven to readiness
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let method = request.uri().path().to_string();
        let context = request
            .extensions()
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default();
        let request_id = context.request_id.unwrap_or_default();
        let traceparent = context.traceparent.unwrap_or_default();

        if self.public_methods.contains(&method) {
            tracing::debug!(
                method = %method,
                request_id = %request_id,
                "Public method, skipping token check"
            );
            return Box::pin(inner.call(request));
        }

        let user_id = extract_token(request.headers()).and_then(|token| {
            self.validator
                .validate_token(token)
                .map_err(|_| Rejection::InvalidToken)
        });

        let user_id = match user_id {
            Ok(user_id) => user_id,
            Err(rejection) => {
                tracing::warn!(
                    method = %method,
                    request_id = %request_id,
                    reason = rejection.label(),
                    "Request rejected"
                );
                metrics::record_gate_rejection(rejection.label());
                return Box::pin(async move { Ok(reject(rejection.into_status())) });
            }
        };

        request
            .extensions_mut()
            .insert(AuthenticatedUser::new(user_id));

        let span = tracing::info_span!(
            "grpc_call",
            method = %method,
            user_id = user_id,
            request_id = %request_id,
            traceparent = %traceparent,
        );

        Box::pin(
            async move {
                tracing::info!("Received request");
                let response = inner.call(request).await;
                tracing::info!("Sending response");
                response
            }
            .instrument(span),
        )
    }
}
