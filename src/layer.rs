//! Tower middleware running the request interceptor in front of handlers.

use crate::plugin::{DeprecationPlugin, Interception};
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use futures_util::future::BoxFuture;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower layer that applies deprecation headers and sunset enforcement.
#[derive(Clone)]
pub struct DeprecationLayer {
    plugin: DeprecationPlugin,
}

impl DeprecationLayer {
    pub fn new(plugin: DeprecationPlugin) -> Self {
        Self { plugin }
    }
}

impl<S> Layer<S> for DeprecationLayer {
    type Service = DeprecationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DeprecationService {
            inner,
            plugin: self.plugin.clone(),
        }
    }
}

/// Service that intercepts requests to deprecated routes.
#[derive(Clone)]
pub struct DeprecationService<S> {
    inner: S,
    plugin: DeprecationPlugin,
}

impl<S, ReqBody> Service<Request<ReqBody>> for DeprecationService<S>
where
    S: Service<Request<ReqBody>, Response = Response> + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ReqBody: 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let url = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| req.uri().path())
            .to_string();

        let Some(interception) = self.plugin.intercept(&url) else {
            return Box::pin(self.inner.call(req));
        };

        if let Some(response) = rejection_response(&interception) {
            return Box::pin(std::future::ready(Ok(response)));
        }

        let future = self.inner.call(req);
        Box::pin(async move {
            let mut response = future.await?;
            interception.headers.apply(response.headers_mut());
            Ok(response)
        })
    }
}

/// Build the 410 Gone response for a rejected request.
fn rejection_response(interception: &Interception) -> Option<Response> {
    let body = interception.rejection.as_ref()?;
    let mut response = (StatusCode::GONE, Json(body)).into_response();
    interception.headers.apply(response.headers_mut());
    Some(response)
}
