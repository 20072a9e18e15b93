/// CORS Middleware
///
/// Requests carrying an `Origin` outside the configured list are refused
/// with 403. Allowed origins are echoed back with credentials enabled, and
/// preflight `OPTIONS` requests are answered with 204 directly.

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::InternalError,
    http::{
        header::{self, HeaderMap, HeaderValue},
        Method,
    },
    Error, HttpResponse,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::sync::Arc;

const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE";
const ALLOWED_HEADERS: &str =
    "Origin, X-Requested-With, Content-Type, Accept, Authorization, X-API-KEY";

pub struct CorsMiddleware {
    allowed_origins: Arc<Vec<String>>,
}

impl CorsMiddleware {
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self {
            allowed_origins: Arc::new(allowed_origins),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for CorsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = CorsMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(CorsMiddlewareService {
            service: Rc::new(service),
            allowed_origins: self.allowed_origins.clone(),
        }))
    }
}

pub struct CorsMiddlewareService<S> {
    service: Rc<S>,
    allowed_origins: Arc<Vec<String>>,
}

fn apply_cors_headers(headers: &mut HeaderMap, origin: HeaderValue) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
}

impl<S, B> Service<ServiceRequest> for CorsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let origin = req.headers().get(header::ORIGIN).cloned();

        // Same-origin and non-browser clients send no Origin header
        let origin = match origin {
            None => {
                let service = self.service.clone();
                return Box::pin(async move {
                    service.call(req).await.map(|res| res.map_into_left_body())
                });
            }
            Some(origin) => origin,
        };

        let allowed = origin
            .to_str()
            .map(|o| self.allowed_origins.iter().any(|allowed| allowed == o))
            .unwrap_or(false);

        if !allowed {
            tracing::warn!(origin = ?origin, "Request from disallowed origin");
            let res = req.into_response(HttpResponse::Forbidden().finish());
            return Box::pin(async move { Ok(res.map_into_right_body()) });
        }

        if req.method() == Method::OPTIONS {
            let mut response = HttpResponse::NoContent().finish();
            apply_cors_headers(response.headers_mut(), origin);
            let res = req.into_response(response);
            return Box::pin(async move { Ok(res.map_into_right_body()) });
        }

        let service = self.service.clone();

        Box::pin(async move {
            match service.call(req).await {
                Ok(mut res) => {
                    apply_cors_headers(res.headers_mut(), origin);
                    Ok(res.map_into_left_body())
                }
                // Errors raised by inner middleware still need CORS headers or
                // the browser hides the status from the caller
                Err(e) => {
                    let mut response = e.error_response();
                    apply_cors_headers(response.headers_mut(), origin);
                    Err(InternalError::from_response(e, response).into())
                }
            }
        })
    }
}
