use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::LocalBoxFuture;
use log::info;
use std::rc::Rc;
use std::time::Instant;

/// Request logger
///
/// Logs method, path, status and latency of every request. Requests to the
/// skipped path (the health check) are passed through silently.
pub struct LoggerMiddleware {
    skip_path: Rc<String>,
}

impl LoggerMiddleware {
    pub fn new(skip_path: impl Into<String>) -> Self {
        Self {
            skip_path: Rc::new(skip_path.into()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = LoggerMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(LoggerMiddlewareService {
            service: Rc::new(service),
            skip_path: self.skip_path.clone(),
        }))
    }
}

pub struct LoggerMiddlewareService<S> {
    service: Rc<S>,
    skip_path: Rc<String>,
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        if req.path() == self.skip_path.as_str() {
            return Box::pin(async move { service.call(req).await });
        }

        let start_time = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();

        // Query strings may carry filter values but never credentials
        let query = req.query_string().to_string();
        info!("Request started: {} {}", method, path);
        if !query.is_empty() {
            info!("Query string: {}", query);
        }

        Box::pin(async move {
            let result = service.call(req).await;
            let elapsed = start_time.elapsed();

            match &result {
                Ok(res) => info!(
                    "Request completed: {} {} - Status: {} ({}ms)",
                    method,
                    path,
                    res.status().as_u16(),
                    elapsed.as_millis()
                ),
                Err(e) => info!(
                    "Request completed: {} {} - Status: {} ({}ms)",
                    method,
                    path,
                    e.as_response_error().status_code().as_u16(),
                    elapsed.as_millis()
                ),
            }

            result
        })
    }
}
