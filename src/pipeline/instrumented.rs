use std::fmt::Display;
use std::task::{Context, Poll};
use std::time::Instant;

use futures::future::BoxFuture;
use tower::Service;
use tower_layer::Layer;
use tracing::{debug, error};

/// Wraps a service with timing and error logging.
#[derive(Debug, Clone)]
pub struct InstrumentedLayer {
    name: &'static str,
}

impl InstrumentedLayer {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl<S> Layer<S> for InstrumentedLayer {
    type Service = Instrumented<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Instrumented {
            inner,
            name: self.name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Instrumented<S> {
    inner: S,
    name: &'static str,
}

impl<S, Request> Service<Request> for Instrumented<S>
where
    S: Service<Request>,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Display + Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<S::Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let name = self.name;
        let start = Instant::now();
        let future = self.inner.call(request);

        Box::pin(async move {
            let result = future.await;
            let duration_us = start.elapsed().as_micros() as u64;

            match &result {
                Ok(_) => debug!("Completed '{}' in {}us", name, duration_us),
                Err(e) => error!("'{}' failed after {}us: {}", name, duration_us, e),
            }

            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower::{service_fn, ServiceExt};

    #[tokio::test]
    async fn passes_responses_and_errors_through() {
        let inner = service_fn(|n: u32| async move {
            if n == 0 {
                Err("zero".to_string())
            } else {
                Ok(n * 2)
            }
        });
        let service = InstrumentedLayer::new("double").layer(inner);

        assert_eq!(service.clone().oneshot(21).await, Ok(42));
        assert_eq!(service.oneshot(0).await, Err("zero".to_string()));
    }
}
