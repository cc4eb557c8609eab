//! Transport layer that traces every RPC request going to the node: the
//! methods in it when it is sent, and how long it took once it finished.
use {
    alloy::{
        rpc::json_rpc::{RequestPacket, ResponsePacket},
        transports::TransportError,
    },
    std::{
        fmt::Debug,
        pin::Pin,
        task::{Context, Poll},
        time::Instant,
    },
    tower::{Layer, Service},
};

/// Layer that logs requests passing through it, tagged with `label`.
pub(crate) struct InstrumentationLayer {
    pub label: String,
}

impl<S> Layer<S> for InstrumentationLayer {
    type Service = InstrumentedProvider<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InstrumentedProvider {
            inner,
            label: self.label.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct InstrumentedProvider<S> {
    inner: S,
    label: String,
}

impl<S> Service<RequestPacket> for InstrumentedProvider<S>
where
    S: Service<RequestPacket, Response = ResponsePacket, Error = TransportError>,
    S::Future: Send + 'static,
    S::Response: Send + 'static + Debug,
    S::Error: Send + 'static + Debug,
{
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;
    type Response = S::Response;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: RequestPacket) -> Self::Future {
        let methods: Vec<String> = req
            .requests_mut()
            .iter_mut()
            .map(|r| {
                tracing::trace!(label = %self.label, ?r, "executing request");
                r.method().to_string()
            })
            .collect();

        let label = self.label.clone();
        let start = Instant::now();
        let fut = self.inner.call(req);
        Box::pin(async move {
            let res = fut.await;
            match &res {
                Ok(_) => tracing::debug!(
                    label,
                    ?methods,
                    elapsed = ?start.elapsed(),
                    "request finished"
                ),
                Err(err) => tracing::debug!(
                    label,
                    ?methods,
                    elapsed = ?start.elapsed(),
                    ?err,
                    "request failed"
                ),
            }
            res
        })
    }
}
