//! `/metrics` HTTP exporter.
//!
//! The listener is bound up front ([`MetricsServer::bind`]) so that a busy
//! port is reported as a startup failure, and connections are served with
//! `hyper` until the shutdown future resolves. Scrapes only read the
//! registry; they never wait for or trigger a poll.

use std::{convert::Infallible, future::Future, io, net::SocketAddr, sync::Arc};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    Method, Request, Response, StatusCode, body::Incoming, header, header::HeaderValue,
    server::conn::http1, service::service_fn,
};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use super::registry::MetricsRegistry;

/// A bound `/metrics` listener.
pub struct MetricsServer {
    listener: TcpListener,
}

impl MetricsServer {
    /// Binds to `listen` (`host:port`, host names are resolved).
    pub async fn bind(listen: &str) -> io::Result<Self> {
        let listener = TcpListener::bind(listen).await?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves `GET /metrics` until `shutdown` resolves. All other paths
    /// return 404.
    pub async fn serve<F>(self, metrics: Arc<MetricsRegistry>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let accepted = tokio::select! {
                accepted = self.listener.accept() => accepted,
                _ = &mut shutdown => break,
            };

            let stream = match accepted {
                Ok((stream, _)) => stream,
                Err(e) => {
                    // Usually fd exhaustion; the next accept may succeed.
                    tracing::warn!(error = %e, "failed to accept metrics connection");
                    continue;
                }
            };

            let io = TokioIo::new(stream);
            let metrics = metrics.clone();

            tokio::spawn(async move {
                let svc = service_fn(move |req| {
                    let metrics = metrics.clone();
                    handle_request(req, metrics)
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, svc).await {
                    tracing::debug!(error = %err, "metrics connection error");
                }
            });
        }

        tracing::info!("metrics server stopped");
    }
}

async fn handle_request(
    req: Request<Incoming>,
    metrics: Arc<MetricsRegistry>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => {
            let mut resp = Response::new(Full::new(Bytes::from(metrics.encode())));
            resp.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(metrics.content_type()),
            );
            Ok(resp)
        }
        _ => {
            let mut resp = Response::new(Full::new(Bytes::from_static(b"not found")));
            *resp.status_mut() = StatusCode::NOT_FOUND;
            Ok(resp)
        }
    }
}
