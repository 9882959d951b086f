use anyhow::Result;
use bytes::Bytes;
use http_body_util::Full;
use std::convert::Infallible;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;

pub mod context;
pub mod db;
pub mod health;
pub mod kafka;
pub mod message;
pub mod relay;
pub mod telegram;
pub mod utils;

use relay_db::DbPool;

type HttpResult = Result<Response<Full<Bytes>>, Infallible>;

fn text_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut res = Response::new(Full::new(body.into()));
    *res.status_mut() = status;
    res
}

async fn http_handler<B>(req: Request<B>, db_pool: DbPool) -> HttpResult {
    let path = req.uri().path().to_string();
    let response = match path.as_str() {
        "/health" => match health::health_check(&db_pool).await {
            Ok(()) => text_response(StatusCode::OK, "OK"),
            Err(e) => {
                tracing::error!(error = %e, "Health check failed");
                text_response(StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable")
            }
        },
        "/metrics" => match relay_metrics::gather_metrics() {
            Ok(metrics_data) => {
                let mut res = text_response(StatusCode::OK, metrics_data);
                res.headers_mut().insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static("text/plain; version=0.0.4"),
                );
                res
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to gather metrics");
                text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        },
        _ => text_response(StatusCode::NOT_FOUND, "Not Found"),
    };
    Ok(response)
}

/// Serve `/health` and `/metrics` until `shutdown` is cancelled
pub async fn run_http_server(
    port: u16,
    db_pool: DbPool,
    shutdown: CancellationToken,
) -> Result<()> {
    let http_addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&http_addr).await?;
    tracing::info!("HTTP server listening on http://{}", http_addr);

    loop {
        let (stream, _) = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to accept HTTP connection");
                    continue;
                }
            },
        };
        let io = TokioIo::new(stream);
        let db_pool = db_pool.clone();

        tokio::task::spawn(async move {
            let service = service_fn(move |req| http_handler(req, db_pool.clone()));

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                tracing::error!("Error serving HTTP connection: {:?}", err);
            }
        });
    }

    tracing::info!("HTTP server stopped");
    Ok(())
}
