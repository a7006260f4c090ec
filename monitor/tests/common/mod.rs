//! A minimal stand-in for rippled's JSON-RPC port.

#![allow(dead_code)]

use std::{collections::HashMap, convert::Infallible, sync::Arc};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{
    Method, Request, Response, StatusCode, body::Incoming, header, server::conn::http1,
    service::service_fn,
};
use hyper_util::rt::TokioIo;
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// Canned raw response bodies keyed by RPC method.
pub type Bodies = HashMap<String, String>;

pub fn result_body(result: Value) -> String {
    json!({ "result": result }).to_string()
}

pub fn server_info(version: &str, ledgers: &str, base_fee_xrp: f64) -> Value {
    json!({
        "info": {
            "build_version": version,
            "complete_ledgers": ledgers,
            "validated_ledger": { "base_fee_xrp": base_fee_xrp, "seq": 200 }
        },
        "status": "success"
    })
}

pub fn peers(versions: &[&str]) -> Value {
    let peers: Vec<Value> = versions.iter().map(|v| json!({ "version": v })).collect();
    json!({ "peers": peers, "status": "success" })
}

/// Healthy node answering with the reference status used across tests.
pub fn healthy_bodies() -> Bodies {
    let mut bodies = Bodies::new();
    bodies.insert(
        "server_info".to_string(),
        result_body(server_info("1.2.3", "100-200", 0.00001)),
    );
    bodies.insert(
        "peers".to_string(),
        result_body(peers(&["1.2.3", "1.2.3"])),
    );
    bodies
}

/// Serves `bodies` on an ephemeral port and returns the node URL.
///
/// Requests that are not JSON-RPC 2.0 POSTs with JSON headers get a 400.
pub async fn spawn_rippled(bodies: Bodies) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake rippled");
    let addr = listener.local_addr().expect("local addr");
    let bodies = Arc::new(bodies);

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let bodies = bodies.clone();
            tokio::spawn(async move {
                let svc = service_fn(move |req| answer(req, bodies.clone()));
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), svc)
                    .await;
            });
        }
    });

    format!("http://{addr}/")
}

async fn answer(
    req: Request<Incoming>,
    bodies: Arc<Bodies>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let is_json = |name: header::HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"))
    };
    if *req.method() != Method::POST || !is_json(header::CONTENT_TYPE) || !is_json(header::ACCEPT) {
        return Ok(status(StatusCode::BAD_REQUEST));
    }

    let Ok(collected) = req.into_body().collect().await else {
        return Ok(status(StatusCode::BAD_REQUEST));
    };
    let Ok(request) = serde_json::from_slice::<Value>(&collected.to_bytes()) else {
        return Ok(status(StatusCode::BAD_REQUEST));
    };
    if request["jsonrpc"] != "2.0" || !request["params"].is_object() {
        return Ok(status(StatusCode::BAD_REQUEST));
    }

    let method = request["method"].as_str().unwrap_or_default();
    let body = match bodies.get(method) {
        Some(body) => body.clone(),
        None => json!({ "error": { "code": -32601, "message": "Method not found." } }).to_string(),
    };
    Ok(Response::new(Full::new(Bytes::from(body))))
}

fn status(code: StatusCode) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(Bytes::from_static(b"bad request")));
    *resp.status_mut() = code;
    resp
}
