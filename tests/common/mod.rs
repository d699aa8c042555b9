//! In-process mock backend for integration tests.
//!
//! Phone/code login: send-code echoes code "654321", login-with-code accepts
//! it and issues token "abc" for user 1. Phone "13800000403" is rejected.
//! `/api/users/profile` requires `Authorization: Bearer abc`.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::TcpListener as StdTcpListener;
use std::thread::{self, JoinHandle};

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::runtime::Builder;
use tokio::sync::oneshot;

pub const CODE: &str = "654321";
pub const TOKEN: &str = "abc";
pub const REJECTED_PHONE: &str = "13800000403";

pub struct MockBackend {
    pub base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

pub fn spawn_backend() -> MockBackend {
    let listener = StdTcpListener::bind("127.0.0.1:0").expect("bind mock backend");
    listener.set_nonblocking(true).expect("nonblocking listener");
    let addr = listener.local_addr().expect("local addr");

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/send-code", post(send_code))
        .route("/api/auth/login-with-code", post(login_with_code))
        .route("/api/users/profile", get(profile))
        .route("/api/users/profile/:id", put(update_profile))
        .route("/api/admin/database/fix/test", post(server_error));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let join = thread::spawn(move || {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("mock backend runtime");
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).expect("tokio listener");
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });
    });

    MockBackend {
        base_url: format!("http://{addr}"),
        shutdown: Some(shutdown_tx),
        join: Some(join),
    }
}

/// A base URL nothing is listening on
pub fn dead_base_url() -> String {
    let listener = StdTcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v == format!("Bearer {TOKEN}"))
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"success": false, "message": "Unauthorized"})),
    )
}

async fn health() -> Json<Value> {
    Json(json!({"status": "UP"}))
}

async fn send_code(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    if params.get("phone").map(String::as_str) == Some(REJECTED_PHONE) {
        return Json(json!({"success": false, "message": "phone is blocked"}));
    }
    Json(json!({"success": true, "data": CODE}))
}

async fn login_with_code(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    if params.get("code").map(String::as_str) != Some(CODE) {
        return Json(json!({"success": false, "message": "invalid code"}));
    }
    Json(json!({
        "success": true,
        "data": {"token": TOKEN, "user": {"id": 1, "phone": params.get("phone")}}
    }))
}

async fn profile(headers: HeaderMap) -> impl IntoResponse {
    if !authorized(&headers) {
        return unauthorized();
    }
    (
        StatusCode::OK,
        Json(json!({"success": true, "data": {"id": 1, "nickname": "probe"}})),
    )
}

async fn update_profile(
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return unauthorized();
    }
    (
        StatusCode::OK,
        Json(json!({"success": true, "data": {"id": id, "nickname": body["nickname"]}})),
    )
}

async fn server_error() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"success": false, "message": "database unavailable"})),
    )
}
