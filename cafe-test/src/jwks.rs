use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cafe_core::http::routing::get;
use cafe_core::http::{IntoResponse, Json, Response, Router, State, StatusCode};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Default)]
struct Published {
    keys: Mutex<Vec<Value>>,
    delay: Mutex<Duration>,
    failing: Mutex<bool>,
    hits: AtomicUsize,
}

/// A JWKS endpoint on a loopback port, for exercising the key cache.
///
/// The served key set, an artificial response delay and a failure switch can
/// be changed while the server runs. Every request is counted.
pub struct JwksServer {
    addr: SocketAddr,
    state: Arc<Published>,
    handle: JoinHandle<()>,
}

impl JwksServer {
    pub async fn start(keys: Vec<Value>) -> Self {
        let state = Arc::new(Published::default());
        *state.keys.lock().unwrap() = keys;

        let router = Router::new()
            .route("/.well-known/jwks.json", get(serve_jwks))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            cafe_core::http::serve(listener, router).await.unwrap();
        });

        Self { addr, state, handle }
    }

    pub fn url(&self) -> String {
        format!("http://{}/.well-known/jwks.json", self.addr)
    }

    /// Number of requests served so far.
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn set_keys(&self, keys: Vec<Value>) {
        *self.state.keys.lock().unwrap() = keys;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.lock().unwrap() = delay;
    }

    /// Answer with 500 while `failing` is set.
    pub fn set_failing(&self, failing: bool) {
        *self.state.failing.lock().unwrap() = failing;
    }
}

impl Drop for JwksServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve_jwks(State(state): State<Arc<Published>>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let delay = *state.delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    if *state.failing.lock().unwrap() {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let keys = state.keys.lock().unwrap().clone();
    Json(serde_json::json!({ "keys": keys })).into_response()
}
