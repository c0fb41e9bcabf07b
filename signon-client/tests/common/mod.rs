//! In-process stand-in for the authentication server.

#![allow(dead_code)]

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::Value;
use shared::config::ClientConfig;
use tokio::{net::TcpListener, task::JoinHandle};
use url::Url;

/// What the mock answers every login with.
#[derive(Clone, Debug)]
pub struct Canned {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: String,
    pub set_cookie: Option<&'static str>,
    pub delay: Option<Duration>,
}

impl Canned {
    pub fn json(status: StatusCode, body: &Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
            set_cookie: None,
            delay: None,
        }
    }

    pub fn text(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.to_string(),
            set_cookie: None,
            delay: None,
        }
    }

    pub fn with_cookie(mut self, cookie: &'static str) -> Self {
        self.set_cookie = Some(cookie);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// A request the mock received.
#[derive(Clone, Debug)]
pub struct Recorded {
    pub content_type: Option<String>,
    pub cookie: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct MockState {
    canned: Arc<Canned>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

pub struct MockAuthServer {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
    handle: JoinHandle<()>,
}

impl MockAuthServer {
    pub async fn start(canned: Canned) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            canned: Arc::new(canned),
            requests: Arc::clone(&requests),
        };
        let router = Router::new()
            .route("/api/auth/login", post(login))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            addr,
            requests,
            handle,
        }
    }

    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).unwrap()
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            api_base_url: self.base_url(),
            ..ClientConfig::with_defaults()
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for MockAuthServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn login(State(state): State<MockState>, headers: HeaderMap, body: String) -> Response {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    state.requests.lock().unwrap().push(Recorded {
        content_type: header_value(header::CONTENT_TYPE),
        cookie: header_value(header::COOKIE),
        body: serde_json::from_str(&body).unwrap_or(Value::Null),
    });

    if let Some(delay) = state.canned.delay {
        tokio::time::sleep(delay).await;
    }

    let canned = &state.canned;
    let mut response = (
        canned.status,
        [(header::CONTENT_TYPE, canned.content_type)],
        canned.body.clone(),
    )
        .into_response();
    if let Some(cookie) = canned.set_cookie {
        response
            .headers_mut()
            .insert(header::SET_COOKIE, header::HeaderValue::from_static(cookie));
    }
    response
}

/// An address nothing listens on.
pub async fn closed_port_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{addr}")).unwrap()
}
