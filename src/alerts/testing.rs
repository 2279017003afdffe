//! Test doubles: a local webhook receiver and scripted channels

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use super::channel::{Channel, ChannelBinding, SendReport};
use super::config::ChannelConfig;
use super::event::AlertEvent;

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub content_type: Option<String>,
    pub body: String,
}

/// HTTP server on 127.0.0.1 recording every POST to `/hook`
pub struct WebhookReceiver {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    handle: JoinHandle<()>,
}

impl WebhookReceiver {
    pub async fn start(status: StatusCode) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&requests);

        let app = Router::new().route(
            "/hook",
            post(move |headers: HeaderMap, body: String| {
                let captured = Arc::clone(&captured);
                async move {
                    captured.lock().push(CapturedRequest {
                        content_type: headers
                            .get(header::CONTENT_TYPE)
                            .and_then(|v| v.to_str().ok())
                            .map(String::from),
                        body,
                    });
                    status
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            requests,
            handle,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}/hook", self.addr)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().clone()
    }
}

impl Drop for WebhookReceiver {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Endpoint on a port nothing listens on
pub fn unreachable_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/hook", port)
}

#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Succeed,
    Fail,
    Hang,
}

/// Channel with scripted behavior that counts its invocations
pub struct ScriptedChannel {
    name: String,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl ScriptedChannel {
    pub fn new(name: &str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Channel for ScriptedChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, _event: &AlertEvent) -> SendReport {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Succeed => SendReport::delivered(200, "200 OK"),
            Behavior::Fail => SendReport::failed(None, "simulated connection failure"),
            Behavior::Hang => futures::future::pending().await,
        }
    }
}

/// Enabled binding for a scripted channel
pub fn binding(channel: &Arc<ScriptedChannel>) -> ChannelBinding {
    let config = ChannelConfig::email(format!("http://{}.invalid/hook", channel.name()));
    ChannelBinding::new(config, Arc::clone(channel) as Arc<dyn Channel>)
}
