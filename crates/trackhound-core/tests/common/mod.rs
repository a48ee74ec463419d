#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use trackhound_core::{Provider, ProviderDescriptor, ProviderOutcome, Query};

/// Shared record of status notifications and provider calls, in order.
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Provider that returns a fixed outcome and records each call.
pub struct ScriptedProvider {
    name: String,
    outcome: ProviderOutcome,
    delay: Option<Duration>,
    log: CallLog,
}

impl ScriptedProvider {
    pub fn descriptor(name: &str, outcome: ProviderOutcome, log: &CallLog) -> ProviderDescriptor {
        Self::slow_descriptor(name, outcome, None, log)
    }

    pub fn slow_descriptor(
        name: &str,
        outcome: ProviderOutcome,
        delay: Option<Duration>,
        log: &CallLog,
    ) -> ProviderDescriptor {
        let provider = ScriptedProvider {
            name: name.to_string(),
            outcome,
            delay,
            log: log.clone(),
        };
        ProviderDescriptor::new(name, Arc::new(provider))
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn attempt(&self, query: &Query) -> ProviderOutcome {
        self.log
            .lock()
            .unwrap()
            .push(format!("attempt:{}:{}", self.name, query));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }
}

/// Status reporter that writes into the same log as the providers.
pub fn status_logger(log: &CallLog) -> impl FnMut(&str, &str) + Send {
    let log = log.clone();
    move |provider: &str, query: &str| {
        log.lock()
            .unwrap()
            .push(format!("status:{}:{}", provider, query));
    }
}

pub fn entries(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub fn audio_file(dir: &std::path::Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, vec![0xFFu8; 4096]).unwrap();
    path
}

pub struct Route {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Route {
    pub fn html(body: &str) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn bytes(content_type: &'static str, len: usize) -> Self {
        Self {
            status: 200,
            content_type,
            body: vec![0x49u8; len],
        }
    }
}

/// Minimal HTTP/1.1 fixture keyed by exact request target (path plus query).
/// Returns the origin, e.g. `http://127.0.0.1:41234`.
pub async fn serve(routes: HashMap<String, Route>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let routes = Arc::new(routes);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let routes = routes.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                loop {
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                    if request.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }

                let request = String::from_utf8_lossy(&request);
                let target = request.split_whitespace().nth(1).unwrap_or("/");
                let (status, content_type, body) = match routes.get(target) {
                    Some(route) => (route.status, route.content_type, route.body.clone()),
                    None => (404, "text/html", b"<h1>Not Found</h1>".to_vec()),
                };

                let head = format!(
                    "HTTP/1.1 {} Fixture\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    content_type,
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{}", addr)
}

pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}
