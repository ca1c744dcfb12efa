//! Browser-level CDP connection.
//!
//! One WebSocket to the browser carries every command. Page commands are
//! routed by flattened `sessionId`, and a reader task pairs each reply with
//! the caller waiting on its id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};
use url::Url;

use super::error::CdpError;
use super::protocol::{CommandFrame, CreatedTab, IncomingFrame, TargetInfo, VersionDocument};
use super::session::PageSession;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Waiters = Mutex<HashMap<u64, oneshot::Sender<Result<Value, CdpError>>>>;

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends command frames and waits for the matching reply.
pub(crate) struct Rpc {
    sink: tokio::sync::Mutex<SplitSink<Socket, Message>>,
    waiters: Arc<Waiters>,
    next_id: AtomicU64,
    call_timeout: Duration,
}

impl Rpc {
    pub(crate) async fn send(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let text = serde_json::to_string(&CommandFrame {
            id,
            method,
            params,
            session_id,
        })?;
        trace!(">> {}", text);

        let (tx, rx) = oneshot::channel();
        self.waiters.lock().insert(id, tx);

        let sent = self.sink.lock().await.send(Message::Text(text.into())).await;
        if let Err(e) = sent {
            self.waiters.lock().remove(&id);
            return Err(e.into());
        }

        match tokio::time::timeout(self.call_timeout, rx).await {
            Ok(reply) => reply.unwrap_or(Err(CdpError::SessionClosed)),
            Err(_) => {
                self.waiters.lock().remove(&id);
                Err(CdpError::Timeout(method.to_string()))
            }
        }
    }
}

/// Hand one incoming frame to the caller waiting on its id.
fn route(frame: IncomingFrame, waiters: &Waiters) {
    let Some(id) = frame.id else {
        if let Some(method) = &frame.method {
            trace!("event {}", method);
        }
        return;
    };

    let waiter = waiters.lock().remove(&id);
    match waiter {
        Some(waiter) => {
            let _ = waiter.send(frame.into_reply());
        }
        None => debug!("Reply {} arrived after its caller gave up", id),
    }
}

async fn pump(mut source: SplitStream<Socket>, waiters: Arc<Waiters>) {
    while let Some(message) = source.next().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(frame)) => {
                debug!("Browser closed the CDP socket: {:?}", frame);
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                warn!("CDP socket error: {}", e);
                break;
            }
        };

        trace!("<< {}", text);
        match serde_json::from_str::<IncomingFrame>(&text) {
            Ok(frame) => route(frame, &waiters),
            Err(e) => warn!("Unparseable CDP frame: {}", e),
        }
    }

    // Dropping the senders resolves every outstanding call as SessionClosed.
    waiters.lock().clear();
}

/// Read the browser socket address from `/json/version`.
async fn discover(endpoint: &Url) -> Result<VersionDocument, CdpError> {
    let url = endpoint.join("json/version")?;
    let unreachable = |e: reqwest::Error| CdpError::Unreachable(format!("{} ({})", endpoint, e));
    reqwest::get(url)
        .await
        .map_err(unreachable)?
        .json()
        .await
        .map_err(unreachable)
}

/// Connection to one Chrome instance.
pub struct CdpClient {
    endpoint: Url,
    rpc: Arc<Rpc>,
    reader: JoinHandle<()>,
}

impl CdpClient {
    /// Connect to the debugging endpoint, e.g. `http://127.0.0.1:9222`.
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        Self::connect_with_timeout(endpoint, DEFAULT_CALL_TIMEOUT).await
    }

    pub async fn connect_with_timeout(
        endpoint: &str,
        call_timeout: Duration,
    ) -> Result<Self, CdpError> {
        let endpoint = Url::parse(endpoint)?;
        let version = discover(&endpoint).await?;
        debug!("Found {} at {}", version.browser, endpoint);

        let (socket, _) = tokio_tungstenite::connect_async(version.ws_url.as_str()).await?;
        let (sink, source) = socket.split();
        let waiters = Arc::new(Waiters::default());
        let reader = tokio::spawn(pump(source, waiters.clone()));

        Ok(Self {
            endpoint,
            rpc: Arc::new(Rpc {
                sink: tokio::sync::Mutex::new(sink),
                waiters,
                next_id: AtomicU64::new(1),
                call_timeout,
            }),
            reader,
        })
    }

    /// False once the browser socket has closed.
    pub fn is_alive(&self) -> bool {
        !self.reader.is_finished()
    }

    pub async fn page_targets(&self) -> Result<Vec<TargetInfo>, CdpError> {
        let mut reply = self.rpc.send("Target.getTargets", None, None).await?;
        let targets: Vec<TargetInfo> = serde_json::from_value(reply["targetInfos"].take())?;
        Ok(targets.into_iter().filter(TargetInfo::is_page).collect())
    }

    /// Open a tab at `url` and attach to it.
    pub async fn open_tab(&self, url: &str) -> Result<PageSession, CdpError> {
        let mut create = self.endpoint.join("json/new")?;
        create.set_query(Some(url));

        // /json/new only accepts PUT on current Chrome
        let tab: CreatedTab = reqwest::Client::new()
            .put(create)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!("Opened tab {} at {}", tab.id, tab.url);

        self.attach(&tab.id).await
    }

    /// Attach a flattened session to an existing tab.
    pub async fn attach(&self, target_id: &str) -> Result<PageSession, CdpError> {
        let reply = self
            .rpc
            .send(
                "Target.attachToTarget",
                Some(json!({"targetId": target_id, "flatten": true})),
                None,
            )
            .await?;

        let session_id = reply
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or(CdpError::MissingField("sessionId"))?;

        let session = PageSession::new(target_id, session_id, self.rpc.clone());
        session.prepare().await?;
        Ok(session)
    }

    /// Make the tab the selected one in its window.
    pub async fn activate(&self, target_id: &str) -> Result<(), CdpError> {
        self.rpc
            .send(
                "Target.activateTarget",
                Some(json!({"targetId": target_id})),
                None,
            )
            .await?;
        Ok(())
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
