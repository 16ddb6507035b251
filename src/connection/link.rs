//! Background websocket task
//!
//! Owns the socket, the backoff state and the single reconnect deadline. It
//! never decodes frames: text is forwarded to the UI thread in arrival order
//! through the event channel.

use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use url::Url;

use super::backoff::{Backoff, BackoffPolicy, ReconnectTimer};
use super::protocol::Outbound;
use crate::error::ConnectError;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Called after every emitted event so the UI can repaint
pub type WakeFn = Arc<dyn Fn() + Send + Sync>;

/// Requests from the UI thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkControl {
    /// Close any open socket and open a fresh one
    Connect,
    Shutdown,
}

/// Notifications to the UI thread
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    Connecting,
    Opened,
    Frame(String),
    Closed { reason: String },
    ReconnectScheduled(Duration),
}

enum Attempt {
    Open(Box<Socket>),
    Failed(ConnectError),
    Restart,
    Shutdown,
}

enum PumpExit {
    Closed(String),
    Reconnect,
    Shutdown,
}

pub struct Link {
    endpoint: Url,
    backoff: Backoff,
    timer: ReconnectTimer,
    control_rx: mpsc::UnboundedReceiver<LinkControl>,
    outbound_rx: mpsc::UnboundedReceiver<String>,
    events_tx: mpsc::UnboundedSender<LinkEvent>,
    /// Set while a socket is open; read by senders on the UI thread
    open: Arc<AtomicBool>,
    wake: Option<WakeFn>,
}

impl Link {
    pub fn new(
        endpoint: Url,
        policy: BackoffPolicy,
        control_rx: mpsc::UnboundedReceiver<LinkControl>,
        outbound_rx: mpsc::UnboundedReceiver<String>,
        events_tx: mpsc::UnboundedSender<LinkEvent>,
        open: Arc<AtomicBool>,
        wake: Option<WakeFn>,
    ) -> Self {
        Self {
            endpoint,
            backoff: Backoff::new(policy),
            timer: ReconnectTimer::default(),
            control_rx,
            outbound_rx,
            events_tx,
            open,
            wake,
        }
    }

    pub async fn run(mut self) {
        let mut connect_now = false;
        loop {
            if !connect_now {
                tokio::select! {
                    control = self.control_rx.recv() => match control {
                        Some(LinkControl::Connect) => self.timer.cancel(),
                        Some(LinkControl::Shutdown) | None => break,
                    },
                    _ = self.timer.fired() => {}
                }
            }
            connect_now = false;

            match self.attempt().await {
                Attempt::Open(socket) => {
                    self.backoff.reset();
                    info!(endpoint = %self.endpoint, "Connected to relay");
                    self.open.store(true, Ordering::Release);
                    self.emit(LinkEvent::Opened);

                    let exit = self.pump(*socket).await;
                    self.open.store(false, Ordering::Release);
                    match exit {
                        PumpExit::Closed(reason) => {
                            info!(reason = %reason, "Relay connection closed");
                            self.emit(LinkEvent::Closed { reason });
                            self.schedule_reconnect();
                        }
                        PumpExit::Reconnect => connect_now = true,
                        PumpExit::Shutdown => break,
                    }
                }
                Attempt::Failed(err) => {
                    warn!(endpoint = %self.endpoint, error = %err, "Relay connection failed");
                    self.emit(LinkEvent::Closed {
                        reason: err.to_string(),
                    });
                    self.schedule_reconnect();
                }
                Attempt::Restart => connect_now = true,
                Attempt::Shutdown => break,
            }
        }
        self.open.store(false, Ordering::Release);
        self.timer.cancel();
        debug!("Link task stopped");
    }

    async fn attempt(&mut self) -> Attempt {
        self.emit(LinkEvent::Connecting);
        debug!(endpoint = %self.endpoint, "Opening relay connection");

        let connecting = connect_async(self.endpoint.as_str());
        let mut socket = tokio::select! {
            result = connecting => match result {
                Ok((socket, _response)) => socket,
                Err(err) => return Attempt::Failed(err.into()),
            },
            control = self.control_rx.recv() => return match control {
                Some(LinkControl::Connect) => Attempt::Restart,
                Some(LinkControl::Shutdown) | None => Attempt::Shutdown,
            },
        };

        // Frames queued while the link was down are not replayed
        let mut stale = 0usize;
        while self.outbound_rx.try_recv().is_ok() {
            stale += 1;
        }
        if stale > 0 {
            debug!(count = stale, "Discarded frames queued before open");
        }

        let hello = match Outbound::hello().encode() {
            Ok(hello) => hello,
            Err(err) => return Attempt::Failed(err.into()),
        };
        if let Err(err) = socket.send(Message::Text(hello)).await {
            let _ = socket.close(None).await;
            return Attempt::Failed(err.into());
        }
        Attempt::Open(Box::new(socket))
    }

    async fn pump(&mut self, socket: Socket) -> PumpExit {
        let (mut sink, mut stream) = socket.split();
        loop {
            tokio::select! {
                incoming = stream.next() => match incoming {
                    Some(Ok(Message::Text(text))) => self.emit(LinkEvent::Frame(text)),
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame
                            .map(|frame| frame.reason.into_owned())
                            .filter(|reason| !reason.is_empty())
                            .unwrap_or_else(|| "closed by relay".to_string());
                        return PumpExit::Closed(reason);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => return PumpExit::Closed(err.to_string()),
                    None => return PumpExit::Closed("stream ended".to_string()),
                },
                outbound = self.outbound_rx.recv() => match outbound {
                    Some(text) => {
                        if let Err(err) = sink.send(Message::Text(text)).await {
                            return PumpExit::Closed(err.to_string());
                        }
                    }
                    None => {
                        let _ = sink.close().await;
                        return PumpExit::Shutdown;
                    }
                },
                control = self.control_rx.recv() => {
                    let _ = sink.close().await;
                    return match control {
                        Some(LinkControl::Connect) => PumpExit::Reconnect,
                        Some(LinkControl::Shutdown) | None => PumpExit::Shutdown,
                    };
                }
            }
        }
    }

    fn schedule_reconnect(&mut self) {
        let delay = self.backoff.next_delay();
        self.timer.schedule(delay);
        debug!(delay_ms = delay.as_millis() as u64, "Reconnect scheduled");
        self.emit(LinkEvent::ReconnectScheduled(delay));
    }

    fn emit(&self, event: LinkEvent) {
        if self.events_tx.send(event).is_ok() {
            if let Some(wake) = &self.wake {
                wake();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio::time::timeout;
    use tokio_tungstenite::accept_async;

    struct Harness {
        control_tx: mpsc::UnboundedSender<LinkControl>,
        events_rx: mpsc::UnboundedReceiver<LinkEvent>,
        outbound_tx: mpsc::UnboundedSender<String>,
        open: Arc<AtomicBool>,
    }

    impl Harness {
        async fn next_event(&mut self) -> LinkEvent {
            timeout(Duration::from_secs(5), self.events_rx.recv())
                .await
                .expect("link event within 5s")
                .expect("link task alive")
        }
    }

    fn link_to(endpoint: &str, policy: BackoffPolicy) -> (Link, Harness) {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let open = Arc::new(AtomicBool::new(false));
        let endpoint = Url::parse(endpoint).unwrap();
        let link = Link::new(
            endpoint,
            policy,
            control_rx,
            outbound_rx,
            events_tx,
            open.clone(),
            None,
        );
        (
            link,
            Harness {
                control_tx,
                events_rx,
                outbound_tx,
                open,
            },
        )
    }

    fn unreachable_link() -> (Link, Harness) {
        // Port 9 on localhost refuses connections on test machines
        let policy = BackoffPolicy::new(Duration::from_millis(800), Duration::from_millis(4000), 1.4);
        link_to("ws://127.0.0.1:9", policy)
    }

    async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
        let (stream, _) = timeout(Duration::from_secs(5), listener.accept())
            .await
            .expect("client connects within 5s")
            .unwrap();
        accept_async(stream).await.unwrap()
    }

    async fn next_text(server: &mut WebSocketStream<TcpStream>) -> String {
        loop {
            let message = timeout(Duration::from_secs(5), server.next())
                .await
                .expect("frame within 5s")
                .expect("socket open")
                .unwrap();
            if let Message::Text(text) = message {
                return text;
            }
        }
    }

    const HELLO: &str = r#"{"type":"hello","client":"ui"}"#;

    #[tokio::test]
    async fn test_failed_open_schedules_reconnect() {
        let (link, mut harness) = unreachable_link();
        let task = tokio::spawn(link.run());
        harness.control_tx.send(LinkControl::Connect).unwrap();

        assert_eq!(harness.next_event().await, LinkEvent::Connecting);
        assert!(matches!(harness.next_event().await, LinkEvent::Closed { .. }));
        assert_eq!(
            harness.next_event().await,
            LinkEvent::ReconnectScheduled(Duration::from_millis(800))
        );
        assert!(!harness.open.load(Ordering::Acquire));

        harness.control_tx.send(LinkControl::Shutdown).unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_while_idle() {
        let (link, harness) = unreachable_link();
        let task = tokio::spawn(link.run());
        harness.control_tx.send(LinkControl::Shutdown).unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_open_sends_hello_and_drops_stale_frames() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let policy = BackoffPolicy::new(Duration::from_millis(100), Duration::from_millis(1000), 2.0);
        let (link, mut harness) = link_to(&format!("ws://127.0.0.1:{port}"), policy);
        let task = tokio::spawn(link.run());

        harness.outbound_tx.send("queued while down".to_string()).unwrap();
        harness.control_tx.send(LinkControl::Connect).unwrap();
        let mut server = accept(&listener).await;

        assert_eq!(next_text(&mut server).await, HELLO);
        assert_eq!(harness.next_event().await, LinkEvent::Connecting);
        assert_eq!(harness.next_event().await, LinkEvent::Opened);
        assert!(harness.open.load(Ordering::Acquire));

        harness.outbound_tx.send("live".to_string()).unwrap();
        assert_eq!(next_text(&mut server).await, "live");

        server.send(Message::Text("{\"type\":\"ack\"}".to_string())).await.unwrap();
        assert_eq!(
            harness.next_event().await,
            LinkEvent::Frame("{\"type\":\"ack\"}".to_string())
        );

        harness.control_tx.send(LinkControl::Shutdown).unwrap();
        task.await.unwrap();
        assert!(!harness.open.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn test_connect_while_open_replaces_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let policy = BackoffPolicy::new(Duration::from_millis(100), Duration::from_millis(1000), 2.0);
        let (link, mut harness) = link_to(&format!("ws://127.0.0.1:{port}"), policy);
        let task = tokio::spawn(link.run());

        harness.control_tx.send(LinkControl::Connect).unwrap();
        let mut first = accept(&listener).await;
        assert_eq!(next_text(&mut first).await, HELLO);
        assert_eq!(harness.next_event().await, LinkEvent::Connecting);
        assert_eq!(harness.next_event().await, LinkEvent::Opened);

        harness.control_tx.send(LinkControl::Connect).unwrap();
        let mut second = accept(&listener).await;
        assert_eq!(next_text(&mut second).await, HELLO);
        assert_eq!(harness.next_event().await, LinkEvent::Connecting);
        assert_eq!(harness.next_event().await, LinkEvent::Opened);

        // The replaced socket was closed by the client
        let closed = timeout(Duration::from_secs(5), async {
            loop {
                match first.next().await {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                }
            }
        })
        .await;
        assert!(closed.is_ok());

        harness.control_tx.send(LinkControl::Shutdown).unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_backoff_resets_after_successful_open() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let policy = BackoffPolicy::new(Duration::from_millis(100), Duration::from_millis(1000), 2.0);
        let (link, mut harness) = link_to(&format!("ws://127.0.0.1:{port}"), policy);
        let task = tokio::spawn(link.run());
        harness.control_tx.send(LinkControl::Connect).unwrap();

        let mut delays = Vec::new();
        for _ in 0..2 {
            let mut server = accept(&listener).await;
            assert_eq!(next_text(&mut server).await, HELLO);
            assert_eq!(harness.next_event().await, LinkEvent::Connecting);
            assert_eq!(harness.next_event().await, LinkEvent::Opened);

            server.close(None).await.unwrap();
            assert!(matches!(harness.next_event().await, LinkEvent::Closed { .. }));
            assert!(!harness.open.load(Ordering::Acquire));
            match harness.next_event().await {
                LinkEvent::ReconnectScheduled(delay) => delays.push(delay),
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(delays, vec![Duration::from_millis(100); 2]);

        harness.control_tx.send(LinkControl::Shutdown).unwrap();
        task.await.unwrap();
    }
}
