//! Connection to the command relay
//!
//! The socket lives in a background [`Link`] task on the tokio runtime. The
//! [`ConnectionManager`] is its UI-thread handle: it decodes frames in arrival
//! order, tracks online hosts and relay liveness, and reports whether a send
//! could be handed to an open socket.

pub mod backoff;
pub mod dispatch;
pub mod link;
pub mod protocol;
pub mod watchdog;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info};
use url::Url;

pub use backoff::BackoffPolicy;
pub use dispatch::Dispatcher;
pub use link::{Link, LinkControl, LinkEvent, WakeFn};
pub use protocol::{Inbound, Outbound, WireCommand, decode_frame};
pub use watchdog::Watchdog;

use crate::error::SendFailure;

/// Connection indicator state as seen from the UI thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Connecting,
    Open,
    Retrying(Duration),
}

/// Anything that can carry frames to the relay
pub trait Upstream {
    fn push(&self, frame: &Outbound) -> Result<(), SendFailure>;
    fn is_open(&self) -> bool;
}

pub struct ConnectionManager {
    control_tx: mpsc::UnboundedSender<LinkControl>,
    outbound_tx: mpsc::UnboundedSender<String>,
    events_rx: mpsc::UnboundedReceiver<LinkEvent>,
    /// Written by the link task as sockets open and close
    open: Arc<AtomicBool>,
    state: LinkState,
    hosts: Vec<String>,
    watchdog: Watchdog,
}

impl ConnectionManager {
    /// Spawn the link task on `handle`; nothing connects until [`connect`](Self::connect)
    pub fn spawn(
        handle: &Handle,
        endpoint: Url,
        policy: BackoffPolicy,
        status_ttl: Duration,
        wake: Option<WakeFn>,
    ) -> Self {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let open = Arc::new(AtomicBool::new(false));

        info!(endpoint = %endpoint, "Starting relay link");
        let link = Link::new(
            endpoint,
            policy,
            control_rx,
            outbound_rx,
            events_tx,
            open.clone(),
            wake,
        );
        handle.spawn(link.run());

        Self::with_channels(control_tx, outbound_tx, events_rx, open, status_ttl)
    }

    pub fn with_channels(
        control_tx: mpsc::UnboundedSender<LinkControl>,
        outbound_tx: mpsc::UnboundedSender<String>,
        events_rx: mpsc::UnboundedReceiver<LinkEvent>,
        open: Arc<AtomicBool>,
        status_ttl: Duration,
    ) -> Self {
        Self {
            control_tx,
            outbound_tx,
            events_rx,
            open,
            state: LinkState::Idle,
            hosts: Vec::new(),
            watchdog: Watchdog::new(status_ttl),
        }
    }

    /// (Re)open the socket; an open socket is closed first
    pub fn connect(&mut self) {
        if self.control_tx.send(LinkControl::Connect).is_ok() {
            self.state = LinkState::Connecting;
        }
    }

    pub fn disconnect(&mut self) {
        let _ = self.control_tx.send(LinkControl::Shutdown);
        self.state = LinkState::Idle;
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Live socket state, not the last polled event: a close the UI has
    /// not drained yet already makes sends fail
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    pub fn try_send(&self, frame: &Outbound) -> Result<(), SendFailure> {
        if !self.is_open() {
            return Err(SendFailure::NotConnected);
        }
        let text = frame
            .encode()
            .map_err(|err| SendFailure::Encode(err.to_string()))?;
        self.outbound_tx
            .send(text)
            .map_err(|_| SendFailure::LinkClosed)
    }

    /// Returns false when the frame could not be handed to an open socket
    pub fn send(&self, frame: &Outbound) -> bool {
        self.try_send(frame).is_ok()
    }

    /// Drain link events; returns decoded frames in arrival order
    pub fn poll(&mut self, now: Instant) -> Vec<Inbound> {
        let mut frames = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                LinkEvent::Connecting => self.state = LinkState::Connecting,
                LinkEvent::Opened => self.state = LinkState::Open,
                LinkEvent::Closed { reason } => {
                    debug!(reason = %reason, "Link reported close");
                    self.state = LinkState::Idle;
                }
                LinkEvent::ReconnectScheduled(delay) => self.state = LinkState::Retrying(delay),
                LinkEvent::Frame(text) => match decode_frame(&text) {
                    Ok(frame) => {
                        if let Inbound::Status(status) = &frame {
                            self.hosts = status.hosts.clone();
                            self.watchdog.record_status(now, status.online);
                        }
                        frames.push(frame);
                    }
                    Err(err) => debug!(error = %err, "Dropping malformed frame"),
                },
            }
        }
        frames
    }

    /// Run the liveness watchdog; returns true when the relay just went offline
    pub fn check_liveness(&mut self, now: Instant) -> bool {
        let expired = self.watchdog.check(now);
        if expired {
            self.hosts.clear();
        }
        expired
    }

    pub fn relay_online(&self) -> bool {
        self.watchdog.is_online()
    }

    pub fn online_hosts(&self) -> &[String] {
        &self.hosts
    }
}

impl Upstream for ConnectionManager {
    fn push(&self, frame: &Outbound) -> Result<(), SendFailure> {
        self.try_send(frame)
    }

    fn is_open(&self) -> bool {
        ConnectionManager::is_open(self)
    }
}
