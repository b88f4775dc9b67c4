//! Per-request execution context.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use uuid::Uuid;

/// Ambient state of one request, handed to methods that declare a
/// `Context` parameter.
///
/// A host may attach a `Context` to the `http::Request` extensions before
/// calling [`Handler::handle`](crate::Handler::handle) (the bundled
/// [`Server`](crate::Server) does this to record the peer address). When none
/// is attached, the handler creates a fresh one.
///
/// The deadline is advisory: nothing in this crate enforces it. Methods that
/// do long work may check [`Context::is_expired`].
#[derive(Clone, Debug)]
pub struct Context {
    request_id: Uuid,
    remote_addr: Option<SocketAddr>,
    received_at: Instant,
    deadline: Option<Instant>,
}

impl Context {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            remote_addr: None,
            received_at: Instant::now(),
            deadline: None,
        }
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the deadline `timeout` after the request was received.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let deadline = self.received_at + timeout;
        self.with_deadline(deadline)
    }

    pub fn request_id(&self) -> Uuid { self.request_id }
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.remote_addr }
    pub fn received_at(&self) -> Instant { self.received_at }
    pub fn deadline(&self) -> Option<Instant> { self.deadline }

    /// Time left before the deadline. `None` when there is no deadline,
    /// `Some(Duration::ZERO)` once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

impl Default for Context {
    fn default() -> Self { Self::new() }
}
