use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::debug;

/// Display time for quick confirmations (star, copy).
pub const SHORT: Duration = Duration::from_millis(1000);
/// Display time for results of slower external operations.
pub const LONG: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub duration: Duration,
    pub created_at: Instant,
}

impl Toast {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) >= self.duration
    }
}

#[derive(Debug, Default)]
struct ToastQueue {
    toasts: Vec<Toast>,
    next_id: u64,
}

/// Auto-dismissing transient notifications.
#[derive(Debug, Clone, Default)]
pub struct Toaster {
    inner: Arc<Mutex<ToastQueue>>,
}

impl Toaster {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self) -> MutexGuard<'_, ToastQueue> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn toast(&self, message: impl Into<String>, duration: Duration) -> u64 {
        self.toast_at(message, duration, Instant::now())
    }

    pub fn toast_at(&self, message: impl Into<String>, duration: Duration, now: Instant) -> u64 {
        let message = message.into();
        debug!(%message, "toast");
        let mut queue = self.queue();
        queue.next_id += 1;
        let id = queue.next_id;
        queue.toasts.push(Toast {
            id,
            message,
            duration,
            created_at: now,
        });
        id
    }

    pub fn active(&self, now: Instant) -> Vec<Toast> {
        self.queue()
            .toasts
            .iter()
            .filter(|toast| !toast.is_expired(now))
            .cloned()
            .collect()
    }

    /// Drops expired toasts and returns how many were removed.
    pub fn prune(&self, now: Instant) -> usize {
        let mut queue = self.queue();
        let before = queue.toasts.len();
        queue.toasts.retain(|toast| !toast.is_expired(now));
        before - queue.toasts.len()
    }

    pub fn dismiss(&self, id: u64) {
        self.queue().toasts.retain(|toast| toast.id != id);
    }

    pub fn messages(&self) -> Vec<String> {
        self.queue()
            .toasts
            .iter()
            .map(|toast| toast.message.clone())
            .collect()
    }
}
