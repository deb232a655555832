use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use crate::models::alert::{AlertState, Severity};
use crate::models::settings::Settings;

/// Process-wide notification slot for user-visible messages.
///
/// Any component may publish; a single banner subscribes through
/// [`AlertChannel::subscribe`]. Cloning yields another handle to the same
/// slot.
#[derive(Clone)]
pub struct AlertChannel {
    inner: Arc<Inner>,
}

struct Inner {
    tx: watch::Sender<AlertState>,
    /// Bumped on every `show`; a pending clear only fires if it is unchanged.
    generation: AtomicU64,
    clear_delay: Duration,
    auto_hide: Duration,
}

impl std::fmt::Debug for AlertChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertChannel")
            .field("state", &*self.inner.tx.borrow())
            .field("clear_delay", &self.inner.clear_delay)
            .finish()
    }
}

impl AlertChannel {
    pub fn new(clear_delay: Duration, auto_hide: Duration) -> Self {
        let (tx, _rx) = watch::channel(AlertState::default());
        Self {
            inner: Arc::new(Inner {
                tx,
                generation: AtomicU64::new(0),
                clear_delay,
                auto_hide,
            }),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            Duration::from_millis(settings.alert_clear_delay_ms),
            Duration::from_millis(settings.alert_auto_hide_ms),
        )
    }

    /// Replace whatever is showing with `message` and open the slot.
    pub fn show(&self, message: impl Into<String>, severity: Severity) {
        let message = message.into();
        debug!(%severity, %message, "alert shown");
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.tx.send_replace(AlertState {
            message,
            severity,
            is_showing: true,
        });
    }

    /// Close the slot now and clear its text after the configured delay,
    /// unless a new message was shown in the meantime.
    ///
    /// Outside a tokio runtime the text is cleared immediately.
    pub fn hide(&self) {
        let generation = self.inner.generation.load(Ordering::SeqCst);
        self.inner.tx.send_modify(|state| state.is_showing = false);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let inner = Arc::clone(&self.inner);
                handle.spawn(async move {
                    tokio::time::sleep(inner.clear_delay).await;
                    inner.clear_if_stale(generation);
                });
            }
            Err(_) => self.inner.clear_if_stale(generation),
        }
    }

    /// Snapshot of the slot.
    pub fn current(&self) -> AlertState {
        self.inner.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AlertState> {
        self.inner.tx.subscribe()
    }

    /// How long the banner keeps a message open before hiding it.
    pub fn auto_hide_duration(&self) -> Duration {
        self.inner.auto_hide
    }
}

impl Default for AlertChannel {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl Inner {
    fn clear_if_stale(&self, generation: u64) {
        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        self.tx.send_if_modified(|state| {
            if state.is_showing || state.message.is_empty() {
                return false;
            }
            state.message.clear();
            true
        });
    }
}
