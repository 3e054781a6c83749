use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Shared busy indicator backing the global loading overlay.
///
/// Requests increment the counter on dispatch and decrement on completion;
/// the subscribed overlay only hides once the counter returns to zero, so
/// nested concurrent calls never flicker it.
#[derive(Debug, Clone)]
pub struct BusyIndicator {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    active: AtomicUsize,
    visible: watch::Sender<bool>,
}

impl BusyIndicator {
    pub fn new() -> BusyIndicator {
        let (visible, _) = watch::channel(false);
        BusyIndicator {
            inner: Arc::new(Inner {
                active: AtomicUsize::new(0),
                visible,
            }),
        }
    }

    /// Marks one call in flight. The indicator shows until the returned
    /// guard (and every other outstanding guard) is dropped.
    #[must_use]
    pub fn begin(&self) -> BusyGuard {
        if self.inner.active.fetch_add(1, Ordering::SeqCst) == 0 {
            self.inner.visible.send_replace(true);
        }
        BusyGuard {
            inner: self.inner.clone(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst) > 0
    }

    /// Watch channel the overlay observes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.visible.subscribe()
    }
}

impl Default for BusyIndicator {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard for one in-flight call.
#[derive(Debug)]
pub struct BusyGuard {
    inner: Arc<Inner>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        if self.inner.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.visible.send_replace(false);
        }
    }
}
