use crate::client::AuthClient;
use crate::config::TrackerConfig;
use crate::diagnostic::SessionEvent;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant};
use tracing::{debug, info, trace, warn};

/// In-memory activity state, rebuilt on each session start.
/// `last_activity_at` only ever moves forward; `warning_shown` gates both
/// new activity recognition and heartbeat sending until the explicit
/// keep-alive clears it.
#[derive(Debug)]
struct ActivityState {
    last_activity_at: Instant,
    last_heartbeat_at: Instant,
    last_recorded_at: Option<Instant>,
    warning_shown: bool,
    timeout_fired: bool,
}

impl ActivityState {
    fn new(now: Instant) -> ActivityState {
        ActivityState {
            last_activity_at: now,
            last_heartbeat_at: now,
            last_recorded_at: None,
            warning_shown: false,
            timeout_fired: false,
        }
    }

    /// Registers one input signal. Ignored entirely while the warning is
    /// shown and coalesced within the debounce window otherwise. Returns
    /// whether `last_activity_at` advanced.
    fn record(&mut self, now: Instant, config: &TrackerConfig) -> bool {
        if self.warning_shown {
            return false;
        }
        if let Some(previous) = self.last_recorded_at {
            if now.duration_since(previous) < config.debounce.get_duration() {
                return false;
            }
        }
        self.last_recorded_at = Some(now);
        self.last_activity_at = now;
        true
    }

    /// Evaluates the idle thresholds for one poll tick. Each of the warning
    /// and the timeout fires at most once per idle episode, and the warning
    /// always precedes the timeout even when both thresholds are crossed in
    /// a single tick (e.g. after a clock suspend).
    fn observe(&mut self, now: Instant, config: &TrackerConfig) -> Vec<SessionEvent> {
        let mut fired = Vec::new();
        let idle_time = now.duration_since(self.last_activity_at);

        if idle_time >= config.idle_timeout.get_duration() {
            if !self.timeout_fired {
                if !self.warning_shown {
                    self.warning_shown = true;
                    fired.push(SessionEvent::IdleWarning);
                }
                self.timeout_fired = true;
                fired.push(SessionEvent::IdleTimeout);
            }
        } else if idle_time >= config.warning_time.get_duration() && !self.warning_shown {
            self.warning_shown = true;
            fired.push(SessionEvent::IdleWarning);
        }
        fired
    }

    /// Heartbeat eligibility: not warned, minimum spacing elapsed, and the
    /// most recent activity genuinely recent. A user idle longer than the
    /// interval simply gets no heartbeat; that is not an error.
    fn heartbeat_due(&self, now: Instant, config: &TrackerConfig) -> bool {
        if self.warning_shown {
            return false;
        }
        let spacing = config.heartbeat_interval.get_duration();
        now.duration_since(self.last_heartbeat_at) >= spacing
            && now.duration_since(self.last_activity_at) < spacing
    }

    /// Explicit extension: clears the idle episode and refreshes activity.
    fn extend(&mut self, now: Instant) {
        self.warning_shown = false;
        self.timeout_fired = false;
        self.last_activity_at = now;
        self.last_recorded_at = Some(now);
    }
}

/// Tracks user activity, evaluates the idle thresholds on a fixed cadence
/// and sends heartbeats while the user is genuinely active.
///
/// The shell forwards input signals (pointer, key, scroll, touch) to
/// [`record_activity`](Self::record_activity) and subscribes to the event
/// bus for [`SessionEvent::IdleWarning`] / [`SessionEvent::IdleTimeout`].
#[derive(Debug)]
pub struct ActivityTracker {
    config: TrackerConfig,
    api: Arc<dyn AuthClient>,
    state: Arc<Mutex<ActivityState>>,
    events: flume::Sender<SessionEvent>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl ActivityTracker {
    /// Starts tracking. A disabled config yields an inert tracker: no
    /// timers, no heartbeats, no recorded activity.
    pub fn start(
        config: TrackerConfig,
        api: Arc<dyn AuthClient>,
        events: flume::Sender<SessionEvent>,
    ) -> ActivityTracker {
        let state = Arc::new(Mutex::new(ActivityState::new(Instant::now())));
        let poll_task = if config.enabled {
            info!(
                "activity tracker started (warning after {}, timeout after {})",
                config.warning_time, config.idle_timeout
            );
            Some(tokio::spawn(run_poll_loop(
                config.clone(),
                api.clone(),
                state.clone(),
                events.clone(),
            )))
        } else {
            debug!("activity tracker disabled");
            None
        };
        ActivityTracker {
            config,
            api,
            state,
            events,
            poll_task: Mutex::new(poll_task),
        }
    }

    /// Entry point for input signals.
    pub fn record_activity(&self) {
        if !self.config.enabled {
            return;
        }
        if lock(&self.state).record(Instant::now(), &self.config) {
            trace!("user activity recorded");
        }
    }

    /// Explicit session extension, the only recognized input while the
    /// idle warning is shown. Clears the warning, refreshes activity and
    /// issues one immediate heartbeat; a heartbeat failure is logged but
    /// not returned.
    pub async fn keep_alive(&self) {
        if !self.config.enabled {
            return;
        }
        lock(&self.state).extend(Instant::now());
        match self.api.heartbeat().await {
            Ok(_) => {
                lock(&self.state).last_heartbeat_at = Instant::now();
                debug!("session extended by explicit keep-alive");
            }
            Err(failure) => warn!("keep-alive heartbeat failed: {failure}"),
        }
    }

    /// Stops the poll loop. After this returns no further events are
    /// emitted; safe to call more than once.
    pub fn shutdown(&self) {
        if let Some(task) = lock(&self.poll_task).take() {
            task.abort();
            info!("activity tracker stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.poll_task).is_some()
    }

    /// Event channel the poll loop reports into.
    pub fn events(&self) -> flume::Sender<SessionEvent> {
        self.events.clone()
    }
}

impl Drop for ActivityTracker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_poll_loop(
    config: TrackerConfig,
    api: Arc<dyn AuthClient>,
    state: Arc<Mutex<ActivityState>>,
    events: flume::Sender<SessionEvent>,
) {
    let mut poll = interval(config.poll_interval.get_duration());
    loop {
        poll.tick().await;
        let now = Instant::now();

        let fired = lock(&state).observe(now, &config);
        for event in fired {
            match &event {
                SessionEvent::IdleTimeout => warn!("idle timeout reached"),
                SessionEvent::IdleWarning => warn!("idle warning threshold reached"),
                _ => {}
            }
            let _ = events.send(event);
        }

        if lock(&state).heartbeat_due(now, &config) {
            match api.heartbeat().await {
                Ok(_) => {
                    lock(&state).last_heartbeat_at = Instant::now();
                    trace!("heartbeat sent");
                }
                // Auth-class failures are resolved by the request pipeline;
                // everything else is swallowed here.
                Err(failure) => warn!("heartbeat failed: {failure}"),
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|error| error.into_inner())
}
