use crate::utils::duration::HumanDuration;
use serde::{Deserialize, Serialize};

/// Configuration for the HTTP request pipeline and the session tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the console API.
    pub api_url: String,
    /// Timeout applied to every outbound request.
    pub request_timeout: HumanDuration,
    /// Activity tracking and heartbeat settings.
    pub tracker: TrackerConfig,
}

impl Default for ClientConfig {
    fn default() -> ClientConfig {
        ClientConfig {
            api_url: "http://localhost:8000/api".to_string(),
            request_timeout: HumanDuration::from_secs(30),
            tracker: TrackerConfig::default(),
        }
    }
}

/// Settings of the activity tracker and its embedded heartbeat scheduler.
///
/// `warning_time` must be below `idle_timeout`; the gap is how long the
/// idle-warning modal stays actionable before the forced logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Whether session tracking runs at all. Disabled trackers record no
    /// activity and send no heartbeats.
    pub enabled: bool,
    /// Minimum spacing between heartbeats, and the window within which
    /// activity must have occurred for a heartbeat to be sent.
    pub heartbeat_interval: HumanDuration,
    /// Idle time after which the warning fires.
    pub warning_time: HumanDuration,
    /// Idle time after which the timeout fires.
    pub idle_timeout: HumanDuration,
    /// Cadence of the idle and heartbeat checks.
    pub poll_interval: HumanDuration,
    /// Coalescing window for input signals.
    pub debounce: HumanDuration,
}

impl Default for TrackerConfig {
    fn default() -> TrackerConfig {
        TrackerConfig {
            enabled: true,
            heartbeat_interval: HumanDuration::from_secs(60),
            warning_time: HumanDuration::from_secs(14 * 60),
            idle_timeout: HumanDuration::from_secs(15 * 60),
            poll_interval: HumanDuration::from_secs(10),
            debounce: HumanDuration::from_secs(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_documented_thresholds() {
        let config = TrackerConfig::default();
        assert!(config.enabled);
        assert_eq!(config.heartbeat_interval.as_secs(), 60);
        assert_eq!(config.warning_time.as_secs(), 14 * 60);
        assert_eq!(config.idle_timeout.as_secs(), 15 * 60);
        assert!(config.warning_time.get_duration() < config.idle_timeout.get_duration());
    }

    #[test]
    fn should_round_trip_through_serde() {
        let config = ClientConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let decoded: ClientConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.api_url, config.api_url);
        assert_eq!(decoded.tracker.idle_timeout, config.tracker.idle_timeout);
    }
}
