use fp_core::*;
use std::time::Duration;
use tokio::time::Instant;

/// Grace periods before an idle room becomes eligible for teardown.
#[derive(Debug, Clone, Copy)]
pub struct IdleConfig {
    /// A freshly created room nobody has joined yet.
    pub vacant: Duration,
    /// A room whose every participant has disconnected.
    pub abandoned: Duration,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            vacant: VACANT_GRACE,
            abandoned: ABANDONED_GRACE,
        }
    }
}

/// Deadline tracking for the idle-room auto-close.
/// Holds a plain deadline value instead of a live timer handle; an
/// external sweeper re-derives "should this room close now" from state,
/// so firing after the condition lapsed is a no-op, not an error.
#[derive(Debug)]
pub struct IdleTimer {
    config: IdleConfig,
    deadline: Option<Instant>,
}

impl IdleTimer {
    pub fn new(config: IdleConfig) -> Self {
        Self {
            config,
            deadline: None,
        }
    }
    pub fn with_defaults() -> Self {
        Self::new(IdleConfig::default())
    }
    /// Arm the short fuse for a room that has never seated anyone.
    pub fn arm_vacant(&mut self, now: Instant) {
        self.deadline = Some(now + self.config.vacant);
    }
    /// Arm the long fuse for a room everyone has walked away from.
    pub fn arm_abandoned(&mut self, now: Instant) {
        self.deadline = Some(now + self.config.abandoned);
    }
    /// Cancel the pending deadline, e.g. on any (re)connection.
    pub fn clear(&mut self) {
        self.deadline = None;
    }
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
    pub fn expired(&self, now: Instant) -> bool {
        self.deadline.map(|d| now >= d).unwrap_or(false)
    }
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }
}
