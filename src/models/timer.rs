use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Running,
    Paused,
    #[default]
    Stopped,
}

impl std::fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimerStatus::Running => write!(f, "running"),
            TimerStatus::Paused => write!(f, "paused"),
            TimerStatus::Stopped => write!(f, "stopped"),
        }
    }
}

/// Timer state embedded in a match record.
///
/// `start_time` and `paused_time` are informational stamps; elapsed time is
/// counted by the live timer, not derived from them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimerSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused_time: Option<DateTime<Utc>>,
    /// Regulation length in seconds.
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overtime: Option<u32>,
    #[serde(default)]
    pub status: TimerStatus,
}

impl TimerSnapshot {
    pub fn new(duration: u32, overtime: Option<u32>) -> Self {
        Self {
            start_time: None,
            paused_time: None,
            duration,
            overtime,
            status: TimerStatus::Stopped,
        }
    }

    /// Regulation plus overtime, in seconds.
    pub fn total_seconds(&self) -> u32 {
        self.duration.saturating_add(self.overtime.unwrap_or(0))
    }

    /// Returns a copy with the patched fields replaced.
    pub fn merged(&self, patch: &TimerPatch) -> TimerSnapshot {
        let mut merged = self.clone();
        if let Some(status) = patch.status {
            merged.status = status;
        }
        if let Some(start_time) = patch.start_time {
            merged.start_time = Some(start_time);
        }
        if let Some(paused_time) = patch.paused_time {
            merged.paused_time = Some(paused_time);
        }
        merged
    }
}

/// Timer fields that may change after a match is created.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TimerStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused_time: Option<DateTime<Utc>>,
}

impl TimerPatch {
    pub fn status(status: TimerStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn started_at(mut self, at: DateTime<Utc>) -> Self {
        self.start_time = Some(at);
        self
    }

    pub fn paused_at(mut self, at: DateTime<Utc>) -> Self {
        self.paused_time = Some(at);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.start_time.is_none() && self.paused_time.is_none()
    }
}
