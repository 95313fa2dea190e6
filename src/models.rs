use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub notification_enabled: bool,
}

/// Stored countdown; a `goal_time` of 0 means nothing is running.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub goal_time: i64,
}

impl TimerState {
    pub fn from_goal(goal_time: Option<i64>) -> Self {
        Self {
            goal_time: goal_time.unwrap_or(0),
        }
    }

    /// Time left at `now`, if the stored countdown has not yet elapsed.
    pub fn remaining_at(&self, now: i64) -> Option<i64> {
        if self.goal_time == 0 {
            return None;
        }
        let remaining = self.goal_time.saturating_sub(now);
        (remaining > 0).then_some(remaining)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub app_preferences: Preferences,
    pub timer_state: TimerState,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResponse {
    pub running: bool,
    pub remaining: i64,
    pub preferences: Preferences,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LifecycleResponse {
    pub active: String,
    pub phase: String,
    pub waiting: Option<String>,
    pub observers: usize,
}
