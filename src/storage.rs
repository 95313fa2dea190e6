use crate::errors::Result;
use crate::models::{PersistedState, Preferences, TimerState};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::{fs, sync::Mutex};
use tracing::{error, warn};

/// Durable app preferences and timer state, shared by every host.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    lock: Mutex<()>,
}

impl Store {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub async fn load(&self) -> PersistedState {
        let _guard = self.lock.lock().await;
        load_state(&self.path).await
    }

    pub async fn save_preferences(&self, preferences: Preferences) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut state = load_state(&self.path).await;
        state.app_preferences = preferences;
        persist_state(&self.path, &state).await
    }

    pub async fn save_timer(&self, timer: TimerState) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut state = load_state(&self.path).await;
        state.timer_state = timer;
        persist_state(&self.path, &state).await
    }
}

/// Missing or unreadable records fall back to their defaults one at a time.
pub async fn load_state(path: &Path) -> PersistedState {
    let value = match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => value,
            Err(err) => {
                warn!("failed to parse state file: {err}");
                return PersistedState::default();
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return PersistedState::default();
        }
        Err(err) => {
            error!("failed to read state file: {err}");
            return PersistedState::default();
        }
    };

    PersistedState {
        app_preferences: record(&value, "appPreferences"),
        timer_state: record(&value, "timerState"),
    }
}

fn record<T: DeserializeOwned + Default>(value: &Value, key: &str) -> T {
    let Some(raw) = value.get(key) else {
        return T::default();
    };
    match serde_json::from_value(raw.clone()) {
        Ok(record) => record,
        Err(err) => {
            warn!("ignoring malformed {key} record: {err}");
            T::default()
        }
    }
}

pub async fn persist_state(path: &Path, state: &PersistedState) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    let payload = serde_json::to_vec_pretty(state)?;
    fs::write(path, payload).await?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn unique_path(tag: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("pwa_timer_{tag}_{}_{nanos}.json", std::process::id()));
    path
}
