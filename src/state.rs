use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::errors::Result;
use crate::host::HostContext;
use crate::lifecycle::{Lifecycle, LifecycleConfig};
use crate::models::StatusResponse;
use crate::notify::{LogNotifier, Notification, Notifier, WebhookNotifier};
use crate::origin::Origin;
use crate::storage::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub lifecycle: Arc<Lifecycle>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
    pub store: Arc<Store>,
}

impl AppState {
    pub async fn build(config: Config) -> Self {
        let client = reqwest::Client::new();
        let notifier: Arc<dyn Notifier> = match &config.notify_webhook {
            Some(url) => Arc::new(WebhookNotifier::new(client.clone(), url.clone())),
            None => Arc::new(LogNotifier),
        };
        Self::with_parts(config, client, notifier, Arc::new(SystemClock)).await
    }

    pub async fn with_parts(
        config: Config,
        client: reqwest::Client,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = Arc::new(Store::new(config.data_path.clone()));
        let host_ctx = Arc::new(HostContext {
            clock: Arc::clone(&clock),
            notifier: Arc::clone(&notifier),
            store: Arc::clone(&store),
            poll_interval: config.poll_interval,
            notification_icon: config.notification_icon(),
        });
        let lifecycle_config = LifecycleConfig {
            mode: config.host_mode,
            cache_prefix: config.cache_prefix.clone(),
            manifest: config.manifest(),
            settle_delay: config.settle_delay,
        };
        let origin = Origin::new(config.asset_dir.clone(), client);
        let lifecycle = Lifecycle::start(lifecycle_config, origin, host_ctx).await;

        Self {
            config: Arc::new(config),
            lifecycle,
            notifier,
            clock,
            store,
        }
    }

    /// The shared host's view, or the persisted state read at the current
    /// time when every observer runs its own host.
    pub async fn status(&self) -> Result<StatusResponse> {
        if let Some(host) = self.lifecycle.active().host() {
            return host.status().await;
        }

        let state = self.store.load().await;
        let remaining = state.timer_state.remaining_at(self.clock.now_ms());
        Ok(StatusResponse {
            running: remaining.is_some(),
            remaining: remaining.unwrap_or(0),
            preferences: state.app_preferences,
        })
    }

    pub fn push(&self, body: &str) {
        self.notifier
            .notify(Notification::new(body, self.config.notification_icon()));
    }
}
