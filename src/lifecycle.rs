//! At most one version is active and at most one waits behind it.

use crate::cache::{CacheManifest, CacheStorage, ResourceCache};
use crate::errors::{Error, Result};
use crate::host::{ControllerHost, HostContext, HostHandle};
use crate::models::LifecycleResponse;
use crate::origin::Origin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{debug, error, info, warn};

/// Where the countdown's source of truth lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostMode {
    /// One host per deployment, shared by every observer.
    Shared,
    /// Each observer session runs its own host over the persisted state.
    PerObserver,
}

impl std::str::FromStr for HostMode {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim() {
            "shared" | "worker" => Ok(Self::Shared),
            "per-observer" | "page" => Ok(Self::PerObserver),
            other => Err(Error::Config(format!("unknown host mode '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Active,
    Installing(String),
    Waiting(String),
    Activating,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Active => "active",
            Phase::Installing(_) => "installing",
            Phase::Waiting(_) => "waiting",
            Phase::Activating => "activating",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Installed { version: String },
}

#[derive(Debug)]
pub struct Deployment {
    pub version: String,
    pub cache: Arc<ResourceCache>,
    host: Option<HostHandle>,
}

impl Deployment {
    /// The shared host; `None` in per-observer mode.
    pub fn host(&self) -> Option<&HostHandle> {
        self.host.as_ref()
    }
}

#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    pub mode: HostMode,
    pub cache_prefix: String,
    pub manifest: CacheManifest,
    pub settle_delay: Duration,
}

struct PendingVersion {
    version: String,
    cache: Arc<ResourceCache>,
}

/// Counts an attached observer until dropped. The last one out activates
/// a waiting version.
pub struct ObserverGuard {
    count: Arc<AtomicUsize>,
    lifecycle: Weak<Lifecycle>,
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) != 1 {
            return;
        }
        let Some(lifecycle) = self.lifecycle.upgrade() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move { lifecycle.activate_if_unobserved().await });
            }
            Err(_) => warn!("last observer left outside the runtime, waiting version stays parked"),
        }
    }
}

pub struct Lifecycle {
    config: LifecycleConfig,
    origin: Origin,
    caches: CacheStorage,
    host_ctx: Arc<HostContext>,
    waiting: Mutex<Option<PendingVersion>>,
    waiting_version: watch::Sender<Option<String>>,
    phase: watch::Sender<Phase>,
    active: watch::Sender<Arc<Deployment>>,
    events: broadcast::Sender<LifecycleEvent>,
    observers: Arc<AtomicUsize>,
}

impl Lifecycle {
    /// Installs and activates the origin's current version.
    ///
    /// A failed fetch still activates, with an empty cache, so every request
    /// falls through to the origin.
    pub async fn start(
        config: LifecycleConfig,
        origin: Origin,
        host_ctx: Arc<HostContext>,
    ) -> Arc<Self> {
        let caches = CacheStorage::new();
        let version = origin.version().await;
        let name = cache_name(&config.cache_prefix, &version);
        let cache = match ResourceCache::populate(&name, &config.manifest, &origin).await {
            Ok(cache) => cache,
            Err(err) => {
                error!("initial cache population failed, serving from network: {err}");
                ResourceCache::empty(&name)
            }
        };
        let cache = caches.insert(cache);
        let host = match config.mode {
            HostMode::Shared => Some(ControllerHost::spawn(Arc::clone(&host_ctx))),
            HostMode::PerObserver => None,
        };
        info!(%version, mode = ?config.mode, "activated");

        let (active, _) = watch::channel(Arc::new(Deployment {
            version,
            cache,
            host,
        }));
        let (phase, _) = watch::channel(Phase::Active);
        let (waiting_version, _) = watch::channel(None);
        let (events, _) = broadcast::channel(16);

        Arc::new(Self {
            config,
            origin,
            caches,
            host_ctx,
            waiting: Mutex::new(None),
            waiting_version,
            phase,
            active,
            events,
            observers: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn manifest(&self) -> &CacheManifest {
        &self.config.manifest
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn active(&self) -> Arc<Deployment> {
        self.active.borrow().clone()
    }

    pub fn watch_active(&self) -> watch::Receiver<Arc<Deployment>> {
        self.active.subscribe()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    pub fn phase(&self) -> Phase {
        self.phase.borrow().clone()
    }

    /// Also set while a newer install is in flight behind it.
    pub fn waiting_version(&self) -> Option<String> {
        self.waiting_version.borrow().clone()
    }

    pub fn attach(self: &Arc<Self>) -> ObserverGuard {
        self.observers.fetch_add(1, Ordering::SeqCst);
        ObserverGuard {
            count: Arc::clone(&self.observers),
            lifecycle: Arc::downgrade(self),
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.load(Ordering::SeqCst)
    }

    /// A fresh host over the shared persisted state, for per-observer mode.
    pub fn spawn_host(&self) -> HostHandle {
        ControllerHost::spawn(Arc::clone(&self.host_ctx))
    }

    pub fn cache_names(&self) -> Vec<String> {
        self.caches.names()
    }

    pub fn snapshot(&self) -> LifecycleResponse {
        let phase = self.phase();
        LifecycleResponse {
            active: self.active().version.clone(),
            phase: phase.label().to_string(),
            waiting: self.waiting_version(),
            observers: self.observer_count(),
        }
    }

    pub async fn check_for_update(&self) -> Result<bool> {
        let version = self.origin.version().await;
        self.install(&version).await
    }

    /// Returns whether anything was installed.
    pub async fn install(&self, version: &str) -> Result<bool> {
        {
            let mut waiting = self.waiting.lock().await;
            let active = self.active();
            if matches!(self.phase(), Phase::Installing(_) | Phase::Activating) {
                debug!(version, "lifecycle busy, skipping install");
                return Ok(false);
            }
            if waiting.as_ref().is_some_and(|pending| pending.version == version) {
                if self.observer_count() > 0 {
                    return Ok(false);
                }
                if let Some(pending) = self.take_waiting(&mut waiting) {
                    self.activate(pending).await;
                }
                return Ok(true);
            }
            if active.version == version && !active.cache.is_empty() {
                return Ok(false);
            }
            self.phase.send_replace(Phase::Installing(version.to_string()));
        }

        info!(version, "installing");
        let name = cache_name(&self.config.cache_prefix, version);
        let populated = ResourceCache::populate(&name, &self.config.manifest, &self.origin).await;

        let mut waiting = self.waiting.lock().await;
        let cache = match populated {
            Ok(cache) => self.caches.insert(cache),
            Err(err) => {
                warn!(version, "install failed: {err}");
                self.phase.send_replace(resting_phase(&waiting));
                return Err(err);
            }
        };

        let active = self.active();
        if active.version == version {
            // Same version whose first population failed: swap in the cache.
            self.active.send_replace(Arc::new(Deployment {
                version: active.version.clone(),
                cache,
                host: active.host.clone(),
            }));
            self.phase.send_replace(resting_phase(&waiting));
            info!(version, "cache refilled");
            return Ok(true);
        }

        let pending = PendingVersion {
            version: version.to_string(),
            cache,
        };
        if self.observer_count() == 0 {
            self.take_waiting(&mut waiting);
            self.activate(pending).await;
            return Ok(true);
        }

        self.waiting_version.send_replace(Some(pending.version.clone()));
        *waiting = Some(pending);
        self.phase.send_replace(Phase::Waiting(version.to_string()));
        let _ = self.events.send(LifecycleEvent::Installed {
            version: version.to_string(),
        });
        info!(version, "installed, waiting for handover");
        Ok(true)
    }

    /// Activates the waiting version, returning it.
    ///
    /// An install still in flight gets up to the settle delay to finish.
    pub async fn skip_waiting(&self) -> Result<String> {
        if matches!(self.phase(), Phase::Installing(_)) {
            let mut phase = self.phase.subscribe();
            let settled = phase.wait_for(|phase| !matches!(phase, Phase::Installing(_)));
            if tokio::time::timeout(self.config.settle_delay, settled).await.is_err() {
                debug!("install did not settle in time");
            }
        }

        let mut waiting = self.waiting.lock().await;
        let pending = self.take_waiting(&mut waiting).ok_or(Error::NoWaitingVersion)?;
        let version = pending.version.clone();
        self.activate(pending).await;
        Ok(version)
    }

    async fn activate_if_unobserved(&self) {
        let mut waiting = self.waiting.lock().await;
        if self.observer_count() > 0 {
            return;
        }
        if let Some(pending) = self.take_waiting(&mut waiting) {
            info!(version = %pending.version, "no observers left, activating waiting version");
            self.activate(pending).await;
        }
    }

    fn take_waiting(&self, waiting: &mut Option<PendingVersion>) -> Option<PendingVersion> {
        self.waiting_version.send_replace(None);
        waiting.take()
    }

    async fn activate(&self, pending: PendingVersion) {
        self.phase.send_replace(Phase::Activating);

        let previous = self.active();
        if let Some(host) = previous.host() {
            host.shutdown().await;
        }

        let host = match self.config.mode {
            HostMode::Shared => Some(ControllerHost::spawn(Arc::clone(&self.host_ctx))),
            HostMode::PerObserver => None,
        };
        let deployment = Arc::new(Deployment {
            version: pending.version,
            cache: pending.cache,
            host,
        });
        self.active.send_replace(Arc::clone(&deployment));

        let removed = self.caches.retain_only(&[deployment.cache.name()]);
        self.phase.send_replace(Phase::Active);
        info!(
            version = %deployment.version,
            previous = %previous.version,
            ?removed,
            "activated"
        );
    }
}

fn cache_name(prefix: &str, version: &str) -> String {
    format!("{prefix}-{version}")
}

fn resting_phase(waiting: &Option<PendingVersion>) -> Phase {
    match waiting {
        Some(pending) => Phase::Waiting(pending.version.clone()),
        None => Phase::Active,
    }
}
