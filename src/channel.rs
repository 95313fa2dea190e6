use crate::errors::Result;
use crate::host::HostHandle;
use crate::lifecycle::{Lifecycle, LifecycleEvent};
use crate::protocol::{ClientMessage, ControllerMessage};
use crate::timer::duration_from_wire;
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::fmt::Display;
use std::pin::pin;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

pub struct ObserverSession {
    lifecycle: Arc<Lifecycle>,
}

impl ObserverSession {
    pub fn new(lifecycle: Arc<Lifecycle>) -> Self {
        Self { lifecycle }
    }

    /// Runs until the observer goes away or a new version takes over.
    pub async fn run<R, W>(self, inbound: R, outbound: W)
    where
        R: Stream<Item = String>,
        W: Sink<String>,
        W::Error: Display,
    {
        let _guard = self.lifecycle.attach();
        let mut active = self.lifecycle.watch_active();
        let deployment = active.borrow_and_update().clone();
        let (host, owns_host) = match deployment.host() {
            Some(host) => (host.clone(), false),
            None => (self.lifecycle.spawn_host(), true),
        };
        let mut host_events = host.subscribe();
        let mut lifecycle_events = self.lifecycle.subscribe();
        let mut inbound = pin!(inbound);
        let mut outbound = pin!(outbound);
        debug!(version = %deployment.version, "observer attached");

        'session: {
            if self.lifecycle.waiting_version().is_some()
                && !deliver(&mut outbound, &ControllerMessage::Waiting).await
            {
                break 'session;
            }

            loop {
                tokio::select! {
                    frame = inbound.next() => {
                        let Some(text) = frame else { break };
                        if let Some(reply) = self.handle_frame(&text, &host).await {
                            if !deliver(&mut outbound, &reply).await {
                                break;
                            }
                        }
                    }
                    event = host_events.recv() => match event {
                        Ok(message) => {
                            if !deliver(&mut outbound, &message).await {
                                break;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => debug!(skipped, "observer lagging"),
                        Err(RecvError::Closed) => break,
                    },
                    event = lifecycle_events.recv() => match event {
                        Ok(LifecycleEvent::Installed { version }) => {
                            debug!(%version, "announcing installed version");
                            if !deliver(&mut outbound, &ControllerMessage::Installed).await {
                                break;
                            }
                        }
                        Err(RecvError::Lagged(_)) => {}
                        Err(RecvError::Closed) => break,
                    },
                    changed = active.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let version = active.borrow_and_update().version.clone();
                        if version != deployment.version {
                            info!(from = %deployment.version, to = %version, "observer superseded");
                            let _ = deliver(&mut outbound, &ControllerMessage::Activated).await;
                            break;
                        }
                    }
                }
            }
        }

        if owns_host {
            host.shutdown().await;
        }
        debug!("observer detached");
    }

    async fn handle_frame(&self, text: &str, host: &HostHandle) -> Option<ControllerMessage> {
        let message = match ClientMessage::decode(text) {
            Ok(message) => message,
            Err(err) => {
                warn!("ignoring malformed observer message: {err}");
                return None;
            }
        };

        match self.apply(message, host).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!("observer command failed: {err}");
                None
            }
        }
    }

    async fn apply(&self, message: ClientMessage, host: &HostHandle) -> Result<Option<ControllerMessage>> {
        match message {
            ClientMessage::SkipWaiting => {
                let version = self.lifecycle.skip_waiting().await?;
                info!(%version, "observer requested handover");
            }
            ClientMessage::RequestStatus => {
                let status = host.status().await?;
                return Ok(Some(ControllerMessage::Status {
                    running: status.running,
                    remaining: status.remaining,
                    preferences: status.preferences,
                }));
            }
            ClientMessage::Start { duration } => host.start(duration_from_wire(duration))?,
            ClientMessage::Stop => host.stop()?,
            ClientMessage::SetNotificationEnabled {
                notification_enabled,
            } => host.set_notification_enabled(notification_enabled)?,
            ClientMessage::Unknown => debug!("ignoring unknown observer message"),
        }
        Ok(None)
    }
}

async fn deliver<W>(outbound: &mut W, message: &ControllerMessage) -> bool
where
    W: Sink<String> + Unpin,
    W::Error: Display,
{
    let text = match message.encode() {
        Ok(text) => text,
        Err(err) => {
            warn!("failed to encode {message:?}: {err}");
            return true;
        }
    };
    match outbound.send(text).await {
        Ok(()) => true,
        Err(err) => {
            debug!("observer transport closed: {err}");
            false
        }
    }
}
