use crate::clock::Clock;
use crate::errors::{Error, Result};
use crate::models::{Preferences, StatusResponse, TimerState};
use crate::notify::{Notification, Notifier};
use crate::protocol::ControllerMessage;
use crate::storage::Store;
use crate::timer::{Countdown, TimerEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, error, info};

const EVENT_BUFFER: usize = 64;
const ALARM_BODY: &str = "It's time!";

/// Everything a host needs from the process around it.
pub struct HostContext {
    pub clock: Arc<dyn Clock>,
    pub notifier: Arc<dyn Notifier>,
    pub store: Arc<Store>,
    pub poll_interval: Duration,
    pub notification_icon: String,
}

#[derive(Debug)]
pub enum HostCommand {
    Start { duration_ms: i64 },
    Stop,
    RequestStatus { reply: oneshot::Sender<StatusResponse> },
    SetNotificationEnabled { enabled: bool },
    Shutdown { done: oneshot::Sender<()> },
}

#[derive(Debug, Clone)]
pub struct HostHandle {
    commands: mpsc::UnboundedSender<HostCommand>,
    events: broadcast::Sender<ControllerMessage>,
}

impl HostHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerMessage> {
        self.events.subscribe()
    }

    pub fn send(&self, command: HostCommand) -> Result<()> {
        self.commands.send(command).map_err(|_| Error::HostClosed)
    }

    pub fn start(&self, duration_ms: i64) -> Result<()> {
        self.send(HostCommand::Start { duration_ms })
    }

    pub fn stop(&self) -> Result<()> {
        self.send(HostCommand::Stop)
    }

    pub fn set_notification_enabled(&self, enabled: bool) -> Result<()> {
        self.send(HostCommand::SetNotificationEnabled { enabled })
    }

    pub async fn status(&self) -> Result<StatusResponse> {
        let (reply, rx) = oneshot::channel();
        self.send(HostCommand::RequestStatus { reply })?;
        rx.await.map_err(|_| Error::HostClosed)
    }

    /// Stops the host and waits until its poll is gone. A host that already
    /// exited counts as stopped.
    pub async fn shutdown(&self) {
        let (done, rx) = oneshot::channel();
        if self.send(HostCommand::Shutdown { done }).is_ok() {
            let _ = rx.await;
        }
    }
}

pub struct ControllerHost {
    countdown: Countdown,
    preferences: Preferences,
    ctx: Arc<HostContext>,
    events: broadcast::Sender<ControllerMessage>,
}

impl ControllerHost {
    pub fn new(
        ctx: Arc<HostContext>,
        preferences: Preferences,
        events: broadcast::Sender<ControllerMessage>,
    ) -> Self {
        Self {
            countdown: Countdown::new(),
            preferences,
            ctx,
            events,
        }
    }

    /// Builds a host from the persisted state, resuming a countdown that has
    /// not yet elapsed.
    pub async fn restore(ctx: Arc<HostContext>, events: broadcast::Sender<ControllerMessage>) -> Self {
        let state = ctx.store.load().await;
        let mut host = Self::new(ctx, state.app_preferences, events);
        let now = host.now();
        if let Some(remaining) = state.timer_state.remaining_at(now) {
            info!(remaining, "resuming persisted countdown");
            host.start(remaining).await;
        }
        host
    }

    pub fn spawn(ctx: Arc<HostContext>) -> HostHandle {
        let (commands, rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let handle = HostHandle {
            commands,
            events: events.clone(),
        };
        tokio::spawn(async move {
            let host = ControllerHost::restore(ctx, events).await;
            host.run(rx).await;
        });
        handle
    }

    pub fn is_running(&self) -> bool {
        self.countdown.is_running()
    }

    fn now(&self) -> i64 {
        self.ctx.clock.now_ms()
    }

    pub async fn start(&mut self, duration_ms: i64) {
        let mut events = Vec::new();
        let now = self.now();
        self.countdown.start(duration_ms, now, &mut events);
        self.publish(events).await;
    }

    pub async fn stop(&mut self) {
        let mut events = Vec::new();
        self.countdown.stop(&mut events);
        self.publish(events).await;
    }

    pub async fn poll(&mut self) {
        let mut events = Vec::new();
        let now = self.now();
        self.countdown.poll(now, &mut events);
        self.publish(events).await;
    }

    pub fn status(&self) -> StatusResponse {
        let status = self.countdown.status(self.now());
        StatusResponse {
            running: status.running,
            remaining: status.remaining,
            preferences: self.preferences,
        }
    }

    pub async fn set_notification_enabled(&mut self, enabled: bool) {
        self.preferences.notification_enabled = enabled;
        if let Err(err) = self.ctx.store.save_preferences(self.preferences).await {
            error!("failed to persist preferences: {err}");
        }
    }

    fn notify(&self, body: &str) {
        let notification = Notification::new(body, self.ctx.notification_icon.clone());
        self.ctx.notifier.notify(notification);
    }

    async fn publish(&mut self, events: Vec<TimerEvent>) {
        for event in events {
            let message = match event {
                TimerEvent::Started { .. } => ControllerMessage::Started,
                TimerEvent::Tick { remaining } => ControllerMessage::Tick { remaining },
                TimerEvent::Alarm => ControllerMessage::Alarm,
                TimerEvent::Stopped => ControllerMessage::Stopped,
            };
            // No subscribers is normal.
            let _ = self.events.send(message);

            match event {
                TimerEvent::Started { goal_time } => self.persist_timer(Some(goal_time)).await,
                TimerEvent::Alarm => {
                    info!("alarm");
                    if self.preferences.notification_enabled {
                        self.notify(ALARM_BODY);
                    }
                    self.persist_timer(None).await;
                }
                TimerEvent::Stopped => self.persist_timer(None).await,
                TimerEvent::Tick { .. } => {}
            }
        }
    }

    async fn persist_timer(&self, goal_time: Option<i64>) {
        if let Err(err) = self.ctx.store.save_timer(TimerState::from_goal(goal_time)).await {
            error!("failed to persist timer state: {err}");
        }
    }

    fn poll_ticker(&self) -> Interval {
        let mut ticker = tokio::time::interval(self.ctx.poll_interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    }

    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<HostCommand>) {
        let mut ticker = self.countdown.is_running().then(|| self.poll_ticker());
        let mut shutdown = None;

        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    match command {
                        HostCommand::Start { duration_ms } => {
                            self.start(duration_ms).await;
                            ticker = Some(self.poll_ticker());
                        }
                        HostCommand::Stop => {
                            ticker = None;
                            self.stop().await;
                        }
                        HostCommand::RequestStatus { reply } => {
                            let _ = reply.send(self.status());
                        }
                        HostCommand::SetNotificationEnabled { enabled } => {
                            self.set_notification_enabled(enabled).await;
                        }
                        HostCommand::Shutdown { done } => {
                            shutdown = Some(done);
                            break;
                        }
                    }
                }
                _ = next_poll(&mut ticker) => {
                    self.poll().await;
                    if !self.countdown.is_running() {
                        ticker = None;
                    }
                }
            }
            debug_assert_eq!(ticker.is_some(), self.countdown.is_running());
        }

        drop(ticker);
        debug!("controller host stopped");
        if let Some(done) = shutdown {
            let _ = done.send(());
        }
    }
}

async fn next_poll(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
