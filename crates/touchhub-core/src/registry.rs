// ── Hub registry ──
//
// Owns one session per discovered hub IP. Discovery announcements create,
// replace and remove sessions; callers find hubs by name or IP and can wait
// until a hub has loaded its catalog.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use touchhub_api::{Discovery, DiscoveryEvent, HubAnnouncement, HubConnector};

use crate::error::CoreError;
use crate::model::HubInfo;
use crate::session::{HubSession, SessionEvent};

const READY_CHANNEL_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Running,
    Stopped,
}

// ── HubRegistry ──────────────────────────────────────────────────

/// Cheaply cloneable via `Arc<RegistryInner>`.
#[derive(Clone)]
pub struct HubRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    discovery: Arc<dyn Discovery>,
    connector: Arc<dyn HubConnector>,
    hubs: DashMap<String, HubSession>,
    ready_tx: broadcast::Sender<HubSession>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
    /// Held across start/stop so concurrent calls serialize.
    lifecycle: Mutex<Lifecycle>,
}

impl HubRegistry {
    /// Create a registry. Does NOT listen yet -- call
    /// [`start()`](Self::start).
    pub fn new(discovery: Arc<dyn Discovery>, connector: Arc<dyn HubConnector>) -> Self {
        let (ready_tx, _) = broadcast::channel(READY_CHANNEL_SIZE);
        Self {
            inner: Arc::new(RegistryInner {
                discovery,
                connector,
                hubs: DashMap::new(),
                ready_tx,
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
                lifecycle: Mutex::new(Lifecycle::Idle),
            }),
        }
    }

    /// Subscribe to discovery, start it and spawn the listener.
    ///
    /// Starting a running registry is a no-op; a stopped registry cannot be
    /// restarted.
    pub async fn start(&self) -> Result<(), CoreError> {
        let mut lifecycle = self.inner.lifecycle.lock().await;
        match *lifecycle {
            Lifecycle::Running => return Ok(()),
            Lifecycle::Stopped => return Err(CoreError::RegistryStopped),
            Lifecycle::Idle => {}
        }

        // Subscribe before starting so no announcement is missed.
        let discovery_rx = self.inner.discovery.subscribe();
        self.inner.discovery.start().await?;

        let (session_tx, session_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(discovery_task(
            self.clone(),
            discovery_rx,
            session_tx,
            session_rx,
            self.inner.cancel.clone(),
        ));
        self.track(handle).await;

        *lifecycle = Lifecycle::Running;
        info!("hub registry started");
        Ok(())
    }

    /// Shut everything down: listener, connect tasks, discovery and every
    /// session. Concurrent and repeated calls collapse into one teardown.
    pub async fn stop(&self) {
        let mut lifecycle = self.inner.lifecycle.lock().await;
        if *lifecycle == Lifecycle::Stopped {
            return;
        }
        let was_running = *lifecycle == Lifecycle::Running;
        *lifecycle = Lifecycle::Stopped;

        self.inner.cancel.cancel();
        let handles: Vec<_> = self.inner.task_handles.lock().await.drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }

        if was_running {
            self.inner.discovery.stop().await;
        }

        let sessions = self.sessions();
        self.inner.hubs.clear();
        for session in sessions {
            session.close().await;
        }
        info!("hub registry stopped");
    }

    pub async fn is_running(&self) -> bool {
        *self.inner.lifecycle.lock().await == Lifecycle::Running
    }

    // ── Queries ──────────────────────────────────────────────────

    /// Find a registered session by IP or by host/friendly name.
    ///
    /// A query made only of digits and dots is treated as an IP; anything
    /// else is matched case-insensitively against hub names.
    pub fn lookup(&self, name_or_ip: &str) -> Result<HubSession, CoreError> {
        let found = if looks_like_ip(name_or_ip) {
            self.inner
                .hubs
                .get(name_or_ip)
                .map(|entry| entry.value().clone())
        } else {
            self.inner
                .hubs
                .iter()
                .find(|entry| entry.value().info().matches_name(name_or_ip))
                .map(|entry| entry.value().clone())
        };
        debug!(query = name_or_ip, found = found.is_some(), "hub lookup");

        found.ok_or_else(|| CoreError::HubNotFound {
            query: name_or_ip.to_owned(),
        })
    }

    /// Wait until a hub matching `name_or_ip` is registered and ready.
    ///
    /// Returns at once if it already is. Fails with
    /// [`CoreError::RegistryStopped`] if the registry stops first.
    pub async fn await_ready(&self, name_or_ip: &str) -> Result<HubSession, CoreError> {
        let mut ready_rx = self.inner.ready_tx.subscribe();
        loop {
            if let Some(session) = self.ready_session(name_or_ip) {
                return Ok(session);
            }
            if self.inner.cancel.is_cancelled() {
                return Err(CoreError::RegistryStopped);
            }

            tokio::select! {
                biased;
                () = self.inner.cancel.cancelled() => return Err(CoreError::RegistryStopped),
                result = ready_rx.recv() => match result {
                    Ok(_) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => return Err(CoreError::RegistryStopped),
                },
            }
        }
    }

    /// Every session announced as ready from now on.
    pub fn subscribe_ready(&self) -> broadcast::Receiver<HubSession> {
        self.inner.ready_tx.subscribe()
    }

    /// Snapshot of all registered sessions, ready or not.
    pub fn sessions(&self) -> Vec<HubSession> {
        self.inner
            .hubs
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn ready_session(&self, name_or_ip: &str) -> Option<HubSession> {
        self.lookup(name_or_ip)
            .ok()
            .filter(HubSession::is_ready)
    }

    // ── Discovery handling ───────────────────────────────────────

    async fn hub_online(&self, hub: HubAnnouncement, events: &mpsc::UnboundedSender<SessionEvent>) {
        let ip = hub.ip.clone();

        if let Some((_, previous)) = self.inner.hubs.remove(&ip) {
            debug!(ip = %ip, session = %previous.id(), "replacing hub session");
            previous.close().await;
        }

        let transport = self.inner.connector.open(&hub);
        let session = HubSession::with_events(HubInfo::from(hub), transport, events.clone());
        info!(ip = %ip, hub = %session.info().display_name(), "hub online");
        self.inner.hubs.insert(ip, session.clone());

        let handle = tokio::spawn(connect_session(
            self.clone(),
            session,
            self.inner.cancel.clone(),
        ));
        self.track(handle).await;
    }

    async fn hub_offline(&self, ip: &str) {
        if let Some((_, session)) = self.inner.hubs.remove(ip) {
            info!(ip = %ip, "hub offline");
            session.close().await;
        } else {
            debug!(ip = %ip, "offline announcement for unknown hub");
        }
    }

    fn session_closed(&self, event: &SessionEvent) {
        let SessionEvent::Closed { ip, session_id } = event;
        let removed = self
            .inner
            .hubs
            .remove_if(ip, |_, session| session.id() == *session_id);
        if removed.is_some() {
            info!(ip = %ip, session = %session_id, "hub session removed");
        }
    }

    /// Remove `session` if it is still the one registered for its IP, then
    /// close it.
    async fn evict(&self, session: &HubSession) {
        self.inner
            .hubs
            .remove_if(session.ip(), |_, registered| registered.id() == session.id());
        session.close().await;
    }

    async fn track(&self, handle: JoinHandle<()>) {
        let mut handles = self.inner.task_handles.lock().await;
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }
}

// ── Background tasks ─────────────────────────────────────────────

async fn discovery_task(
    registry: HubRegistry,
    mut discovery_rx: broadcast::Receiver<DiscoveryEvent>,
    session_tx: mpsc::UnboundedSender<SessionEvent>,
    mut session_rx: mpsc::UnboundedReceiver<SessionEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            Some(event) = session_rx.recv() => registry.session_closed(&event),
            result = discovery_rx.recv() => match result {
                Ok(DiscoveryEvent::Online(hub)) => registry.hub_online(hub, &session_tx).await,
                Ok(DiscoveryEvent::Offline { ip }) => registry.hub_offline(&ip).await,
                Err(RecvError::Lagged(n)) => {
                    warn!(skipped = n, "discovery receiver lagged");
                }
                Err(RecvError::Closed) => {
                    debug!("discovery channel closed");
                    break;
                }
            },
        }
    }
}

async fn connect_session(registry: HubRegistry, session: HubSession, cancel: CancellationToken) {
    let result = tokio::select! {
        biased;
        () = cancel.cancelled() => return,
        () = session.closed() => {
            debug!(ip = %session.ip(), "hub session closed while connecting");
            return;
        }
        result = session.connect() => result,
    };

    match result {
        Ok(()) => {
            let _ = registry.inner.ready_tx.send(session);
        }
        Err(e) => {
            warn!(ip = %session.ip(), error = %e, "hub session failed to connect");
            registry.evict(&session).await;
        }
    }
}

fn looks_like_ip(query: &str) -> bool {
    !query.is_empty() && query.chars().all(|c| c.is_ascii_digit() || c == '.')
}
