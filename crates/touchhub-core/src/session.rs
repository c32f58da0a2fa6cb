// ── Hub session ──
//
// One live connection to one hub: its transport, catalog and tracked
// current activity. Sessions move Connecting → Ready → Disconnected and
// never leave Disconnected; a hub that comes back gets a new session.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use arc_swap::ArcSwapOption;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use touchhub_api::{HubTransport, RawCatalog};

use crate::convert::catalog_from_raw;
use crate::error::CoreError;
use crate::guard::{OperationGuard, OperationPermit};
use crate::model::{Activity, HubCatalog, HubInfo, OFF_ACTIVITY_ID};
use crate::resolve::{activity_by_id, encode_action, resolve_action, resolve_activity, resolve_device};

/// Lifecycle of a [`HubSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Ready,
    Disconnected,
}

/// Notifications a session sends to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SessionEvent {
    Closed { ip: String, session_id: Uuid },
}

type RefreshFuture = Shared<BoxFuture<'static, Result<Activity, CoreError>>>;

// ── HubSession ───────────────────────────────────────────────────

/// Handle to a hub session. Cheaply cloneable; all clones share state.
#[derive(Clone)]
pub struct HubSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    id: Uuid,
    info: HubInfo,
    transport: Arc<dyn HubTransport>,
    catalog: ArcSwapOption<HubCatalog>,
    current: ArcSwapOption<Activity>,
    state: watch::Sender<SessionState>,
    /// In-flight current-activity query shared by concurrent callers.
    refresh: Mutex<Option<RefreshFuture>>,
    /// Bumped on every change of `current`. A refresh that started under
    /// an older generation does not overwrite the tracked activity.
    generation: Mutex<u64>,
    operations: OperationGuard,
    cancel: CancellationToken,
    events: Option<mpsc::UnboundedSender<SessionEvent>>,
}

impl HubSession {
    /// Create an unconnected session. Call [`connect()`](Self::connect)
    /// before issuing operations.
    pub fn new(info: HubInfo, transport: Arc<dyn HubTransport>) -> Self {
        Self::build(info, transport, None)
    }

    pub(crate) fn with_events(
        info: HubInfo,
        transport: Arc<dyn HubTransport>,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self::build(info, transport, Some(events))
    }

    fn build(
        info: HubInfo,
        transport: Arc<dyn HubTransport>,
        events: Option<mpsc::UnboundedSender<SessionEvent>>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Connecting);
        Self {
            inner: Arc::new(SessionInner {
                id: Uuid::new_v4(),
                info,
                transport,
                catalog: ArcSwapOption::empty(),
                current: ArcSwapOption::empty(),
                state,
                refresh: Mutex::new(None),
                generation: Mutex::new(0),
                operations: OperationGuard::new(),
                cancel: CancellationToken::new(),
                events,
            }),
        }
    }

    // ── Accessors ────────────────────────────────────────────────

    /// Unique per session; a reconnecting hub gets a new id.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn info(&self) -> &HubInfo {
        &self.inner.info
    }

    pub fn ip(&self) -> &str {
        &self.inner.info.ip
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == SessionState::Ready
    }

    /// The catalog, once loaded.
    pub fn catalog(&self) -> Option<Arc<HubCatalog>> {
        self.inner.catalog.load_full()
    }

    /// Last known current activity. `None` before the session is ready.
    pub fn current_activity(&self) -> Option<Arc<Activity>> {
        self.inner.current.load_full()
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Open the transport, load the catalog and the current activity.
    ///
    /// A hub that answers the config request with anything but a non-empty
    /// success payload is unusable: the error is returned and the caller is
    /// expected to [`close()`](Self::close) the session.
    pub async fn connect(&self) -> Result<(), CoreError> {
        if self.state() == SessionState::Disconnected {
            return Err(CoreError::TransportClosed);
        }
        let ip = self.ip().to_owned();
        let transport = &self.inner.transport;

        transport.connect(&ip).await?;
        self.spawn_close_watcher();
        debug!(ip = %ip, "hub transport connected");

        let response = transport.get_config().await?;
        if !response.is_ok() {
            return Err(CoreError::CatalogUnavailable {
                ip,
                reason: format!("hub answered with status {}", response.status_code),
            });
        }
        if !response.has_payload() {
            return Err(CoreError::CatalogUnavailable {
                ip,
                reason: "hub returned an empty config".into(),
            });
        }
        let raw = RawCatalog::from_payload(&response.payload).map_err(|e| {
            CoreError::CatalogUnavailable {
                ip: ip.clone(),
                reason: e.to_string(),
            }
        })?;
        let catalog = Arc::new(catalog_from_raw(raw));
        self.inner.catalog.store(Some(Arc::clone(&catalog)));

        let current_id = transport.get_current_activity().await?;
        let current = activity_by_id(&catalog, &current_id);
        self.set_current(current.clone());

        if !self.transition(SessionState::Ready) {
            return Err(CoreError::TransportClosed);
        }
        info!(
            ip = %ip,
            hub = %self.inner.info.display_name(),
            activities = catalog.activity_count(),
            devices = catalog.device_count(),
            current = %current,
            "hub session ready"
        );
        Ok(())
    }

    /// Tear the session down. Safe to call any number of times; only the
    /// first call closes the transport.
    pub async fn close(&self) {
        if !self.transition(SessionState::Disconnected) {
            return;
        }
        self.inner.cancel.cancel();
        self.inner.transport.close().await;
        debug!(ip = %self.ip(), session = %self.inner.id, "hub session closed");

        if let Some(events) = &self.inner.events {
            let _ = events.send(SessionEvent::Closed {
                ip: self.ip().to_owned(),
                session_id: self.inner.id,
            });
        }
    }

    /// Resolves once the session has been closed.
    pub(crate) async fn closed(&self) {
        self.inner.cancel.cancelled().await;
    }

    /// Watch the transport's closed signal until the session is cancelled.
    fn spawn_close_watcher(&self) {
        let weak = Arc::downgrade(&self.inner);
        let transport = Arc::clone(&self.inner.transport);
        let cancel = self.inner.cancel.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {}
                () = transport.closed() => {
                    if let Some(inner) = weak.upgrade() {
                        let session = HubSession { inner };
                        warn!(ip = %session.ip(), "hub connection lost");
                        session.close().await;
                    }
                }
            }
        });
    }

    /// Apply a state change. Returns `false` if nothing changed, which
    /// includes any attempt to leave `Disconnected`.
    fn transition(&self, next: SessionState) -> bool {
        self.inner.state.send_if_modified(|state| {
            if *state == SessionState::Disconnected || *state == next {
                return false;
            }
            *state = next;
            true
        })
    }

    // ── Operations ───────────────────────────────────────────────

    /// Ask the hub which activity is running and update the tracked one.
    ///
    /// Concurrent callers share a single query.
    pub async fn refresh_current_activity(&self) -> Result<Activity, CoreError> {
        self.ready_catalog()?;

        let refresh = {
            let mut slot = lock(&self.inner.refresh);
            if let Some(pending) = slot.as_ref() {
                pending.clone()
            } else {
                let refresh = query_current_activity(
                    Arc::downgrade(&self.inner),
                    Arc::clone(&self.inner.transport),
                )
                .boxed()
                .shared();
                *slot = Some(refresh.clone());
                refresh
            }
        };

        refresh.await
    }

    /// Whether the hub was off at last look.
    ///
    /// Answers from the tracked state immediately and refreshes it in the
    /// background, so the next call sees the hub's latest answer. Outside a
    /// tokio runtime no refresh is scheduled.
    pub fn is_off(&self) -> bool {
        let runtime = self
            .is_ready()
            .then(tokio::runtime::Handle::try_current)
            .and_then(Result::ok);
        if let Some(runtime) = runtime {
            let session = self.clone();
            runtime.spawn(async move {
                if let Err(e) = session.refresh_current_activity().await {
                    debug!(ip = %session.ip(), error = %e, "background activity refresh failed");
                }
            });
        }
        self.current_activity().is_none_or(|current| current.is_off())
    }

    /// Whether `name` (or "off") is the tracked current activity. Unknown
    /// names never match.
    pub fn matches_current_activity(&self, name: &str) -> bool {
        let Some(catalog) = self.catalog() else {
            return false;
        };
        let Ok(activity) = resolve_activity(&catalog, name) else {
            return false;
        };
        self.current_activity()
            .is_some_and(|current| current.id == activity.id)
    }

    /// Switch the hub to `target`.
    ///
    /// Switching between two real activities goes through off first.
    /// Switching to the tracked activity sends nothing.
    pub async fn switch_activity(&self, target: &Activity) -> Result<(), CoreError> {
        self.ready_catalog()?;
        let current = self
            .current_activity()
            .map_or_else(Activity::off, |current| (*current).clone());

        if current.id == target.id {
            debug!(ip = %self.ip(), activity = %target, "activity already current");
            self.set_current(target.clone());
            return Ok(());
        }

        let transport = &self.inner.transport;
        if !current.is_off() && !target.is_off() {
            transport.start_activity(OFF_ACTIVITY_ID).await?;
            self.set_current(Activity::off());
        }
        transport.start_activity(&target.id).await?;
        self.set_current(target.clone());

        info!(ip = %self.ip(), from = %current, to = %target, "activity switched");
        Ok(())
    }

    /// Resolve `name` (or "off") in the catalog and switch to it.
    pub async fn start_activity(&self, name: &str) -> Result<(), CoreError> {
        let catalog = self.ready_catalog()?;
        let activity = resolve_activity(&catalog, name)?;
        self.switch_activity(&activity).await
    }

    /// Resolve a device and function from hints and send the command.
    pub async fn send_command(&self, device_hint: &str, action_hint: &str) -> Result<(), CoreError> {
        let catalog = self.ready_catalog()?;
        let device = resolve_device(&catalog, device_hint)?;
        let function = resolve_action(device, action_hint)?;
        let encoded = encode_action(function);

        debug!(
            ip = %self.ip(),
            device = %device.label,
            function = %function.name,
            "sending command"
        );
        self.inner.transport.send_command(&encoded).await?;
        Ok(())
    }

    /// Claim the session's command slot, or `None` if a command is already
    /// in flight.
    pub fn try_begin_operation(&self) -> Option<OperationPermit> {
        self.inner.operations.try_enter()
    }

    // ── Internals ────────────────────────────────────────────────

    fn ready_catalog(&self) -> Result<Arc<HubCatalog>, CoreError> {
        let not_ready = || CoreError::NotReady {
            ip: self.ip().to_owned(),
        };
        match self.state() {
            SessionState::Ready => self.catalog().ok_or_else(not_ready),
            SessionState::Connecting => Err(not_ready()),
            SessionState::Disconnected => Err(CoreError::TransportClosed),
        }
    }

    fn set_current(&self, activity: Activity) {
        let mut generation = lock(&self.inner.generation);
        *generation += 1;
        self.inner.current.store(Some(Arc::new(activity)));
    }
}

impl fmt::Debug for HubSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubSession")
            .field("id", &self.inner.id)
            .field("info", &self.inner.info)
            .field("state", &self.state())
            .field("current", &self.current_activity())
            .finish_non_exhaustive()
    }
}

/// Body of a shared refresh. Holds only a weak handle so a pending refresh
/// never keeps a dropped session alive.
async fn query_current_activity(
    weak: Weak<SessionInner>,
    transport: Arc<dyn HubTransport>,
) -> Result<Activity, CoreError> {
    let started = weak
        .upgrade()
        .map(|inner| *lock(&inner.generation))
        .ok_or(CoreError::TransportClosed)?;

    let result = transport.get_current_activity().await;

    let inner = weak.upgrade().ok_or(CoreError::TransportClosed)?;
    *lock(&inner.refresh) = None;
    let id = result?;

    let activity = inner
        .catalog
        .load()
        .as_deref()
        .map_or_else(Activity::off, |catalog| activity_by_id(catalog, &id));

    let mut generation = lock(&inner.generation);
    if *generation == started {
        *generation += 1;
        inner.current.store(Some(Arc::new(activity.clone())));
        Ok(activity)
    } else {
        debug!(ip = %inner.info.ip, reported = %activity, "discarding stale activity refresh");
        Ok(inner
            .current
            .load_full()
            .map_or_else(Activity::off, |current| (*current).clone()))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
