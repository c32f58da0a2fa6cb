// ── Remote interpreter ──
//
// Turns button events from a four-button remote into hub operations.
// Holding north or east starts a bound activity, holding south turns the
// hub off, and short presses act as channel and volume keys while a bound
// activity is running.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use touchhub_api::{Button, ButtonEvent, RemoteDevice, RemoteEvent};

use crate::config::{CommandHint, RemoteBinding};
use crate::error::CoreError;
use crate::guard::OperationGuard;
use crate::registry::HubRegistry;
use crate::session::HubSession;

/// What a button event should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteAction {
    StartActivity(String),
    TurnOff,
    SendCommand(CommandHint),
    Ignore,
}

/// How [`RemoteInterpreter::handle_event`] disposed of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The hub operation ran and succeeded.
    Executed,
    /// Nothing to do in the hub's current state.
    Ignored,
    /// Another operation was in flight.
    Dropped,
    /// The hub operation failed; the error has been logged.
    Failed,
}

/// The hub state a decision depends on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubView {
    /// The hub is running no activity.
    pub off: bool,
    /// The hub is running the primary or secondary bound activity.
    pub bound_active: bool,
}

impl HubView {
    /// Read the view from a session. Holds consult [`HubSession::is_off`],
    /// which also schedules a refresh of the tracked activity.
    fn of(session: &HubSession, binding: &RemoteBinding, hold: bool) -> Self {
        let current = session.current_activity();
        let off = if hold {
            session.is_off()
        } else {
            current.as_ref().is_none_or(|activity| activity.is_off())
        };
        let bound_active = current
            .is_some_and(|activity| !activity.is_off() && binding.is_bound_activity(&activity.label));
        Self { off, bound_active }
    }
}

/// Map an event to an action. Pure; the caller executes the result.
///
/// | button | hold, off | hold, on | press, bound activity |
/// |---|---|---|---|
/// | north | start primary | - | north command |
/// | east | start secondary | - | east command |
/// | south | - | turn off | south command |
/// | west | - | - | west command |
///
/// Multi-touch is always ignored, as is a press while no bound activity
/// runs.
pub fn decide(binding: &RemoteBinding, event: ButtonEvent, view: HubView) -> RemoteAction {
    if event.button == Button::MultiTouch {
        return RemoteAction::Ignore;
    }

    if event.hold {
        return match (event.button, view.off) {
            (Button::North, true) => RemoteAction::StartActivity(binding.primary_activity.clone()),
            (Button::East, true) => RemoteAction::StartActivity(binding.secondary_activity.clone()),
            (Button::South, false) => RemoteAction::TurnOff,
            _ => RemoteAction::Ignore,
        };
    }

    if !view.bound_active {
        return RemoteAction::Ignore;
    }
    binding
        .command_for(event.button)
        .cloned()
        .map_or(RemoteAction::Ignore, RemoteAction::SendCommand)
}

/// Start `name` on the hub. If it is already running, the hub is switched
/// off first so the activity's start-up sequence runs again.
pub async fn start_activity(session: &HubSession, name: &str) -> Result<(), CoreError> {
    if session.matches_current_activity(name) {
        debug!(ip = %session.ip(), activity = name, "activity already running, restarting");
        session.start_activity("off").await?;
    }
    session.start_activity(name).await
}

// ── RemoteInterpreter ────────────────────────────────────────────

/// Cheaply cloneable; clones share the operation guard and battery state.
#[derive(Clone)]
pub struct RemoteInterpreter {
    inner: Arc<InterpreterInner>,
}

struct InterpreterInner {
    registry: HubRegistry,
    binding: RemoteBinding,
    /// Held while any hub operation runs, so events are handled one at a time.
    in_flight: OperationGuard,
    battery: watch::Sender<Option<u8>>,
}

impl RemoteInterpreter {
    pub fn new(registry: HubRegistry, binding: RemoteBinding) -> Self {
        let (battery, _) = watch::channel(None);
        Self {
            inner: Arc::new(InterpreterInner {
                registry,
                binding,
                in_flight: OperationGuard::new(),
                battery,
            }),
        }
    }

    pub fn binding(&self) -> &RemoteBinding {
        &self.inner.binding
    }

    /// Last battery level reported by the remote, in percent.
    pub fn battery_level(&self) -> Option<u8> {
        *self.inner.battery.borrow()
    }

    pub fn subscribe_battery(&self) -> watch::Receiver<Option<u8>> {
        self.inner.battery.subscribe()
    }

    /// Handle one button event end to end.
    ///
    /// Waits for the bound hub to be ready, decides, and executes. Events
    /// that arrive while another event's hub operation is running are
    /// dropped, whether that operation is an activity change or a command.
    pub async fn handle_event(&self, event: ButtonEvent) -> EventOutcome {
        let binding = &self.inner.binding;
        if event.button == Button::MultiTouch {
            debug!("multi-touch ignored");
            return EventOutcome::Ignored;
        }
        if self.inner.in_flight.is_busy() {
            debug!(button = %event.button, hold = event.hold, "hub operation in progress, event dropped");
            return EventOutcome::Dropped;
        }

        let session = match self.inner.registry.await_ready(&binding.hub).await {
            Ok(session) => session,
            Err(e) => {
                warn!(hub = %binding.hub, error = %e, "hub unavailable");
                return EventOutcome::Failed;
            }
        };

        let view = HubView::of(&session, binding, event.hold);
        let action = decide(binding, event, view);
        debug!(button = %event.button, hold = event.hold, ?view, ?action, "button decided");
        self.execute(&session, action).await
    }

    async fn execute(&self, session: &HubSession, action: RemoteAction) -> EventOutcome {
        if action == RemoteAction::Ignore {
            return EventOutcome::Ignored;
        }
        let Some(_permit) = self.inner.in_flight.try_enter() else {
            debug!(?action, "hub operation in progress, dropped");
            return EventOutcome::Dropped;
        };

        let result = match action {
            RemoteAction::Ignore => return EventOutcome::Ignored,
            RemoteAction::StartActivity(name) => start_activity(session, &name).await,
            RemoteAction::TurnOff => session.start_activity("off").await,
            RemoteAction::SendCommand(hint) => {
                let Some(_command) = session.try_begin_operation() else {
                    debug!(device = %hint.device, action = %hint.action, "command in flight, dropped");
                    return EventOutcome::Dropped;
                };
                session.send_command(&hint.device, &hint.action).await
            }
        };

        match result {
            Ok(()) => EventOutcome::Executed,
            Err(e) => {
                warn!(ip = %session.ip(), error = %e, "remote action failed");
                EventOutcome::Failed
            }
        }
    }

    /// Drive the interpreter from a remote until `cancel` fires or the
    /// remote's event stream ends.
    ///
    /// Every button event runs in its own task so a slow hub never stalls
    /// battery or error reports. Handlers still running at shutdown are
    /// aborted.
    pub async fn run(
        &self,
        remote: Arc<dyn RemoteDevice>,
        cancel: CancellationToken,
    ) -> Result<(), CoreError> {
        let mut events = remote.subscribe();
        remote.connect().await?;
        info!(hub = %self.inner.binding.hub, "remote connected");

        let mut handlers = JoinSet::new();
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                Some(joined) = handlers.join_next() => {
                    if let Err(e) = joined {
                        warn!(error = %e, "button handler did not finish");
                    }
                }
                result = events.recv() => match result {
                    Ok(RemoteEvent::Button(event)) => {
                        let interpreter = self.clone();
                        handlers.spawn(async move { interpreter.handle_event(event).await });
                    }
                    Ok(RemoteEvent::Battery(level)) => {
                        info!(battery = level, "remote battery level");
                        self.inner.battery.send_replace(Some(level));
                    }
                    Ok(RemoteEvent::Error(message)) => {
                        warn!(error = %message, "remote device error");
                    }
                    Err(RecvError::Lagged(n)) => {
                        warn!(skipped = n, "remote event receiver lagged");
                    }
                    Err(RecvError::Closed) => {
                        debug!("remote event stream ended");
                        break;
                    }
                },
            }
        }

        handlers.shutdown().await;
        remote.disconnect().await;
        info!("remote disconnected");
        Ok(())
    }
}
