//! Hub sessions and remote-event interpretation for touchhub.
//!
//! This crate sits between the collaborator interfaces in `touchhub-api`
//! (hub transport, discovery, remote device) and whatever process wires
//! them together:
//!
//! - **[`HubRegistry`]** -- Listens to discovery and keeps one
//!   [`HubSession`] per hub IP. Callers find hubs with
//!   [`lookup()`](HubRegistry::lookup) or wait for them with
//!   [`await_ready()`](HubRegistry::await_ready).
//!
//! - **[`HubSession`]** -- One connection to one hub. Loads the hub's
//!   [`HubCatalog`] on connect, tracks the current activity, and turns
//!   activity names and device/action hints into transport calls.
//!
//! - **[`RemoteInterpreter`]** -- Maps four-button remote events onto
//!   hub operations according to a [`RemoteBinding`].
//!
//! - **Resolver** ([`resolve`]) -- Pure, case-insensitive lookups of
//!   activities, devices and functions in a catalog.

pub mod config;
pub mod convert;
pub mod error;
pub mod guard;
pub mod model;
pub mod registry;
pub mod remote;
pub mod resolve;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{CommandHint, RemoteBinding};
pub use error::CoreError;
pub use guard::{OperationGuard, OperationPermit};
pub use registry::HubRegistry;
pub use remote::{EventOutcome, HubView, RemoteAction, RemoteInterpreter, decide, start_activity};
pub use session::{HubSession, SessionState};

pub use model::{
    Activity, ControlGroup, Device, Function, HubCatalog, HubInfo, OFF_ACTIVITY_ID,
};
