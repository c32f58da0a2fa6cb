#![allow(clippy::unwrap_used, dead_code)]
// Shared in-memory collaborators for touchhub-core integration tests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::{Notify, broadcast};
use tokio_util::sync::CancellationToken;

use touchhub_api::{
    ChannelDiscovery, ConfigResponse, Error, HubAnnouncement, HubConnector, HubTransport,
    RemoteDevice, RemoteEvent,
};
use touchhub_core::{HubInfo, HubRegistry, HubSession};

pub const HUB_IP: &str = "192.168.1.20";
pub const HUB_NAME: &str = "Huiskamer";

// ── Catalog fixture ─────────────────────────────────────────────────

pub fn catalog_payload() -> Value {
    json!({
        "activity": [
            { "id": "-1", "label": "PowerOff" },
            { "id": "1", "label": "TV kijken" },
            { "id": "2", "label": "Radio" },
            { "id": 3, "label": "Netflix" }
        ],
        "device": [
            {
                "id": "100",
                "label": "pvr",
                "deviceTypeDisplayName": "PVR",
                "controlGroup": [
                    { "name": "Power", "function": [{ "name": "PowerToggle", "action": "1:1" }] },
                    { "name": "Channel", "function": [
                        { "name": "Up", "action": "1:2" },
                        { "name": "Down", "action": "1:3" }
                    ]}
                ]
            },
            {
                "id": "200",
                "label": "Living Room Receiver",
                "deviceTypeDisplayName": "Stereo Receiver",
                "controlGroup": [
                    { "name": "Volume", "function": [
                        { "name": "Up", "action": "{\"command\":\"VolumeUp\",\"deviceId\":\"200\"}" },
                        { "name": "Down", "action": "{\"command\":\"VolumeDown\",\"deviceId\":\"200\"}" }
                    ]}
                ]
            }
        ]
    })
}

pub fn announcement() -> HubAnnouncement {
    HubAnnouncement::new(HUB_IP)
        .with_host_name("HarmonyHub")
        .with_friendly_name(HUB_NAME)
}

// ── FakeHub ─────────────────────────────────────────────────────────

/// Every transport call a fake hub has seen, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect(String),
    GetConfig,
    GetCurrentActivity,
    StartActivity(String),
    SendCommand(String),
    Close,
}

/// Transport operations that can be held open by a [`Gate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    GetConfig,
    GetCurrentActivity,
    StartActivity,
    SendCommand,
}

/// Pauses the next call of one operation until released.
#[derive(Clone, Default)]
pub struct Gate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl Gate {
    /// Resolves once the gated call has started.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

struct HubState {
    calls: Vec<Call>,
    current_activity: String,
    config: ConfigResponse,
    gates: HashMap<Op, Gate>,
    connections: Vec<CancellationToken>,
}

/// A scripted hub. All transports it hands out share its state.
#[derive(Clone)]
pub struct FakeHub {
    state: Arc<Mutex<HubState>>,
}

impl FakeHub {
    pub fn new() -> Self {
        Self::with_config(ConfigResponse::new(200, catalog_payload()))
    }

    pub fn with_config(config: ConfigResponse) -> Self {
        Self {
            state: Arc::new(Mutex::new(HubState {
                calls: Vec::new(),
                current_activity: "-1".into(),
                config,
                gates: HashMap::new(),
                connections: Vec::new(),
            })),
        }
    }

    pub fn running(self, activity_id: &str) -> Self {
        self.set_current_activity(activity_id);
        self
    }

    /// A fresh transport for this hub.
    pub fn transport(&self) -> Arc<dyn HubTransport> {
        let closed = CancellationToken::new();
        self.state.lock().unwrap().connections.push(closed.clone());
        Arc::new(FakeTransport {
            hub: self.clone(),
            closed,
        })
    }

    /// Hold the next call of `op` until the returned gate is released.
    pub fn gate(&self, op: Op) -> Gate {
        let gate = Gate::default();
        self.state.lock().unwrap().gates.insert(op, gate.clone());
        gate
    }

    pub fn set_current_activity(&self, activity_id: &str) {
        self.state.lock().unwrap().current_activity = activity_id.into();
    }

    /// Simulate the hub dropping its latest connection.
    pub fn drop_connection(&self) {
        if let Some(closed) = self.state.lock().unwrap().connections.last() {
            closed.cancel();
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn started_activities(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::StartActivity(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn sent_commands(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::SendCommand(action) => Some(action),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    async fn pass_gate(&self, op: Op) {
        let gate = self.state.lock().unwrap().gates.remove(&op);
        if let Some(gate) = gate {
            gate.pass().await;
        }
    }
}

struct FakeTransport {
    hub: FakeHub,
    closed: CancellationToken,
}

#[async_trait]
impl HubTransport for FakeTransport {
    async fn connect(&self, ip: &str) -> Result<(), Error> {
        self.hub.record(Call::Connect(ip.into()));
        Ok(())
    }

    async fn get_config(&self) -> Result<ConfigResponse, Error> {
        self.hub.record(Call::GetConfig);
        self.hub.pass_gate(Op::GetConfig).await;
        if self.closed.is_cancelled() {
            return Err(Error::Closed);
        }
        Ok(self.hub.state.lock().unwrap().config.clone())
    }

    async fn get_current_activity(&self) -> Result<String, Error> {
        self.hub.record(Call::GetCurrentActivity);
        // Read before pausing so a gated call answers with stale state.
        let current = self.hub.state.lock().unwrap().current_activity.clone();
        self.hub.pass_gate(Op::GetCurrentActivity).await;
        tokio::task::yield_now().await;
        Ok(current)
    }

    async fn start_activity(&self, activity_id: &str) -> Result<(), Error> {
        self.hub.record(Call::StartActivity(activity_id.into()));
        self.hub.pass_gate(Op::StartActivity).await;
        self.hub.set_current_activity(activity_id);
        Ok(())
    }

    async fn send_command(&self, encoded_action: &str) -> Result<(), Error> {
        self.hub.record(Call::SendCommand(encoded_action.into()));
        self.hub.pass_gate(Op::SendCommand).await;
        Ok(())
    }

    async fn close(&self) {
        self.hub.record(Call::Close);
        self.closed.cancel();
    }

    async fn closed(&self) {
        self.closed.cancelled().await;
    }
}

// ── FakeConnector ───────────────────────────────────────────────────

/// Hands out transports for scripted hubs, creating a default hub for
/// any IP it has not seen.
#[derive(Default)]
pub struct FakeConnector {
    hubs: Mutex<HashMap<String, FakeHub>>,
}

impl FakeConnector {
    pub fn insert(&self, ip: &str, hub: FakeHub) {
        self.hubs.lock().unwrap().insert(ip.into(), hub);
    }

    pub fn hub(&self, ip: &str) -> FakeHub {
        self.hubs
            .lock()
            .unwrap()
            .entry(ip.into())
            .or_insert_with(FakeHub::new)
            .clone()
    }
}

impl HubConnector for FakeConnector {
    fn open(&self, hub: &HubAnnouncement) -> Arc<dyn HubTransport> {
        self.hub(&hub.ip).transport()
    }
}

// ── FakeRemote ──────────────────────────────────────────────────────

pub struct FakeRemote {
    tx: broadcast::Sender<RemoteEvent>,
    connected: AtomicBool,
    disconnected: AtomicBool,
}

impl FakeRemote {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self {
            tx,
            connected: AtomicBool::new(false),
            disconnected: AtomicBool::new(false),
        }
    }

    pub fn emit(&self, event: RemoteEvent) {
        self.tx.send(event).unwrap();
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::Acquire)
    }
}

#[async_trait]
impl RemoteDevice for FakeRemote {
    async fn connect(&self) -> Result<(), Error> {
        self.connected.store(true, Ordering::Release);
        Ok(())
    }

    async fn disconnect(&self) {
        self.disconnected.store(true, Ordering::Release);
    }

    fn subscribe(&self) -> broadcast::Receiver<RemoteEvent> {
        self.tx.subscribe()
    }
}

// ── Harness ─────────────────────────────────────────────────────────

pub struct Harness {
    pub discovery: Arc<ChannelDiscovery>,
    pub connector: Arc<FakeConnector>,
    pub registry: HubRegistry,
}

impl Harness {
    pub fn new() -> Self {
        let discovery = Arc::new(ChannelDiscovery::new());
        let connector = Arc::new(FakeConnector::default());
        let registry = HubRegistry::new(discovery.clone(), connector.clone());
        Self {
            discovery,
            connector,
            registry,
        }
    }

    /// Start the registry, announce `hub` and wait until it is ready.
    pub async fn with_ready_hub(hub: FakeHub) -> Self {
        let harness = Self::new();
        harness.connector.insert(HUB_IP, hub);
        harness.registry.start().await.unwrap();
        assert!(harness.discovery.announce_online(announcement()));
        within(harness.registry.await_ready(HUB_NAME)).await.unwrap();
        harness
    }

    pub fn hub(&self) -> FakeHub {
        self.connector.hub(HUB_IP)
    }
}

/// A standalone session on `hub`, connected.
pub async fn connected_session(hub: &FakeHub) -> HubSession {
    let session = HubSession::new(
        HubInfo::new(HUB_IP, Some("HarmonyHub".into()), Some(HUB_NAME.into())),
        hub.transport(),
    );
    session.connect().await.unwrap();
    session
}

// ── Timing helpers ──────────────────────────────────────────────────

/// Await `future`, failing the test if it takes more than a second.
pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(1), future)
        .await
        .expect("timed out")
}

/// Poll `condition` until it holds, failing the test after a second.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}
