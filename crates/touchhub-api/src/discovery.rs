//! Hub discovery interface.
//!
//! Discovery is a passive network scan owned by an external collaborator.
//! It publishes [`DiscoveryEvent`]s through a [`tokio::sync::broadcast`]
//! channel; consumers call [`Discovery::subscribe`] before
//! [`Discovery::start`] so no announcement is missed.
//!
//! [`ChannelDiscovery`] is an in-memory implementation for wiring an
//! external scanner (or a test) into the registry.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::Error;

/// UDP port hubs answer discovery probes on.
pub const DISCOVERY_PORT: u16 = 61991;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// What a hub tells us about itself when it shows up on the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubAnnouncement {
    pub ip: String,
    #[serde(default, alias = "host_name")]
    pub host_name: Option<String>,
    #[serde(default)]
    pub friendly_name: Option<String>,
}

impl HubAnnouncement {
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            host_name: None,
            friendly_name: None,
        }
    }

    pub fn with_host_name(mut self, host_name: impl Into<String>) -> Self {
        self.host_name = Some(host_name.into());
        self
    }

    pub fn with_friendly_name(mut self, friendly_name: impl Into<String>) -> Self {
        self.friendly_name = Some(friendly_name.into());
        self
    }
}

/// A hub appeared on, or disappeared from, the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    Online(HubAnnouncement),
    Offline { ip: String },
}

#[async_trait]
pub trait Discovery: Send + Sync {
    /// Receiver for all events published after this call.
    fn subscribe(&self) -> broadcast::Receiver<DiscoveryEvent>;

    /// Begin scanning.
    async fn start(&self) -> Result<(), Error>;

    /// Stop scanning. Must be safe to call more than once.
    async fn stop(&self);
}

/// Broadcast-backed discovery fed by explicit announcements.
///
/// Announcements made while stopped are discarded, like a scanner
/// that is not listening.
pub struct ChannelDiscovery {
    tx: broadcast::Sender<DiscoveryEvent>,
    running: AtomicBool,
}

impl ChannelDiscovery {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            tx,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Publish an "online" event. Returns `false` if it was discarded.
    pub fn announce_online(&self, hub: HubAnnouncement) -> bool {
        self.publish(DiscoveryEvent::Online(hub))
    }

    /// Publish an "offline" event. Returns `false` if it was discarded.
    pub fn announce_offline(&self, ip: impl Into<String>) -> bool {
        self.publish(DiscoveryEvent::Offline { ip: ip.into() })
    }

    fn publish(&self, event: DiscoveryEvent) -> bool {
        if !self.is_running() {
            tracing::debug!(?event, "discovery stopped, dropping announcement");
            return false;
        }
        // No subscribers is fine -- nobody is interested yet.
        let _ = self.tx.send(event);
        true
    }
}

impl Default for ChannelDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Discovery for ChannelDiscovery {
    fn subscribe(&self) -> broadcast::Receiver<DiscoveryEvent> {
        self.tx.subscribe()
    }

    async fn start(&self) -> Result<(), Error> {
        self.running.store(true, Ordering::Release);
        tracing::debug!(port = DISCOVERY_PORT, "discovery started");
        Ok(())
    }

    async fn stop(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            tracing::debug!("discovery stopped");
        }
    }
}
