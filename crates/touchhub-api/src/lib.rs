// touchhub-api: Interfaces to the hub, discovery and remote-device collaborators

pub mod catalog;
pub mod discovery;
pub mod error;
pub mod remote;
pub mod transport;

pub use catalog::{RawActivity, RawCatalog, RawControlGroup, RawDevice, RawFunction};
pub use discovery::{ChannelDiscovery, DISCOVERY_PORT, Discovery, DiscoveryEvent, HubAnnouncement};
pub use error::Error;
pub use remote::{Button, ButtonEvent, RemoteDevice, RemoteEvent};
pub use transport::{CODE_OK, ConfigResponse, HubConnector, HubTransport};
