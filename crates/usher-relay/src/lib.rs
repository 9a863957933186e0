//! Cross-shard invalidation and coordination for the Usher backend.
//!
//! Every shard process runs an [`InvalidationBus`] over a shared [`Broker`].
//! Local write-throughs publish [`FlushNotice`]s through a [`FlushPublisher`];
//! foreign notices evict the matching local cache entry, so shards converge
//! on store state without ever shipping values over the wire. The same bus
//! carries the [`ShardEnvelope`] command protocol the [`ShardManager`] uses
//! for fleet health and directed actions.

pub mod broker;
pub mod bus;
pub mod envelope;
pub mod error;
pub mod manager;
pub mod routing;
pub mod state;

pub use broker::{Broker, MemoryBroker, Subscription};
pub use bus::{BusConfig, BusHandle, FlushPublisher, GatewayHandler, InvalidationBus, NoopGateway};
pub use envelope::{FlushNotice, ShardCommand, ShardEnvelope, ShardId, ShardStatus};
pub use error::{RelayError, Result};
pub use manager::{FleetHealth, ShardHealth, ShardManager};
pub use routing::shard_for_guild;
pub use state::{BusState, ConnectionState};
