//! # Network Module
//!
//! The boundary between the witness subsystem and the replicated network
//! data store. Transport, gossip and persistence live behind the
//! [`PayloadStore`] trait; this module only defines the payload envelope
//! and the feed that keeps the witness store current.

pub mod feed;
pub mod payload;

pub use feed::{bootstrap, spawn_witness_feed};
pub use payload::{InMemoryPayloadStore, NetworkPayload, PayloadStore, PayloadStoreError};
