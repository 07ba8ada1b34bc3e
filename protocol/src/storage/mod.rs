//! # Storage Module
//!
//! Local persistence for network payloads. The in-memory
//! [`WitnessStore`](crate::witness::WitnessStore) is a cache; this is what
//! lets a node re-seed it after a restart.
//!
//! Bincode is the on-disk encoding. JSON is for APIs and debugging.

pub mod db;

pub use db::{DbError, WitnessDb};
