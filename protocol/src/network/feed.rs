//! # Witness Feed
//!
//! Wires a [`PayloadStore`] into a [`WitnessStore`]:
//!
//! 1. subscribe to new payloads,
//! 2. bulk-load everything the payload store already holds,
//! 3. spawn a task that forwards every witness payload that arrives later.
//!
//! Subscribing before enumerating means nothing slips through the gap
//! between the two; anything seen twice is a no-op thanks to
//! insert-if-absent. For the same reason a lagging follower simply
//! re-enumerates the payload store to pick up whatever it missed.

use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::payload::{NetworkPayload, PayloadStore, PayloadStoreError};
use crate::witness::store::WitnessStore;

/// Seeds `store` from `payloads` and starts following new arrivals.
///
/// Must be called from within a tokio runtime. Returns the number of
/// witnesses loaded at startup and the handle of the follower task.
pub fn bootstrap<P>(
    store: Arc<WitnessStore>,
    payloads: Arc<P>,
) -> Result<(usize, JoinHandle<()>), PayloadStoreError>
where
    P: PayloadStore + ?Sized + 'static,
{
    let receiver = payloads.subscribe();
    let loaded = reload(&store, payloads.as_ref())?;
    info!(loaded, "witness store bootstrapped from payload store");

    let handle = spawn_witness_feed(store, payloads, receiver);
    Ok((loaded, handle))
}

/// Spawns a task forwarding witness payloads from `receiver` into `store`.
///
/// When the receiver lags, the task re-enumerates `payloads` so that the
/// witnesses whose notifications were dropped still reach the store. The
/// task ends when the sending side is dropped.
pub fn spawn_witness_feed<P>(
    store: Arc<WitnessStore>,
    payloads: Arc<P>,
    mut receiver: broadcast::Receiver<NetworkPayload>,
) -> JoinHandle<()>
where
    P: PayloadStore + ?Sized + 'static,
{
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(NetworkPayload::AccountAgeWitness(witness)) => {
                    store.on_new_witness(witness);
                }
                Ok(NetworkPayload::Other { kind, .. }) => {
                    debug!(%kind, "ignoring non-witness payload");
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "witness feed lagged behind payload notifications, reloading");
                    match reload(&store, payloads.as_ref()) {
                        Ok(recovered) => info!(recovered, "witness store caught up after lag"),
                        Err(e) => warn!(error = %e, "failed to reload witnesses after lag"),
                    }
                }
                Err(RecvError::Closed) => {
                    debug!("payload notification channel closed, witness feed stopping");
                    break;
                }
            }
        }
    })
}

/// Loads every witness `payloads` currently holds. Returns how many were new.
fn reload<P>(store: &WitnessStore, payloads: &P) -> Result<usize, PayloadStoreError>
where
    P: PayloadStore + ?Sized,
{
    let current = payloads.enumerate()?;
    Ok(store.load(current.into_iter().filter_map(NetworkPayload::into_witness)))
}
