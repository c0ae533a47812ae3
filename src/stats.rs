//! Periodic statistics reporting

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::info;

use crate::store::{Snapshot, TupleStore};

/// Default reporting period
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Take a snapshot every `period` and hand it to `emit`, forever.
///
/// The first report is emitted immediately.
pub async fn run<F>(store: Arc<TupleStore>, period: Duration, mut emit: F)
where
    F: FnMut(Snapshot),
{
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        emit(store.snapshot());
    }
}

/// Spawn the reporter, logging each snapshot
pub fn spawn(store: Arc<TupleStore>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(run(store, period, |snapshot| {
        info!(target: "tuplespace::stats", "Tuple space summary\n{}", snapshot);
    }))
}
