//! Background Expiry Sweeper
//!
//! A dedicated thread that periodically drops expired entries, independent
//! of request traffic. It runs on its own OS thread so the cache can be built
//! and torn down outside an async runtime.

use std::sync::Weak;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Sender};
use tracing::{debug, error, trace};

use super::memory::CacheState;
use crate::error::{Error, Result};

/// Handle to a running sweeper thread. Stopping consumes the handle.
pub(crate) struct Sweeper {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Start sweeping `state` every `interval`.
    ///
    /// The thread holds only a weak reference and exits on its own if the
    /// cache state is dropped.
    pub(crate) fn spawn(state: Weak<CacheState>, interval: Duration) -> Result<Self> {
        let (stop_tx, stop_rx) = channel::bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("ordercache-sweeper".to_string())
            .spawn(move || {
                let ticker = channel::tick(interval);
                loop {
                    channel::select! {
                        recv(ticker) -> _ => {
                            let Some(state) = state.upgrade() else {
                                break;
                            };
                            let removed = state.remove_expired();
                            if removed > 0 {
                                debug!(removed, "Swept expired cache entries");
                            } else {
                                trace!("Cache sweep found nothing to remove");
                            }
                        }
                        recv(stop_rx) -> _ => break,
                    }
                }
            })
            .map_err(|e| Error::Internal(format!("Failed to start cache sweeper: {}", e)))?;

        Ok(Self { stop_tx, handle })
    }

    /// Signal the thread and wait for it to exit.
    pub(crate) fn stop(self) {
        // A closed channel also wakes the select, so a failed send is fine
        let _ = self.stop_tx.send(());
        drop(self.stop_tx);

        if self.handle.join().is_err() {
            error!("Cache sweeper thread panicked");
        }
    }
}
