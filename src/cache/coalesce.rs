//! Single-flight request coalescing.
//!
//! The first caller to miss on a key becomes the owner and performs the
//! fetch; everyone else arriving before completion subscribes to the same
//! outcome. Completion removes the key before broadcasting, so a caller
//! arriving afterwards starts a fresh flight instead of waiting forever.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use glimpse_common::{Error, ResolvedMedia};
use tokio::sync::broadcast;

/// Outcome delivered to every caller of a coalesced flight.
pub(crate) type FlightOutcome = Result<ResolvedMedia, Error>;

/// A caller's position in a flight.
pub(crate) enum Flight {
    /// This caller must perform the fetch and call
    /// [`InFlightMap::complete`]. The receiver observes its own outcome.
    Owner(broadcast::Receiver<FlightOutcome>),
    /// Another caller owns the fetch; await the broadcast.
    Waiter(broadcast::Receiver<FlightOutcome>),
}

/// Map of in-flight fetches keyed by cache key.
pub(crate) struct InFlightMap {
    flights: DashMap<String, broadcast::Sender<FlightOutcome>>,
}

impl InFlightMap {
    pub fn new() -> Self {
        Self {
            flights: DashMap::new(),
        }
    }

    /// Join the flight for `key`, creating it if absent.
    pub fn join(&self, key: &str) -> Flight {
        match self.flights.entry(key.to_string()) {
            Entry::Occupied(occupied) => Flight::Waiter(occupied.get().subscribe()),
            Entry::Vacant(vacant) => {
                // A single send fans out to every subscriber; capacity 1 is
                // enough because nothing is sent before completion.
                let (tx, rx) = broadcast::channel(1);
                vacant.insert(tx);
                Flight::Owner(rx)
            }
        }
    }

    /// Complete the flight for `key`, releasing all waiters.
    pub fn complete(&self, key: &str, outcome: FlightOutcome) {
        if let Some((_, tx)) = self.flights.remove(key) {
            // Send can only fail if every waiter already went away.
            let _ = tx.send(outcome);
        }
    }

    /// Number of flights currently in progress.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.flights.len()
    }
}
