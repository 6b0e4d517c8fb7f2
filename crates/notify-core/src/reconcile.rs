//! Diffing of polled streams against previously seen ones.

use crate::stream::{RemoteStream, StreamSnapshot};

/// Outcome of one reconciliation pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Streams not covered by any retained snapshot, in poll order.
    pub new_streams: Vec<RemoteStream>,
    /// The retained set to carry into the next cycle.
    pub retained: Vec<StreamSnapshot>,
}

/// Reconcile `retained` against the latest poll.
///
/// A snapshot whose channel reappears with a start time no newer than
/// `observed_since` is kept with its miss counter reset. A snapshot whose
/// channel reappears newer is replaced by a fresh one and the stream is
/// reported as new. A snapshot whose channel is absent has its miss counter
/// bumped and is dropped once the counter exceeds `miss_tolerance`.
///
/// Channels are matched by id with a linear scan; when a poll contains the
/// same id twice only the first entry counts and the rest are ignored, so
/// each channel has at most one snapshot.
pub fn reconcile(
    retained: Vec<StreamSnapshot>,
    polled: Vec<RemoteStream>,
    miss_tolerance: u32,
) -> Reconciliation {
    let mut unmatched = polled;
    let mut kept = Vec::with_capacity(retained.len() + unmatched.len());

    for mut snapshot in retained {
        let found = unmatched
            .iter()
            .position(|s| s.channel_id == snapshot.channel_id);

        match found {
            Some(idx) if !unmatched[idx].is_newer_than(&snapshot) => {
                unmatched.remove(idx);
                snapshot.consecutive_misses = 0;
                kept.push(snapshot);
            }
            // Restarted stream: the fresh sighting below replaces this snapshot.
            Some(_) => {}
            None => {
                snapshot.consecutive_misses += 1;
                if snapshot.consecutive_misses <= miss_tolerance {
                    kept.push(snapshot);
                } else {
                    tracing::debug!("Channel {} went offline", snapshot.channel_id);
                }
            }
        }
    }

    let mut new_streams = Vec::with_capacity(unmatched.len());
    for stream in unmatched {
        if kept.iter().any(|s| s.channel_id == stream.channel_id) {
            tracing::debug!("Ignoring repeated entry for channel {}", stream.channel_id);
            continue;
        }
        kept.push(StreamSnapshot::from(&stream));
        new_streams.push(stream);
    }

    Reconciliation {
        new_streams,
        retained: kept,
    }
}

/// Owner of the retained snapshot set across poll cycles.
#[derive(Debug, Default)]
pub struct ReconciliationEngine {
    miss_tolerance: u32,
    retained: Vec<StreamSnapshot>,
}

impl ReconciliationEngine {
    pub fn new(miss_tolerance: u32) -> Self {
        Self {
            miss_tolerance,
            retained: Vec::new(),
        }
    }

    /// Apply one poll result and return the streams to announce.
    ///
    /// With `suppress` set (first cycle after a start) the retained set is
    /// still updated but nothing is reported.
    pub fn reconcile(&mut self, polled: Vec<RemoteStream>, suppress: bool) -> Vec<RemoteStream> {
        let retained = std::mem::take(&mut self.retained);
        let outcome = reconcile(retained, polled, self.miss_tolerance);
        self.retained = outcome.retained;

        if suppress {
            Vec::new()
        } else {
            outcome.new_streams
        }
    }

    /// Remember a stream without announcing it. Returns false if the channel
    /// was already retained.
    pub fn track(&mut self, stream: &RemoteStream) -> bool {
        if self
            .retained
            .iter()
            .any(|s| s.channel_id == stream.channel_id)
        {
            return false;
        }
        self.retained.push(StreamSnapshot::from(stream));
        true
    }

    pub fn set_miss_tolerance(&mut self, miss_tolerance: u32) {
        self.miss_tolerance = miss_tolerance;
    }

    pub fn reset(&mut self) {
        self.retained.clear();
    }

    pub fn retained(&self) -> &[StreamSnapshot] {
        &self.retained
    }

    pub fn len(&self) -> usize {
        self.retained.len()
    }

    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }
}
