// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Queue of scheduled timer callbacks
//!
//! The module system only produces into this queue (`setTimeout`,
//! `setInterval`) and cancels entries (`clearTimeout`, `clearInterval`).
//! Draining belongs to whatever event loop the embedding host runs, via
//! [`AsyncCallbackQueue::take_due`].

use crate::engine::Value;
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, Instant};

/// Furthest a callback is scheduled ahead when `now + delay` overflows
const MAX_SCHEDULE_AHEAD: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Unique identifier for a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

/// A pending timer
#[derive(Debug)]
struct ScheduledCallback {
    id: TimerId,
    callback: Value,
    due: Instant,
    /// Period of a repeating callback
    repeat: Option<Duration>,
    /// Scheduling order, breaks ties between equal due times
    seq: u64,
    cancelled: Arc<AtomicBool>,
}

impl PartialEq for ScheduledCallback {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for ScheduledCallback {}

impl PartialOrd for ScheduledCallback {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledCallback {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (earliest due first, then FIFO)
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// A callback whose due time has passed
#[derive(Debug, Clone)]
pub struct ReadyCallback {
    /// Timer that produced the callback
    pub id: TimerId,
    /// Function to invoke
    pub callback: Value,
    cancelled: Arc<AtomicBool>,
}

impl ReadyCallback {
    /// Whether the timer was cancelled after this callback was taken.
    /// Consumers must check this right before invoking.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(AtomicOrdering::SeqCst)
    }
}

/// Ordered collection of timeout/interval callbacks
pub struct AsyncCallbackQueue {
    next_id: AtomicU64,
    next_seq: AtomicU64,
    pending: Mutex<BinaryHeap<ScheduledCallback>>,
    /// Cancellation flags of live timers
    handles: Mutex<HashMap<TimerId, Arc<AtomicBool>>>,
}

impl AsyncCallbackQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            next_seq: AtomicU64::new(0),
            pending: Mutex::new(BinaryHeap::new()),
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Schedule a one-shot callback (setTimeout)
    pub fn set_timeout(&self, callback: Value, delay: Duration) -> TimerId {
        self.schedule_at(callback, due_after(Instant::now(), delay), None)
    }

    /// Schedule a repeating callback (setInterval)
    pub fn set_interval(&self, callback: Value, period: Duration) -> TimerId {
        self.schedule_at(callback, due_after(Instant::now(), period), Some(period))
    }

    /// Schedule a callback at an explicit due time
    pub fn schedule_at(&self, callback: Value, due: Instant, repeat: Option<Duration>) -> TimerId {
        let id = TimerId(self.next_id.fetch_add(1, AtomicOrdering::SeqCst));
        let cancelled = Arc::new(AtomicBool::new(false));
        self.handles.lock().insert(id, Arc::clone(&cancelled));
        self.push(ScheduledCallback {
            id,
            callback,
            due,
            repeat,
            seq: 0,
            cancelled,
        });
        tracing::trace!(timer = id.0, repeating = repeat.is_some(), "scheduled callback");
        id
    }

    fn push(&self, mut entry: ScheduledCallback) {
        entry.seq = self.next_seq.fetch_add(1, AtomicOrdering::SeqCst);
        self.pending.lock().push(entry);
    }

    /// Cancel a timer (clearTimeout/clearInterval). Returns false for
    /// unknown or already finished timers.
    pub fn cancel(&self, id: TimerId) -> bool {
        match self.handles.lock().remove(&id) {
            Some(flag) => {
                flag.store(true, AtomicOrdering::SeqCst);
                tracing::trace!(timer = id.0, "cancelled callback");
                true
            }
            None => false,
        }
    }

    /// Remove and return every callback due at or before `now`, in due
    /// order (FIFO among equal due times). Cancelled entries are dropped;
    /// repeating entries are rescheduled one period after `now`.
    pub fn take_due(&self, now: Instant) -> Vec<ReadyCallback> {
        let mut ready = Vec::new();
        let mut repeating = Vec::new();
        {
            let mut pending = self.pending.lock();
            while let Some(entry) = pending.peek() {
                if entry.cancelled.load(AtomicOrdering::SeqCst) {
                    pending.pop();
                    continue;
                }
                if entry.due > now {
                    break;
                }
                let Some(entry) = pending.pop() else { break };
                ready.push(ReadyCallback {
                    id: entry.id,
                    callback: entry.callback.clone(),
                    cancelled: Arc::clone(&entry.cancelled),
                });
                match entry.repeat {
                    Some(period) => repeating.push(ScheduledCallback {
                        due: due_after(now, period),
                        ..entry
                    }),
                    None => {
                        self.handles.lock().remove(&entry.id);
                    }
                }
            }
        }
        for entry in repeating {
            self.push(entry);
        }
        ready
    }

    /// Due time of the earliest live callback
    pub fn next_due(&self) -> Option<Instant> {
        self.pending
            .lock()
            .iter()
            .filter(|entry| !entry.cancelled.load(AtomicOrdering::SeqCst))
            .map(|entry| entry.due)
            .min()
    }

    /// Time until the earliest live callback becomes due
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.next_due()
            .map(|due| due.saturating_duration_since(now))
    }

    /// Number of live (not cancelled) timers
    pub fn len(&self) -> usize {
        self.handles.lock().len()
    }

    /// Whether no live timers remain
    pub fn is_empty(&self) -> bool {
        self.handles.lock().is_empty()
    }
}

/// `now + delay`, saturating at the latest representable instant
fn due_after(now: Instant, delay: Duration) -> Instant {
    now.checked_add(delay)
        .or_else(|| now.checked_add(MAX_SCHEDULE_AHEAD))
        .unwrap_or(now)
}

impl Default for AsyncCallbackQueue {
    fn default() -> Self {
        Self::new()
    }
}
