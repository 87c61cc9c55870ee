// crates/optima-sim/src/scheduler.rs
//
// Single logical scheduler for every periodic task in the simulation.
//
// Timers are ordered by:
//   1. Due time (earlier first)
//   2. Sequence number (order in which the timer was armed)
//
// so two runs with the same seed and the same clock readings fire ticks in
// exactly the same order. Periodic timers re-arm at `due + interval`, which
// keeps them drift-free and makes a large clock jump replay every missed
// tick in order.

use std::collections::{BTreeMap, HashMap};

/// Opaque handle returned by [`TickScheduler::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// What a timer drives when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickTarget {
    /// Block production for the validator at this pool index.
    Block(usize),
    /// Resource telemetry for the validator at this pool index.
    Metrics(usize),
    /// Network-wide aggregation.
    Aggregate,
}

/// A timer that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueTick {
    pub handle: TimerHandle,
    pub target: TickTarget,
    /// The scheduled fire time (not the time it was popped).
    pub due_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct TimerKey {
    due_ms: u64,
    sequence: u64,
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    target: TickTarget,
    interval_ms: u64,
    key: TimerKey,
}

/// Ordered set of periodic timers.
#[derive(Debug, Default)]
pub struct TickScheduler {
    queue: BTreeMap<TimerKey, TimerHandle>,
    timers: HashMap<TimerHandle, Timer>,
    next_handle: u64,
    next_sequence: u64,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a periodic timer that first fires at `now_ms + interval_ms`.
    ///
    /// An interval of zero is treated as one millisecond.
    pub fn schedule(&mut self, target: TickTarget, interval_ms: u64, now_ms: u64) -> TimerHandle {
        let interval_ms = interval_ms.max(1);
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;

        let key = self.next_key(now_ms + interval_ms);
        self.queue.insert(key, handle);
        self.timers.insert(
            handle,
            Timer {
                target,
                interval_ms,
                key,
            },
        );
        handle
    }

    /// Disarm a timer. Returns `true` only the first time for a given handle.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.timers.remove(&handle) {
            Some(timer) => {
                self.queue.remove(&timer.key);
                true
            }
            None => false,
        }
    }

    /// Pop the earliest timer due at or before `now_ms`, re-arming it for its
    /// next period.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<DueTick> {
        let (&key, &handle) = self.queue.first_key_value()?;
        if key.due_ms > now_ms {
            return None;
        }
        self.queue.remove(&key);

        let interval_ms = match self.timers.get(&handle) {
            Some(timer) => timer.interval_ms,
            None => {
                tracing::warn!("Dropping orphaned timer entry {:?}", handle);
                return None;
            }
        };
        let next = self.next_key(key.due_ms + interval_ms);
        let timer = self.timers.get_mut(&handle)?;
        timer.key = next;
        let target = timer.target;
        self.queue.insert(next, handle);

        Some(DueTick {
            handle,
            target,
            due_ms: key.due_ms,
        })
    }

    /// Number of armed timers.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    fn next_key(&mut self, due_ms: u64) -> TimerKey {
        let key = TimerKey {
            due_ms,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        key
    }
}
