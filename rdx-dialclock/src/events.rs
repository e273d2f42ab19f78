//! Defines the lifecycle events broadcast by a `TimeEmitter`.
//!
//! Observers registered with `TimeEmitter::subscribe` receive every tick's
//! `Emission`. These events are a separate, lower-volume stream describing
//! what the emitter itself is doing, useful for hosts that log or display it.

use crate::common::SubscriberId;
use crate::precision::PrecisionLevel;
use crate::rotation::RotationSnapshot;
use crate::time::TimeSample;
use std::time::Duration;
use tokio::time::Instant;

/// What observers receive on every tick.
#[derive(Debug, Clone)]
pub struct Emission {
    /// Counts published ticks since the emitter was created, starting at 1.
    pub tick: u64,
    /// The monotonic instant the tick fired at.
    pub fired_at: Instant,
    /// The decomposed wall-clock time.
    pub sample: TimeSample,
    /// Rotations for every requested hand.
    pub rotations: RotationSnapshot,
}

/// Events related to the lifecycle and state of the emitter itself.
#[derive(Debug, Clone)]
pub enum EmitterEvent {
    /// The periodic wake was (re)started at `interval`.
    Started { interval: Duration },
    /// The periodic wake was cancelled.
    Stopped,
    /// The effective precision changed, either by request or because display
    /// options demanded a finer interval.
    IntervalChanged {
        precision: PrecisionLevel,
        interval: Duration,
    },
    /// A new observer was registered.
    SubscriberAdded { id: SubscriberId },
    /// An observer was removed.
    SubscriberRemoved { id: SubscriberId },
    /// A tick panicked. The scheduler keeps running.
    TickFailed { tick: u64, message: String },
}
