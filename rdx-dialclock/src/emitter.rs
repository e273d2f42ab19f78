//! The emitter that samples the clock on a schedule and publishes hand rotations.

use crate::common::{RotationUnit, SubscriberId};
use crate::config::DialclockConfig;
use crate::error::ClockError;
use crate::events::{EmitterEvent, Emission};
use crate::precision::{interval_duration, DisplayOptions, PrecisionLevel, PrecisionPolicy};
use crate::rotation::{ClockBase, HandSpec, RotationEngine};
use crate::time::{TimeSampler, TimeSource};
use parking_lot::Mutex;
use slotmap::SlotMap;
use std::any::Any;
use std::hash::{Hash, Hasher};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

/// A callback that receives every published tick.
pub type Observer = Arc<dyn Fn(&Emission) + Send + Sync>;

/// Emits the current time and hand rotations at the effective interval.
///
/// A `TimeEmitter` is a cheap handle: clones share the same schedule,
/// observers and cached emission. It starts out stopped. Once started, the
/// first tick fires one full interval later, never immediately, and the same
/// holds after every `set_interval`.
///
/// Two emitters compare equal when their effective intervals are equal.
#[derive(Clone)]
pub struct TimeEmitter {
    inner: Arc<EmitterInner>,
}

struct EmitterInner {
    sampler: TimeSampler,
    policy: PrecisionPolicy,
    state: Mutex<EmitterState>,
    subscribers: Mutex<Subscribers>,
    // Held for the whole of a tick so two ticks never overlap, even across a restart.
    tick_lock: Mutex<()>,
    event_sender: broadcast::Sender<EmitterEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Schedule {
    Stopped,
    Running { generation: u64, interval: Duration },
}

struct EmitterState {
    requested: PrecisionLevel,
    display: DisplayOptions,
    effective: PrecisionLevel,
    clock_base: ClockBase,
    explicit_hands: Option<Vec<HandSpec>>,
    rotation: RotationEngine,
    schedule: Schedule,
    generation: u64,
    task: Option<JoinHandle<()>>,
    tick_count: u64,
    last: Option<Arc<Emission>>,
}

impl EmitterState {
    fn requested_hands(&self) -> Vec<HandSpec> {
        match &self.explicit_hands {
            Some(hands) => hands.clone(),
            None => HandSpec::standard_set(
                self.clock_base,
                self.effective > PrecisionLevel::Low,
                self.display.period,
                self.display.tick_tock,
            ),
        }
    }
}

/// Observers in registration order.
#[derive(Default)]
struct Subscribers {
    observers: SlotMap<SubscriberId, Observer>,
    order: Vec<SubscriberId>,
}

impl Subscribers {
    fn in_order(&self) -> Vec<(SubscriberId, Observer)> {
        self.order
            .iter()
            .filter_map(|id| Some((*id, self.observers.get(*id).cloned()?)))
            .collect()
    }
}

enum TickOutcome {
    Continue,
    Reschedule(Duration),
    Cancelled,
}

struct PreparedTick {
    emission: Arc<Emission>,
    observers: Vec<(SubscriberId, Observer)>,
    outcome: TickOutcome,
}

// Construction and configuration.
impl TimeEmitter {
    /// Creates a stopped emitter that samples the system clock.
    pub fn new(config: &DialclockConfig) -> Result<Self, ClockError> {
        Self::with_source(config, config.time_source())
    }

    /// Creates a stopped emitter that samples the given time source.
    pub fn with_source(
        config: &DialclockConfig,
        source: Arc<dyn TimeSource>,
    ) -> Result<Self, ClockError> {
        config.validate()?;
        let policy = config.policy()?;
        let effective = policy.effective_precision(config.precision, config.display);
        const EVENT_CHANNEL_CAPACITY: usize = 64;
        let (event_sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let state = EmitterState {
            requested: config.precision,
            display: config.display,
            effective,
            clock_base: config.clock_base,
            explicit_hands: config.hands.clone(),
            rotation: RotationEngine::new(config.rotation_unit),
            schedule: Schedule::Stopped,
            generation: 0,
            task: None,
            tick_count: 0,
            last: None,
        };
        Ok(Self {
            inner: Arc::new(EmitterInner {
                sampler: TimeSampler::new(source),
                policy,
                state: Mutex::new(state),
                subscribers: Mutex::new(Subscribers::default()),
                tick_lock: Mutex::new(()),
                event_sender,
            }),
        })
    }

    /// A default-configured emitter at the given precision.
    pub fn from_precision(precision: PrecisionLevel) -> Result<Self, ClockError> {
        Self::new(&DialclockConfig {
            precision,
            ..Default::default()
        })
    }

    /// A default-configured emitter at the given interval, resolved to a
    /// preset when it matches one.
    pub fn from_interval(seconds: f64) -> Result<Self, ClockError> {
        interval_duration(seconds)?;
        let precision = PrecisionPolicy::default().precision_from_interval(seconds);
        Self::from_precision(precision)
    }

    /// Changes the display options and recomputes the effective precision.
    ///
    /// A running schedule whose interval changes is restarted at once, so the
    /// reported interval is always the one in use. Outside a runtime the
    /// running schedule picks the change up on its next tick instead.
    pub fn set_display_options(&self, options: DisplayOptions) {
        let mut state = self.inner.state.lock();
        state.display = options;
        let requested = state.requested;
        let effective = self.inner.policy.effective_precision(requested, options);
        debug!(
            "Display options now {:?}; effective precision {}.",
            options, effective
        );
        if state.schedule == Schedule::Stopped || effective == state.effective {
            state.effective = effective;
            return;
        }
        drop(state);
        if let Err(err) = self.restart(requested) {
            warn!("Could not reschedule for new display options: {}", err);
        }
    }

    pub fn set_clock_base(&self, base: ClockBase) {
        self.inner.state.lock().clock_base = base;
    }

    /// Replaces the requested hand list. `None` restores the standard set for
    /// the clock base and display options.
    pub fn set_hands(&self, hands: Option<Vec<HandSpec>>) {
        self.inner.state.lock().explicit_hands = hands;
    }

    pub fn set_rotation_unit(&self, unit: RotationUnit) {
        let mut state = self.inner.state.lock();
        state.rotation = state.rotation.with_unit(unit);
    }
}

// Scheduling.
impl TimeEmitter {
    /// Starts (or restarts) the periodic wake at `seconds`.
    ///
    /// The interval becomes the requested precision; display options may still
    /// raise the effective one. An invalid interval is rejected and the
    /// emitter is left exactly as it was.
    pub fn start(&self, seconds: f64) -> Result<(), ClockError> {
        let requested = self.precision_for(seconds)?;
        self.restart(requested)
    }

    /// Starts at the currently requested precision.
    pub fn resume(&self) -> Result<(), ClockError> {
        let requested = self.inner.state.lock().requested;
        self.restart(requested)
    }

    /// Changes the interval. A running emitter restarts its wake at the new
    /// interval, keeping its observers; a stopped one only records it.
    pub fn set_interval(&self, seconds: f64) -> Result<(), ClockError> {
        let requested = self.precision_for(seconds)?;
        self.apply_precision(requested)
    }

    /// Like `set_interval`, keeping the given level as the requested precision.
    pub fn set_precision(&self, precision: PrecisionLevel) -> Result<(), ClockError> {
        precision.duration()?;
        self.apply_precision(precision)
    }

    /// Cancels the periodic wake. Observers stay registered. Stopping a
    /// stopped emitter does nothing.
    pub fn stop(&self) {
        let mut state = self.inner.state.lock();
        if state.schedule == Schedule::Stopped {
            return;
        }
        state.schedule = Schedule::Stopped;
        if let Some(task) = state.task.take() {
            task.abort();
        }
        drop(state);
        info!("TimeEmitter stopped.");
        self.inner.event_sender.send(EmitterEvent::Stopped).ok();
    }

    fn precision_for(&self, seconds: f64) -> Result<PrecisionLevel, ClockError> {
        if let Err(err) = interval_duration(seconds) {
            warn!("Rejected interval: {}", err);
            return Err(err);
        }
        Ok(self.inner.policy.precision_from_interval(seconds))
    }

    fn apply_precision(&self, requested: PrecisionLevel) -> Result<(), ClockError> {
        if self.is_running() {
            return self.restart(requested);
        }
        let mut state = self.inner.state.lock();
        state.requested = requested;
        state.effective = self
            .inner
            .policy
            .effective_precision(requested, state.display);
        Ok(())
    }

    fn restart(&self, requested: PrecisionLevel) -> Result<(), ClockError> {
        let runtime = Handle::try_current().map_err(|_| ClockError::NoRuntime)?;
        let mut state = self.inner.state.lock();
        let effective = self
            .inner
            .policy
            .effective_precision(requested, state.display);
        let interval = effective.duration()?;

        if let Some(task) = state.task.take() {
            task.abort();
        }
        let was_running = state.schedule != Schedule::Stopped;
        let previous = state.effective;
        state.requested = requested;
        state.effective = effective;
        state.generation += 1;
        let generation = state.generation;
        state.schedule = Schedule::Running {
            generation,
            interval,
        };
        let weak = Arc::downgrade(&self.inner);
        state.task = Some(runtime.spawn(run_schedule(weak, generation, interval)));
        drop(state);

        info!(
            "TimeEmitter running at {} ({:?}, requested {}).",
            effective, interval, requested
        );
        if was_running && previous != effective {
            self.inner
                .event_sender
                .send(EmitterEvent::IntervalChanged {
                    precision: effective,
                    interval,
                })
                .ok();
        }
        self.inner
            .event_sender
            .send(EmitterEvent::Started { interval })
            .ok();
        Ok(())
    }
}

// Observers and state queries.
impl TimeEmitter {
    /// Registers an observer for every subsequent tick.
    ///
    /// The observer is not called immediately; use `last_emission` to read the
    /// most recent tick. Observers may call back into the emitter, including
    /// unsubscribing themselves.
    pub fn subscribe(
        &self,
        observer: impl Fn(&Emission) + Send + Sync + 'static,
    ) -> SubscriberId {
        let mut subscribers = self.inner.subscribers.lock();
        let id = subscribers.observers.insert(Arc::new(observer));
        subscribers.order.push(id);
        drop(subscribers);
        self.inner
            .event_sender
            .send(EmitterEvent::SubscriberAdded { id })
            .ok();
        id
    }

    /// Removes an observer.
    ///
    /// Returns `true` if the observer was found and removed; an unknown or
    /// already-removed handle is a no-op. An observer removed while a tick is
    /// publishing is not called for the rest of that tick.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.inner.subscribers.lock();
        let was_removed = subscribers.observers.remove(id).is_some();
        if was_removed {
            subscribers.order.retain(|registered| *registered != id);
        }
        drop(subscribers);
        if was_removed {
            self.inner
                .event_sender
                .send(EmitterEvent::SubscriberRemoved { id })
                .ok();
        }
        was_removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().observers.len()
    }

    /// Subscribes to the `EmitterEvent` stream.
    pub fn subscribe_events(&self) -> broadcast::Receiver<EmitterEvent> {
        self.inner.event_sender.subscribe()
    }

    /// The most recently published tick, if any.
    pub fn last_emission(&self) -> Option<Arc<Emission>> {
        self.inner.state.lock().last.clone()
    }

    pub fn is_running(&self) -> bool {
        self.inner.state.lock().schedule != Schedule::Stopped
    }

    /// The precision the host asked for.
    pub fn precision(&self) -> PrecisionLevel {
        self.inner.state.lock().requested
    }

    /// The precision actually in use after display options are applied.
    pub fn effective_precision(&self) -> PrecisionLevel {
        self.inner.state.lock().effective
    }

    /// The effective interval in seconds.
    pub fn interval(&self) -> f64 {
        self.effective_precision().interval()
    }

    pub fn display_options(&self) -> DisplayOptions {
        self.inner.state.lock().display
    }

    pub fn clock_base(&self) -> ClockBase {
        self.inner.state.lock().clock_base
    }

    /// The hands computed on each tick.
    pub fn hands(&self) -> Vec<HandSpec> {
        self.inner.state.lock().requested_hands()
    }

    /// The rotation engine currently used, for hosts that compute text or
    /// extra hands from a cached sample.
    pub fn rotation_engine(&self) -> RotationEngine {
        self.inner.state.lock().rotation.clone()
    }
}

impl PartialEq for TimeEmitter {
    fn eq(&self, other: &Self) -> bool {
        self.interval() == other.interval()
    }
}

// Intervals are validated to be finite, so equality is reflexive.
impl Eq for TimeEmitter {}

impl Hash for TimeEmitter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.interval().to_bits().hash(state);
    }
}

impl std::fmt::Debug for TimeEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("TimeEmitter")
            .field("requested", &state.requested)
            .field("effective", &state.effective)
            .field("schedule", &state.schedule)
            .finish_non_exhaustive()
    }
}

fn periodic_wake(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Drives one generation of the schedule until it is superseded, stopped, or
/// the emitter is dropped.
async fn run_schedule(emitter: Weak<EmitterInner>, generation: u64, period: Duration) {
    let mut ticker = periodic_wake(period);
    loop {
        let fired_at = ticker.tick().await;
        let Some(inner) = emitter.upgrade() else {
            break;
        };
        match inner.tick(generation, fired_at) {
            TickOutcome::Continue => {}
            TickOutcome::Reschedule(new_period) => ticker = periodic_wake(new_period),
            TickOutcome::Cancelled => break,
        }
    }
    trace!("Schedule generation {} finished.", generation);
}

impl EmitterInner {
    fn tick(&self, generation: u64, fired_at: Instant) -> TickOutcome {
        let _serial = self.tick_lock.lock();
        let prepared = panic::catch_unwind(AssertUnwindSafe(|| {
            self.prepare_tick(generation, fired_at)
        }));
        let PreparedTick {
            emission,
            observers,
            outcome,
        } = match prepared {
            Ok(Some(prepared)) => prepared,
            Ok(None) => return TickOutcome::Cancelled,
            Err(payload) => {
                let tick = self.state.lock().tick_count + 1;
                self.report_failure(tick, payload);
                return TickOutcome::Continue;
            }
        };

        trace!("Tick #{} publishing to {} observers.", emission.tick, observers.len());
        for (id, observer) in observers {
            // An earlier observer may have removed this one during the tick.
            if !self.subscribers.lock().observers.contains_key(id) {
                continue;
            }
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| observer(&emission))) {
                self.report_failure(emission.tick, payload);
            }
        }
        outcome
    }

    /// Samples and computes under the state lock. Returns `None` when this
    /// generation is no longer the active schedule.
    fn prepare_tick(&self, generation: u64, fired_at: Instant) -> Option<PreparedTick> {
        let mut state = self.state.lock();
        let running_interval = match state.schedule {
            Schedule::Running {
                generation: active,
                interval,
            } if active == generation => interval,
            _ => return None,
        };

        let sample = self.sampler.sample();
        state.effective = self.policy.effective_precision(state.requested, state.display);
        let mut outcome = TickOutcome::Continue;
        if let Ok(wanted) = state.effective.duration() {
            if wanted != running_interval {
                state.schedule = Schedule::Running {
                    generation,
                    interval: wanted,
                };
                outcome = TickOutcome::Reschedule(wanted);
                info!(
                    "Effective precision changed to {}; rescheduling at {:?}.",
                    state.effective, wanted
                );
                self.event_sender
                    .send(EmitterEvent::IntervalChanged {
                        precision: state.effective,
                        interval: wanted,
                    })
                    .ok();
            }
        }

        let hands = state.requested_hands();
        let rotations = state.rotation.snapshot(&sample, &hands);
        for hand in rotations.missing() {
            if let Err(err) = state.rotation.try_rotate(&sample, hand) {
                debug!("Hand '{}' not updated this tick: {}", hand, err);
            }
        }

        state.tick_count += 1;
        let emission = Arc::new(Emission {
            tick: state.tick_count,
            fired_at,
            sample,
            rotations,
        });
        state.last = Some(Arc::clone(&emission));
        drop(state);

        let observers = self.subscribers.lock().in_order();
        Some(PreparedTick {
            emission,
            observers,
            outcome,
        })
    }

    fn report_failure(&self, tick: u64, payload: Box<dyn Any + Send>) {
        let message = panic_message(payload.as_ref());
        error!("Tick #{} failed: {}. Continuing with the next tick.", tick, message);
        self.event_sender
            .send(EmitterEvent::TickFailed { tick, message })
            .ok();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
