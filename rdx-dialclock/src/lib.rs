//! # Dialclock
//!
//! A live clock engine for analog and digital clock faces.
//!
//! Dialclock samples wall-clock time on a configurable cadence, decomposes it
//! into calendar fields, and turns those fields into normalized rotations for
//! any set of clock hands. It is the part of a clock application with real
//! timing logic in it; drawing the face is left to whoever observes it.
//!
//! ## Core Concepts
//!
//! - **TimeSampler**: captures one instant from a `TimeSource` and decomposes it
//!   into a `TimeSample`. All fields come from that single instant.
//! - **PrecisionPolicy**: maps a `PrecisionLevel` to its sampling interval and
//!   back, and raises the interval when display options need it (a pendulum
//!   needs sub-second updates).
//! - **RotationEngine**: a pure function from a sample and a `HandSpec` to an
//!   angle, across 12-hour, 24-hour and decimal clocks.
//! - **TimeEmitter**: owns the schedule, runs sampler and engine on every tick,
//!   and publishes an `Emission` to its observers.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use dialclock::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // 1. Create an emitter from the default configuration.
//!     let emitter = TimeEmitter::new(&DialclockConfig::default())?;
//!
//!     // 2. Observe every tick.
//!     let _id = emitter.subscribe(|emission| {
//!         let minute = emission.rotations.get(HandSpec::Minute(DialBase::Standard));
//!         println!("Tick #{}: minute hand at {:?}", emission.tick, minute);
//!     });
//!
//!     // 3. Sample once per second; a pendulum display would raise this.
//!     emitter.start(PrecisionLevel::Low.interval())?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     emitter.stop();
//!     Ok(())
//! }
//! ```

pub const ENGINE_NAME: &str = "Dialclock";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Declare all the modules in the crate.
pub mod common;
pub mod config;
pub mod emitter;
pub mod error;
pub mod events;
pub mod precision;
pub mod rotation;
pub mod time;

/// A prelude module for easy importing of the most common Dialclock types.
pub mod prelude {
    pub use crate::common::{RotationUnit, SubscriberId};
    pub use crate::config::DialclockConfig;
    pub use crate::emitter::TimeEmitter;
    pub use crate::error::ClockError;
    pub use crate::events::{EmitterEvent, Emission};
    pub use crate::precision::{DisplayOptions, PrecisionLevel, PrecisionPolicy};
    pub use crate::rotation::{ClockBase, DialBase, HandSpec, RotationEngine, RotationSnapshot};
    pub use crate::time::{Period, TickTock, TimeSample, TimeSampler, TimeSource};
}
