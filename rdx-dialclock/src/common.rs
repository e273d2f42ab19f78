//! Contains common, primitive types shared across the Dialclock engine.
//!
//! This module defines the handle types used to identify subscribers and the
//! rotation unit enum that every angle computation is expressed in.

use serde::Deserialize;
use slotmap::new_key_type;
use std::f64::consts::TAU;

new_key_type! {
    /// Uniquely and safely identifies a registered observer within a `TimeEmitter`.
    ///
    /// This key is returned by `TimeEmitter::subscribe`. A removed key is never
    /// handed out again, so unsubscribing with a stale handle is a harmless no-op.
    pub struct SubscriberId;
}

/// Degrees in a full rotation.
pub const FULL_CIRCLE_DEGREES: f64 = 360.0;

/// The unit a computed hand rotation is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationUnit {
    #[default]
    Degrees,
    Radians,
}

impl RotationUnit {
    /// The size of one full rotation in this unit.
    pub fn full_circle(self) -> f64 {
        match self {
            RotationUnit::Degrees => FULL_CIRCLE_DEGREES,
            RotationUnit::Radians => TAU,
        }
    }

    /// Converts an angle in degrees into this unit.
    pub fn from_degrees(self, degrees: f64) -> f64 {
        match self {
            RotationUnit::Degrees => degrees,
            RotationUnit::Radians => degrees.to_radians(),
        }
    }
}
