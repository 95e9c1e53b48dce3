//! Straight-line sensor trajectory.
//!
//! A sensor axis (wire, scintillator bar) is modeled as a signal moving
//! along an infinite line at a fixed speed, with a finite validity range
//! derived from the physical length. The anchor point is the measurement
//! position at the measurement time.

use crate::time_range::TimeRange;
use crate::vectors::Vec3;
use crate::{Error, Result};

#[derive(Clone, Debug)]
pub struct Line {
    p0: Vec3,
    t0: f64,
    dir: Vec3,
    speed: f64,
    length: f64,
    trange: TimeRange,
}

impl Line {
    /// Construct from the anchor point, anchor time, signal velocity and
    /// physical length. The validity range covers half the length on
    /// either side of the anchor.
    pub fn new(p0: Vec3, t0: f64, velocity: Vec3, length: f64) -> Result<Self> {
        let speed = velocity.norm();
        if !(speed.is_finite() && speed > 0.0) {
            return Err(Error::InvalidArgument("line requires a finite non-zero speed".into()));
        }
        if !(length.is_finite() && length > 0.0) {
            return Err(Error::InvalidArgument("line requires a positive length".into()));
        }
        let half = 0.5 * length / speed;
        Ok(Self {
            p0,
            t0,
            dir: velocity / speed,
            speed,
            length,
            trange: TimeRange::new(t0 - half, t0 + half),
        })
    }

    pub fn position3(&self, t: f64) -> Vec3 {
        self.p0 + self.dir * (self.speed * (t - self.t0))
    }

    pub fn direction(&self) -> Vec3 {
        self.dir
    }

    pub fn velocity(&self) -> Vec3 {
        self.dir * self.speed
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn t0(&self) -> f64 {
        self.t0
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn range(&self) -> &TimeRange {
        &self.trange
    }
}
