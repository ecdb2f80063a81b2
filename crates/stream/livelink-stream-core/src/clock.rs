//! Logical frame clock.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::StreamError;

/// Logical time of a stream. Starts at zero and only moves forward, by exactly
/// one `frame_period` per tick, independent of how long the tick really took.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameClock {
    world_time: f64,
    frame_index: u64,
    frame_period: f64,
    /// `frame_period` as a `Duration`, checked on construction.
    period: Duration,
}

impl FrameClock {
    /// Clock with the given period in seconds.
    pub fn new(frame_period: f64) -> Result<Self, StreamError> {
        if !frame_period.is_finite() || frame_period <= 0.0 {
            return Err(StreamError::InvalidConfig(format!(
                "frame period must be a positive number of seconds, got {frame_period}"
            )));
        }
        let period = Duration::try_from_secs_f64(frame_period).map_err(|e| {
            StreamError::InvalidConfig(format!("frame period of {frame_period}s: {e}"))
        })?;
        Ok(Self {
            world_time: 0.0,
            frame_index: 0,
            frame_period,
            period,
        })
    }

    /// Clock ticking `fps` times per second.
    pub fn from_fps(fps: f64) -> Result<Self, StreamError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(StreamError::InvalidConfig(format!(
                "target fps must be positive, got {fps}"
            )));
        }
        Self::new(1.0 / fps)
    }

    #[inline]
    pub fn world_time(&self) -> f64 {
        self.world_time
    }

    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    #[inline]
    pub fn frame_period(&self) -> f64 {
        self.frame_period
    }

    pub fn period_duration(&self) -> Duration {
        self.period
    }

    /// Move to the next tick. Only the scheduler calls this.
    #[inline]
    pub(crate) fn advance(&mut self) {
        self.world_time += self.frame_period;
        self.frame_index += 1;
    }
}
