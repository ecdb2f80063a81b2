//! Stream configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::FrameClock;
use crate::error::StreamError;
use crate::hierarchy::DEFAULT_ROOT;
use crate::scheduler::StepBudget;

/// Whether ticks are spaced out in real time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingMode {
    #[default]
    RealTime,
    /// Back-to-back ticks; logical time still advances one period per tick.
    Unpaced,
}

/// Per-stream settings. Every field has a default, so a partial JSON object
/// (or `{}`) is a valid config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub target_fps: f64,
    /// `None` streams until cancelled.
    pub step_count: Option<u64>,
    /// Log "frame N" every this many ticks.
    pub progress_interval: Option<u64>,
    /// Name of the top-level skeleton bone.
    pub root_bone: String,
    /// Per-tick produce + deliver budget in milliseconds.
    pub tick_deadline_ms: Option<f64>,
    pub pacing: PacingMode,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            target_fps: 24.0,
            step_count: None,
            progress_interval: Some(96),
            root_bone: DEFAULT_ROOT.to_string(),
            tick_deadline_ms: None,
            pacing: PacingMode::RealTime,
        }
    }
}

impl StreamConfig {
    pub fn from_json(text: &str) -> Result<Self, StreamError> {
        let cfg: StreamConfig = serde_json::from_str(text)
            .map_err(|e| StreamError::InvalidConfig(format!("config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn with_target_fps(mut self, fps: f64) -> Self {
        self.target_fps = fps;
        self
    }

    pub fn with_step_count(mut self, steps: Option<u64>) -> Self {
        self.step_count = steps;
        self
    }

    pub fn with_pacing(mut self, pacing: PacingMode) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn validate(&self) -> Result<(), StreamError> {
        if !self.target_fps.is_finite() || self.target_fps <= 0.0 {
            return Err(StreamError::InvalidConfig(format!(
                "target_fps must be positive, got {}",
                self.target_fps
            )));
        }
        // the period must also fit a Duration
        FrameClock::from_fps(self.target_fps)?;
        if self.progress_interval == Some(0) {
            return Err(StreamError::InvalidConfig(
                "progress_interval must be at least 1".into(),
            ));
        }
        if self.root_bone.is_empty() {
            return Err(StreamError::InvalidConfig("root_bone is empty".into()));
        }
        if let Some(ms) = self.tick_deadline_ms {
            if !ms.is_finite() || ms <= 0.0 {
                return Err(StreamError::InvalidConfig(format!(
                    "tick_deadline_ms must be positive, got {ms}"
                )));
            }
            Duration::try_from_secs_f64(ms / 1000.0).map_err(|e| {
                StreamError::InvalidConfig(format!("tick_deadline_ms of {ms}: {e}"))
            })?;
        }
        Ok(())
    }

    /// Seconds per tick.
    pub fn frame_period(&self) -> f64 {
        1.0 / self.target_fps
    }

    pub fn step_budget(&self) -> StepBudget {
        self.step_count.into()
    }

    /// `None` when unset or when the value does not survive [`Self::validate`].
    pub fn tick_deadline(&self) -> Option<Duration> {
        self.tick_deadline_ms
            .and_then(|ms| Duration::try_from_secs_f64(ms / 1000.0).ok())
    }
}
