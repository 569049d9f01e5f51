//! Settings recognised by the visualizer. Only `grid_size` and `allow_diagonal` influence the
//! search; the delay, speed and debug values are pacing and display concerns.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Grid dimension presets offered to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GridSize {
    #[default]
    Small,
    Medium,
    Large,
    Custom { width: usize, height: usize },
}

impl GridSize {
    pub fn dimensions(&self) -> (usize, usize) {
        match *self {
            GridSize::Small => (15, 15),
            GridSize::Medium => (25, 25),
            GridSize::Large => (40, 40),
            GridSize::Custom { width, height } => (width, height),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VisualizerConfig {
    pub grid_size: GridSize,
    /// Enables the four diagonal neighbours (cost 1.4). The Manhattan heuristic overestimates
    /// with diagonals on, so found paths are no longer guaranteed to be shortest.
    pub allow_diagonal: bool,
    /// Pause between two steps when running to completion, at speed 1.0.
    pub base_delay: Duration,
    /// Speed multiplier applied to `base_delay`.
    pub speed: f32,
    /// Shows the per-cell cost readout.
    pub debug: bool,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        VisualizerConfig {
            grid_size: GridSize::default(),
            allow_diagonal: false,
            base_delay: Duration::from_millis(20),
            speed: 1.0,
            debug: false,
        }
    }
}

impl VisualizerConfig {
    pub fn new(grid_size: GridSize) -> Self {
        VisualizerConfig {
            grid_size,
            ..Default::default()
        }
    }

    pub fn with_diagonal(mut self, allow_diagonal: bool) -> Self {
        self.allow_diagonal = allow_diagonal;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Effective delay between steps. A non-positive or non-finite speed disables pacing.
    pub fn step_delay(&self) -> Duration {
        if self.speed > 0.0 && self.speed.is_finite() {
            Duration::from_nanos((self.base_delay.as_nanos() as f64 / self.speed as f64) as u64)
        } else {
            Duration::ZERO
        }
    }
}
