//! Error types for the visualizer engine.

use grid_util::point::Point;
use thiserror::Error;

use crate::engine::Phase;

pub type Result<T> = std::result::Result<T, VisualizerError>;

/// Why a selected cell was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionRejection {
    /// The point lies outside the grid.
    OutOfBounds,
    /// The start cell cannot also be the end cell.
    StartAsEnd,
    /// Start and end cells cannot be turned into walls.
    StartOrEndAsWall,
    /// Cells can no longer be selected once the search has begun.
    SearchStarted,
}

/// Every error is recoverable and leaves the engine untouched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VisualizerError {
    #[error("invalid selection at ({}, {}): {reason:?}", .point.x, .point.y)]
    InvalidSelection {
        point: Point,
        reason: SelectionRejection,
    },

    /// Another step or run is still in flight on the same engine.
    #[error("engine is busy with another step")]
    EngineBusy,

    #[error("search cannot run during {phase:?}, select start and end first")]
    NotReady { phase: Phase },

    #[error("setting cannot change while a search is in progress")]
    SearchInProgress,
}

impl VisualizerError {
    pub(crate) fn selection(point: Point, reason: SelectionRejection) -> Self {
        VisualizerError::InvalidSelection { point, reason }
    }
}
