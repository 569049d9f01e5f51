//! # astar_visualizer
//!
//! The pathfinding core of an A* visualizer. A [SearchEngine] owns a grid of cells and one search
//! session over it. The driver selects a start cell, an end cell and any number of walls through
//! [SearchEngine::select_cell], then advances the search one expansion at a time with
//! [SearchEngine::step] or all at once with [SearchEngine::run]. Every cell exposes its
//! classification and costs so a presentation layer can render each intermediate state.
//!
//! Moves along an axis cost [CARDINAL_COST], diagonal moves (when enabled) cost
//! [DIAGONAL_COST]. The heuristic is the Manhattan distance to the end cell.
//!
//! ```
//! use astar_visualizer::{GridSize, SearchEngine, StepResult, VisualizerConfig};
//! use grid_util::point::Point;
//!
//! let mut engine = SearchEngine::new(VisualizerConfig::new(GridSize::Custom { width: 5, height: 5 }));
//! engine.select_cell(Point::new(0, 0)).unwrap();
//! engine.select_cell(Point::new(4, 4)).unwrap();
//! engine.select_cell(Point::new(2, 2)).unwrap();
//! assert_eq!(engine.run().unwrap(), StepResult::Found);
//! assert_eq!(engine.path_cost(), Some(8.0));
//! ```
pub mod cell;
pub mod config;
pub mod engine;
pub mod error;
pub mod frontier;
pub mod path;
pub mod pathing_grid;
pub mod runner;

pub use cell::{Cell, CellKind};
pub use config::{GridSize, VisualizerConfig};
pub use engine::{Phase, SearchEngine, StepResult};
pub use error::{Result, SelectionRejection, VisualizerError};
pub use pathing_grid::PathingGrid;
pub use runner::{run_paced, SharedEngine};

/// Cost of a move along an axis.
pub const CARDINAL_COST: f64 = 1.0;
/// Cost of a diagonal move. A fixed approximation of √2 so results stay reproducible.
pub const DIAGONAL_COST: f64 = 1.4;
/// Stands in for an infinite cost.
pub const UNKNOWN_COST: f64 = f64::MAX;

const N_SMALLVEC_SIZE: usize = 8;
