//! The steppable A* search and the selection phases that precede it.
//!
//! The search departs from textbook A* in two ways:
//!
//! - a cell that has been expanded is never reopened, even if a cheaper route to it turns up
//!   later;
//! - a cell already in the open set whose cost improves keeps its first queue position.
//!
//! A step that empties the open set without reaching the end reports [StepResult::NotFound]
//! itself instead of leaving that to the following step.
//!
//! The heuristic is always the Manhattan distance. With diagonal moves enabled it can
//! overestimate, so diagonal searches are not guaranteed to return a shortest path.
use fxhash::FxBuildHasher;
use grid_util::point::Point;
use indexmap::IndexSet;
use log::{debug, info, warn};

use crate::cell::{Cell, CellKind, Neighbours};
use crate::config::{GridSize, VisualizerConfig};
use crate::error::{Result, SelectionRejection, VisualizerError};
use crate::frontier::Frontier;
use crate::path::reconstruct;
use crate::pathing_grid::PathingGrid;
use crate::DIAGONAL_COST;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

type FxIndexSet<K> = IndexSet<K, FxBuildHasher>;

/// Operation phase. Progresses strictly in declaration order; `DrawingWalls` and `Searching`
/// repeat until the next phase is entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Phase {
    SelectingStart,
    SelectingEnd,
    DrawingWalls,
    Searching,
    PathFound,
    PathNotExist,
}

impl Phase {
    /// Header text shown above the grid.
    pub fn header(&self) -> &'static str {
        match self {
            Phase::SelectingStart => "Select start position",
            Phase::SelectingEnd => "Select end position",
            Phase::DrawingWalls => "Draw walls",
            Phase::Searching => "Searching",
            Phase::PathFound => "Path found",
            Phase::PathNotExist => "Path does not exist",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::PathFound | Phase::PathNotExist)
    }
}

/// Outcome of a single expansion step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepResult {
    Continue,
    Found,
    /// The open set ran dry. This is a valid outcome, not an error.
    NotFound,
}

impl StepResult {
    pub fn is_terminal(&self) -> bool {
        *self != StepResult::Continue
    }
}

/// A grid together with one search session over it.
#[derive(Clone, Debug)]
pub struct SearchEngine {
    config: VisualizerConfig,
    grid: PathingGrid,
    frontier: Frontier,
    closed: FxIndexSet<usize>,
    visited: FxIndexSet<usize>,
    phase: Phase,
    start: Option<usize>,
    end: Option<usize>,
    path: Option<Vec<Point>>,
    steps: usize,
    generation: u64,
}

impl Default for SearchEngine {
    fn default() -> SearchEngine {
        SearchEngine::new(VisualizerConfig::default())
    }
}

impl SearchEngine {
    pub fn new(config: VisualizerConfig) -> SearchEngine {
        let mut grid = PathingGrid::from_size(config.grid_size);
        grid.allow_diagonal_move = config.allow_diagonal;
        info!(
            "Created {}x{} grid (diagonal moves: {})",
            grid.width(),
            grid.height(),
            config.allow_diagonal
        );
        SearchEngine {
            config,
            grid,
            frontier: Frontier::new(),
            closed: FxIndexSet::default(),
            visited: FxIndexSet::default(),
            phase: Phase::SelectingStart,
            start: None,
            end: None,
            path: None,
            steps: 0,
            generation: 0,
        }
    }

    /// Discards the grid and the whole session, rebuilding both from the current
    /// configuration. Valid in every phase, including halfway through a search.
    pub fn reset(&mut self) {
        let generation = self.generation.wrapping_add(1);
        *self = SearchEngine::new(self.config.clone());
        self.generation = generation;
        info!("Grid reset");
    }

    /// Switches to a different grid size. Like [reset](Self::reset), this rebuilds everything.
    pub fn resize(&mut self, grid_size: GridSize) {
        self.config.grid_size = grid_size;
        self.reset();
    }

    pub fn set_allow_diagonal(&mut self, allow_diagonal: bool) -> Result<()> {
        if self.phase == Phase::Searching {
            return Err(VisualizerError::SearchInProgress);
        }
        self.config.allow_diagonal = allow_diagonal;
        self.grid.allow_diagonal_move = allow_diagonal;
        self.grid.components_dirty = true;
        Ok(())
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.config.speed = speed;
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.config.debug = debug;
    }

    /// Routes a user-selected point to the active phase: start selection, end selection or wall
    /// drawing. Rejected selections leave the engine unchanged.
    pub fn select_cell(&mut self, point: Point) -> Result<()> {
        let Some(ix) = self.grid.index_of(point) else {
            return Err(reject(point, SelectionRejection::OutOfBounds));
        };
        match self.phase {
            Phase::SelectingStart => {
                let cell = self.grid.cell_at_mut(ix);
                cell.kind = CellKind::Start;
                cell.set_g_cost(0.0);
                self.frontier.push(ix, cell);
                self.visited.insert(ix);
                self.start = Some(ix);
                self.enter(Phase::SelectingEnd);
            }
            Phase::SelectingEnd => {
                if self.start == Some(ix) {
                    return Err(reject(point, SelectionRejection::StartAsEnd));
                }
                self.grid.cell_at_mut(ix).kind = CellKind::End;
                self.grid.compute_heuristics(point);
                self.end = Some(ix);
                self.enter(Phase::DrawingWalls);
            }
            Phase::DrawingWalls => {
                if self.start == Some(ix) || self.end == Some(ix) {
                    return Err(reject(point, SelectionRejection::StartOrEndAsWall));
                }
                self.grid.set_wall(point)?;
            }
            Phase::Searching | Phase::PathFound | Phase::PathNotExist => {
                return Err(reject(point, SelectionRejection::SearchStarted));
            }
        }
        Ok(())
    }

    /// Performs exactly one pop-and-expand cycle. The first call after wall drawing starts the
    /// search; calls after the search ended repeat its outcome without changing anything.
    pub fn step(&mut self) -> Result<StepResult> {
        match self.phase {
            Phase::SelectingStart | Phase::SelectingEnd => {
                return Err(VisualizerError::NotReady { phase: self.phase })
            }
            Phase::DrawingWalls => self.enter(Phase::Searching),
            Phase::Searching => {}
            Phase::PathFound => return Ok(StepResult::Found),
            Phase::PathNotExist => return Ok(StepResult::NotFound),
        }

        let Some(current) = self.frontier.pop() else {
            return Ok(self.exhausted());
        };
        self.steps += 1;

        let cell = self.grid.cell_at_mut(current);
        cell.kind = CellKind::Visited;
        let current_g = cell.g_cost();
        let neighbours = cell.neighbours().iter().copied().collect::<Neighbours>();
        self.closed.insert(current);
        debug!(
            "Step {}: expanding {:?} (g {}, f {})",
            self.steps,
            self.grid.point_of(current),
            current_g,
            self.grid.cell_at(current).f_cost()
        );

        for (n, edge_cost) in neighbours {
            if edge_cost == DIAGONAL_COST && !self.grid.allow_diagonal_move {
                continue;
            }
            if self.closed.contains(&n) {
                continue;
            }
            let neighbour = self.grid.cell_at_mut(n);
            if neighbour.is_wall() {
                continue;
            }
            if self.end == Some(n) {
                neighbour.set_g_cost(current_g + edge_cost);
                neighbour.predecessor = Some(current);
                let path = reconstruct(&mut self.grid, current, n);
                info!(
                    "Path of {} cells found after {} steps, cost {}",
                    path.len(),
                    self.steps,
                    self.grid.cell_at(n).g_cost()
                );
                self.path = Some(path);
                self.restore_start();
                self.enter(Phase::PathFound);
                return Ok(StepResult::Found);
            }
            let candidate = current_g + edge_cost;
            if candidate < neighbour.g_cost() {
                neighbour.set_g_cost(candidate);
                neighbour.predecessor = Some(current);
                if self.visited.insert(n) {
                    neighbour.kind = CellKind::Frontier;
                    self.frontier.push(n, neighbour);
                }
            }
        }
        // Nothing left to expand, the next step could only report failure
        if self.frontier.is_empty() {
            return Ok(self.exhausted());
        }
        Ok(StepResult::Continue)
    }

    /// Steps until the search ends.
    pub fn run(&mut self) -> Result<StepResult> {
        loop {
            let result = self.step()?;
            if result.is_terminal() {
                return Ok(result);
            }
        }
    }

    fn exhausted(&mut self) -> StepResult {
        self.restore_start();
        self.enter(Phase::PathNotExist);
        info!("No path exists after {} steps", self.steps);
        StepResult::NotFound
    }

    fn enter(&mut self, phase: Phase) {
        info!("{:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    fn restore_start(&mut self) {
        if let Some(start) = self.start {
            self.grid.cell_at_mut(start).kind = CellKind::Start;
        }
    }

    pub fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    pub fn grid(&self) -> &PathingGrid {
        &self.grid
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn cell(&self, point: Point) -> Option<&Cell> {
        self.grid.cell(point)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn header(&self) -> &'static str {
        self.phase.header()
    }

    pub fn start(&self) -> Option<Point> {
        self.start.map(|ix| self.grid.point_of(ix))
    }

    pub fn end(&self) -> Option<Point> {
        self.end.map(|ix| self.grid.point_of(ix))
    }

    /// The cell the next step would expand.
    pub fn frontier_head(&self) -> Option<Point> {
        self.frontier.peek().map(|ix| self.grid.point_of(ix))
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    /// Expanded cells in expansion order.
    pub fn closed(&self) -> impl Iterator<Item = Point> + '_ {
        self.closed.iter().map(|&ix| self.grid.point_of(ix))
    }

    pub fn is_closed(&self, point: Point) -> bool {
        self.grid
            .index_of(point)
            .is_some_and(|ix| self.closed.contains(&ix))
    }

    pub fn closed_len(&self) -> usize {
        self.closed.len()
    }

    /// Cells ever added to the open set, in discovery order.
    pub fn visited(&self) -> impl Iterator<Item = Point> + '_ {
        self.visited.iter().map(|&ix| self.grid.point_of(ix))
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    /// The route from start to end, once found.
    pub fn path(&self) -> Option<&[Point]> {
        self.path.as_deref()
    }

    /// Final cost of the end cell, once a path was found.
    pub fn path_cost(&self) -> Option<f64> {
        match (self.phase, self.end) {
            (Phase::PathFound, Some(end)) => Some(self.grid.cell_at(end).g_cost()),
            _ => None,
        }
    }

    /// Number of cells expanded so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Incremented by every reset; lets drivers notice that a session was discarded.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the end is connected to the start through non-wall cells, according to the
    /// grid's connected components. `None` until both are selected.
    ///
    /// Takes `&mut self` because components left stale by wall drawing are regenerated first.
    pub fn reachable(&mut self) -> Option<bool> {
        let (start, end) = (self.start()?, self.end()?);
        self.grid.update();
        Some(self.grid.reachable(&start, &end))
    }
}

fn reject(point: Point, reason: SelectionRejection) -> VisualizerError {
    warn!("Rejected selection of ({}, {}): {:?}", point.x, point.y, reason);
    VisualizerError::selection(point, reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(width: usize, height: usize, allow_diagonal: bool) -> SearchEngine {
        SearchEngine::new(
            VisualizerConfig::new(GridSize::Custom { width, height }).with_diagonal(allow_diagonal),
        )
    }

    #[test]
    fn selection_phases_progress() {
        let mut engine = engine(3, 3, false);
        assert_eq!(engine.header(), "Select start position");
        engine.select_cell(Point::new(0, 0)).unwrap();
        assert_eq!(engine.phase(), Phase::SelectingEnd);
        let start = engine.cell(Point::new(0, 0)).unwrap();
        assert_eq!(start.kind, CellKind::Start);
        assert_eq!(start.g_cost(), 0.0);
        assert_eq!(engine.frontier_head(), Some(Point::new(0, 0)));
        assert_eq!(engine.visited_len(), 1);

        engine.select_cell(Point::new(2, 1)).unwrap();
        assert_eq!(engine.phase(), Phase::DrawingWalls);
        assert_eq!(engine.cell(Point::new(0, 0)).unwrap().h_cost(), 3.0);
        assert_eq!(engine.cell(Point::new(0, 0)).unwrap().f_cost(), 3.0);
        assert_eq!(engine.cell(Point::new(2, 1)).unwrap().kind, CellKind::End);

        engine.select_cell(Point::new(1, 1)).unwrap();
        engine.select_cell(Point::new(1, 0)).unwrap();
        assert_eq!(engine.phase(), Phase::DrawingWalls);
        assert!(engine.cell(Point::new(1, 1)).unwrap().is_wall());
        assert!(engine.cell(Point::new(1, 0)).unwrap().is_wall());
    }

    #[test]
    fn rejected_selections_leave_state_unchanged() {
        let mut engine = engine(3, 3, false);
        let outside = Point::new(5, 0);
        assert_eq!(
            engine.select_cell(outside),
            Err(VisualizerError::InvalidSelection {
                point: outside,
                reason: SelectionRejection::OutOfBounds
            })
        );
        assert_eq!(engine.phase(), Phase::SelectingStart);

        engine.select_cell(Point::new(1, 1)).unwrap();
        assert!(engine.select_cell(Point::new(1, 1)).is_err());
        assert_eq!(engine.phase(), Phase::SelectingEnd);
        assert_eq!(engine.cell(Point::new(1, 1)).unwrap().kind, CellKind::Start);

        engine.select_cell(Point::new(2, 2)).unwrap();
        for p in [Point::new(1, 1), Point::new(2, 2)] {
            assert_eq!(
                engine.select_cell(p),
                Err(VisualizerError::InvalidSelection {
                    point: p,
                    reason: SelectionRejection::StartOrEndAsWall
                })
            );
        }
        assert_eq!(engine.cell(Point::new(1, 1)).unwrap().kind, CellKind::Start);
        assert_eq!(engine.cell(Point::new(2, 2)).unwrap().kind, CellKind::End);
    }

    #[test]
    fn step_requires_start_and_end() {
        let mut engine = engine(3, 3, false);
        assert_eq!(
            engine.step(),
            Err(VisualizerError::NotReady {
                phase: Phase::SelectingStart
            })
        );
        engine.select_cell(Point::new(0, 0)).unwrap();
        assert_eq!(
            engine.run(),
            Err(VisualizerError::NotReady {
                phase: Phase::SelectingEnd
            })
        );
    }

    #[test]
    fn first_step_expands_start() {
        let mut engine = engine(3, 3, false);
        engine.select_cell(Point::new(1, 1)).unwrap();
        engine.select_cell(Point::new(1, 0)).unwrap();
        engine.select_cell(Point::new(0, 1)).unwrap();
        // Top neighbour is the end
        assert_eq!(engine.step(), Ok(StepResult::Found));
        assert_eq!(engine.phase(), Phase::PathFound);
        assert_eq!(engine.path(), Some(&[Point::new(1, 1), Point::new(1, 0)][..]));
        assert_eq!(engine.path_cost(), Some(1.0));
        assert_eq!(engine.cell(Point::new(1, 1)).unwrap().kind, CellKind::Start);
    }

    #[test]
    fn frontier_cells_are_classified() {
        let mut engine = engine(3, 3, false);
        engine.select_cell(Point::new(0, 0)).unwrap();
        engine.select_cell(Point::new(2, 2)).unwrap();
        assert_eq!(engine.step(), Ok(StepResult::Continue));
        assert_eq!(engine.phase(), Phase::Searching);
        assert_eq!(engine.cell(Point::new(0, 0)).unwrap().kind, CellKind::Visited);
        for p in [Point::new(0, 1), Point::new(1, 0)] {
            let cell = engine.cell(p).unwrap();
            assert_eq!(cell.kind, CellKind::Frontier);
            assert_eq!(cell.g_cost(), 1.0);
            assert_eq!(cell.f_cost(), 4.0);
            assert_eq!(cell.predecessor, Some(0));
        }
        // Diagonal neighbour ignored with diagonals disabled
        assert_eq!(engine.cell(Point::new(1, 1)).unwrap().kind, CellKind::Empty);
        // Equal f and h: bottom was discovered first
        assert_eq!(engine.frontier_head(), Some(Point::new(0, 1)));
        assert_eq!(engine.visited_len(), 3);
        assert_eq!(engine.closed_len(), 1);
    }

    #[test]
    fn terminal_phase_repeats_result() {
        let mut engine = engine(2, 1, false);
        engine.select_cell(Point::new(0, 0)).unwrap();
        engine.select_cell(Point::new(1, 0)).unwrap();
        assert_eq!(engine.run(), Ok(StepResult::Found));
        let grid_before = engine.grid().to_string();
        assert_eq!(engine.step(), Ok(StepResult::Found));
        assert_eq!(engine.steps(), 1);
        assert_eq!(engine.grid().to_string(), grid_before);
        assert!(engine.select_cell(Point::new(1, 0)).is_err());
    }

    #[test]
    fn diagonal_toggle_rejected_while_searching() {
        let mut engine = engine(4, 4, false);
        engine.set_allow_diagonal(true).unwrap();
        assert!(engine.grid().allow_diagonal_move);
        engine.select_cell(Point::new(0, 0)).unwrap();
        engine.select_cell(Point::new(3, 3)).unwrap();
        engine.step().unwrap();
        assert_eq!(
            engine.set_allow_diagonal(false),
            Err(VisualizerError::SearchInProgress)
        );
        assert!(engine.config().allow_diagonal);
    }

    #[test]
    fn reset_mid_search_discards_session() {
        let mut engine = engine(5, 5, false);
        engine.select_cell(Point::new(0, 0)).unwrap();
        engine.select_cell(Point::new(4, 4)).unwrap();
        engine.select_cell(Point::new(2, 2)).unwrap();
        engine.step().unwrap();
        engine.step().unwrap();
        engine.reset();
        assert_eq!(engine.phase(), Phase::SelectingStart);
        assert_eq!(engine.closed_len(), 0);
        assert_eq!(engine.visited_len(), 0);
        assert_eq!(engine.frontier_head(), None);
        assert_eq!(engine.start(), None);
        assert_eq!(engine.generation(), 1);
        assert!(engine.grid().cells().all(|c| c.kind == CellKind::Empty));
    }

    #[test]
    fn resize_rebuilds_grid() {
        let mut engine = engine(5, 5, false);
        engine.resize(GridSize::Medium);
        assert_eq!((engine.width(), engine.height()), (25, 25));
        assert_eq!(engine.phase(), Phase::SelectingStart);
    }

    #[test]
    fn reachable_uses_components() {
        let mut engine = engine(3, 3, false);
        assert_eq!(engine.reachable(), None);
        engine.select_cell(Point::new(0, 0)).unwrap();
        engine.select_cell(Point::new(2, 2)).unwrap();
        assert_eq!(engine.reachable(), Some(true));
        engine.select_cell(Point::new(1, 0)).unwrap();
        engine.select_cell(Point::new(0, 1)).unwrap();
        assert!(engine.grid().components_dirty);
        assert_eq!(engine.reachable(), Some(false));
        assert!(!engine.grid().components_dirty);
    }
}
