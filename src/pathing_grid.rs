use core::fmt;
use grid_util::point::Point;
use log::info;
use petgraph::unionfind::UnionFind;

use crate::cell::{Cell, CellKind};
use crate::config::GridSize;
use crate::error::{Result, SelectionRejection, VisualizerError};

/// [PathingGrid] owns every [Cell] of a fixed-size lattice in a flat arena indexed by
/// `y * width + x`. It also maintains connected components of the non-wall cells in a
/// [UnionFind] structure, which can answer reachability questions without searching.
#[derive(Clone, Debug)]
pub struct PathingGrid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    pub components: UnionFind<usize>,
    pub components_dirty: bool,
    pub allow_diagonal_move: bool,
}

impl Default for PathingGrid {
    fn default() -> PathingGrid {
        PathingGrid::new(0, 0)
    }
}

impl PathingGrid {
    /// Allocates `width * height` empty cells with their neighbours precomputed.
    pub fn new(width: usize, height: usize) -> PathingGrid {
        let cells = (0..height as i32)
            .flat_map(|y| (0..width as i32).map(move |x| Point::new(x, y)))
            .map(|p| Cell::new(p, width, height))
            .collect::<Vec<Cell>>();
        let mut grid = PathingGrid {
            width,
            height,
            cells,
            components: UnionFind::new(width * height),
            components_dirty: false,
            allow_diagonal_move: false,
        };
        grid.generate_components();
        grid
    }

    pub fn from_size(size: GridSize) -> PathingGrid {
        let (width, height) = size.dimensions();
        PathingGrid::new(width, height)
    }

    pub fn width(&self) -> usize {
        self.width
    }
    pub fn height(&self) -> usize {
        self.height
    }
    pub fn len(&self) -> usize {
        self.cells.len()
    }
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn in_bounds(&self, point: Point) -> bool {
        point.x >= 0
            && point.y >= 0
            && (point.x as usize) < self.width
            && (point.y as usize) < self.height
    }

    pub fn index_of(&self, point: Point) -> Option<usize> {
        if self.in_bounds(point) {
            Some(point.y as usize * self.width + point.x as usize)
        } else {
            None
        }
    }

    pub fn point_of(&self, index: usize) -> Point {
        self.cells[index].point
    }

    pub fn cell(&self, point: Point) -> Option<&Cell> {
        self.index_of(point).map(|ix| &self.cells[ix])
    }

    pub fn cell_at(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    pub(crate) fn cell_at_mut(&mut self, index: usize) -> &mut Cell {
        &mut self.cells[index]
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Turns a cell into a wall and clears its costs so it is never taken for a reachable
    /// cell. Start and end cells cannot be walled.
    pub fn set_wall(&mut self, point: Point) -> Result<()> {
        let ix = self
            .index_of(point)
            .ok_or_else(|| VisualizerError::selection(point, SelectionRejection::OutOfBounds))?;
        let cell = &mut self.cells[ix];
        if matches!(cell.kind, CellKind::Start | CellKind::End) {
            return Err(VisualizerError::selection(
                point,
                SelectionRejection::StartOrEndAsWall,
            ));
        }
        if !cell.is_wall() {
            // Blocking a cell may split a component
            self.components_dirty = true;
        }
        cell.kind = CellKind::Wall;
        cell.clear_costs();
        Ok(())
    }

    /// Sets the heuristic of every cell towards `end` in one pass.
    pub fn compute_heuristics(&mut self, end: Point) {
        for cell in self.cells.iter_mut() {
            cell.set_h_cost_towards(end);
        }
    }

    /// Checks if start and goal are on the same component.
    pub fn reachable(&self, start: &Point, goal: &Point) -> bool {
        match (self.index_of(*start), self.index_of(*goal)) {
            (Some(start_ix), Some(goal_ix)) => self.components.equiv(start_ix, goal_ix),
            _ => false,
        }
    }

    /// Regenerates the components if they are marked as dirty.
    pub fn update(&mut self) {
        if self.components_dirty {
            self.generate_components();
        }
    }

    /// Generates a new [UnionFind] structure and links up non-wall neighbours to the same
    /// components, honouring the diagonal setting.
    pub fn generate_components(&mut self) {
        info!(
            "Generating connected components for {}x{} grid",
            self.width, self.height
        );
        self.components = UnionFind::new(self.cells.len());
        self.components_dirty = false;
        for (ix, cell) in self.cells.iter().enumerate() {
            if cell.is_wall() {
                continue;
            }
            for &(n, cost) in cell.neighbours() {
                let diagonal = cost != crate::CARDINAL_COST;
                if (self.allow_diagonal_move || !diagonal) && !self.cells[n].is_wall() {
                    self.components.union(ix, n);
                }
            }
        }
    }
}

impl fmt::Display for PathingGrid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in self.cells.chunks(self.width.max(1)) {
            let line = row.iter().map(|c| c.kind.symbol()).collect::<String>();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grid_is_empty() {
        let grid = PathingGrid::new(4, 3);
        assert_eq!(grid.len(), 12);
        assert!(grid.cells().all(|c| c.kind == CellKind::Empty));
        assert_eq!(grid.index_of(Point::new(3, 2)), Some(11));
        assert_eq!(grid.point_of(5), Point::new(1, 1));
        assert_eq!(grid.index_of(Point::new(4, 0)), None);
        assert_eq!(grid.index_of(Point::new(-1, 0)), None);
    }

    #[test]
    fn wall_clears_costs() {
        let mut grid = PathingGrid::new(3, 3);
        grid.compute_heuristics(Point::new(2, 2));
        grid.set_wall(Point::new(1, 1)).unwrap();
        let cell = grid.cell(Point::new(1, 1)).unwrap();
        assert!(cell.is_wall());
        assert_eq!(cell.h_cost(), 0.0);
        assert_eq!(cell.g_cost(), crate::UNKNOWN_COST);
        // Walling twice is fine
        assert!(grid.set_wall(Point::new(1, 1)).is_ok());
    }

    #[test]
    fn wall_rejected_on_endpoints_and_outside() {
        let mut grid = PathingGrid::new(3, 3);
        grid.cell_at_mut(0).kind = CellKind::Start;
        grid.cell_at_mut(8).kind = CellKind::End;
        for (p, reason) in [
            (Point::new(0, 0), SelectionRejection::StartOrEndAsWall),
            (Point::new(2, 2), SelectionRejection::StartOrEndAsWall),
            (Point::new(3, 0), SelectionRejection::OutOfBounds),
        ] {
            assert_eq!(
                grid.set_wall(p),
                Err(VisualizerError::InvalidSelection { point: p, reason })
            );
        }
        assert_eq!(grid.cell_at(0).kind, CellKind::Start);
    }

    /// Tests whether points are correctly mapped to different connected components
    #[test]
    fn test_component_generation() {
        // Corresponds to the following 3x2 grid:
        //  ___
        // | # |
        // | # |
        //  ___
        let mut grid = PathingGrid::new(3, 2);
        grid.set_wall(Point::new(1, 0)).unwrap();
        grid.set_wall(Point::new(1, 1)).unwrap();
        assert!(grid.components_dirty);
        grid.update();
        assert!(grid.reachable(&Point::new(0, 0), &Point::new(0, 1)));
        assert!(!grid.reachable(&Point::new(0, 0), &Point::new(2, 0)));
        assert!(!grid.reachable(&Point::new(0, 0), &Point::new(1, 1)));
    }

    // Tests whether allowing diagonals has the expected effect on reachability in a minimal setting.
    #[test]
    fn test_diagonal_switch_reachable() {
        //  __
        // | #|
        // |# |
        //  __
        let mut grid = PathingGrid::new(2, 2);
        grid.set_wall(Point::new(1, 0)).unwrap();
        grid.set_wall(Point::new(0, 1)).unwrap();
        grid.generate_components();
        let start = Point::new(0, 0);
        let end = Point::new(1, 1);
        assert!(!grid.reachable(&start, &end));
        grid.allow_diagonal_move = true;
        grid.generate_components();
        assert!(grid.reachable(&start, &end));
    }

    #[test]
    fn display_renders_rows() {
        let mut grid = PathingGrid::new(3, 2);
        grid.set_wall(Point::new(1, 0)).unwrap();
        assert_eq!(grid.to_string(), ".#.\n...\n");
    }
}
