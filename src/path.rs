use grid_util::point::Point;
use itertools::Itertools;

use crate::cell::CellKind;
use crate::pathing_grid::PathingGrid;
use crate::{CARDINAL_COST, DIAGONAL_COST};

/// Walks the predecessor chain from `from` (the cell that discovered the end) back to the start,
/// marking every cell on it as [CellKind::Path]. The start keeps its own classification. Returns
/// the route ordered from start to `end`.
pub fn reconstruct(grid: &mut PathingGrid, from: usize, end: usize) -> Vec<Point> {
    let mut path = vec![grid.point_of(end)];
    let mut current = Some(from);
    let mut start = from;
    while let Some(ix) = current {
        let cell = grid.cell_at_mut(ix);
        cell.kind = CellKind::Path;
        path.push(cell.point);
        start = ix;
        current = cell.predecessor;
    }
    grid.cell_at_mut(start).kind = CellKind::Start;
    path.reverse();
    path
}

/// Cost of moving between two adjacent points.
pub fn edge_cost(p1: &Point, p2: &Point) -> f64 {
    if p1.x != p2.x && p1.y != p2.y {
        DIAGONAL_COST
    } else {
        CARDINAL_COST
    }
}

/// Sums the edge costs along `path` from its first point onwards, in the same order the search
/// accumulates them.
pub fn path_cost(path: &[Point]) -> f64 {
    path.iter()
        .tuple_windows()
        .fold(0.0, |total, (p1, p2)| total + edge_cost(p1, p2))
}
