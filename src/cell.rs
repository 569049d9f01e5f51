use grid_util::point::Point;
use smallvec::SmallVec;

use crate::{CARDINAL_COST, DIAGONAL_COST, N_SMALLVEC_SIZE, UNKNOWN_COST};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Classification of a cell. Exactly one applies at any time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CellKind {
    #[default]
    Empty,
    Wall,
    Start,
    End,
    Path,
    /// Discovered and waiting in the open set.
    Frontier,
    /// Expanded (closed).
    Visited,
}

impl CellKind {
    /// Character used by the text rendering of a grid.
    pub fn symbol(&self) -> char {
        match self {
            CellKind::Empty => '.',
            CellKind::Wall => '#',
            CellKind::Start => 'S',
            CellKind::End => 'E',
            CellKind::Path => '*',
            CellKind::Frontier => 'o',
            CellKind::Visited => 'x',
        }
    }
}

pub type Neighbours = SmallVec<[(usize, f64); N_SMALLVEC_SIZE]>;

/// Search bookkeeping for a single grid position. Predecessors are arena indices into the
/// owning [PathingGrid](crate::pathing_grid::PathingGrid).
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub point: Point,
    pub kind: CellKind,
    g_cost: f64,
    h_cost: f64,
    f_cost: f64,
    pub predecessor: Option<usize>,
    neighbours: Neighbours,
}

impl Cell {
    pub fn new(point: Point, width: usize, height: usize) -> Cell {
        Cell {
            point,
            kind: CellKind::Empty,
            g_cost: UNKNOWN_COST,
            h_cost: 0.0,
            f_cost: UNKNOWN_COST,
            predecessor: None,
            neighbours: neighbours_of(point, width, height),
        }
    }

    pub fn g_cost(&self) -> f64 {
        self.g_cost
    }
    pub fn h_cost(&self) -> f64 {
        self.h_cost
    }
    pub fn f_cost(&self) -> f64 {
        self.f_cost
    }

    /// Sets the cost from the start and keeps `f = g + h`.
    pub fn set_g_cost(&mut self, g_cost: f64) {
        self.g_cost = g_cost;
        self.update_f_cost();
    }

    /// Sets the heuristic as the Manhattan distance to `end` and keeps `f = g + h`.
    pub fn set_h_cost_towards(&mut self, end: Point) {
        self.h_cost = ((self.point.x - end.x).abs() + (self.point.y - end.y).abs()) as f64;
        self.update_f_cost();
    }

    fn update_f_cost(&mut self) {
        self.f_cost = self.g_cost + self.h_cost;
    }

    /// Returns all costs and the backlink to their initial values.
    pub fn clear_costs(&mut self) {
        self.g_cost = UNKNOWN_COST;
        self.h_cost = 0.0;
        self.f_cost = UNKNOWN_COST;
        self.predecessor = None;
    }

    pub fn is_wall(&self) -> bool {
        self.kind == CellKind::Wall
    }

    /// Precomputed in-bounds neighbours with their edge cost.
    pub fn neighbours(&self) -> &[(usize, f64)] {
        &self.neighbours
    }

    /// Debug overlay readout as `(g, f, h)`. Unknown costs are shown as `∞`. Empty and wall cells
    /// carry no readout.
    pub fn debug_label(&self) -> Option<(String, String, String)> {
        match self.kind {
            CellKind::Empty | CellKind::Wall => None,
            _ => Some((
                format_cost(self.g_cost),
                format_cost(self.f_cost),
                format!("{:.1}", self.h_cost),
            )),
        }
    }
}

fn format_cost(cost: f64) -> String {
    if cost < 99.0 {
        format!("{:.1}", cost)
    } else {
        "∞".to_owned()
    }
}

/// Lists the in-bounds neighbours of `point` in a fixed order: top, bottom, left, left-top,
/// left-bottom, right, right-top, right-bottom. The order decides which of several equally good
/// candidates gets discovered first.
pub fn neighbours_of(point: Point, width: usize, height: usize) -> Neighbours {
    let (w, h) = (width as i32, height as i32);
    let ix = |x: i32, y: i32| (y * w + x) as usize;
    let (x, y) = (point.x, point.y);
    let mut neighbours = Neighbours::new();
    if y > 0 {
        neighbours.push((ix(x, y - 1), CARDINAL_COST));
    }
    if y < h - 1 {
        neighbours.push((ix(x, y + 1), CARDINAL_COST));
    }
    if x > 0 {
        neighbours.push((ix(x - 1, y), CARDINAL_COST));
        if y > 0 {
            neighbours.push((ix(x - 1, y - 1), DIAGONAL_COST));
        }
        if y < h - 1 {
            neighbours.push((ix(x - 1, y + 1), DIAGONAL_COST));
        }
    }
    if x < w - 1 {
        neighbours.push((ix(x + 1, y), CARDINAL_COST));
        if y > 0 {
            neighbours.push((ix(x + 1, y - 1), DIAGONAL_COST));
        }
        if y < h - 1 {
            neighbours.push((ix(x + 1, y + 1), DIAGONAL_COST));
        }
    }
    neighbours
}
