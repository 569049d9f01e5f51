//! The open set of the search: a binary heap of cell indices ordered by estimated total cost.
//!
//! Priorities are captured when a cell is pushed. A cell whose cost later improves keeps its old
//! position; there is no decrease-key.
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::cell::Cell;

#[derive(Clone, Copy, Debug)]
struct SmallestCostHolder {
    f_cost: f64,
    h_cost: f64,
    g_cost: f64,
    sequence: u64,
    index: usize,
}

impl Eq for SmallestCostHolder {}

impl PartialEq for SmallestCostHolder {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for SmallestCostHolder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SmallestCostHolder {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap pops the smallest f, then h, then g, then the oldest entry
        other
            .f_cost
            .total_cmp(&self.f_cost)
            .then_with(|| other.h_cost.total_cmp(&self.h_cost))
            .then_with(|| other.g_cost.total_cmp(&self.g_cost))
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

#[derive(Clone, Debug, Default)]
pub struct Frontier {
    heap: BinaryHeap<SmallestCostHolder>,
    pushed: u64,
}

impl Frontier {
    pub fn new() -> Frontier {
        Frontier::default()
    }

    /// Pushes the cell stored at `index` with its current costs as priority.
    pub fn push(&mut self, index: usize, cell: &Cell) {
        self.push_with_costs(index, cell.f_cost(), cell.h_cost(), cell.g_cost());
    }

    pub(crate) fn push_with_costs(&mut self, index: usize, f_cost: f64, h_cost: f64, g_cost: f64) {
        self.heap.push(SmallestCostHolder {
            f_cost,
            h_cost,
            g_cost,
            sequence: self.pushed,
            index,
        });
        self.pushed += 1;
    }

    pub fn pop(&mut self) -> Option<usize> {
        self.heap.pop().map(|holder| holder.index)
    }

    /// The index that the next [pop](Self::pop) would return.
    pub fn peek(&self) -> Option<usize> {
        self.heap.peek().map(|holder| holder.index)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
