//! # Pathfinding Module
//!
//! A* shortest path over 4-directional walkability, used by the monster AI
//! to chase the player. Backed by a purpose-built binary min-heap rather
//! than `std::collections::BinaryHeap` so that equal-priority pops follow
//! insertion order, which keeps expansion deterministic and testable.

use crate::game::{Level, Position};
use std::collections::HashMap;

/// One heap entry: a cell, its f-score, and the insertion sequence number
/// used to break priority ties deterministically.
#[derive(Debug, Clone, Copy)]
struct Node {
    pos: Position,
    priority: i32,
    seq: u64,
}

impl Node {
    fn before(&self, other: &Node) -> bool {
        (self.priority, self.seq) < (other.priority, other.seq)
    }
}

/// Binary min-heap over (position, priority) pairs.
///
/// Duplicate priorities and duplicate positions are both valid; A* pushes a
/// fresh entry whenever it finds a cheaper route to a known cell.
#[derive(Debug, Default)]
pub struct MinHeap {
    nodes: Vec<Node>,
    next_seq: u64,
}

impl MinHeap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Inserts `pos` with the given priority, sifting it up past any parent
    /// with a larger priority.
    pub fn push(&mut self, pos: Position, priority: i32) {
        self.nodes.push(Node {
            pos,
            priority,
            seq: self.next_seq,
        });
        self.next_seq += 1;

        let mut idx = self.nodes.len() - 1;
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if self.nodes[idx].before(&self.nodes[parent]) {
                self.nodes.swap(idx, parent);
                idx = parent;
            } else {
                break;
            }
        }
    }

    /// Removes and returns the minimum-priority position, restoring the heap
    /// by sifting the displaced last element down toward its smaller child.
    pub fn pop(&mut self) -> Option<Position> {
        if self.nodes.is_empty() {
            return None;
        }
        let last = self.nodes.len() - 1;
        self.nodes.swap(0, last);
        let result = self.nodes.pop().map(|node| node.pos);

        let mut idx = 0;
        loop {
            let left = idx * 2 + 1;
            let right = idx * 2 + 2;
            let mut smallest = idx;
            if left < self.nodes.len() && self.nodes[left].before(&self.nodes[smallest]) {
                smallest = left;
            }
            if right < self.nodes.len() && self.nodes[right].before(&self.nodes[smallest]) {
                smallest = right;
            }
            if smallest == idx {
                break;
            }
            self.nodes.swap(idx, smallest);
            idx = smallest;
        }

        result
    }
}

/// Shortest path from `start` to `goal` under the level's walkability rules.
///
/// Returns the full path including `start` as its first element and `goal`
/// as its last, or an empty vector when the goal is unreachable.
/// `find_path(level, p, p)` is `[p]`. Uniform step cost with the Manhattan
/// heuristic keeps the result optimal for 4-way movement. All bookkeeping is
/// rebuilt per call; nothing is cached across searches.
pub fn find_path(level: &Level, start: Position, goal: Position) -> Vec<Position> {
    let mut frontier = MinHeap::new();
    let mut came_from: HashMap<Position, Position> = HashMap::new();
    let mut cost_so_far: HashMap<Position, i32> = HashMap::new();

    frontier.push(start, 0);
    came_from.insert(start, start);
    cost_so_far.insert(start, 0);

    while let Some(current) = frontier.pop() {
        if current == goal {
            let mut path = Vec::new();
            let mut cursor = current;
            while cursor != start {
                path.push(cursor);
                cursor = came_from[&cursor];
            }
            path.push(start);
            path.reverse();
            return path;
        }

        for next in current.cardinal_neighbors() {
            if !level.can_walk(next) {
                continue;
            }
            let new_cost = cost_so_far[&current] + 1;
            if cost_so_far.get(&next).map_or(true, |&cost| new_cost < cost) {
                cost_so_far.insert(next, new_cost);
                let priority = new_cost + next.manhattan_distance(goal);
                frontier.push(next, priority);
                came_from.insert(next, current);
            }
        }
    }

    Vec::new()
}
