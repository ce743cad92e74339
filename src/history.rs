// Recent pointer positions for the line and image trails.
// Oldest point first; the newest point is where the cursor is now.

use std::collections::VecDeque;

use crate::types::Point;

pub struct TrailHistory {
    points: VecDeque<Point>,
    capacity: usize,
}

impl TrailHistory {
    pub fn new(capacity: usize) -> Self {
        Self { points: VecDeque::with_capacity(capacity), capacity }
    }

    /// Change the capacity. Extra points are dropped on the next push, not here.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append `point`, evicting from the front until we fit the capacity again.
    pub fn push(&mut self, point: Point) {
        self.points.push_back(point);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    /// Oldest → newest.
    pub fn contents(&self) -> impl ExactSizeIterator<Item = &Point> + DoubleEndedIterator {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
