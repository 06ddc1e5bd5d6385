//! Rotation schedules for a Givens cascade.
//!
//! A schedule lists the coordinate pairs a layer rotates, in the order the
//! rotations are applied. Rotations sharing a coordinate do not commute, so
//! the order is part of the layer's definition.

use std::{fmt, ops::Deref};

/// A pair of adjacent coordinates `(low, low + 1)` rotated by one angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wire {
    pub low: usize,
    pub high: usize,
}

impl fmt::Display for Wire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.low, self.high)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WireSchedule(Vec<Wire>);

impl WireSchedule {
    /// Builds the schedule for a layer reading `dim` coordinates and keeping `size`.
    ///
    /// For every base index `i` in `1..dim` a descending run of targets
    /// `j = i, i-1, ..., max(0, i - size) + 1` is emitted, each wired to `j - 1`.
    /// Runs are concatenated in increasing `i`, which walks information towards
    /// the high end of the vector where the layer output is taken from.
    pub fn new(dim: usize, size: usize) -> Self {
        let mut wires = Vec::with_capacity(Self::expected_len(dim, size));
        for i in 1..dim {
            let stop = i.saturating_sub(size);
            for j in (stop + 1..=i).rev() {
                wires.push(Wire { low: j - 1, high: j });
            }
        }
        Self(wires)
    }

    /// Closed form of the schedule length: `sum_{i=1}^{dim-1} min(i, size)`.
    pub fn expected_len(dim: usize, size: usize) -> usize {
        if dim <= 1 {
            return 0;
        }
        let size = size.min(dim - 1);
        size * (size + 1) / 2 + size * (dim - 1 - size)
    }

    pub fn wires(&self) -> &[Wire] {
        &self.0
    }
}

impl Deref for WireSchedule {
    type Target = [Wire];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a> IntoIterator for &'a WireSchedule {
    type Item = &'a Wire;
    type IntoIter = std::slice::Iter<'a, Wire>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
