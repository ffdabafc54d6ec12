/// Point to bin assignment under overlap
use crate::bin_store::BinStore;
use crate::bounds::{BoundingBox, LabeledPoint, Point3};
use crate::grid::GridSpec;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Counters for one assignment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentStats {
    /// Points seen.
    pub points: usize,
    /// Point/bin pairs appended, counting overlap duplicates.
    pub assignments: usize,
    /// Points whose candidate range was empty on some axis. They are in no bin.
    pub degenerate_points: usize,
}

/// Maps translated points to the bins containing them.
///
/// A translated point `p` lies in bin coordinate `k` along axis `d` when
/// `k * step <= p <= k * step + size`, so the candidate range per axis is
/// `ceil((p - size) / step) ..= floor(p / step)`, with the start raised to 0
/// and the end lowered to the last bin. A point past the grid on some axis
/// gets an empty range there and lands in no bin.
pub struct PointAssigner<'a> {
    grid: &'a GridSpec,
    bounds: &'a BoundingBox,
}

impl<'a> PointAssigner<'a> {
    pub fn new(grid: &'a GridSpec, bounds: &'a BoundingBox) -> Self {
        Self { grid, bounds }
    }

    /// Per-axis candidate ranges for a world-space point. May be empty.
    pub fn axis_ranges(&self, world: &Point3) -> [RangeInclusive<i64>; 3] {
        let point = self.bounds.translate(world);
        std::array::from_fn(|d| {
            let last = self.grid.num_bins_per_axis[d] as i64 - 1;
            let step = self.grid.slide_step[d];
            let start = ((point[d] - self.grid.cubic_size[d]) / step).ceil() as i64;
            let end = (point[d] / step).floor() as i64;
            start.max(0)..=end.min(last)
        })
    }

    /// Linear indices of every bin whose cube contains `world`.
    pub fn candidates(&self, world: &Point3) -> CandidateBins<'a> {
        CandidateBins::new(self.grid, self.axis_ranges(world))
    }

    /// Append `point` to every candidate bin. Returns how many bins took it.
    pub fn assign(&self, point: &LabeledPoint, store: &mut BinStore) -> usize {
        let candidates = self.candidates(&point.position);
        let count = candidates.total();
        for index in candidates {
            store.push(index, *point);
        }
        count
    }

    /// Assign a whole cloud, calling `on_point` after each point.
    ///
    /// The store is sized exactly in a counting pass before it is filled.
    pub fn assign_all(
        &self,
        points: &[LabeledPoint],
        mut on_point: impl FnMut(usize),
    ) -> (BinStore, AssignmentStats) {
        let mut counts = vec![0usize; self.grid.total_bins];
        for point in points {
            for index in self.candidates(&point.position) {
                counts[index] += 1;
            }
        }

        let mut store = BinStore::with_capacities(&counts);
        let mut stats = AssignmentStats::default();
        for (i, point) in points.iter().enumerate() {
            let taken = self.assign(point, &mut store);
            if taken == 0 {
                stats.degenerate_points += 1;
            }
            stats.assignments += taken;
            stats.points += 1;
            on_point(i);
        }

        (store, stats)
    }
}

/// Allocation-free iterator over the cartesian product of three candidate
/// ranges, yielding linear bin indices with x varying fastest.
pub struct CandidateBins<'a> {
    grid: &'a GridSpec,
    ranges: [RangeInclusive<i64>; 3],
    next: Option<[i64; 3]>,
}

impl<'a> CandidateBins<'a> {
    fn new(grid: &'a GridSpec, ranges: [RangeInclusive<i64>; 3]) -> Self {
        let next = if ranges.iter().any(|r| r.is_empty()) {
            None
        } else {
            Some([*ranges[0].start(), *ranges[1].start(), *ranges[2].start()])
        };
        Self { grid, ranges, next }
    }

    /// Number of bins the iterator will still yield when fresh.
    pub fn total(&self) -> usize {
        self.ranges
            .iter()
            .map(|r| (r.end() - r.start() + 1).max(0) as usize)
            .product()
    }
}

impl Iterator for CandidateBins<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;

        let mut advanced = current;
        self.next = None;
        for d in 0..3 {
            if advanced[d] < *self.ranges[d].end() {
                advanced[d] += 1;
                self.next = Some(advanced);
                break;
            }
            advanced[d] = *self.ranges[d].start();
        }

        Some(self.grid.encode([
            current[0] as usize,
            current[1] as usize,
            current[2] as usize,
        ]))
    }
}
