/// Per-bin point accumulation for one cloud
use crate::bounds::LabeledPoint;

/// One ordered point sequence per linear bin index.
#[derive(Debug, Clone, Default)]
pub struct BinStore {
    bins: Vec<Vec<LabeledPoint>>,
}

impl BinStore {
    /// `total_bins` empty bins.
    #[cfg(test)]
    pub(crate) fn new(total_bins: usize) -> Self {
        Self {
            bins: vec![Vec::new(); total_bins],
        }
    }

    /// Empty bins with exact capacities from a counting pass.
    pub fn with_capacities(counts: &[usize]) -> Self {
        Self {
            bins: counts.iter().map(|&c| Vec::with_capacity(c)).collect(),
        }
    }

    /// Append a point to bin `index`.
    #[inline]
    pub fn push(&mut self, index: usize, point: LabeledPoint) {
        self.bins[index].push(point);
    }

    pub fn total_bins(&self) -> usize {
        self.bins.len()
    }

    pub fn len(&self, index: usize) -> usize {
        self.bins[index].len()
    }

    pub fn points(&self, index: usize) -> &[LabeledPoint] {
        &self.bins[index]
    }

    /// Bins in index order, consuming the store.
    pub fn into_bins(self) -> impl Iterator<Item = (usize, Vec<LabeledPoint>)> {
        self.bins.into_iter().enumerate()
    }
}
