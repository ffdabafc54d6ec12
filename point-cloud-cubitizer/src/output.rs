/// Per-bin output policy and record sinks
use crate::bin_store::BinStore;
use crate::bounds::{BoundingBox, LabeledPoint};
use crate::config::CubitizerConfig;
use crate::constants::{COLUMN_SEPARATOR, OUTPUT_PRECISION, RECORD_EXTENSION};
use crate::error::{CubitizeError, Result};
use crate::grid::{BinBoundary, GridSpec};
use rand::Rng;
use rand::seq::index;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// One surviving bin, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct BinRecord {
    /// `start_index + bin index`
    pub id: usize,
    pub boundary: Option<BinBoundary>,
    pub points: Vec<LabeledPoint>,
}

impl BinRecord {
    /// Numeric rows in output order: optional corner rows, then points.
    pub fn rows(&self) -> Vec<Vec<f64>> {
        let mut rows = Vec::with_capacity(self.points.len() + 2);
        if let Some(bd) = &self.boundary {
            rows.push(bd.min_bd.to_vec());
            rows.push(bd.max_bd.to_vec());
        }
        rows.extend(self.points.iter().map(|p| p.row().to_vec()));
        rows
    }

    /// Write rows as delimited text, one row per line.
    pub fn write_text(&self, writer: &mut impl Write) -> std::io::Result<()> {
        for row in self.rows() {
            let mut first = true;
            for value in row {
                if !first {
                    write!(writer, "{COLUMN_SEPARATOR}")?;
                }
                write!(writer, "{:.*}", OUTPUT_PRECISION, value)?;
                first = false;
            }
            writeln!(writer)?;
        }
        Ok(())
    }
}

/// Destination for emitted bin records.
pub trait BinSink {
    fn emit(&mut self, record: &BinRecord) -> Result<()>;
}

/// Writes `<dir>/<id>.txt` per record.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Creates the directory if needed.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| CubitizeError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn record_path(&self, id: usize) -> PathBuf {
        self.dir.join(format!("{id}.{RECORD_EXTENSION}"))
    }
}

impl BinSink for DirectorySink {
    fn emit(&mut self, record: &BinRecord) -> Result<()> {
        let path = self.record_path(record.id);
        let file = File::create(&path).map_err(|e| CubitizeError::io(&path, e))?;
        let mut writer = BufWriter::new(file);
        record
            .write_text(&mut writer)
            .and_then(|_| writer.flush())
            .map_err(|e| CubitizeError::io(&path, e))
    }
}

/// Keeps records in memory keyed by identifier.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: BTreeMap<usize, BinRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BinSink for MemorySink {
    fn emit(&mut self, record: &BinRecord) -> Result<()> {
        self.records.insert(record.id, record.clone());
        Ok(())
    }
}

/// What happened to each bin during emission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionStats {
    pub emitted: usize,
    pub dropped: usize,
    pub subsampled: usize,
    pub points_written: usize,
}

/// Drop / keep / subsample decision per bin.
///
/// For a bin holding `c` points and a threshold `k`:
/// - `c <= k`: dropped, nothing emitted (equality drops too)
/// - `k > 0`: exactly `k` points sampled without replacement
/// - `k == 0`: every point kept as stored
///
/// Surviving bins are emitted as [`BinRecord`]s under `start_index + i`.
pub struct OutputPolicy<'a> {
    grid: &'a GridSpec,
    bounds: &'a BoundingBox,
    min_num_of_point: usize,
    store_boundary: bool,
    start_index: usize,
}

impl<'a> OutputPolicy<'a> {
    pub fn new(
        grid: &'a GridSpec,
        bounds: &'a BoundingBox,
        config: &CubitizerConfig,
        start_index: usize,
    ) -> Self {
        Self {
            grid,
            bounds,
            min_num_of_point: config.min_num_of_point,
            store_boundary: config.store_boundary,
            start_index,
        }
    }

    /// Record for bin `index`, or `None` when the bin is dropped.
    pub fn materialize<R: Rng + ?Sized>(
        &self,
        index: usize,
        mut points: Vec<LabeledPoint>,
        rng: &mut R,
    ) -> Option<BinRecord> {
        let k = self.min_num_of_point;
        if points.len() <= k {
            return None;
        }

        if k > 0 {
            let picked = index::sample(rng, points.len(), k);
            points = picked.into_iter().map(|i| points[i]).collect();
        }

        Some(BinRecord {
            id: self.start_index + index,
            boundary: self
                .store_boundary
                .then(|| self.grid.boundary(index, self.bounds)),
            points,
        })
    }

    /// Emit every surviving bin, calling `on_bin` after each bin.
    ///
    /// Stops at the first sink failure; records already emitted stay emitted.
    pub fn emit_all<R: Rng + ?Sized>(
        &self,
        store: BinStore,
        sink: &mut dyn BinSink,
        rng: &mut R,
        mut on_bin: impl FnMut(usize),
    ) -> Result<EmissionStats> {
        let mut stats = EmissionStats::default();
        for (index, points) in store.into_bins() {
            let subsampled = self.min_num_of_point > 0 && points.len() > self.min_num_of_point;
            match self.materialize(index, points, rng) {
                Some(record) => {
                    sink.emit(&record)?;
                    stats.emitted += 1;
                    stats.points_written += record.points.len();
                    if subsampled {
                        stats.subsampled += 1;
                    }
                }
                None => stats.dropped += 1,
            }
            on_bin(index);
        }
        Ok(stats)
    }
}
