/// Per-cloud pipeline: load, dimension, assign, emit.
use crate::assigner::{AssignmentStats, PointAssigner};
use crate::bin_store::BinStore;
use crate::bounds::{BoundingBox, LabeledPoint, Point3};
use crate::config::CubitizerConfig;
use crate::constants::{PROGRESS_BIN_INTERVAL, PROGRESS_POINT_INTERVAL};
use crate::error::Result;
use crate::grid::GridSpec;
use crate::loader::load_labeled_points;
use crate::output::{BinSink, EmissionStats, OutputPolicy};
use crate::progress::progress_bar;
use rand::Rng;
use std::path::Path;
use tracing::{debug, info, warn};

/// One cloud after assignment, before emission.
pub struct BinnedCloud {
    pub grid: GridSpec,
    pub bounds: BoundingBox,
    pub store: BinStore,
    pub stats: AssignmentStats,
}

impl BinnedCloud {
    pub fn total_bins(&self) -> usize {
        self.grid.total_bins
    }
}

/// Runs cubitization for clouds sharing one configuration.
pub struct PointCloudCubitizer {
    config: CubitizerConfig,
    show_progress: bool,
}

impl PointCloudCubitizer {
    /// Validates the configuration up front.
    pub fn new(config: CubitizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            show_progress: false,
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &CubitizerConfig {
        &self.config
    }

    /// Load a point/label pair and bin it.
    pub fn bin_files(&self, points_path: &Path, labels_path: &Path) -> Result<BinnedCloud> {
        info!(
            points = %points_path.display(),
            labels = %labels_path.display(),
            "Loading point cloud"
        );
        let points = load_labeled_points(points_path, labels_path)?;
        self.bin_points(&points)
    }

    /// Compute the grid for `points` and assign every point to its bins.
    pub fn bin_points(&self, points: &[LabeledPoint]) -> Result<BinnedCloud> {
        let positions: Vec<Point3> = points.iter().map(|p| p.position).collect();
        let (grid, bounds) = GridSpec::dimension(&positions, &self.config)?;
        self.log_grid(points.len(), &grid, &bounds);

        let pb = progress_bar(points.len(), "points", "Assigning points", self.show_progress);
        let assigner = PointAssigner::new(&grid, &bounds);
        let (store, stats) = assigner.assign_all(points, |i| {
            if i % PROGRESS_POINT_INTERVAL == 0 {
                pb.set_position(i as u64);
            }
        });
        pb.finish_with_message("Points assigned");

        debug!(
            assignments = stats.assignments,
            "Assigned {} points",
            stats.points
        );
        if stats.degenerate_points > 0 {
            warn!(
                dropped = stats.degenerate_points,
                "Points outside every candidate bin were excluded"
            );
        }

        Ok(BinnedCloud {
            grid,
            bounds,
            store,
            stats,
        })
    }

    /// Apply the output policy and hand every surviving bin to `sink`.
    pub fn emit<R: Rng + ?Sized>(
        &self,
        cloud: BinnedCloud,
        start_index: usize,
        sink: &mut dyn BinSink,
        rng: &mut R,
    ) -> Result<EmissionStats> {
        info!(start_index, "Writing bins");
        let total = cloud.total_bins();
        let policy = OutputPolicy::new(&cloud.grid, &cloud.bounds, &self.config, start_index);

        let pb = progress_bar(total, "bins", "Writing bins", self.show_progress);
        let stats = policy.emit_all(cloud.store, sink, rng, |i| {
            if i % PROGRESS_BIN_INTERVAL == 0 {
                pb.set_position(i as u64);
            }
        })?;
        pb.finish_with_message("Bins written");

        info!(
            emitted = stats.emitted,
            dropped = stats.dropped,
            subsampled = stats.subsampled,
            "Finished {} bins",
            total
        );
        Ok(stats)
    }

    fn log_grid(&self, num_points: usize, grid: &GridSpec, bounds: &BoundingBox) {
        info!("Total num of points: {}", num_points);
        info!(
            "Bounds: min {:?} max {:?}",
            bounds.min_xyz, bounds.max_xyz
        );
        info!(
            "Num of bins [#x, #y, #z]: {:?} ({} total)",
            grid.num_bins_per_axis, grid.total_bins
        );
        info!("Slide step: {:?}", grid.slide_step);
    }
}
