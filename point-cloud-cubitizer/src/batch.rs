/// Sequential driver over manifests of point/label sources
use crate::config::CubitizerConfig;
use crate::cubitizer::PointCloudCubitizer;
use crate::error::Result;
use crate::loader::load_manifest_pairs;
use crate::output::BinSink;
use crate::summary::{CloudReport, CloudStatus, RunSummary};
use rand::Rng;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Runs a [`PointCloudCubitizer`] over many clouds.
///
/// Every cloud whose grid was computed advances the running start index by
/// its `total_bins`, even when some of its bins were dropped or its emission
/// failed part way. A cloud that fails is reported and the driver moves on.
pub struct BatchDriver {
    cubitizer: PointCloudCubitizer,
    output_dir: PathBuf,
    start_index: usize,
}

impl BatchDriver {
    pub fn new(cubitizer: PointCloudCubitizer, output_dir: &Path) -> Self {
        Self {
            cubitizer,
            output_dir: output_dir.to_path_buf(),
            start_index: 0,
        }
    }

    /// First identifier used by the next cloud.
    pub fn with_start_index(mut self, start_index: usize) -> Self {
        self.start_index = start_index;
        self
    }

    pub fn config(&self) -> &CubitizerConfig {
        self.cubitizer.config()
    }

    /// Read both manifests and process every pair.
    pub fn run_manifests<R: Rng + ?Sized>(
        &mut self,
        point_manifest: &Path,
        label_manifest: &Path,
        sink: &mut dyn BinSink,
        rng: &mut R,
    ) -> Result<RunSummary> {
        let pairs = load_manifest_pairs(point_manifest, label_manifest)?;
        info!("Manifest lists {} point clouds", pairs.len());
        Ok(self.run(&pairs, sink, rng))
    }

    /// Process pairs in order. Never fails as a whole.
    pub fn run<R: Rng + ?Sized>(
        &mut self,
        pairs: &[(PathBuf, PathBuf)],
        sink: &mut dyn BinSink,
        rng: &mut R,
    ) -> RunSummary {
        let mut clouds = Vec::with_capacity(pairs.len());

        for (position, (points_path, labels_path)) in pairs.iter().enumerate() {
            info!(
                "Initializing file #{}: {} and its label file: {}",
                position,
                points_path.display(),
                labels_path.display()
            );
            let report = self.run_one(position, points_path, labels_path, sink, rng);
            if let Some(err) = report_error(&report) {
                error!(
                    position,
                    points = %points_path.display(),
                    "Skipping point cloud: {}",
                    err
                );
            }
            clouds.push(report);
        }

        RunSummary {
            config: self.config().clone(),
            output_dir: self.output_dir.clone(),
            clouds,
            next_start_index: self.start_index,
        }
    }

    fn run_one<R: Rng + ?Sized>(
        &mut self,
        position: usize,
        points_path: &Path,
        labels_path: &Path,
        sink: &mut dyn BinSink,
        rng: &mut R,
    ) -> CloudReport {
        let mut report = CloudReport::new(position, points_path, labels_path, self.start_index);

        let cloud = match self.cubitizer.bin_files(points_path, labels_path) {
            Ok(cloud) => cloud,
            Err(err) => {
                report.fail(&err);
                return report;
            }
        };

        report.bounds = Some(cloud.bounds);
        report.grid = Some(cloud.grid.clone());
        report.assignment = Some(cloud.stats);

        let total_bins = cloud.total_bins();
        let emitted = self.cubitizer.emit(cloud, self.start_index, sink, rng);
        self.start_index += total_bins;

        match emitted {
            Ok(stats) => report.emission = Some(stats),
            Err(err) => report.fail(&err),
        }
        report
    }
}

fn report_error(report: &CloudReport) -> Option<&str> {
    match &report.status {
        CloudStatus::Failed { message } => Some(message),
        CloudStatus::Ok => None,
    }
}
