/// JSON run summary listing every cloud processed in a run.
use crate::assigner::AssignmentStats;
use crate::bounds::BoundingBox;
use crate::config::CubitizerConfig;
use crate::error::{CubitizeError, Result};
use crate::grid::GridSpec;
use crate::output::EmissionStats;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Outcome of one cloud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CloudStatus {
    Ok,
    Failed { message: String },
}

/// Everything known about one cloud after its run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudReport {
    /// 0-based position in the manifest.
    pub position: usize,
    pub points_path: PathBuf,
    pub labels_path: PathBuf,
    #[serde(flatten)]
    pub status: CloudStatus,
    /// Identifier of bin 0 of this cloud.
    pub start_index: usize,
    /// Present once the grid was computed.
    pub bounds: Option<BoundingBox>,
    pub grid: Option<GridSpec>,
    pub assignment: Option<AssignmentStats>,
    pub emission: Option<EmissionStats>,
}

impl CloudReport {
    pub fn new(position: usize, points_path: &Path, labels_path: &Path, start_index: usize) -> Self {
        Self {
            position,
            points_path: points_path.to_path_buf(),
            labels_path: labels_path.to_path_buf(),
            status: CloudStatus::Ok,
            start_index,
            bounds: None,
            grid: None,
            assignment: None,
            emission: None,
        }
    }

    pub fn fail(&mut self, err: &CubitizeError) {
        self.status = CloudStatus::Failed {
            message: err.to_string(),
        };
    }

    pub fn succeeded(&self) -> bool {
        self.status == CloudStatus::Ok
    }
}

/// Summary of a whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub config: CubitizerConfig,
    pub output_dir: PathBuf,
    pub clouds: Vec<CloudReport>,
    /// Identifier the next cloud would start at.
    pub next_start_index: usize,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.clouds.iter().filter(|c| c.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.clouds.len() - self.succeeded()
    }

    pub fn bins_emitted(&self) -> usize {
        self.clouds
            .iter()
            .filter_map(|c| c.emission.as_ref())
            .map(|e| e.emitted)
            .sum()
    }

    pub fn degenerate_points(&self) -> usize {
        self.clouds
            .iter()
            .filter_map(|c| c.assignment.as_ref())
            .map(|a| a.degenerate_points)
            .sum()
    }

    /// Write as pretty JSON.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| CubitizeError::io(path, e))?;
        info!("Generated run summary: {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_flat() {
        let mut report = CloudReport::new(2, Path::new("p.txt"), Path::new("l.txt"), 7);
        report.fail(&CubitizeError::config("point cloud is empty"));

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["message"], "configuration error: point cloud is empty");
        assert_eq!(value["position"], 2);
        assert!(value["grid"].is_null());
    }

    #[test]
    fn test_counts() {
        let ok = CloudReport::new(0, Path::new("a"), Path::new("b"), 0);
        let mut bad = CloudReport::new(1, Path::new("c"), Path::new("d"), 0);
        bad.fail(&CubitizeError::config("x"));

        let summary = RunSummary {
            config: CubitizerConfig::new([1.0; 3], [0.0; 3], 0),
            output_dir: PathBuf::from("out"),
            clouds: vec![ok, bad],
            next_start_index: 0,
        };
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.bins_emitted(), 0);
    }
}
