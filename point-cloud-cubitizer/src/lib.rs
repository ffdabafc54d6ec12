/// Sliding-cube partitioning of labelled point clouds
pub mod assigner;
pub mod batch;
pub mod bin_store;
pub mod bounds;
pub mod config;
pub mod constants;
pub mod cubitizer;
pub mod error;
pub mod grid;
pub mod loader;
pub mod output;
pub mod progress;
pub mod summary;

pub use assigner::{AssignmentStats, PointAssigner};
pub use batch::BatchDriver;
pub use bin_store::BinStore;
pub use bounds::{BoundingBox, LabeledPoint, Point3};
pub use config::CubitizerConfig;
pub use cubitizer::{BinnedCloud, PointCloudCubitizer};
pub use error::{CubitizeError, Result};
pub use grid::{BinBoundary, GridSpec};
pub use output::{BinRecord, BinSink, DirectorySink, EmissionStats, MemorySink, OutputPolicy};
pub use summary::{CloudReport, CloudStatus, RunSummary};
