/// Point cloud cubitizer command line entry point
use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use point_cloud_cubitizer::{
    BatchDriver, CubitizerConfig, DirectorySink, PointCloudCubitizer, RunSummary,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "point-cloud-cubitizer",
    about = "Cubitize point clouds with sliding cubes"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Hide progress bars
    #[arg(long, global = true)]
    no_progress: bool,

    /// Seed for subsampling; random when omitted
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Cubitize one point cloud
    Single {
        /// Source point cloud (x y z per line)
        #[arg(short = 'p', long = "points")]
        points: PathBuf,

        /// Source point cloud labels (one per line)
        #[arg(short = 'l', long = "labels")]
        labels: PathBuf,

        #[command(flatten)]
        grid: GridArgs,
    },
    /// Cubitize every point cloud listed in a pair of manifests
    Batch {
        /// Text file listing point cloud paths, one per line
        #[arg(short = 'p', long = "point-manifest")]
        point_manifest: PathBuf,

        /// Text file listing label paths in the same order
        #[arg(short = 'l', long = "label-manifest")]
        label_manifest: PathBuf,

        /// Write a JSON summary of the run here
        #[arg(long)]
        summary: Option<PathBuf>,

        #[command(flatten)]
        grid: GridArgs,
    },
}

#[derive(Args)]
struct GridArgs {
    /// Directory to store output
    #[arg(short = 'd', long = "output-dir")]
    output_dir: PathBuf,

    /// Cubic size x y z
    #[arg(short = 'c', long = "cubic-size", num_args = 3, value_names = ["X", "Y", "Z"], required = true)]
    cubic_size: Vec<f64>,

    /// Overlap fraction x y z, each in [0, 1)
    #[arg(short = 'o', long, num_args = 3, value_names = ["X", "Y", "Z"], required = true)]
    overlap: Vec<f64>,

    /// Discard cubes with this many points or fewer, trim larger ones to it
    #[arg(short = 'k', long = "min-points")]
    min_num_of_point: usize,

    /// Store each cube's boundary in its output's first two rows
    #[arg(short = 'b', long)]
    store_boundary: bool,

    /// Identifier of the first cube written
    #[arg(long, default_value_t = 0)]
    start_index: usize,
}

impl GridArgs {
    fn config(&self) -> anyhow::Result<CubitizerConfig> {
        let cubic_size: [f64; 3] = self
            .cubic_size
            .as_slice()
            .try_into()
            .context("cubic size needs exactly 3 values")?;
        let overlap: [f64; 3] = self
            .overlap
            .as_slice()
            .try_into()
            .context("overlap needs exactly 3 values")?;

        Ok(CubitizerConfig::new(cubic_size, overlap, self.min_num_of_point)
            .with_store_boundary(self.store_boundary))
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut rng = match cli.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let summary = match &cli.command {
        Command::Single {
            points,
            labels,
            grid,
        } => {
            let mut driver = driver(grid, !cli.no_progress)?;
            let mut sink = DirectorySink::create(&grid.output_dir)?;
            driver.run(&[(points.clone(), labels.clone())], &mut sink, &mut rng)
        }
        Command::Batch {
            point_manifest,
            label_manifest,
            summary,
            grid,
        } => {
            let mut driver = driver(grid, !cli.no_progress)?;
            let mut sink = DirectorySink::create(&grid.output_dir)?;
            let run = driver
                .run_manifests(point_manifest, label_manifest, &mut sink, &mut rng)
                .context("reading manifests")?;
            if let Some(path) = summary {
                run.write(path)?;
            }
            run
        }
    };

    report(&summary)
}

fn driver(grid: &GridArgs, show_progress: bool) -> anyhow::Result<BatchDriver> {
    let cubitizer = PointCloudCubitizer::new(grid.config()?)?.with_progress(show_progress);
    Ok(BatchDriver::new(cubitizer, &grid.output_dir).with_start_index(grid.start_index))
}

fn report(summary: &RunSummary) -> anyhow::Result<()> {
    info!(
        "Cubitized {}/{} point clouds, {} bins written, next start index {}",
        summary.succeeded(),
        summary.clouds.len(),
        summary.bins_emitted(),
        summary.next_start_index
    );
    if summary.degenerate_points() > 0 {
        warn!(
            "{} points fell outside every candidate bin",
            summary.degenerate_points()
        );
    }
    if summary.succeeded() == 0 {
        bail!("no point cloud was cubitized successfully");
    }
    Ok(())
}
