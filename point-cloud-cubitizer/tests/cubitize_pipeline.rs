/// End-to-end cubitization tests over files and in-memory sinks
use approx::assert_abs_diff_eq;
use point_cloud_cubitizer::{
    BatchDriver, CubitizeError, CubitizerConfig, DirectorySink, GridSpec, LabeledPoint,
    MemorySink, PointAssigner, PointCloudCubitizer, Point3,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Points on a half-unit lattice so every grid division is exact.
fn random_cloud(rng: &mut ChaCha8Rng, n: usize, extent: [i32; 3]) -> Vec<LabeledPoint> {
    (0..n)
        .map(|_| {
            let position = [
                rng.gen_range(0..=extent[0] * 2) as f64 * 0.5,
                rng.gen_range(0..=extent[1] * 2) as f64 * 0.5 - 7.0,
                rng.gen_range(0..=extent[2] * 2) as f64 * 0.5 + 100.0,
            ];
            LabeledPoint::new(position, rng.gen_range(0..8) as f64)
        })
        .collect()
}

fn write_sources(dir: &Path, name: &str, points: &[LabeledPoint]) -> (PathBuf, PathBuf) {
    let points_path = dir.join(format!("{name}.xyz"));
    let labels_path = dir.join(format!("{name}.labels"));
    let xyz: String = points
        .iter()
        .map(|p| format!("{} {} {}\n", p.position[0], p.position[1], p.position[2]))
        .collect();
    let labels: String = points.iter().map(|p| format!("{}\n", p.label)).collect();
    fs::write(&points_path, xyz).unwrap();
    fs::write(&labels_path, labels).unwrap();
    (points_path, labels_path)
}

fn read_rows(path: &Path) -> Vec<Vec<f64>> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| line.split(' ').map(|v| v.parse().unwrap()).collect())
        .collect()
}

#[test]
fn test_every_assignment_is_contained() {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let config = CubitizerConfig::new([6.0, 4.0, 5.0], [0.5, 0.25, 0.0], 0);
    let cloud = random_cloud(&mut rng, 2_000, [30, 20, 12]);
    let positions: Vec<Point3> = cloud.iter().map(|p| p.position).collect();

    let (grid, bounds) = GridSpec::dimension(&positions, &config).unwrap();
    let assigner = PointAssigner::new(&grid, &bounds);

    for point in &positions {
        let mut got: Vec<usize> = assigner.candidates(point).collect();
        got.sort_unstable();
        let expected: Vec<usize> = (0..grid.total_bins)
            .filter(|&i| grid.boundary(i, &bounds).contains(point))
            .collect();
        assert_eq!(got, expected, "point {:?}", point);
    }
}

#[test]
fn test_round_trip_over_real_grid() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let config = CubitizerConfig::new([3.0; 3], [0.5; 3], 0);
    let cloud = random_cloud(&mut rng, 200, [20, 14, 9]);
    let positions: Vec<Point3> = cloud.iter().map(|p| p.position).collect();
    let (grid, _) = GridSpec::dimension(&positions, &config).unwrap();

    for i in 0..grid.total_bins {
        assert_eq!(grid.encode(grid.decode(i)), i);
    }
}

#[test]
fn test_overlap_point_appears_in_both_cubes() {
    let config = CubitizerConfig::new([10.0; 3], [0.5, 0.0, 0.0], 0);
    let cubitizer = PointCloudCubitizer::new(config).unwrap();
    let cloud = vec![
        LabeledPoint::new([0.0, 0.0, 0.0], 0.0),
        LabeledPoint::new([7.0, 0.0, 0.0], 9.0),
        LabeledPoint::new([20.0, 0.0, 0.0], 0.0),
    ];

    let binned = cubitizer.bin_points(&cloud).unwrap();
    assert_eq!(binned.grid.slide_step, [5.0, 10.0, 10.0]);

    let mut sink = MemorySink::new();
    cubitizer
        .emit(binned, 0, &mut sink, &mut ChaCha8Rng::seed_from_u64(0))
        .unwrap();

    let holders: Vec<usize> = sink
        .records
        .values()
        .filter(|r| r.points.iter().any(|p| p.label == 9.0))
        .map(|r| r.id)
        .collect();
    assert_eq!(holders, vec![0, 1]);
}

#[test]
fn test_threshold_drops_equal_and_trims_larger() {
    let config = CubitizerConfig::new([10.0; 3], [0.0; 3], 5);
    let cubitizer = PointCloudCubitizer::new(config).unwrap();

    // bin 0 gets exactly 5 points, bin 1 gets 6
    let mut cloud: Vec<LabeledPoint> = (0..5)
        .map(|i| LabeledPoint::new([i as f64, 0.0, 0.0], i as f64))
        .collect();
    cloud.extend((0..6).map(|i| LabeledPoint::new([12.0 + i as f64, 0.0, 0.0], 100.0 + i as f64)));

    let binned = cubitizer.bin_points(&cloud).unwrap();
    assert_eq!(binned.total_bins(), 2);

    let mut sink = MemorySink::new();
    let stats = cubitizer
        .emit(binned, 0, &mut sink, &mut ChaCha8Rng::seed_from_u64(11))
        .unwrap();

    assert_eq!(stats.dropped, 1);
    assert_eq!(stats.subsampled, 1);
    assert!(!sink.records.contains_key(&0));

    let kept = &sink.records[&1];
    assert_eq!(kept.points.len(), 5);
    let mut labels: Vec<f64> = kept.points.iter().map(|p| p.label).collect();
    labels.sort_by(f64::total_cmp);
    labels.dedup();
    assert_eq!(labels.len(), 5);
    assert!(labels.iter().all(|l| (100.0..106.0).contains(l)));
}

#[test]
fn test_rerun_without_subsampling_is_identical() {
    let mut rng = ChaCha8Rng::seed_from_u64(77);
    let cloud = random_cloud(&mut rng, 500, [25, 25, 25]);
    let config = CubitizerConfig::new([8.0; 3], [0.25; 3], 0).with_store_boundary(true);
    let cubitizer = PointCloudCubitizer::new(config).unwrap();

    let run = |seed: u64| {
        let binned = cubitizer.bin_points(&cloud).unwrap();
        let mut sink = MemorySink::new();
        cubitizer
            .emit(binned, 0, &mut sink, &mut ChaCha8Rng::seed_from_u64(seed))
            .unwrap();
        sink.records
    };

    assert_eq!(run(1), run(2));
}

#[test]
fn test_arity_mismatch_stops_before_binning() {
    let dir = tempfile::tempdir().unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let cloud = random_cloud(&mut rng, 10, [5, 5, 5]);
    let (points_path, labels_path) = write_sources(dir.path(), "cloud", &cloud);

    let labels = fs::read_to_string(&labels_path).unwrap();
    let nine: String = labels.lines().take(9).map(|l| format!("{l}\n")).collect();
    fs::write(&labels_path, nine).unwrap();

    let config = CubitizerConfig::new([2.0; 3], [0.0; 3], 0);
    let cubitizer = PointCloudCubitizer::new(config).unwrap();
    let result = cubitizer.bin_files(&points_path, &labels_path);
    assert!(matches!(
        result,
        Err(CubitizeError::ArityMismatch { left: 10, right: 9, .. })
    ));
}

#[test]
fn test_files_with_boundary_rows() {
    let dir = tempfile::tempdir().unwrap();
    let cloud = vec![
        LabeledPoint::new([100.0, -5.0, 2.0], 1.0),
        LabeledPoint::new([103.5, -4.0, 3.0], 2.0),
        LabeledPoint::new([115.0, 0.0, 4.0], 3.0),
    ];
    let (points_path, labels_path) = write_sources(dir.path(), "tile", &cloud);
    let out = dir.path().join("bins");

    let config = CubitizerConfig::new([10.0; 3], [0.0; 3], 0).with_store_boundary(true);
    let cubitizer = PointCloudCubitizer::new(config).unwrap();
    let binned = cubitizer.bin_files(&points_path, &labels_path).unwrap();
    let mut sink = DirectorySink::create(&out).unwrap();
    cubitizer
        .emit(binned, 40, &mut sink, &mut ChaCha8Rng::seed_from_u64(0))
        .unwrap();

    let rows = read_rows(&out.join("40.txt"));
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0], vec![100.0, -5.0, 2.0]);
    assert_eq!(rows[1], vec![110.0, 5.0, 12.0]);
    assert_abs_diff_eq!(rows[3][0], 103.5, epsilon = 1e-9);
    assert_eq!(rows[3][3], 2.0);

    let rows = read_rows(&out.join("41.txt"));
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2], vec![115.0, 0.0, 4.0, 3.0]);

    let text = fs::read_to_string(out.join("41.txt")).unwrap();
    assert!(text.starts_with("110.00000 -5.00000 2.00000\n"));
}

#[test]
fn test_batch_over_manifests_writes_summary() {
    let dir = tempfile::tempdir().unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let first = write_sources(dir.path(), "first", &random_cloud(&mut rng, 300, [12, 4, 4]));
    let second = write_sources(dir.path(), "second", &random_cloud(&mut rng, 300, [4, 4, 4]));
    let broken = (dir.path().join("gone.xyz"), dir.path().join("gone.labels"));

    let pairs = [first, broken, second];
    let point_manifest = dir.path().join("points.lst");
    let label_manifest = dir.path().join("labels.lst");
    let mut point_list = String::new();
    let mut label_list = String::new();
    for (points_path, labels_path) in &pairs {
        point_list.push_str(&format!("{}\n", points_path.display()));
        label_list.push_str(&format!("{}\n", labels_path.display()));
    }
    // trailing blank line, as manifests usually end
    point_list.push('\n');
    fs::write(&point_manifest, point_list).unwrap();
    fs::write(&label_manifest, label_list).unwrap();

    let out = dir.path().join("out");
    let config = CubitizerConfig::new([4.0; 3], [0.5; 3], 0);
    let mut driver = BatchDriver::new(PointCloudCubitizer::new(config).unwrap(), &out);
    let mut sink = DirectorySink::create(&out).unwrap();
    let summary = driver
        .run_manifests(&point_manifest, &label_manifest, &mut sink, &mut rng)
        .unwrap();

    assert_eq!(summary.clouds.len(), 3);
    assert_eq!(summary.succeeded(), 2);
    assert!(!summary.clouds[1].succeeded());

    let first_bins = summary.clouds[0].grid.as_ref().unwrap().total_bins;
    assert_eq!(summary.clouds[2].start_index, first_bins);
    let second_bins = summary.clouds[2].grid.as_ref().unwrap().total_bins;
    assert_eq!(summary.next_start_index, first_bins + second_bins);

    let written: BTreeMap<usize, ()> = fs::read_dir(&out)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter_map(|e| e.path().file_stem()?.to_str()?.parse().ok())
        .map(|id| (id, ()))
        .collect();
    assert_eq!(written.len(), summary.bins_emitted());
    assert!(written.keys().all(|&id| id < summary.next_start_index));

    let summary_path = dir.path().join("summary.json");
    summary.write(&summary_path).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&summary_path).unwrap()).unwrap();
    assert_eq!(json["clouds"][1]["status"], "failed");
    assert_eq!(json["clouds"][0]["status"], "ok");
    assert_eq!(json["config"]["overlap"][0], 0.5);
}

#[test]
fn test_nan_coordinates_never_reach_a_bin() {
    let config = CubitizerConfig::new([10.0; 3], [0.0; 3], 0);
    let cubitizer = PointCloudCubitizer::new(config).unwrap();

    let cloud = vec![
        LabeledPoint::new([0.0, 0.0, 0.0], 0.0),
        LabeledPoint::new([20.0, 20.0, 20.0], 1.0),
        LabeledPoint::new([f64::NAN, 15.0, 15.0], 2.0),
    ];
    assert!(matches!(
        cubitizer.bin_points(&cloud),
        Err(CubitizeError::Config(_))
    ));

    let dir = tempfile::tempdir().unwrap();
    let points_path = dir.path().join("nan.xyz");
    let labels_path = dir.path().join("nan.labels");
    fs::write(&points_path, "0 0 0\n20 20 20\nnan 15 15\n").unwrap();
    fs::write(&labels_path, "0\n1\n2\n").unwrap();
    assert!(matches!(
        cubitizer.bin_files(&points_path, &labels_path),
        Err(CubitizeError::Parse { line: 3, .. })
    ));
}
