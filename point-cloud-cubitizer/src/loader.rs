/// Whitespace-delimited text loaders for points, labels and manifests
use crate::bounds::{LabeledPoint, Point3};
use crate::constants::{COMMENT_MARKER, POINT_COLUMNS};
use crate::error::{CubitizeError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Non-blank, non-comment lines with their 1-based line numbers.
fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with(COMMENT_MARKER))
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| CubitizeError::io(path, e))
}

fn parse_value(path: &Path, line: usize, token: &str) -> Result<f64> {
    let value = token
        .parse::<f64>()
        .map_err(|e| CubitizeError::parse(path, line, format!("'{token}': {e}")))?;
    if !value.is_finite() {
        return Err(CubitizeError::parse(path, line, format!("'{token}' is not finite")));
    }
    Ok(value)
}

/// Parse point rows `x y z`.
pub fn parse_points(path: &Path, text: &str) -> Result<Vec<Point3>> {
    let mut points = Vec::new();
    for (line, content) in data_lines(text) {
        let tokens: Vec<&str> = content.split_whitespace().collect();
        if tokens.len() != POINT_COLUMNS {
            return Err(CubitizeError::parse(
                path,
                line,
                format!("expected {POINT_COLUMNS} columns, found {}", tokens.len()),
            ));
        }
        points.push([
            parse_value(path, line, tokens[0])?,
            parse_value(path, line, tokens[1])?,
            parse_value(path, line, tokens[2])?,
        ]);
    }
    Ok(points)
}

/// Parse one scalar label per row.
pub fn parse_labels(path: &Path, text: &str) -> Result<Vec<f64>> {
    let mut labels = Vec::new();
    for (line, content) in data_lines(text) {
        let mut tokens = content.split_whitespace();
        let (Some(token), None) = (tokens.next(), tokens.next()) else {
            return Err(CubitizeError::parse(path, line, "expected a single label"));
        };
        labels.push(parse_value(path, line, token)?);
    }
    Ok(labels)
}

/// Load a point source and its label source, paired by line order.
///
/// Counts are compared before anything is returned, so a mismatch never
/// reaches binning.
pub fn load_labeled_points(points_path: &Path, labels_path: &Path) -> Result<Vec<LabeledPoint>> {
    let points = parse_points(points_path, &read_text(points_path)?)?;
    let labels = parse_labels(labels_path, &read_text(labels_path)?)?;

    if points.len() != labels.len() {
        return Err(CubitizeError::ArityMismatch {
            what: "points vs labels",
            left: points.len(),
            right: labels.len(),
        });
    }

    Ok(points
        .into_iter()
        .zip(labels)
        .map(|(position, label)| LabeledPoint::new(position, label))
        .collect())
}

/// One input path per line. Blank lines are ignored.
pub fn parse_manifest(text: &str) -> Vec<PathBuf> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Pair a point manifest with a label manifest by line order.
pub fn load_manifest_pairs(
    point_manifest: &Path,
    label_manifest: &Path,
) -> Result<Vec<(PathBuf, PathBuf)>> {
    let points = parse_manifest(&read_text(point_manifest)?);
    let labels = parse_manifest(&read_text(label_manifest)?);

    if points.len() != labels.len() {
        return Err(CubitizeError::ArityMismatch {
            what: "point manifest vs label manifest",
            left: points.len(),
            right: labels.len(),
        });
    }

    Ok(points.into_iter().zip(labels).collect())
}
