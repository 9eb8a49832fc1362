//! Turning shortest-path node sequences into exportable line geometry.

use crate::error::ClassifyError;
use geo_types::{Coord, LineString};

/// Clean a path for geometry export.
///
/// Non-finite coordinates are dropped and consecutive duplicates collapsed.
/// A line string is only produced when at least two distinct valid
/// coordinates remain; otherwise the path is reported as invalid so the
/// caller can count it as skipped.
pub fn sanitize_path(coords: &[Coord<f64>]) -> Result<LineString<f64>, ClassifyError> {
    let mut cleaned: Vec<Coord<f64>> = Vec::with_capacity(coords.len());
    for coord in coords {
        if !coord.x.is_finite() || !coord.y.is_finite() {
            continue;
        }
        if cleaned.last() == Some(coord) {
            continue;
        }
        cleaned.push(*coord);
    }

    if cleaned.len() < 2 {
        return Err(ClassifyError::InvalidGeometry(format!(
            "path has {} distinct valid coordinate(s), need at least 2",
            cleaned.len()
        )));
    }
    Ok(LineString::new(cleaned))
}
