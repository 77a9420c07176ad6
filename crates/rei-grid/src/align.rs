//! Co-registration checks.
//!
//! Layers are combined cell by cell, so every layer must share the reference
//! layer's dimensions, affine transform and spatial reference. Checked before
//! any arithmetic.

use tracing::debug;

use crate::error::{GridError, Result};
use crate::types::GeoProfile;

/// Relative tolerance for comparing affine coefficients.
pub const TRANSFORM_TOLERANCE: f64 = 1e-9;

/// Verify that `candidate` lines up with `reference`.
///
/// Dimensions must match exactly. Affine transforms must agree within
/// [`TRANSFORM_TOLERANCE`] when both are present; a layer with a transform
/// never matches one without. GeoKey directories are compared when both
/// layers carry one.
pub fn check_coregistered(
    reference: &GeoProfile,
    candidate: &GeoProfile,
    layer: &str,
) -> Result<()> {
    if reference.shape() != candidate.shape() {
        return Err(GridError::DimensionMismatch {
            layer: layer.to_string(),
            expected: reference.shape(),
            actual: candidate.shape(),
        });
    }

    match (reference.transform.affine(), candidate.transform.affine()) {
        (Some(a), Some(b)) => {
            for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
                if !approx_eq(*x, *y) {
                    return Err(GridError::Misaligned {
                        layer: layer.to_string(),
                        reason: format!(
                            "geotransform coefficient {} differs ({} vs {})",
                            i, x, y
                        ),
                    });
                }
            }
        }
        (None, None) => {}
        (Some(_), None) | (None, Some(_)) => {
            return Err(GridError::Misaligned {
                layer: layer.to_string(),
                reason: "only one layer is georeferenced".to_string(),
            });
        }
    }

    if let (Some(a), Some(b)) = (&reference.geo_keys.directory, &candidate.geo_keys.directory) {
        if a != b {
            return Err(GridError::Misaligned {
                layer: layer.to_string(),
                reason: "spatial reference (GeoKey directory) differs".to_string(),
            });
        }
    }

    debug!(layer, "Layer is co-registered with reference");
    Ok(())
}

fn approx_eq(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= TRANSFORM_TOLERANCE * scale
}
