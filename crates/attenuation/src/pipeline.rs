//! Attenuation pipeline: load, align, combine, write.

use std::fmt;
use std::path::{Path, PathBuf};

use rei_grid::{
    check_coregistered, load_layer, write_layer, GeoProfile, Grid, Layer, MaskedGrid, Nodata,
    DEFAULT_NODATA,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{AttenuationConfig, DecayModel, InvalidExposurePolicy};
use crate::error::{AttenuationError, Result};
use crate::formula::{attenuation_factor, decay_constant, is_valid_exposure, slope_term};

/// Bathymetry file expected in the raster directory.
pub const BATHYMETRY_FILE: &str = "bathymetry.tif";

/// Slope file expected in the raster directory when slope is enabled.
pub const SLOPE_FILE: &str = "slope.tif";

/// Cell counts from one attenuation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttenuationReport {
    /// Cells in the grid.
    pub total: usize,
    /// Cells masked as nodata in at least one input.
    pub masked: usize,
    /// Unmasked exposure cells outside the REI domain, written as nodata.
    pub invalid_exposure: usize,
    /// Unmasked cells with a NaN or infinite depth or slope, written as nodata.
    pub invalid_terrain: usize,
    /// Depth cells raised to the floor.
    pub depth_floored: usize,
    /// Zero slope cells replaced by 0.1.
    pub slope_corrected: usize,
}

impl AttenuationReport {
    /// Cells that received an attenuated value.
    pub fn attenuated(&self) -> usize {
        self.total - self.masked - self.invalid_exposure - self.invalid_terrain
    }
}

impl fmt::Display for AttenuationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cells: {} attenuated, {} nodata, {} invalid exposure, {} invalid terrain, {} depth floored, {} slope corrected",
            self.total,
            self.attenuated(),
            self.masked,
            self.invalid_exposure,
            self.invalid_terrain,
            self.depth_floored,
            self.slope_corrected
        )
    }
}

/// Result grid plus the report.
#[derive(Debug, Clone)]
pub struct Attenuated {
    pub grid: MaskedGrid,
    pub report: AttenuationReport,
}

/// Attenuate masked, co-registered grids.
///
/// A cell is masked in the output when it is masked in any input, when its
/// exposure value is invalid under [`InvalidExposurePolicy::Mask`], or when
/// its depth or slope is NaN or infinite.
pub fn attenuate(
    exposure: &MaskedGrid,
    depth: &MaskedGrid,
    slope: Option<&MaskedGrid>,
    config: &AttenuationConfig,
) -> Result<Attenuated> {
    config.validate().map_err(AttenuationError::InvalidConfig)?;

    let floor = config.depth_floor;
    let mut report = AttenuationReport {
        total: exposure.len(),
        ..Default::default()
    };

    // Union of input masks first, so the counts below only see live cells.
    let mut combined = exposure.zip_with(depth, |rei, _| rei)?;
    if let Some(slope) = slope {
        combined = combined.zip_with(slope, |rei, _| rei)?;
    }
    report.masked = combined.masked_count();

    let width = combined.width();
    for (idx, &rei) in combined.values().iter().enumerate() {
        if combined.is_masked(idx) || valid_for_model(rei, config.decay) {
            continue;
        }
        match config.invalid_exposure {
            InvalidExposurePolicy::Fail => {
                return Err(AttenuationError::InvalidExposure {
                    col: idx % width,
                    row: idx / width,
                    value: rei,
                })
            }
            InvalidExposurePolicy::Mask => report.invalid_exposure += 1,
        }
    }
    combined.mask_where(|rei| !valid_for_model(rei, config.decay));

    let depths = depth.values();
    let slopes = slope.map(MaskedGrid::values);
    report.invalid_terrain = combined.mask_indices_where(|idx| {
        !depths[idx].is_finite() || slopes.is_some_and(|s| !s[idx].is_finite())
    });

    for (idx, &d) in depth.values().iter().enumerate() {
        if combined.is_masked(idx) {
            continue;
        }
        if d <= floor {
            report.depth_floored += 1;
        }
        if let Some(slope) = slope {
            if slope.values()[idx] == 0.0 {
                report.slope_corrected += 1;
            }
        }
    }

    let mut result = combined.zip_with(depth, |rei, d| {
        let k = match config.decay {
            DecayModel::ExposureDerived => decay_constant(rei),
            DecayModel::Constant(k) => k,
        };
        rei * attenuation_factor(k, d, floor)
    })?;
    if let Some(slope) = slope {
        result = result.zip_with(slope, |value, s| value * slope_term(s))?;
    }

    debug!(
        total = report.total,
        masked = report.masked,
        invalid_exposure = report.invalid_exposure,
        invalid_terrain = report.invalid_terrain,
        "Attenuation applied"
    );

    Ok(Attenuated {
        grid: result,
        report,
    })
}

fn valid_for_model(rei: f64, decay: DecayModel) -> bool {
    match decay {
        DecayModel::ExposureDerived => is_valid_exposure(rei),
        DecayModel::Constant(_) => rei.is_finite(),
    }
}

/// Output sentinel: the exposure layer's, or [`DEFAULT_NODATA`].
pub fn output_nodata(exposure: Nodata) -> Nodata {
    match exposure {
        Nodata::None => Nodata::Value(DEFAULT_NODATA),
        value => value,
    }
}

/// Inputs of one attenuation run, already loaded.
#[derive(Debug, Clone)]
pub struct AttenuationInputs {
    pub exposure: Layer,
    pub depth: Layer,
    pub slope: Option<Layer>,
}

impl AttenuationInputs {
    /// Load `bathymetry.tif` (and `slope.tif` when enabled) from
    /// `raster_dir` plus the exposure raster, and check they line up.
    pub fn load(
        raster_dir: impl AsRef<Path>,
        exposure: impl AsRef<Path>,
        use_slope: bool,
    ) -> Result<Self> {
        let raster_dir = raster_dir.as_ref();

        let exposure = load_layer(exposure)?;
        let depth = load_layer(raster_dir.join(BATHYMETRY_FILE))?;
        check_coregistered(&exposure.profile, &depth.profile, &depth.name())?;

        let slope = if use_slope {
            let path = raster_dir.join(SLOPE_FILE);
            if !path.exists() {
                return Err(AttenuationError::MissingSlope(path));
            }
            let slope = load_layer(path)?;
            check_coregistered(&exposure.profile, &slope.profile, &slope.name())?;
            Some(slope)
        } else {
            None
        };

        info!(
            exposure = %exposure.path.display(),
            width = exposure.grid.width(),
            height = exposure.grid.height(),
            slope = slope.is_some(),
            "Loaded input layers"
        );

        Ok(Self {
            exposure,
            depth,
            slope,
        })
    }

    /// Run the transform and produce the output grid and profile.
    pub fn run(&self, config: &AttenuationConfig) -> Result<(Grid, GeoProfile, AttenuationReport)> {
        let exposure = self.exposure.masked();
        let depth = self.depth.masked();
        let slope = self.slope.as_ref().map(Layer::masked);

        let attenuated = attenuate(&exposure, &depth, slope.as_ref(), config)?;

        let nodata = output_nodata(self.exposure.nodata);
        let grid = attenuated.grid.filled(nodata.value_or(DEFAULT_NODATA));
        let profile = self.exposure.profile.single_band().with_nodata(nodata);
        Ok((grid, profile, attenuated.report))
    }
}

/// Load, attenuate and write in one call. Returns the output path and report.
pub fn process(
    raster_dir: impl AsRef<Path>,
    exposure: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &AttenuationConfig,
) -> Result<(PathBuf, AttenuationReport)> {
    config.validate().map_err(AttenuationError::InvalidConfig)?;

    let output = output.as_ref();
    if output.exists() && config.write_policy == rei_grid::WritePolicy::Reject {
        // Fail before doing any work.
        return Err(rei_grid::GridError::OutputExists(output.to_path_buf()).into());
    }

    let inputs = AttenuationInputs::load(raster_dir, exposure, config.use_slope)?;
    let (grid, profile, report) = inputs.run(config)?;
    write_layer(output, &grid, &profile, config.write_policy)?;

    info!(output = %output.display(), %report, "Attenuation complete");
    Ok((output.to_path_buf(), report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_approx_eq;

    fn masked(data: Vec<f64>, width: usize, height: usize, nodata: f64) -> MaskedGrid {
        MaskedGrid::from_grid(Grid::new(data, width, height).unwrap(), Nodata::Value(nodata))
    }

    #[test]
    fn test_scenario_deep_cell() {
        let exposure = masked(vec![2.0], 1, 1, -9999.0);
        let depth = masked(vec![5.0], 1, 1, -9999.0);
        let out = attenuate(&exposure, &depth, None, &AttenuationConfig::default()).unwrap();
        let value = out.grid.get(0, 0).unwrap();
        assert!(value >= 0.0 && value < 1e-300);
        assert_eq!(out.report.depth_floored, 0);
    }

    #[test]
    fn test_scenario_shallow_cell_floored() {
        let exposure = masked(vec![5.0], 1, 1, -9999.0);
        let depth = masked(vec![0.2], 1, 1, -9999.0);
        let out = attenuate(&exposure, &depth, None, &AttenuationConfig::default()).unwrap();
        let expected = 5.0 * (-decay_constant(5.0)).exp();
        assert_eq!(out.grid.get(0, 0), Some(expected));
        assert_eq!(out.report.depth_floored, 1);
    }

    #[test]
    fn test_nodata_in_any_input_masks_output() {
        let exposure = masked(vec![-9999.0, 1.0, 1.0, 1.0], 2, 2, -9999.0);
        let depth = masked(vec![3.0, -32768.0, 3.0, 3.0], 2, 2, -32768.0);
        let slope = masked(vec![1.0, 1.0, -1.0, 1.0], 2, 2, -1.0);
        let config = AttenuationConfig {
            decay: DecayModel::Constant(0.05),
            use_slope: true,
            ..Default::default()
        };

        let out = attenuate(&exposure, &depth, Some(&slope), &config).unwrap();
        assert_eq!(out.grid.mask(), &[true, true, true, false]);
        assert_eq!(out.report.masked, 3);
        assert_approx_eq!(out.grid.get(1, 1).unwrap(), (-0.05f64 * 3.0).exp(), 1e-12);
    }

    #[test]
    fn test_constant_model_matches_first_variant() {
        let exposure = masked(vec![10.0, 20.0], 2, 1, -9999.0);
        let depth = masked(vec![2.0, 4.0], 2, 1, -9999.0);
        let config = AttenuationConfig {
            decay: DecayModel::Constant(0.05),
            ..Default::default()
        };
        let out = attenuate(&exposure, &depth, None, &config).unwrap();
        assert_approx_eq!(out.grid.get(0, 0).unwrap(), 10.0 * (-0.1f64).exp(), 1e-12);
        assert_approx_eq!(out.grid.get(1, 0).unwrap(), 20.0 * (-0.2f64).exp(), 1e-12);
    }

    #[test]
    fn test_zero_slope_replaced() {
        let exposure = masked(vec![1.0, 1.0], 2, 1, -9999.0);
        let depth = masked(vec![1.0, 1.0], 2, 1, -9999.0);
        let slope = masked(vec![0.0, 2.0], 2, 1, -9999.0);
        let config = AttenuationConfig {
            decay: DecayModel::Constant(1.0),
            use_slope: true,
            ..Default::default()
        };
        let out = attenuate(&exposure, &depth, Some(&slope), &config).unwrap();
        let base = (-1.0f64).exp();
        assert_approx_eq!(out.grid.get(0, 0).unwrap(), base * 0.1, 1e-12);
        assert_approx_eq!(out.grid.get(1, 0).unwrap(), base * 2.0, 1e-12);
        assert_eq!(out.report.slope_corrected, 1);
    }

    #[test]
    fn test_invalid_exposure_masked() {
        let exposure = masked(vec![0.0, -2.0, f64::NAN, 3.0], 4, 1, -9999.0);
        let depth = masked(vec![2.0; 4], 4, 1, -9999.0);
        let out = attenuate(&exposure, &depth, None, &AttenuationConfig::default()).unwrap();
        assert_eq!(out.grid.mask(), &[true, true, true, false]);
        assert_eq!(out.report.invalid_exposure, 3);
        assert_eq!(out.report.masked, 0);
        assert_eq!(out.report.attenuated(), 1);
    }

    #[test]
    fn test_invalid_exposure_fail_policy() {
        let exposure = masked(vec![3.0, 3.0, -1.0, 3.0], 2, 2, -9999.0);
        let depth = masked(vec![2.0; 4], 2, 2, -9999.0);
        let config = AttenuationConfig {
            invalid_exposure: InvalidExposurePolicy::Fail,
            ..Default::default()
        };
        let err = attenuate(&exposure, &depth, None, &config).unwrap_err();
        assert!(matches!(
            err,
            AttenuationError::InvalidExposure { col: 0, row: 1, value } if value == -1.0
        ));
    }

    #[test]
    fn test_invalid_exposure_under_nodata_is_ignored() {
        // The invalid value sits under the depth mask, so it never counts.
        let exposure = masked(vec![-1.0, 3.0], 2, 1, -9999.0);
        let depth = masked(vec![-9999.0, 2.0], 2, 1, -9999.0);
        let config = AttenuationConfig {
            invalid_exposure: InvalidExposurePolicy::Fail,
            ..Default::default()
        };
        let out = attenuate(&exposure, &depth, None, &config).unwrap();
        assert_eq!(out.report.invalid_exposure, 0);
        assert_eq!(out.report.masked, 1);
    }

    #[test]
    fn test_shape_mismatch_is_error() {
        let exposure = masked(vec![1.0; 4], 2, 2, -9999.0);
        let depth = masked(vec![1.0; 6], 3, 2, -9999.0);
        assert!(matches!(
            attenuate(&exposure, &depth, None, &AttenuationConfig::default()),
            Err(AttenuationError::Grid(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let grid = masked(vec![1.0], 1, 1, -9999.0);
        let config = AttenuationConfig {
            depth_floor: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            attenuate(&grid, &grid, None, &config),
            Err(AttenuationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_output_nodata_default() {
        assert_eq!(output_nodata(Nodata::None), Nodata::Value(-9999.0));
        assert_eq!(output_nodata(Nodata::Value(-1.0)), Nodata::Value(-1.0));
    }

    #[test]
    fn test_report_display() {
        let report = AttenuationReport {
            total: 10,
            masked: 2,
            invalid_exposure: 1,
            invalid_terrain: 1,
            depth_floored: 3,
            slope_corrected: 0,
        };
        assert_eq!(
            report.to_string(),
            "10 cells: 6 attenuated, 2 nodata, 1 invalid exposure, 1 invalid terrain, 3 depth floored, 0 slope corrected"
        );
    }

    #[test]
    fn test_nan_depth_written_as_nodata() {
        let exposure = masked(vec![3.0, 3.0], 2, 1, -9999.0);
        let depth = masked(vec![f64::NAN, 2.0], 2, 1, -9999.0);
        let out = attenuate(&exposure, &depth, None, &AttenuationConfig::default()).unwrap();

        let filled = out.grid.filled(-9999.0);
        assert_eq!(filled.get(0, 0), Some(-9999.0));
        assert!(filled.get(1, 0).unwrap().is_finite());
        assert_eq!(out.grid.mask(), &[true, false]);
        assert_eq!(out.report.invalid_terrain, 1);
        assert_eq!(out.report.attenuated(), 1);
        assert_eq!(out.report.depth_floored, 0);
    }

    #[test]
    fn test_infinite_slope_written_as_nodata() {
        let exposure = masked(vec![3.0, 3.0, 3.0], 3, 1, -9999.0);
        let depth = masked(vec![2.0, 2.0, 2.0], 3, 1, -9999.0);
        let slope = masked(vec![f64::INFINITY, 0.0, f64::NAN], 3, 1, -1.0);
        let config = AttenuationConfig {
            use_slope: true,
            ..Default::default()
        };
        let out = attenuate(&exposure, &depth, Some(&slope), &config).unwrap();

        assert_eq!(out.grid.mask(), &[true, false, true]);
        assert_eq!(out.report.invalid_terrain, 2);
        assert_eq!(out.report.slope_corrected, 1);
        assert!(out.grid.values()[1].is_finite());
    }

    #[test]
    fn test_nan_depth_under_exposure_mask_not_counted() {
        let exposure = masked(vec![-9999.0, 3.0], 2, 1, -9999.0);
        let depth = masked(vec![f64::NAN, 2.0], 2, 1, -9999.0);
        let out = attenuate(&exposure, &depth, None, &AttenuationConfig::default()).unwrap();
        assert_eq!(out.report.masked, 1);
        assert_eq!(out.report.invalid_terrain, 0);
    }
}
