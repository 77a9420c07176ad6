//! Depth-attenuated relative exposure index.
//!
//! Wave exposure decays with depth. Each exposure cell is multiplied by an
//! attenuation factor derived from its own REI value and the local depth,
//! and optionally by the local slope.
//!
//! ```text
//! exposure.tif ─┐
//! bathymetry.tif├─► check_coregistered ─► mask union ─► REI·exp(−k·max(d, floor))[·slope]
//! slope.tif ────┘                                              │
//!                                                              ▼
//!                                      rei_{region}_{version}.tif (exposure profile, 1 band)
//! ```

pub mod config;
pub mod error;
pub mod formula;
pub mod pipeline;

pub use config::{AttenuationConfig, DecayModel, InvalidExposurePolicy};
pub use error::{AttenuationError, Result};
pub use formula::{attenuation_factor, decay_constant, slope_term, GRAVITY};
pub use pipeline::{
    attenuate, output_nodata, process, Attenuated, AttenuationInputs, AttenuationReport,
    BATHYMETRY_FILE, SLOPE_FILE,
};
