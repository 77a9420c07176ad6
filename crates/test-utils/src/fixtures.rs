//! Common fixtures for coastal REI tests.

/// Nodata sentinels seen in the regional rasters.
pub mod nodata {
    /// ArcGIS / GDAL default for spline outputs
    pub const DEFAULT: f64 = -9999.0;

    /// Lowest finite f32, used by some bathymetry products
    pub const F32_LOWEST: f64 = f32::MIN as f64;
}

/// Region bounding boxes as (min_lon, min_lat, max_lon, max_lat).
pub mod bbox {
    /// CDS request area for the whole BC coast
    pub const BC_COAST: (f64, f64, f64, f64) = (-133.4, 48.2, -122.5, 55.8);

    /// Barkley Sound subset used for wave means
    pub const BARKLEY_SOUND: (f64, f64, f64, f64) =
        (-125.828219, 48.517618, -124.561191, 49.33337);
}

/// GeoTIFF georeferencing for a small BC Albers test raster.
pub mod geo {
    /// ModelPixelScale: 20 m cells
    pub const PIXEL_SCALE: [f64; 3] = [20.0, 20.0, 0.0];

    /// ModelTiepoint: raster (0, 0) at a BC Albers corner
    pub const TIEPOINT: [f64; 6] = [0.0, 0.0, 0.0, 1_021_900.0, 398_100.0, 0.0];

    /// GeoKeyDirectory declaring a projected CRS of EPSG:3005
    pub const GEO_KEYS_3005: [u16; 16] = [
        1, 1, 0, 3, // header: version, revision, minor, key count
        1024, 0, 1, 1, // GTModelType = Projected
        1025, 0, 1, 1, // GTRasterType = PixelIsArea
        3072, 0, 1, 3005, // ProjectedCSType = EPSG:3005
    ];
}

/// Wind direction bins (degrees) used by the HRDPS products.
pub const DIRECTION_BINS: [u32; 8] = [45, 90, 135, 180, 225, 270, 315, 360];
