//! Point tables read from CSV.
//!
//! Coordinates come from `x`/`y` columns (BC Albers metres) when present,
//! otherwise from `lon_dd`/`lat_dd`, projected to BC Albers.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use projection::transform;
use rei_common::CrsCode;
use tracing::debug;

use crate::error::{InterpolationError, Result};

/// Whether a column holds a statistic to interpolate.
pub fn is_interpolated_field(name: &str) -> bool {
    name.contains("mx_spd") || name.contains("freq")
}

/// Points with one value column per statistic.
#[derive(Debug, Clone, PartialEq)]
pub struct PointTable {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// `(column name, values)`; missing values are NaN.
    pub fields: Vec<(String, Vec<f64>)>,
}

impl PointTable {
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(BufReader::new(file));

        let headers = reader.headers()?.clone();
        let position = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

        let (coord_x, coord_y, geographic) = match (position("x"), position("y")) {
            (Some(x), Some(y)) => (x, y, false),
            _ => {
                let lon = position("lon_dd")
                    .ok_or_else(|| InterpolationError::MissingColumn("x or lon_dd".to_string()))?;
                let lat = position("lat_dd")
                    .ok_or_else(|| InterpolationError::MissingColumn("y or lat_dd".to_string()))?;
                (lon, lat, true)
            }
        };

        let field_columns: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(_, name)| is_interpolated_field(name))
            .map(|(i, name)| (i, name.to_string()))
            .collect();
        if field_columns.is_empty() {
            return Err(InterpolationError::NoFields(path.to_path_buf()));
        }

        let mut table = PointTable {
            x: Vec::new(),
            y: Vec::new(),
            fields: field_columns
                .iter()
                .map(|(_, name)| (name.clone(), Vec::new()))
                .collect(),
        };

        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let cell = |idx: usize, column: &str| -> Result<f64> {
                let raw = record.get(idx).unwrap_or("");
                parse_value(raw).ok_or_else(|| InterpolationError::InvalidValue {
                    row: row + 1,
                    column: column.to_string(),
                    value: raw.to_string(),
                })
            };

            let cx = cell(coord_x, &headers[coord_x])?;
            let cy = cell(coord_y, &headers[coord_y])?;
            let (x, y) = if geographic {
                transform(cx, cy, CrsCode::Epsg4326, CrsCode::Epsg3005)?
            } else {
                (cx, cy)
            };
            table.x.push(x);
            table.y.push(y);

            for ((idx, name), (_, values)) in field_columns.iter().zip(table.fields.iter_mut()) {
                values.push(cell(*idx, name)?);
            }
        }

        debug!(
            path = %path.display(),
            rows = table.len(),
            fields = table.fields.len(),
            geographic,
            "Loaded point table"
        );
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// `(x, y, value)` for every row where `field` has a finite value.
    pub fn points(&self, field: &str) -> Option<Vec<(f64, f64, f64)>> {
        let (_, values) = self.fields.iter().find(|(name, _)| name == field)?;
        Some(
            self.x
                .iter()
                .zip(&self.y)
                .zip(values)
                .filter(|(_, v)| v.is_finite())
                .map(|((&x, &y), &v)| (x, y, v))
                .collect(),
        )
    }
}

/// Empty cells and `nan` are missing values; anything else must parse.
fn parse_value(raw: &str) -> Option<f64> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }
    raw.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use test_utils::{assert_approx_eq, temp_test_dir};

    fn write_csv(dir: &Path, contents: &str) -> std::path::PathBuf {
        let path = dir.join("hrdps_sog.csv");
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_field_selection() {
        assert!(is_interpolated_field("mx_spd_45"));
        assert!(is_interpolated_field("freq_360"));
        assert!(!is_interpolated_field("lat_dd"));
        assert!(!is_interpolated_field("x"));
    }

    #[test]
    fn test_reads_projected_table() {
        let dir = temp_test_dir();
        let path = write_csv(
            dir.path(),
            "lat_dd,lon_dd,x,y,mx_spd_45,freq_45\n\
             48.5,-125.6,1000.0,2000.0,9.5,0.04\n\
             48.6,-125.5,1100.0,2100.0,,0.05\n",
        );
        let table = PointTable::from_csv(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.x, vec![1000.0, 1100.0]);
        assert_eq!(
            table.field_names().collect::<Vec<_>>(),
            vec!["mx_spd_45", "freq_45"]
        );
        assert_eq!(table.points("mx_spd_45").unwrap(), vec![(1000.0, 2000.0, 9.5)]);
        assert_eq!(table.points("freq_45").unwrap().len(), 2);
        assert!(table.points("freq_90").is_none());
    }

    #[test]
    fn test_projects_geographic_table() {
        let dir = temp_test_dir();
        let path = write_csv(
            dir.path(),
            "lat_dd,lon_dd,mx_spd_90\n48.598047,-125.703253,10.1\n",
        );
        let table = PointTable::from_csv(&path).unwrap();
        assert_approx_eq!(table.x[0], 1021928.428003, 1.0);
        assert_approx_eq!(table.y[0], 398050.489959, 1.0);
    }

    #[test]
    fn test_missing_coordinates() {
        let dir = temp_test_dir();
        let path = write_csv(dir.path(), "a,b,freq_45\n1,2,3\n");
        assert!(matches!(
            PointTable::from_csv(&path),
            Err(InterpolationError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_no_fields() {
        let dir = temp_test_dir();
        let path = write_csv(dir.path(), "x,y,depth\n1,2,3\n");
        assert!(matches!(
            PointTable::from_csv(&path),
            Err(InterpolationError::NoFields(_))
        ));
    }

    #[test]
    fn test_invalid_number() {
        let dir = temp_test_dir();
        let path = write_csv(dir.path(), "x,y,freq_45\n1,2,abc\n");
        let err = PointTable::from_csv(&path).unwrap_err();
        assert!(matches!(
            err,
            InterpolationError::InvalidValue { row: 1, ref column, .. } if column == "freq_45"
        ));
    }
}
