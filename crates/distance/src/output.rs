use std::path::Path;

use gdal::DriverManager;
use gdal::raster::{Buffer, RasterCreationOptions};
use tracing::debug;

use crate::{
    error::{DistanceError, Result},
    grid::GridSpec,
};

/// NoData marker of written distance rasters
pub const NODATA: f64 = -9999.0;

/// GDAL driver for an output path, chosen by extension
pub fn driver_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "asc" => Some("AAIGrid"),
        "tif" | "tiff" => Some("GTiff"),
        "img" => Some("HFA"),
        _ => None,
    }
}

/// Fail with `UnsupportedFormat` unless a driver writes `path`
pub fn check_format(path: &Path) -> Result<&'static str> {
    driver_for(path).ok_or_else(|| {
        let ext = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default();
        DistanceError::UnsupportedFormat(ext)
    })
}

/// A computed distance surface; `None` cells are NoData
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceRaster {
    pub spec: GridSpec,
    pub values: Vec<Option<f64>>,
}

impl DistanceRaster {
    pub fn valid_count(&self) -> usize {
        self.values.iter().flatten().count()
    }

    /// Smallest and largest distance over valid cells
    pub fn range(&self) -> Option<(f64, f64)> {
        self.values.iter().flatten().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Row-major values with NoData cells set to [`NODATA`]
    pub fn filled_values(&self) -> Vec<f64> {
        self.values.iter().map(|v| v.unwrap_or(NODATA)).collect()
    }

    /// Write a georeferenced Float64 raster through the driver matching
    /// the extension
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let driver_name = check_format(path)?;
        let (cols, rows) = (self.spec.cols as usize, self.spec.rows as usize);

        // AAIGrid only supports CreateCopy, so stage in memory first
        let mut staged = DriverManager::get_driver_by_name("MEM")?.create_with_band_type::<f64, _>("", cols, rows, 1)?;
        staged.set_geo_transform(&self.spec.geo_transform())?;
        {
            let mut band = staged.rasterband(1)?;
            band.set_no_data_value(Some(NODATA))?;
            let mut buffer = Buffer::new((cols, rows), self.filled_values());
            band.write((0, 0), (cols, rows), &mut buffer)?;
        }

        let driver = DriverManager::get_driver_by_name(driver_name)?;
        staged.create_copy(&driver, path, &RasterCreationOptions::new())?;
        debug!(path = %path.display(), driver = driver_name, cols, rows, "wrote distance raster");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn read_raster(path: &Path) -> (Option<GridSpec>, Vec<f64>, Option<f64>) {
    let dataset = gdal::Dataset::open(path).expect("Should open raster");
    let (cols, rows) = dataset.raster_size();
    let spec = dataset
        .geo_transform()
        .ok()
        .map(|transform| GridSpec::from_geo_transform(&transform, cols, rows).expect("Should build grid"));
    let band = dataset.rasterband(1).expect("Should have a band");
    let values = band.read_band_as::<f64>().expect("Should read band").data().to_vec();
    (spec, values, band.no_data_value())
}
