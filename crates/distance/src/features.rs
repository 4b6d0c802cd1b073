use std::path::Path;

use gdal::raster::{RasterizeOptions, rasterize};
use gdal::vector::{LayerAccess, ToGdal};
use gdal::{Dataset, DriverManager};
use geo_types::{Geometry, LineString};
use image::GrayImage;
use tracing::{debug, warn};

use crate::{
    error::{DistanceError, Result},
    grid::GridSpec,
};

const SOURCE: u8 = 255;

/// Read every geometry of an OGR feature class (GeoJSON, shapefile, ...)
pub fn load_features<P: AsRef<Path>>(path: P) -> Result<Vec<Geometry<f64>>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DistanceError::InputNotFound(path.to_path_buf()));
    }

    let dataset = Dataset::open(path)?;
    let features = read_geometries(&dataset)?;
    if features.is_empty() {
        return Err(DistanceError::EmptyFeatures);
    }
    debug!(path = %path.display(), count = features.len(), "loaded features");
    Ok(features)
}

/// Geometries of all layers of a vector dataset, in layer order
pub(crate) fn read_geometries(dataset: &Dataset) -> Result<Vec<Geometry<f64>>> {
    let mut geometries = Vec::new();
    for mut layer in dataset.layers() {
        let mut skipped = 0usize;
        for feature in layer.features() {
            match feature.geometry() {
                Some(geometry) => geometries.push(geometry.to_geo()?),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(layer = %layer.name(), skipped, "skipped features without geometry");
        }
    }
    Ok(geometries)
}

/// Mark the cells features occupy.
///
/// Points mark the cell they fall in, lines and polygon edges every cell
/// they touch, polygons also their interior. Features off the grid are
/// dropped.
pub fn burn_features(features: &[Geometry<f64>], spec: &GridSpec) -> Result<GrayImage> {
    burn(features, spec, true)
}

/// Rasterize `geometries` onto a byte grid with GDAL.
///
/// Without `all_touched` a polygon only claims the cells whose centre it
/// contains.
pub(crate) fn burn(geometries: &[Geometry<f64>], spec: &GridSpec, all_touched: bool) -> Result<GrayImage> {
    let geometries = geometries.iter().map(to_ogr).collect::<Result<Vec<_>>>()?;

    let mut dataset = DriverManager::get_driver_by_name("MEM")?.create_with_band_type::<u8, _>(
        "",
        spec.cols as usize,
        spec.rows as usize,
        1,
    )?;
    dataset.set_geo_transform(&spec.geo_transform())?;

    if !geometries.is_empty() {
        let burn_values = vec![SOURCE as f64; geometries.len()];
        let options = RasterizeOptions {
            all_touched,
            ..Default::default()
        };
        rasterize(&mut dataset, &[1], &geometries, &burn_values, Some(options))?;
    }

    let buffer = dataset.rasterband(1)?.read_band_as::<u8>()?;
    GrayImage::from_raw(spec.cols, spec.rows, buffer.data().to_vec())
        .ok_or_else(|| DistanceError::Engine("rasterized grid does not match its shape".to_string()))
}

fn to_ogr(geometry: &Geometry<f64>) -> Result<gdal::vector::Geometry> {
    let ogr = match geometry {
        Geometry::Line(line) => LineString::from(vec![line.start, line.end]).to_gdal()?,
        Geometry::Rect(rect) => rect.to_polygon().to_gdal()?,
        Geometry::Triangle(triangle) => triangle.to_polygon().to_gdal()?,
        other => other.to_gdal()?,
    };
    Ok(ogr)
}

/// Number of marked cells
pub fn source_count(sources: &GrayImage) -> usize {
    sources.pixels().filter(|p| p.0[0] > 0).count()
}
