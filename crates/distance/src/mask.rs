use std::path::Path;

use gdal::Dataset;
use geo::BoundingRect;
use geo_types::{Coord, Geometry, GeometryCollection};
use tracing::debug;

use crate::{
    error::{DistanceError, Result},
    features,
    grid::GridSpec,
};

/// Where a mask came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskSource {
    Raster,
    /// Polygons rasterized at the output cell size
    Features,
}

/// Cells a distance raster is computed for.
///
/// Raster masks exclude their NoData cells, or zero cells when the band
/// declares no NoData value. Rasters without a geotransform live in pixel
/// space. Polygon feature classes are rasterized by cell centre.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterMask {
    spec: GridSpec,
    inside: Vec<bool>,
    source: MaskSource,
}

impl RasterMask {
    pub fn new(spec: GridSpec, inside: Vec<bool>, source: MaskSource) -> Self {
        Self { spec, inside, source }
    }

    /// Load a GDAL raster or an OGR polygon feature class.
    ///
    /// `cell_size` sets the grid polygons are rasterized onto.
    pub fn load<P: AsRef<Path>>(path: P, cell_size: f64) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DistanceError::InputNotFound(path.to_path_buf()));
        }

        let dataset = Dataset::open(path)?;
        let mask = if dataset.raster_count() > 0 {
            Self::from_raster(&dataset)?
        } else if dataset.layer_count() > 0 {
            Self::from_polygons(&features::read_geometries(&dataset)?, cell_size)?
        } else {
            return Err(DistanceError::InvalidMask(format!(
                "{} holds neither raster bands nor layers",
                path.display()
            )));
        };

        debug!(
            path = %path.display(),
            source = ?mask.source,
            cols = mask.spec.cols,
            rows = mask.spec.rows,
            inside = mask.inside_count(),
            "loaded mask"
        );
        Ok(mask)
    }

    /// Band 1 of a raster dataset
    pub fn from_raster(dataset: &Dataset) -> Result<Self> {
        let (cols, rows) = dataset.raster_size();
        let spec = match dataset.geo_transform() {
            Ok(transform) => GridSpec::from_geo_transform(&transform, cols, rows)?,
            Err(_) => GridSpec::pixel_space(cols as u32, rows as u32),
        };

        let band = dataset.rasterband(1)?;
        let nodata = band.no_data_value();
        let values = band.read_band_as::<f64>()?;
        let inside = values
            .data()
            .iter()
            .map(|v| match nodata {
                Some(nodata) => *v != nodata && !v.is_nan(),
                None => *v != 0.0,
            })
            .collect();

        Ok(Self::new(spec, inside, MaskSource::Raster))
    }

    /// Cells whose centre lies in a polygon, on a grid covering the polygons
    pub fn from_polygons(geometries: &[Geometry<f64>], cell_size: f64) -> Result<Self> {
        let polygons: Vec<Geometry<f64>> = geometries
            .iter()
            .filter(|g| matches!(g, Geometry::Polygon(_) | Geometry::MultiPolygon(_) | Geometry::Rect(_)))
            .cloned()
            .collect();

        let extent = GeometryCollection(polygons.clone())
            .bounding_rect()
            .ok_or_else(|| DistanceError::InvalidMask("feature class has no polygons".to_string()))?;

        let spec = GridSpec::covering(extent, cell_size)?;
        let burned = features::burn(&polygons, &spec, false)?;
        let inside = burned.pixels().map(|p| p.0[0] > 0).collect();
        Ok(Self::new(spec, inside, MaskSource::Features))
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn source(&self) -> MaskSource {
        self.source
    }

    /// Grid the distance surface is computed on
    pub fn output_grid(&self, cell_size: f64) -> Result<GridSpec> {
        match self.source {
            MaskSource::Raster => self.spec.with_cell_size(cell_size),
            MaskSource::Features => Ok(self.spec),
        }
    }

    pub fn inside_count(&self) -> usize {
        self.inside.iter().filter(|v| **v).count()
    }

    /// Whether a map coordinate falls on a mask cell
    pub fn contains(&self, coord: Coord<f64>) -> bool {
        self.spec
            .cell_of(coord)
            .and_then(|(col, row)| self.inside.get(self.spec.index(col, row)).copied())
            .unwrap_or(false)
    }
}
