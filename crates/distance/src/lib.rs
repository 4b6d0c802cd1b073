//! # Euclidean Distance
//!
//! Straight-line distance from every cell of a raster to the nearest
//! feature of a feature class, restricted to the cells of a mask.
//!
//! Rasters and feature classes are read and written through GDAL/OGR. The
//! transform itself is delegated to a [`DistanceEngine`]; this crate
//! rasterizes the features, applies the mask and writes the result.
//!
//! ```rust,no_run
//! use distance::{DistanceRequest, Environment, euclidean_distance};
//!
//! let mut env = Environment::default();
//! let request = DistanceRequest::new("roads.shp", "roads_dist.tif", 30.0, "aquifers.shp");
//!
//! match euclidean_distance(&request, &mut env) {
//!     Ok(outcome) => println!("max distance {:?}", outcome.max_distance),
//!     Err(err) => eprintln!("{}: {}", err.kind(), err),
//! }
//! ```

pub mod error;
pub mod grid;
pub mod mask;
pub mod features;
pub mod engine;
pub mod environment;
pub mod output;

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

pub use error::{DistanceError, Result};
pub use grid::{GridSpec, MAX_CELLS};
pub use mask::{MaskSource, RasterMask};
pub use engine::{DistanceEngine, DistanceImage, ImageprocEngine};
pub use environment::{Environment, EnvironmentSettings, ScopedEnvironment};
pub use output::{DistanceRaster, NODATA};

/// Inputs of one distance run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceRequest {
    pub in_features: PathBuf,
    pub out_raster: PathBuf,
    /// Output cell size in map units
    pub cell_size: f64,
    pub mask: PathBuf,
}

impl DistanceRequest {
    pub fn new(
        in_features: impl Into<PathBuf>,
        out_raster: impl Into<PathBuf>,
        cell_size: f64,
        mask: impl Into<PathBuf>,
    ) -> Self {
        Self {
            in_features: in_features.into(),
            out_raster: out_raster.into(),
            cell_size,
            mask: mask.into(),
        }
    }
}

/// What a successful run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceOutcome {
    pub output: PathBuf,
    pub cols: u32,
    pub rows: u32,
    pub source_cells: usize,
    /// Cells that received a distance
    pub valid_cells: usize,
    /// Cells dropped by the mask
    pub masked_cells: usize,
    pub min_distance: Option<f64>,
    pub max_distance: Option<f64>,
    /// Status messages, in order
    pub messages: Vec<String>,
}

/// Run with the default imageproc engine
pub fn euclidean_distance(request: &DistanceRequest, env: &mut Environment) -> Result<DistanceOutcome> {
    euclidean_distance_with(&ImageprocEngine, request, env)
}

/// Run with a given engine.
///
/// The request's mask and cell size are applied to `env` only for the
/// duration of the call.
pub fn euclidean_distance_with<E: DistanceEngine>(
    engine: &E,
    request: &DistanceRequest,
    env: &mut Environment,
) -> Result<DistanceOutcome> {
    let started = Instant::now();
    if !request.cell_size.is_finite() || request.cell_size <= 0.0 {
        return Err(DistanceError::InvalidCellSize(request.cell_size));
    }

    let scoped = env.scoped(EnvironmentSettings {
        mask: Some(request.mask.clone()),
        cell_size: Some(request.cell_size),
        ..Default::default()
    });

    let in_features = scoped.resolve(&request.in_features);
    let out_raster = scoped.resolve(&request.out_raster);
    let mask_path = scoped.resolve(scoped.mask.as_deref().unwrap_or(request.mask.as_path()));
    let cell_size = scoped.cell_size.unwrap_or(request.cell_size);

    let mut messages = vec![format!(
        "Executing: EucDistance {} {} {} {}",
        in_features.display(),
        out_raster.display(),
        cell_size,
        mask_path.display()
    )];

    output::check_format(&out_raster)?;
    if out_raster.exists() && !scoped.overwrite_output {
        return Err(DistanceError::OutputExists(out_raster));
    }

    let features = features::load_features(&in_features)?;
    let mask = RasterMask::load(&mask_path, cell_size)?;
    let spec = mask.output_grid(cell_size)?;
    messages.push(format!(
        "Loaded {} features, output grid {} x {} cells",
        features.len(),
        spec.cols,
        spec.rows
    ));

    let sources = features::burn_features(&features, &spec)?;
    let source_cells = features::source_count(&sources);
    if source_cells == 0 {
        return Err(DistanceError::NoSourceCells {
            cols: spec.cols,
            rows: spec.rows,
        });
    }

    info!(engine = engine.name(), source_cells, cols = spec.cols, rows = spec.rows, "computing distance");
    let distances = engine.distance_cells(&sources)?;
    let raster = apply_mask(&spec, &distances, &mask, cell_size);
    raster.write(&out_raster)?;

    let range = raster.range();
    let valid_cells = raster.valid_count();
    messages.push(format!("Wrote {}", out_raster.display()));
    messages.push(format!(
        "Succeeded (Elapsed Time: {:.2} seconds)",
        started.elapsed().as_secs_f64()
    ));
    info!(output = %out_raster.display(), valid_cells, "distance raster written");

    Ok(DistanceOutcome {
        output: out_raster,
        cols: spec.cols,
        rows: spec.rows,
        source_cells,
        valid_cells,
        masked_cells: spec.cell_count() - valid_cells,
        min_distance: range.map(|r| r.0),
        max_distance: range.map(|r| r.1),
        messages,
    })
}

/// Scale cell distances to map units and drop cells outside the mask
fn apply_mask(spec: &GridSpec, distances: &DistanceImage, mask: &RasterMask, cell_size: f64) -> DistanceRaster {
    let mut values = Vec::with_capacity(spec.cell_count());
    for row in 0..spec.rows {
        for col in 0..spec.cols {
            let value = mask
                .contains(spec.cell_center(col, row))
                .then(|| distances.get_pixel(col, row).0[0] * cell_size);
            values.push(value);
        }
    }
    DistanceRaster { spec: *spec, values }
}

/// Whether a path names a raster format this crate can write
pub fn is_supported_output(path: &Path) -> bool {
    output::driver_for(path).is_some()
}
