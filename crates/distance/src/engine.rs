use image::{GrayImage, ImageBuffer, Luma};

use crate::error::{DistanceError, Result};

/// Distances in cell units, one per grid cell
pub type DistanceImage = ImageBuffer<Luma<f64>, Vec<f64>>;

/// Backend that computes a distance transform over a source grid.
///
/// Non-zero cells of `sources` are the features; every cell receives its
/// straight-line distance to the nearest one, measured in cells.
pub trait DistanceEngine: Send + Sync {
    fn name(&self) -> &'static str;

    fn distance_cells(&self, sources: &GrayImage) -> Result<DistanceImage>;
}

/// Exact Euclidean distance transform from imageproc
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageprocEngine;

impl DistanceEngine for ImageprocEngine {
    fn name(&self) -> &'static str {
        "imageproc"
    }

    fn distance_cells(&self, sources: &GrayImage) -> Result<DistanceImage> {
        if sources.pixels().all(|p| p.0[0] == 0) {
            return Err(DistanceError::Engine("source grid has no feature cells".to_string()));
        }

        let mut distances = imageproc::distance_transform::euclidean_squared_distance_transform(sources);
        for pixel in distances.pixels_mut() {
            pixel.0[0] = pixel.0[0].sqrt();
        }
        Ok(distances)
    }
}
