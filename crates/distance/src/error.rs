use std::path::PathBuf;

use strum::IntoStaticStr;
use thiserror::Error;

#[derive(Error, Debug, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum DistanceError {
    #[error("Cell size must be a positive number, got {0}")]
    InvalidCellSize(f64),

    #[error("Input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Output already exists: {}", .0.display())]
    OutputExists(PathBuf),

    #[error("Unsupported raster format: {0}")]
    UnsupportedFormat(String),

    #[error("Feature class contains no geometries")]
    EmptyFeatures,

    #[error("Invalid mask: {0}")]
    InvalidMask(String),

    #[error("Output grid of {cols} x {rows} cells exceeds the limit of {limit} cells")]
    GridTooLarge { cols: f64, rows: f64, limit: usize },

    #[error("No feature falls inside the {cols}x{rows} output grid")]
    NoSourceCells { cols: u32, rows: u32 },

    #[error("Distance engine failed: {0}")]
    Engine(String),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DistanceError {
    /// Stable identifier for the failure kind
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

pub type Result<T> = std::result::Result<T, DistanceError>;
