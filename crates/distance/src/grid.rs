use gdal::GeoTransform;
use geo_types::{Coord, Rect};
use serde::{Deserialize, Serialize};

use crate::error::{DistanceError, Result};

/// Largest grid the tool will allocate
pub const MAX_CELLS: usize = 1 << 28;

/// Placement of a regular grid in map space.
///
/// Cell `(col, row)` spans `origin + col * cell_width` to the next column
/// and likewise for rows. North-up grids have a negative `cell_height`;
/// pixel-space grids have a positive one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub origin_x: f64,
    pub origin_y: f64,
    pub cell_width: f64,
    pub cell_height: f64,
    pub cols: u32,
    pub rows: u32,
}

impl GridSpec {
    /// Image pixel space: origin top-left, unit cells, y down
    pub fn pixel_space(cols: u32, rows: u32) -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            cell_width: 1.0,
            cell_height: 1.0,
            cols,
            rows,
        }
    }

    /// North-up grid from its lower-left corner
    pub fn north_up(xll: f64, yll: f64, cell_size: f64, cols: u32, rows: u32) -> Self {
        Self {
            origin_x: xll,
            origin_y: yll + rows as f64 * cell_size,
            cell_width: cell_size,
            cell_height: -cell_size,
            cols,
            rows,
        }
    }

    /// North-up grid of square cells covering `extent`
    pub fn covering(extent: Rect<f64>, cell_size: f64) -> Result<Self> {
        let (cols, rows) = checked_shape(extent.width() / cell_size, extent.height() / cell_size)?;
        Ok(Self {
            origin_x: extent.min().x,
            origin_y: extent.max().y,
            cell_width: cell_size,
            cell_height: -cell_size,
            cols,
            rows,
        })
    }

    /// Grid of a GDAL dataset. Rotated geotransforms have no grid.
    pub fn from_geo_transform(transform: &GeoTransform, cols: usize, rows: usize) -> Result<Self> {
        if transform[2] != 0.0 || transform[4] != 0.0 {
            return Err(DistanceError::InvalidMask(format!(
                "rotated geotransform {transform:?} is not supported"
            )));
        }
        let (cols, rows) = checked_shape(cols as f64, rows as f64)?;
        Ok(Self {
            origin_x: transform[0],
            origin_y: transform[3],
            cell_width: transform[1],
            cell_height: transform[5],
            cols,
            rows,
        })
    }

    pub fn geo_transform(&self) -> GeoTransform {
        [self.origin_x, self.cell_width, 0.0, self.origin_y, 0.0, self.cell_height]
    }

    pub fn cell_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    /// Row-major index of a cell
    pub fn index(&self, col: u32, row: u32) -> usize {
        row as usize * self.cols as usize + col as usize
    }

    pub fn cell_center(&self, col: u32, row: u32) -> Coord<f64> {
        Coord {
            x: self.origin_x + (col as f64 + 0.5) * self.cell_width,
            y: self.origin_y + (row as f64 + 0.5) * self.cell_height,
        }
    }

    /// Cell containing a map coordinate, if it is on the grid
    pub fn cell_of(&self, coord: Coord<f64>) -> Option<(u32, u32)> {
        let col = (coord.x - self.origin_x) / self.cell_width;
        let row = (coord.y - self.origin_y) / self.cell_height;
        if !col.is_finite() || !row.is_finite() || col < 0.0 || row < 0.0 {
            return None;
        }
        let (col, row) = (col.floor(), row.floor());
        if col >= self.cols as f64 || row >= self.rows as f64 {
            return None;
        }
        Some((col as u32, row as u32))
    }

    /// Map-space extent
    pub fn extent(&self) -> Rect<f64> {
        Rect::new(
            Coord { x: self.origin_x, y: self.origin_y },
            Coord {
                x: self.origin_x + self.cols as f64 * self.cell_width,
                y: self.origin_y + self.rows as f64 * self.cell_height,
            },
        )
    }

    /// Same extent and orientation with square cells of `cell_size`.
    ///
    /// Partial cells at the far edges are kept, so the new grid may reach
    /// slightly past the original extent.
    pub fn with_cell_size(&self, cell_size: f64) -> Result<Self> {
        let extent = self.extent();
        let (cols, rows) = checked_shape(extent.width() / cell_size, extent.height() / cell_size)?;
        Ok(Self {
            origin_x: self.origin_x,
            origin_y: self.origin_y,
            cell_width: cell_size.copysign(self.cell_width),
            cell_height: cell_size.copysign(self.cell_height),
            cols,
            rows,
        })
    }
}

/// Round fractional column and row counts up, refusing grids too large to
/// allocate
fn checked_shape(cols: f64, rows: f64) -> Result<(u32, u32)> {
    let cols = cols.ceil().max(1.0);
    let rows = rows.ceil().max(1.0);
    let axis_limit = u32::MAX as f64;
    if cols > axis_limit || rows > axis_limit || cols * rows > MAX_CELLS as f64 {
        return Err(DistanceError::GridTooLarge {
            cols,
            rows,
            limit: MAX_CELLS,
        });
    }
    Ok((cols as u32, rows as u32))
}
