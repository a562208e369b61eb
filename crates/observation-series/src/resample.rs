//! Spatial resampling of NARR value grids.
//!
//! Grids are row-major with latitude rows and longitude columns. Resampling
//! maps the corner cells of the source onto the corner cells of the output,
//! so the first and last coordinates of each axis are preserved.
//!
//! A cell is missing when it is NaN or at/above the grid's missing-value
//! sentinel. Kernels never blend a missing cell into a valid one: an output
//! cell whose neighbourhood touches a missing cell is written as the
//! sentinel, which `fix_nans` can repair afterwards.

use narr_common::{NarrError, NarrResult};

use crate::config::InterpolationMethod;

/// Length of an axis of `len` cells after scaling by `factor`.
///
/// Rounds to the nearest cell and never drops below one.
pub fn zoomed_len(len: usize, factor: f64) -> usize {
    ((len as f64) * factor).round().max(1.0) as usize
}

/// Read-only view of a row-major grid and its missing-value sentinel.
#[derive(Debug, Clone, Copy)]
pub struct GridView<'a> {
    data: &'a [f32],
    cols: usize,
    rows: usize,
    missing_value: f32,
}

impl<'a> GridView<'a> {
    /// Wrap `data` as `rows` x `cols`, rejecting empty or mis-sized grids.
    pub fn new(data: &'a [f32], cols: usize, rows: usize, missing_value: f32) -> NarrResult<Self> {
        if cols == 0 || rows == 0 || data.len() != cols * rows {
            return Err(NarrError::dimension_mismatch(
                format!("{} values for ({}, {})", cols * rows, rows, cols),
                format!("{} values", data.len()),
            ));
        }
        Ok(Self {
            data,
            cols,
            rows,
            missing_value,
        })
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn missing_value(&self) -> f32 {
        self.missing_value
    }

    /// Whether `v` counts as missing in this grid.
    pub fn is_missing(&self, v: f32) -> bool {
        v.is_nan() || v >= self.missing_value
    }

    /// Valid value at a (col, row) clamped into the grid, or None if missing.
    fn cell(&self, col: i64, row: i64) -> Option<f32> {
        let col = col.clamp(0, self.cols as i64 - 1) as usize;
        let row = row.clamp(0, self.rows as i64 - 1) as usize;
        let v = self.data[row * self.cols + col];
        (!self.is_missing(v)).then_some(v)
    }

    /// Fractional position clamped into the grid.
    fn clamp_position(&self, x: f64, y: f64) -> (f64, f64) {
        let x = if x.is_finite() { x } else { 0.0 };
        let y = if y.is_finite() { y } else { 0.0 };
        (
            x.clamp(0.0, (self.cols - 1) as f64),
            y.clamp(0.0, (self.rows - 1) as f64),
        )
    }

    /// Value of the closest cell.
    pub fn nearest(&self, x: f64, y: f64) -> Option<f32> {
        let (x, y) = self.clamp_position(x, y);
        self.cell(x.round() as i64, y.round() as i64)
    }

    /// Weighted blend of the four surrounding cells; None if any is missing.
    pub fn bilinear(&self, x: f64, y: f64) -> Option<f32> {
        let (x, y) = self.clamp_position(x, y);
        let (col, row) = (x.floor() as i64, y.floor() as i64);
        let (tx, ty) = ((x - col as f64) as f32, (y - row as f64) as f32);

        let upper = lerp(self.cell(col, row)?, self.cell(col + 1, row)?, tx);
        let lower = lerp(self.cell(col, row + 1)?, self.cell(col + 1, row + 1)?, tx);
        Some(lerp(upper, lower, ty))
    }

    /// Catmull-Rom blend of the surrounding 4x4 cells.
    ///
    /// Falls back to [`Self::bilinear`] when the wider neighbourhood holds a
    /// missing cell, so coastlines of missing data do not ring.
    pub fn cubic(&self, x: f64, y: f64) -> Option<f32> {
        let (x, y) = self.clamp_position(x, y);
        let (col, row) = (x.floor() as i64, y.floor() as i64);
        let (tx, ty) = ((x - col as f64) as f32, (y - row as f64) as f32);

        let mut columns = [0.0f32; 4];
        for (dy, slot) in (-1..=2).zip(columns.iter_mut()) {
            let mut points = [0.0f32; 4];
            for (dx, point) in (-1..=2).zip(points.iter_mut()) {
                match self.cell(col + dx, row + dy) {
                    Some(v) => *point = v,
                    None => return self.bilinear(x, y),
                }
            }
            *slot = catmull_rom(points, tx);
        }
        Some(catmull_rom(columns, ty))
    }

    /// Sample with `method`, writing the sentinel where no value exists.
    pub fn sample(&self, method: InterpolationMethod, x: f64, y: f64) -> f32 {
        let value = match method {
            InterpolationMethod::Nearest => self.nearest(x, y),
            InterpolationMethod::Bilinear => self.bilinear(x, y),
            InterpolationMethod::Cubic => self.cubic(x, y),
        };
        value.unwrap_or(self.missing_value)
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Catmull-Rom spline through p[1]..p[2] at `t` in [0, 1].
fn catmull_rom(p: [f32; 4], t: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * (2.0 * p[1]
        + (p[2] - p[0]) * t
        + (2.0 * p[0] - 5.0 * p[1] + 4.0 * p[2] - p[3]) * t2
        + (3.0 * p[1] - p[0] - 3.0 * p[2] + p[3]) * t3)
}

/// Step in source cells between consecutive output cells.
fn source_step(src_len: usize, dst_len: usize) -> f64 {
    if dst_len <= 1 {
        return 0.0;
    }
    (src_len.saturating_sub(1)) as f64 / (dst_len - 1) as f64
}

/// Resample a grid to `dst_cols` x `dst_rows` cells.
pub fn resample_grid(
    grid: &GridView<'_>,
    dst_cols: usize,
    dst_rows: usize,
    method: InterpolationMethod,
) -> Vec<f32> {
    let step_x = source_step(grid.cols(), dst_cols);
    let step_y = source_step(grid.rows(), dst_rows);

    let mut output = Vec::with_capacity(dst_cols * dst_rows);
    for dy in 0..dst_rows {
        let sy = dy as f64 * step_y;
        for dx in 0..dst_cols {
            output.push(grid.sample(method, dx as f64 * step_x, sy));
        }
    }
    output
}

/// Resample a coordinate axis linearly to `dst_len` points.
pub fn resample_axis(axis: &[f64], dst_len: usize) -> Vec<f64> {
    if axis.is_empty() {
        return Vec::new();
    }

    let step = source_step(axis.len(), dst_len);
    let last = axis.len() - 1;

    (0..dst_len)
        .map(|i| {
            let pos = (i as f64 * step).min(last as f64);
            let i0 = pos.floor() as usize;
            let i1 = (i0 + 1).min(last);
            let t = pos - i0 as f64;
            axis[i0] * (1.0 - t) + axis[i1] * t
        })
        .collect()
}
