//! Test data generators for creating synthetic reanalysis-like data.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite.

/// Creates an evenly spaced coordinate axis.
///
/// # Example
///
/// ```
/// use test_utils::regular_axis;
///
/// let axis = regular_axis(10.0, 0.5, 4);
/// assert_eq!(axis, vec![10.0, 10.5, 11.0, 11.5]);
/// ```
pub fn regular_axis(start: f64, step: f64, count: usize) -> Vec<f64> {
    (0..count).map(|i| start + step * i as f64).collect()
}

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// This makes it easy to verify that data is being resampled correctly
/// by checking that grid[row][col] == col * 1000 + row.
///
/// # Arguments
///
/// * `width` - Number of columns (longitude)
/// * `height` - Number of rows (latitude)
///
/// # Returns
///
/// A `Vec<f32>` in row-major order (row 0 first, then row 1, etc.)
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50); // 10 * 5
/// assert_eq!(grid[0], 0.0);   // col=0, row=0 -> 0*1000 + 0
/// assert_eq!(grid[1], 1000.0); // col=1, row=0 -> 1*1000 + 0
/// assert_eq!(grid[10], 1.0);  // col=0, row=1 -> 0*1000 + 1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates a test grid with temperature-like values in Kelvin.
///
/// The values range from approximately 250K (-23C) to 310K (37C),
/// creating a gradient pattern similar to real reanalysis fields.
pub fn create_temperature_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            // Create a gradient from cold (top-left) to warm (bottom-right)
            let x_factor = col as f32 / width.max(1) as f32;
            let y_factor = row as f32 / height.max(1) as f32;
            let temp = 250.0 + (x_factor * 30.0) + (y_factor * 30.0);
            data.push(temp);
        }
    }
    data
}

/// Creates a grid filled with a constant value.
pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Creates a grid with the missing-value sentinel at specified positions.
///
/// Cells not listed hold `fill`.
///
/// # Arguments
///
/// * `width` - Number of columns
/// * `height` - Number of rows
/// * `fill` - Value of the valid cells
/// * `missing_value` - Sentinel written at the listed positions
/// * `positions` - List of (col, row) positions that should be missing
pub fn create_grid_with_missing(
    width: usize,
    height: usize,
    fill: f32,
    missing_value: f32,
    positions: &[(usize, usize)],
) -> Vec<f32> {
    let mut data = vec![fill; width * height];
    for &(col, row) in positions {
        if col < width && row < height {
            data[row * width + col] = missing_value;
        }
    }
    data
}

/// Cloud-cover-like grid in percent with a deterministic pattern per seed.
pub fn create_cloud_cover_grid(width: usize, height: usize, seed: u32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let hash = simple_hash(col as u32, row as u32, seed);
            data.push((hash % 10_001) as f32 / 100.0);
        }
    }
    data
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_axis() {
        let axis = regular_axis(-133.0, 0.25, 5);
        assert_eq!(axis.len(), 5);
        assert_eq!(axis[4], -132.0);
        assert!(regular_axis(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_create_test_grid() {
        let grid = create_test_grid(10, 5);
        assert_eq!(grid.len(), 50);
        assert_eq!(grid[11], 1001.0); // col=1, row=1
    }

    #[test]
    fn test_create_temperature_grid() {
        let grid = create_temperature_grid(100, 100);
        let min = grid.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = grid.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        assert!(min >= 250.0);
        assert!(max <= 310.0);
    }

    #[test]
    fn test_create_grid_with_missing() {
        let grid = create_grid_with_missing(10, 10, 1.0, 9.999e20, &[(5, 5), (0, 0)]);
        assert_eq!(grid[0], 9.999e20);
        assert_eq!(grid[55], 9.999e20); // row 5 * 10 + col 5
        assert_eq!(grid[1], 1.0);
    }

    #[test]
    fn test_cloud_cover_deterministic() {
        let a = create_cloud_cover_grid(20, 20, 42);
        assert_eq!(a, create_cloud_cover_grid(20, 20, 42));
        assert_ne!(a, create_cloud_cover_grid(20, 20, 43));
        assert!(a.iter().all(|&v| (0.0..=100.0).contains(&v)));
    }
}
