//! Test data generators for creating synthetic forecast fields.
//!
//! These generators create predictable, verifiable patterns that can be
//! used across the test suite. All grids are row-major (row 0 first).

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0); // col=1, row=0
/// assert_eq!(grid[10], 1.0);   // col=0, row=1
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
/// Warm in the south-west (row 0, col 0), cold towards the north-east,
/// ranging from about 290 K down to 250 K.
pub fn create_temperature_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x_factor = col as f32 / width.max(1) as f32;
            let y_factor = row as f32 / height.max(1) as f32;
            data.push(290.0 - (x_factor * 15.0) - (y_factor * 25.0));
        }
    }
    data
}

/// Creates a grid with a single Gaussian bump on top of a base value.
///
/// The peak is exactly `base + amplitude` at `(center_row, center_col)` and
/// strictly decreases with distance from it, so the centre is the unique
/// global extremum of the grid.
pub fn create_gaussian_bump(
    width: usize,
    height: usize,
    center_row: usize,
    center_col: usize,
    amplitude: f32,
    sigma: f32,
    base: f32,
) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let dy = row as f32 - center_row as f32;
            let dx = col as f32 - center_col as f32;
            let r2 = dx * dx + dy * dy;
            data.push(base + amplitude * (-r2 / (2.0 * sigma * sigma)).exp());
        }
    }
    data
}

/// Creates a geopotential height field (m) with one high and one low.
///
/// The high sits at one quarter of the grid, the low at three quarters,
/// both on the middle row.
pub fn create_height_field_with_centres(width: usize, height: usize) -> Vec<f32> {
    let row = height / 2;
    let high = create_gaussian_bump(width, height, row, width / 4, 80.0, width as f32 / 8.0, 0.0);
    let low = create_gaussian_bump(width, height, row, 3 * width / 4, -80.0, width as f32 / 8.0, 0.0);
    high.iter()
        .zip(&low)
        .map(|(h, l)| 1500.0 + h + l)
        .collect()
}

/// Creates a U-component wind grid (west-east component) in m/s.
///
/// Varies by row from -20 to +20 m/s.
pub fn create_u_wind_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for _col in 0..width {
            let lat_factor = (row as f32 / height as f32 - 0.5) * 2.0;
            data.push(lat_factor * 20.0);
        }
    }
    data
}

/// Creates a V-component wind grid (south-north component) in m/s.
///
/// Varies by column from -15 to +15 m/s.
pub fn create_v_wind_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            let lon_factor = (col as f32 / width as f32 - 0.5) * 2.0;
            data.push(lon_factor * 15.0);
        }
    }
    data
}

/// Accumulated precipitation series: `rate` mm per step, starting at 0.
pub fn create_accumulation_series(steps: usize, rate: f32) -> Vec<f32> {
    (0..steps).map(|i| i as f32 * rate).collect()
}

/// Creates a grid filled with a constant value.
pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Creates a grid with NaN values at the given `(col, row)` positions,
/// zeros elsewhere.
pub fn create_grid_with_nans(
    width: usize,
    height: usize,
    nan_positions: &[(usize, usize)],
) -> Vec<f32> {
    let mut data = vec![0.0f32; width * height];
    for &(col, row) in nan_positions {
        if col < width && row < height {
            data[row * width + col] = f32::NAN;
        }
    }
    data
}

/// Creates RGBA pixel data with a gradient pattern.
///
/// Red increases left to right, green top to bottom, blue is constant and
/// alpha is opaque.
pub fn create_test_rgba_pixels(width: usize, height: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            pixels.push((x * 255 / width.max(1)) as u8);
            pixels.push((y * 255 / height.max(1)) as u8);
            pixels.push(128);
            pixels.push(255);
        }
    }
    pixels
}
