use ndarray::Array2;
use scene_geometry::DetectorError;

/// Edge map of two concentric 3-pixel-wide rings plus isolated bright specks,
/// rendered at whatever size is requested.
pub fn ring_edges(width: usize, height: usize) -> Array2<u8> {
    let (cx, cy) = (width as f64 / 2.0, height as f64 / 2.0);
    let outer = width.min(height) as f64 * 0.4;
    let inner = outer * 0.5;

    Array2::from_shape_fn((height, width), |(y, x)| {
        let d = ((x as f64 - cx).powi(2) + (y as f64 - cy).powi(2)).sqrt();
        if (d - outer).abs() < 1.5 || (d - inner).abs() < 1.5 {
            230
        } else if (x * 7 + y * 13) % 97 == 0 {
            // isolated bright specks, removed by component cleaning
            200
        } else {
            0
        }
    })
}

pub fn ring_detector(width: usize, height: usize) -> Result<Array2<u8>, DetectorError> {
    Ok(ring_edges(width, height))
}
