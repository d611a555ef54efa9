use crate::types::LatLng;

/// Initial great-circle bearing from `origin` to `target`.
///
/// Both points are in decimal degrees. The result is a compass heading in
/// degrees, clockwise from north and always in `[0, 360)`, which can be sent
/// directly as the `heading` parameter.
///
/// Coincident points have no defined bearing; this returns 0 for them.
///
/// # Example
///
/// ```
/// use street_heading::{bearing::initial_bearing, LatLng};
///
/// let heading = initial_bearing(LatLng::new(0.0, 0.0), LatLng::new(0.0, 90.0));
/// assert!((heading - 90.0).abs() < 1e-9);
/// ```
pub fn initial_bearing(origin: LatLng, target: LatLng) -> f64 {
    initial_bearing_radians(
        origin.lat.to_radians(),
        origin.lng.to_radians(),
        target.lat.to_radians(),
        target.lng.to_radians(),
    )
}

/// Same as [`initial_bearing`] with all four coordinates already in radians.
/// The result is still in degrees.
pub fn initial_bearing_radians(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lng = lng2 - lng1;
    let x = lat2.cos() * d_lng.sin();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lng.cos();

    if !x.is_finite() || !y.is_finite() || (x == 0.0 && y == 0.0) {
        return 0.0;
    }

    let heading = (x.atan2(y).to_degrees() + 360.0) % 360.0;
    // -1e-15 + 360 rounds to 360
    if heading >= 360.0 {
        0.0
    } else {
        heading
    }
}
