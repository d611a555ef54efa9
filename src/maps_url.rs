use crate::error::{Result, StreetViewError};
use crate::types::{LatLng, Target};
use regex::Regex;

/// Pull the target point out of a Google Maps URL.
///
/// Understands the two shapes Google uses:
/// - `https://www.google.com/maps/@LAT,LNG,17z`
/// - `https://www.google.com/maps/place/...!3dLAT!4dLNG...`
///
/// When both are present the `!3d/!4d` pair wins, since it marks the place
/// itself while `@` marks where the map is centered.
pub fn parse_url(url: &str) -> Result<LatLng> {
    let place_re = compile(r"!3d(-?\d+(?:\.\d+)?)!4d(-?\d+(?:\.\d+)?)")?;
    let center_re = compile(r"@(-?\d+(?:\.\d+)?),(-?\d+(?:\.\d+)?)")?;

    let point = capture_pair(&place_re, url)
        .or_else(|| capture_pair(&center_re, url))
        .ok_or(StreetViewError::InvalidUrl)?;

    if !point.is_valid() {
        return Err(StreetViewError::InvalidUrl);
    }
    Ok(point)
}

/// [`parse_url`] wrapped as a coordinates target.
pub fn target_from_url(url: &str) -> Result<Target> {
    parse_url(url).map(Target::Coordinates)
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| StreetViewError::ParseError(e.to_string()))
}

fn capture_pair(re: &Regex, text: &str) -> Option<LatLng> {
    let cap = re.captures(text)?;
    let lat = cap.get(1)?.as_str().parse::<f64>().ok()?;
    let lng = cap.get(2)?.as_str().parse::<f64>().ok()?;
    Some(LatLng::new(lat, lng))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url() {
        let url = "https://www.google.com/maps/@41.8982208,12.4764804,17z";
        let point = parse_url(url).unwrap();
        assert!((point.lat - 41.8982208).abs() < 0.0001);
        assert!((point.lng - 12.4764804).abs() < 0.0001);
    }

    #[test]
    fn test_parse_url_prefers_place_marker() {
        let url = "https://www.google.com/maps/place/Cornell+Tech/@40.7559,-73.9561,17z/data=!3m1!4b1!4m6!3m5!1s0x0:0x0!8m2!3d40.7557592!4d-73.9542045";
        let point = parse_url(url).unwrap();
        assert_eq!(point, LatLng::new(40.7557592, -73.9542045));
    }

    #[test]
    fn test_parse_street_view_url() {
        let url = "https://www.google.com/maps/@42.4384965,-76.5031861,3a,75y,90t/data=!3m6!1e1!3m4!1sAF1QipNRA!2e0!7i16384!8i8192";
        let target = target_from_url(url).unwrap();
        assert_eq!(target, Target::coordinates(42.4384965, -76.5031861));
    }

    #[test]
    fn test_parse_url_without_coordinates() {
        assert!(matches!(
            parse_url("https://www.google.com/maps/search/coffee"),
            Err(StreetViewError::InvalidUrl)
        ));
    }

    #[test]
    fn test_parse_url_out_of_range() {
        assert!(matches!(
            parse_url("https://www.google.com/maps/@95.0,12.0,17z"),
            Err(StreetViewError::InvalidUrl)
        ));
    }
}
