//! Great-circle distance between two coordinates.

use crate::args::{number_property, object_schema, parse_args};
use crate::{Tool, ToolContext};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use waypoint_rs_protocol::ToolError;

/// Mean earth radius in kilometres (IUGG).
const EARTH_RADIUS_KM: f64 = 6371.0088;
const KM_PER_MILE: f64 = 1.609_344;
const KM_PER_NAUTICAL_MILE: f64 = 1.852;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DistanceArgs {
    lat1: f64,
    lon1: f64,
    lat2: f64,
    lon2: f64,
    #[serde(default = "default_unit")]
    unit: String,
}

fn default_unit() -> String {
    "km".to_string()
}

/// Haversine distance tool served alongside geocoding results.
#[derive(Debug, Default)]
pub struct DistanceTool;

#[async_trait]
impl Tool for DistanceTool {
    fn name(&self) -> &str {
        "calculate_distance"
    }

    fn description(&self) -> &str {
        "Calculate the distance between two latitude/longitude points in km, miles, or nm"
    }

    fn args_schema(&self) -> Value {
        object_schema(
            json!({
                "lat1": number_property("Latitude of the first point"),
                "lon1": number_property("Longitude of the first point"),
                "lat2": number_property("Latitude of the second point"),
                "lon2": number_property("Longitude of the second point"),
                "unit": {"type": "string", "enum": ["km", "miles", "nm"]},
            }),
            &["lat1", "lon1", "lat2", "lon2"],
        )
    }

    async fn call(&self, _ctx: &ToolContext, args: Value) -> Result<Value, ToolError> {
        let input: DistanceArgs = parse_args(args)?;
        let per_unit = match input.unit.trim().to_ascii_lowercase().as_str() {
            "km" => 1.0,
            "miles" | "mi" => KM_PER_MILE,
            "nm" => KM_PER_NAUTICAL_MILE,
            other => {
                return Err(ToolError::InvalidArguments(format!(
                    "unit must be km, miles, or nm, got {other:?}"
                )));
            }
        };
        check_point("lat1", input.lat1, "lon1", input.lon1)?;
        check_point("lat2", input.lat2, "lon2", input.lon2)?;

        let km = haversine_km((input.lat1, input.lon1), (input.lat2, input.lon2));
        let distance = (km / per_unit * 100.0).round() / 100.0;
        Ok(json!({
            "distance": distance,
            "unit": input.unit,
            "point1": {"latitude": input.lat1, "longitude": input.lon1},
            "point2": {"latitude": input.lat2, "longitude": input.lon2},
            "calculation_method": "haversine",
        }))
    }
}

fn check_point(lat_name: &str, lat: f64, lon_name: &str, lon: f64) -> Result<(), ToolError> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(ToolError::InvalidArguments(format!(
            "{lat_name} must be within [-90, 90], got {lat}"
        )));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(ToolError::InvalidArguments(format!(
            "{lon_name} must be within [-180, 180], got {lon}"
        )));
    }
    Ok(())
}

fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lon2) = (to.0.to_radians(), to.1.to_radians());
    let a = ((lat2 - lat1) / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * ((lon2 - lon1) / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::haversine_km;

    #[test]
    fn haversine_matches_known_distances() {
        assert_eq!(haversine_km((51.1784, -115.5708), (51.1784, -115.5708)), 0.0);
        // Banff to Calgary, about 105 km.
        let km = haversine_km((51.1784, -115.5708), (51.0447, -114.0719));
        assert!((km - 105.4).abs() < 2.0, "got {km}");
        // A quarter of the meridian.
        let km = haversine_km((0.0, 0.0), (90.0, 0.0));
        assert!((km - 10_007.5).abs() < 1.0, "got {km}");
    }
}
