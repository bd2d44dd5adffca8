// Geodetic helpers for handing formation slots to a flight controller
// Slots are metres east/north of the leader; autopilots want lat/lon

use super::formation::Point;

/// Mean Earth radius in metres
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Destination reached from `origin` after travelling `distance_m` along
/// `bearing_rad` (clockwise from north), using the inverse haversine formula
pub fn destination(origin: GeoPoint, distance_m: f64, bearing_rad: f64) -> GeoPoint {
    let lat1 = origin.lat.to_radians();
    let lon1 = origin.lon.to_radians();
    let angular = distance_m / EARTH_RADIUS_M;

    let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing_rad.cos()).asin();
    let lon2 = lon1
        + (bearing_rad.sin() * angular.sin() * lat1.cos())
            .atan2(angular.cos() - lat1.sin() * lat2.sin());

    GeoPoint {
        lat: lat2.to_degrees(),
        lon: lon2.to_degrees(),
    }
}

/// Geodetic position of a formation slot given as an east (`x`) / north
/// (`y`) offset in metres from the leader
pub fn slot_to_geodetic(leader: GeoPoint, slot: Point) -> GeoPoint {
    let distance = slot.distance_to(&Point::ORIGIN);
    if distance == 0.0 {
        return leader;
    }
    let bearing = slot.x.atan2(slot.y);
    destination(leader, distance, bearing)
}
