//! Geodesic distance between coordinates.

use std::cmp::Ordering;

use geo::{Distance, Geodesic, Point};

use crate::model::Coordinate;

const METERS_PER_KM: f64 = 1000.0;

/// Ellipsoidal (WGS-84) great-circle distance between two coordinates in kilometers.
///
/// Coordinates outside the valid latitude/longitude ranges give unspecified results.
#[must_use]
pub fn distance_km(from: Coordinate, to: Coordinate) -> f64 {
    if from == to {
        return 0.0;
    }

    // Evaluate in a canonical endpoint order so the result is bit-identical both ways.
    let (first, second) = match cmp_coordinates(from, to) {
        Ordering::Greater => (to, from),
        Ordering::Less | Ordering::Equal => (from, to),
    };

    Geodesic::distance(to_point(first), to_point(second)) / METERS_PER_KM
}

fn cmp_coordinates(left: Coordinate, right: Coordinate) -> Ordering {
    left.lat
        .total_cmp(&right.lat)
        .then_with(|| left.lon.total_cmp(&right.lon))
}

fn to_point(coordinate: Coordinate) -> Point<f64> {
    Point::new(coordinate.lon, coordinate.lat)
}
