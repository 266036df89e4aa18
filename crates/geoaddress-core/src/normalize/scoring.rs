//! Derived quality scores
//!
//! Both scores are on a 0 to 100 scale, rounded to two decimals.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::model::AddressFields;
use crate::request::Point;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Importance is doubled, so a provider score of 0.5 already reads as certain
const IMPORTANCE_MULTIPLIER: f64 = 2.0;
const MIN_IMPORTANCE_CONFIDENCE: f64 = 0.3;

const STREET_WEIGHT: f64 = 3.0;
const POSTCODE_WEIGHT: f64 = 2.0;
const CITY_WEIGHT: f64 = 1.5;
const DISTANCE_WEIGHT: f64 = 1.0;

/// Shortest folded query that may match as a fragment of a longer component
const MIN_FRAGMENT_CHARS: usize = 3;

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round and clamp to [0, 100]; non-finite scores are dropped
pub fn clamp_score(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(round2(value.clamp(0.0, 100.0)))
    } else {
        None
    }
}

/// Lower-case, strip accents and collapse whitespace
pub fn fold(text: &str) -> String {
    let stripped: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Great-circle distance in kilometres
pub fn haversine_km(a: Point, b: Point) -> f64 {
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();
    let h = (dlat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Confidence from the provider's importance, or from address completeness
pub fn confidence(fields: &AddressFields) -> Option<f64> {
    let from_importance = fields
        .importance
        .filter(|i| i.is_finite())
        .map(|i| (i * IMPORTANCE_MULTIPLIER).min(1.0))
        .filter(|c| *c >= MIN_IMPORTANCE_CONFIDENCE);

    let score = from_importance.unwrap_or_else(|| {
        match fields.address_line1.as_deref() {
            Some(line) if line.chars().any(|c| c.is_ascii_digit()) => 0.9,
            Some(_) => 0.7,
            None if fields.city.is_some() || fields.postal_code.is_some() => 0.5,
            None => 0.3,
        }
    });

    clamp_score(score * 100.0)
}

/// How well a search result matches the caller's query
///
/// Street, postcode and city are matched against the folded query text; a
/// proximity term is added when both sides have coordinates.
pub fn relevance(query: &str, proximity: Option<Point>, fields: &AddressFields) -> Option<f64> {
    let query = fold(query);
    let fragment_allowed = query.chars().count() >= MIN_FRAGMENT_CHARS;
    let mut score = 0.0;
    let mut max_score = STREET_WEIGHT + POSTCODE_WEIGHT + CITY_WEIGHT;

    let mentions = |component: Option<&str>| {
        component
            .map(fold)
            .filter(|c| !c.is_empty())
            .map_or(false, |c| {
                query.contains(&c) || (fragment_allowed && c.contains(&query))
            })
    };

    if mentions(fields.address_line1.as_deref()) {
        score += STREET_WEIGHT;
    }
    if mentions(fields.postal_code.as_deref()) {
        score += POSTCODE_WEIGHT;
    }
    let city = fields
        .city
        .as_deref()
        .or(fields.municipality.as_deref());
    if mentions(city) {
        score += CITY_WEIGHT;
    }

    if let (Some(origin), Some(lat), Some(lon)) = (proximity, fields.latitude, fields.longitude) {
        max_score += DISTANCE_WEIGHT;
        let km = haversine_km(
            origin,
            Point {
                latitude: lat,
                longitude: lon,
            },
        );
        score += DISTANCE_WEIGHT / (km + 1.0);
    }

    clamp_score(score / max_score * 100.0)
}
