//! Field mapping tables
//!
//! Each provider owns a [`FieldMapping`] that knows its native response
//! shape. The helpers here cover the lookups every mapping needs.

use serde_json::Value;

use crate::error::NormalizationError;
use crate::model::AddressFields;

/// Projects one provider's native response onto [`AddressFields`]
pub trait FieldMapping: Send + Sync {
    /// Split a raw response into native records
    ///
    /// An empty list means "no results", which is not an error. The default
    /// treats `null` as empty, an array as a list of records and an object as
    /// a single record.
    fn records<'a>(&self, raw: &'a Value) -> Result<Vec<&'a Value>, NormalizationError> {
        match raw {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => Ok(items.iter().collect()),
            Value::Object(_) => Ok(vec![raw]),
            other => Err(NormalizationError::malformed(format!(
                "expected a record or a list of records, got {}",
                type_name(other)
            ))),
        }
    }

    /// Map one native record
    fn map_record(&self, record: &Value) -> Result<AddressFields, NormalizationError>;
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Follow a dotted path; numeric segments index into lists
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Text at `path`; numbers are rendered, blanks are `None`
pub fn text_at(value: &Value, path: &str) -> Option<String> {
    match lookup(value, path)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First non-blank text among `paths`
pub fn first_text(value: &Value, paths: &[&str]) -> Option<String> {
    paths.iter().find_map(|path| text_at(value, path))
}

/// Number at `path`, accepting numeric strings
///
/// Missing, null and blank values are `None`; anything else that is not a
/// number fails.
pub fn number_at(
    value: &Value,
    path: &str,
    field: &'static str,
) -> Result<Option<f64>, NormalizationError> {
    match lookup(value, path) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| NormalizationError::NonNumeric {
                field,
                value: n.to_string(),
            }),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => {
            s.trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| NormalizationError::NonNumeric {
                    field,
                    value: s.clone(),
                })
        }
        Some(other) => Err(NormalizationError::NonNumeric {
            field,
            value: other.to_string(),
        }),
    }
}

/// Provider quality score; unusable values are ignored rather than fatal
pub fn importance_at(value: &Value, path: &str) -> Option<f64> {
    number_at(value, path, "importance").ok().flatten()
}

/// `"{house_number} {road}"`, or whichever half exists
pub fn street_line(house_number: Option<String>, road: Option<String>) -> Option<String> {
    match (house_number, road) {
        (Some(number), Some(road)) => Some(format!("{} {}", number, road)),
        (None, Some(road)) => Some(road),
        (Some(number), None) => Some(number),
        (None, None) => None,
    }
}

/// Address type from an OSM class/type pair
pub fn osm_address_type(class: Option<String>, kind: Option<String>) -> Option<String> {
    match (class, kind) {
        (Some(class), Some(kind)) => Some(match class.as_str() {
            "place" | "highway" | "building" => kind,
            _ => format!("{}_{}", class, kind),
        }),
        (class, kind) => class.or(kind),
    }
}

/// Records of a GeoJSON `FeatureCollection` (or a lone `Feature`)
pub fn feature_collection(raw: &Value) -> Result<Vec<&Value>, NormalizationError> {
    match raw {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => match map.get("features") {
            Some(Value::Array(features)) => Ok(features.iter().collect()),
            Some(other) => Err(NormalizationError::malformed(format!(
                "'features' must be a list, got {}",
                type_name(other)
            ))),
            None if map.get("type").and_then(Value::as_str) == Some("Feature") => Ok(vec![raw]),
            None => Err(NormalizationError::malformed(
                "expected a GeoJSON FeatureCollection",
            )),
        },
        Value::Array(features) => Ok(features.iter().collect()),
        other => Err(NormalizationError::malformed(format!(
            "expected a GeoJSON FeatureCollection, got {}",
            type_name(other)
        ))),
    }
}

/// Items of a list found under `path` in a response envelope
pub fn results_array<'a>(raw: &'a Value, path: &str) -> Result<Vec<&'a Value>, NormalizationError> {
    match raw {
        Value::Null => Ok(Vec::new()),
        Value::Object(_) => match lookup(raw, path) {
            Some(Value::Array(items)) => Ok(items.iter().collect()),
            Some(Value::Null) => Ok(Vec::new()),
            Some(other) => Err(NormalizationError::malformed(format!(
                "'{}' must be a list, got {}",
                path,
                type_name(other)
            ))),
            None => Err(NormalizationError::malformed(format!(
                "response has no '{}' list",
                path
            ))),
        },
        other => Err(NormalizationError::malformed(format!(
            "expected a response object, got {}",
            type_name(other)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_paths() {
        let value = json!({"geometry": {"coordinates": [2.35, 48.85]}, "a": {"b": null}});
        assert_eq!(lookup(&value, "geometry.coordinates.1"), Some(&json!(48.85)));
        assert_eq!(lookup(&value, "geometry.coordinates.9"), None);
        assert_eq!(lookup(&value, "a.b"), Some(&Value::Null));
        assert_eq!(lookup(&value, "a.b.c"), None);
    }

    #[test]
    fn test_text_at() {
        let value = json!({"id": 42, "name": "  Paris ", "blank": " ", "flag": true});
        assert_eq!(text_at(&value, "id").as_deref(), Some("42"));
        assert_eq!(text_at(&value, "name").as_deref(), Some("Paris"));
        assert_eq!(text_at(&value, "blank"), None);
        assert_eq!(text_at(&value, "flag"), None);
        assert_eq!(first_text(&value, &["missing", "blank", "name"]).as_deref(), Some("Paris"));
    }

    #[test]
    fn test_number_at() {
        let value = json!({"lat": "48.85", "lon": 2.35, "bad": "north", "empty": "", "obj": {}});
        assert_eq!(number_at(&value, "lat", "latitude").unwrap(), Some(48.85));
        assert_eq!(number_at(&value, "lon", "longitude").unwrap(), Some(2.35));
        assert_eq!(number_at(&value, "empty", "latitude").unwrap(), None);
        assert_eq!(number_at(&value, "missing", "latitude").unwrap(), None);
        assert!(matches!(
            number_at(&value, "bad", "latitude"),
            Err(NormalizationError::NonNumeric { field: "latitude", .. })
        ));
        assert!(number_at(&value, "obj", "latitude").is_err());
        assert_eq!(importance_at(&value, "bad"), None);
    }

    #[test]
    fn test_street_and_type_helpers() {
        assert_eq!(
            street_line(Some("10".into()), Some("Downing Street".into())).as_deref(),
            Some("10 Downing Street")
        );
        assert_eq!(street_line(None, Some("Main St".into())).as_deref(), Some("Main St"));
        assert_eq!(street_line(None, None), None);

        let kind = |c: &str, t: &str| osm_address_type(Some(c.into()), Some(t.into()));
        assert_eq!(kind("place", "city").as_deref(), Some("city"));
        assert_eq!(kind("highway", "residential").as_deref(), Some("residential"));
        assert_eq!(kind("building", "yes").as_deref(), Some("yes"));
        assert_eq!(kind("amenity", "cafe").as_deref(), Some("amenity_cafe"));
        assert_eq!(osm_address_type(Some("building".into()), None).as_deref(), Some("building"));
        assert_eq!(osm_address_type(None, Some("house".into())).as_deref(), Some("house"));
    }

    #[test]
    fn test_envelopes() {
        assert_eq!(feature_collection(&json!({"features": []})).unwrap().len(), 0);
        assert_eq!(
            feature_collection(&json!({"type": "Feature", "properties": {}})).unwrap().len(),
            1
        );
        assert!(feature_collection(&json!({"results": []})).is_err());
        assert!(feature_collection(&json!("oops")).is_err());

        let raw = json!({"Response": {"View": [{"Result": [{}, {}]}]}});
        assert_eq!(results_array(&raw, "Response.View.0.Result").unwrap().len(), 2);
        assert!(results_array(&json!({}), "results").is_err());
        assert_eq!(results_array(&Value::Null, "results").unwrap().len(), 0);
    }
}
