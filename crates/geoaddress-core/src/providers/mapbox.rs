//! Mapbox geocoding (v5 places)

use serde_json::Value;

use crate::descriptor::{Capability, ProviderDescriptor};
use crate::error::NormalizationError;
use crate::model::AddressFields;
use crate::normalize::mapping::{
    feature_collection, first_text, importance_at, number_at, street_line, text_at,
};
use crate::normalize::FieldMapping;

pub const NAME: &str = "mapbox";

pub fn descriptor() -> ProviderDescriptor {
    ProviderDescriptor::builder(NAME, "Mapbox")
        .documentation_url("https://docs.mapbox.com/api/search/geocoding/")
        .site_url("https://www.mapbox.com")
        .required("MAPBOX_ACCESS_TOKEN")
        .capabilities([
            Capability::SearchAddresses,
            Capability::ReverseGeocode,
            Capability::GetAddressByReference,
        ])
        .build()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MapboxMapping;

/// Context entries whose id starts with `prefix` (`place.123`, `region.9`)
fn context_entries<'a>(feature: &'a Value, prefix: &'a str) -> impl Iterator<Item = &'a Value> {
    feature
        .get("context")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(move |item| {
            item.get("id")
                .and_then(Value::as_str)
                .map_or(false, |id| id.starts_with(prefix))
        })
}

fn context_text(feature: &Value, prefix: &str) -> Option<String> {
    context_entries(feature, prefix).find_map(|item| text_at(item, "text"))
}

impl FieldMapping for MapboxMapping {
    fn records<'a>(&self, raw: &'a Value) -> Result<Vec<&'a Value>, NormalizationError> {
        feature_collection(raw)
    }

    fn map_record(&self, feature: &Value) -> Result<AddressFields, NormalizationError> {
        let address_line1 = text_at(feature, "properties.address")
            .or_else(|| {
                text_at(feature, "place_name")
                    .and_then(|name| name.split(',').next().map(|part| part.trim().to_string()))
            })
            .or_else(|| {
                street_line(
                    text_at(feature, "properties.address_number"),
                    text_at(feature, "properties.street"),
                )
            })
            .or_else(|| text_at(feature, "text"));

        // The first region is the state, a second one the wider region
        let mut regions = context_entries(feature, "region").filter_map(|item| text_at(item, "text"));
        let state = regions.next();
        let region = regions.next();

        let country = context_entries(feature, "country").next();

        let latitude = number_at(feature, "center.1", "latitude")?;
        let longitude = number_at(feature, "center.0", "longitude")?;
        let (latitude, longitude) = match (latitude, longitude) {
            (Some(lat), Some(lon)) => (Some(lat), Some(lon)),
            _ => super::geojson_coordinates(feature)?,
        };

        Ok(AddressFields {
            text: text_at(feature, "place_name"),
            reference: text_at(feature, "id"),
            address_line1,
            city: context_text(feature, "place"),
            postal_code: context_text(feature, "postcode"),
            state,
            region,
            country: country.and_then(|c| text_at(c, "text")),
            country_code: country.and_then(|c| text_at(c, "short_code")),
            municipality: context_text(feature, "district"),
            neighbourhood: context_text(feature, "neighborhood"),
            address_type: first_text(feature, &["properties.type", "place_type.0"]),
            latitude,
            longitude,
            importance: importance_at(feature, "relevance"),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature() -> Value {
        json!({
            "id": "address.4356035406756260",
            "type": "Feature",
            "place_type": ["address"],
            "relevance": 1,
            "properties": {"accuracy": "rooftop"},
            "text": "Pennsylvania Avenue Northwest",
            "place_name": "1600 Pennsylvania Avenue Northwest, Washington, District of Columbia 20500, United States",
            "center": [-77.036547, 38.897675],
            "geometry": {"type": "Point", "coordinates": [-77.036547, 38.897675]},
            "address": "1600",
            "context": [
                {"id": "neighborhood.2915", "text": "Downtown"},
                {"id": "postcode.13903", "text": "20500"},
                {"id": "place.15394", "text": "Washington"},
                {"id": "region.14064", "short_code": "US-DC", "text": "District of Columbia"},
                {"id": "country.9053", "short_code": "us", "text": "United States"}
            ]
        })
    }

    #[test]
    fn test_maps_context() {
        let fields = MapboxMapping.map_record(&feature()).unwrap();
        assert_eq!(fields.reference.as_deref(), Some("address.4356035406756260"));
        assert_eq!(
            fields.address_line1.as_deref(),
            Some("1600 Pennsylvania Avenue Northwest")
        );
        assert_eq!(fields.city.as_deref(), Some("Washington"));
        assert_eq!(fields.postal_code.as_deref(), Some("20500"));
        assert_eq!(fields.state.as_deref(), Some("District of Columbia"));
        assert_eq!(fields.region, None);
        assert_eq!(fields.neighbourhood.as_deref(), Some("Downtown"));
        assert_eq!(fields.country_code.as_deref(), Some("us"));
        assert_eq!(fields.address_type.as_deref(), Some("address"));
        assert_eq!(fields.latitude, Some(38.897675));
        assert_eq!(fields.importance, Some(1.0));
    }

    #[test]
    fn test_feature_collection() {
        let raw = json!({"type": "FeatureCollection", "query": ["nowhere"], "features": []});
        assert!(MapboxMapping.records(&raw).unwrap().is_empty());
    }
}
