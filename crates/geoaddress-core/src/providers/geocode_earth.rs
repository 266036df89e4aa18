//! Geocode Earth, a hosted Pelias

use serde_json::Value;

use super::geojson_coordinates;
use crate::descriptor::{Capability, ProviderDescriptor};
use crate::error::NormalizationError;
use crate::model::AddressFields;
use crate::normalize::mapping::{
    feature_collection, first_text, importance_at, street_line, text_at,
};
use crate::normalize::FieldMapping;

pub const NAME: &str = "geocode_earth";

pub fn descriptor() -> ProviderDescriptor {
    ProviderDescriptor::builder(NAME, "Geocode Earth")
        .documentation_url("https://geocode.earth/docs")
        .site_url("https://geocode.earth")
        .required("GEOCODE_EARTH_API_KEY")
        .config_default("GEOCODE_EARTH_BASE_URL", "https://api.geocode.earth/v1")
        .capabilities([
            Capability::SearchAddresses,
            Capability::ReverseGeocode,
            Capability::GetAddressByReference,
        ])
        .build()
}

/// Pelias GeoJSON features
#[derive(Debug, Clone, Copy, Default)]
pub struct PeliasMapping;

impl FieldMapping for PeliasMapping {
    fn records<'a>(&self, raw: &'a Value) -> Result<Vec<&'a Value>, NormalizationError> {
        feature_collection(raw)
    }

    fn map_record(&self, feature: &Value) -> Result<AddressFields, NormalizationError> {
        let (latitude, longitude) = geojson_coordinates(feature)?;
        let address_line1 = street_line(
            text_at(feature, "properties.housenumber"),
            text_at(feature, "properties.street"),
        )
        .or_else(|| text_at(feature, "properties.name"));

        Ok(AddressFields {
            text: text_at(feature, "properties.label"),
            reference: first_text(feature, &["properties.gid", "id"]),
            address_line1,
            city: first_text(
                feature,
                &["properties.locality", "properties.localadmin", "properties.county"],
            ),
            postal_code: text_at(feature, "properties.postalcode"),
            state: text_at(feature, "properties.state"),
            region: text_at(feature, "properties.region"),
            country: text_at(feature, "properties.country"),
            // country_a is ISO alpha-3 and is dropped by the normalizer
            country_code: first_text(feature, &["properties.country_code", "properties.country_a"]),
            municipality: text_at(feature, "properties.municipality"),
            neighbourhood: first_text(
                feature,
                &[
                    "properties.neighbourhood",
                    "properties.suburb",
                    "properties.district",
                ],
            ),
            address_type: first_text(feature, &["properties.layer", "properties.type"]),
            latitude,
            longitude,
            importance: importance_at(feature, "properties.confidence"),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_maps_feature() {
        let feature = json!({
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [-73.9857, 40.7484]},
            "properties": {
                "gid": "openaddresses:address:us/ny/city_of_new_york:abc",
                "layer": "address", "name": "350 5th Avenue",
                "housenumber": "350", "street": "5th Avenue", "postalcode": "10118",
                "locality": "New York", "region": "New York", "country": "United States",
                "country_a": "USA", "country_code": "US", "confidence": 1,
                "label": "350 5th Avenue, New York, NY, USA"
            }
        });
        let fields = PeliasMapping.map_record(&feature).unwrap();
        assert_eq!(
            fields.reference.as_deref(),
            Some("openaddresses:address:us/ny/city_of_new_york:abc")
        );
        assert_eq!(fields.address_line1.as_deref(), Some("350 5th Avenue"));
        assert_eq!(fields.city.as_deref(), Some("New York"));
        assert_eq!(fields.country_code.as_deref(), Some("US"));
        assert_eq!(fields.address_type.as_deref(), Some("address"));
        assert_eq!(fields.importance, Some(1.0));
        assert_eq!(fields.latitude, Some(40.7484));
    }

    #[test]
    fn test_name_fallback_for_venues() {
        let feature = json!({
            "geometry": {"coordinates": [0.0, 0.0]},
            "properties": {"name": "Null Island", "layer": "venue"}
        });
        let fields = PeliasMapping.map_record(&feature).unwrap();
        assert_eq!(fields.address_line1.as_deref(), Some("Null Island"));
        assert_eq!(fields.reference, None);
    }
}
