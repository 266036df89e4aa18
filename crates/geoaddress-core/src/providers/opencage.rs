//! OpenCage geocoding API

use serde_json::Value;

use crate::descriptor::{Capability, ProviderDescriptor};
use crate::error::NormalizationError;
use crate::model::AddressFields;
use crate::normalize::mapping::{first_text, number_at, results_array, street_line, text_at};
use crate::normalize::FieldMapping;

pub const NAME: &str = "opencage";

/// OpenCage rates confidence from 0 to 10
const CONFIDENCE_SCALE: f64 = 10.0;

pub fn descriptor() -> ProviderDescriptor {
    ProviderDescriptor::builder(NAME, "OpenCage")
        .documentation_url("https://opencagedata.com/api")
        .site_url("https://opencagedata.com")
        .required("OPENCAGE_API_KEY")
        .config_default("OPENCAGE_BASE_URL", "https://api.opencagedata.com/geocode/v1")
        .capabilities([Capability::SearchAddresses, Capability::ReverseGeocode])
        .build()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OpenCageMapping;

impl FieldMapping for OpenCageMapping {
    fn records<'a>(&self, raw: &'a Value) -> Result<Vec<&'a Value>, NormalizationError> {
        results_array(raw, "results")
    }

    fn map_record(&self, result: &Value) -> Result<AddressFields, NormalizationError> {
        let formatted = text_at(result, "formatted");
        let address_line1 = street_line(
            text_at(result, "components.house_number"),
            text_at(result, "components.road"),
        )
        .or_else(|| {
            formatted
                .as_deref()
                .and_then(|f| f.split(',').next())
                .map(|part| part.trim().to_string())
        });

        // Halved so the normalizer's doubling maps 10/10 to full confidence
        let importance = number_at(result, "confidence", "confidence")
            .ok()
            .flatten()
            .map(|c| c / CONFIDENCE_SCALE / 2.0);

        Ok(AddressFields {
            text: formatted,
            reference: text_at(result, "annotations.geohash"),
            address_line1,
            city: first_text(
                result,
                &["components.city", "components.town", "components.village"],
            ),
            postal_code: text_at(result, "components.postcode"),
            state: first_text(result, &["components.state", "components.state_district"]),
            region: text_at(result, "components.region"),
            country: text_at(result, "components.country"),
            country_code: text_at(result, "components.country_code"),
            municipality: text_at(result, "components.municipality"),
            neighbourhood: first_text(
                result,
                &[
                    "components.suburb",
                    "components.neighbourhood",
                    "components.quarter",
                    "components.district",
                ],
            ),
            address_type: text_at(result, "components._type"),
            latitude: number_at(result, "geometry.lat", "latitude")?,
            longitude: number_at(result, "geometry.lng", "longitude")?,
            importance,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_maps_result() {
        let raw = json!({
            "results": [{
                "annotations": {"geohash": "u09tvw0f64r7"},
                "components": {
                    "_type": "building", "house_number": "8", "road": "Rue de Rivoli",
                    "city": "Paris", "postcode": "75004", "state": "Île-de-France",
                    "country": "France", "country_code": "fr", "suburb": "Le Marais"
                },
                "confidence": 10,
                "formatted": "8 Rue de Rivoli, 75004 Paris, France",
                "geometry": {"lat": 48.8556, "lng": 2.3592}
            }],
            "status": {"code": 200, "message": "OK"},
            "total_results": 1
        });
        let records = OpenCageMapping.records(&raw).unwrap();
        let fields = OpenCageMapping.map_record(records[0]).unwrap();
        assert_eq!(fields.reference.as_deref(), Some("u09tvw0f64r7"));
        assert_eq!(fields.address_line1.as_deref(), Some("8 Rue de Rivoli"));
        assert_eq!(fields.neighbourhood.as_deref(), Some("Le Marais"));
        assert_eq!(fields.address_type.as_deref(), Some("building"));
        assert_eq!(fields.longitude, Some(2.3592));
        assert_eq!(fields.importance, Some(0.5));
    }

    #[test]
    fn test_formatted_fallback_and_empty() {
        let result = json!({"formatted": "Atlantic Ocean, somewhere", "components": {}});
        let fields = OpenCageMapping.map_record(&result).unwrap();
        assert_eq!(fields.address_line1.as_deref(), Some("Atlantic Ocean"));

        let raw = json!({"results": [], "total_results": 0});
        assert!(OpenCageMapping.records(&raw).unwrap().is_empty());
    }
}
