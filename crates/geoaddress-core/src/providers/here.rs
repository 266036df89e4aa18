//! HERE Geocoder API 6.2

use serde_json::Value;

use crate::descriptor::{Capability, ProviderDescriptor};
use crate::error::NormalizationError;
use crate::model::AddressFields;
use crate::normalize::mapping::{first_text, number_at, results_array, street_line, text_at};
use crate::normalize::FieldMapping;

pub const NAME: &str = "here";

pub fn descriptor() -> ProviderDescriptor {
    ProviderDescriptor::builder(NAME, "Here")
        .documentation_url("https://developer.here.com/documentation/geocoding-search-api")
        .site_url("https://developer.here.com")
        .required("HERE_APP_ID")
        .required("HERE_APP_CODE")
        .capabilities([
            Capability::SearchAddresses,
            Capability::ReverseGeocode,
            Capability::GetAddressByReference,
        ])
        .build()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HereMapping;

impl FieldMapping for HereMapping {
    fn records<'a>(&self, raw: &'a Value) -> Result<Vec<&'a Value>, NormalizationError> {
        let views = results_array(raw, "Response.View")?;
        let mut results = Vec::new();
        for view in views {
            results.extend(results_array(view, "Result")?);
        }
        Ok(results)
    }

    fn map_record(&self, result: &Value) -> Result<AddressFields, NormalizationError> {
        // Relevance is already a 0..1 confidence; halve it for the normalizer's doubling
        let importance = number_at(result, "Relevance", "relevance")
            .ok()
            .flatten()
            .map(|r| r / 2.0);

        Ok(AddressFields {
            text: text_at(result, "Location.Address.Label"),
            reference: text_at(result, "Location.LocationId"),
            address_line1: street_line(
                text_at(result, "Location.Address.HouseNumber"),
                text_at(result, "Location.Address.Street"),
            ),
            city: text_at(result, "Location.Address.City"),
            postal_code: text_at(result, "Location.Address.PostalCode"),
            state: text_at(result, "Location.Address.State"),
            region: first_text(result, &["Location.Address.County", "Location.Address.Region"]),
            country: text_at(result, "Location.Address.Country"),
            // HERE reports alpha-3 here; the normalizer keeps only alpha-2 codes
            country_code: text_at(result, "Location.Address.Country"),
            municipality: first_text(
                result,
                &["Location.Address.Municipality", "Location.Address.District"],
            ),
            neighbourhood: first_text(
                result,
                &["Location.Address.Subdistrict", "Location.Address.Neighborhood"],
            ),
            address_type: first_text(result, &["MatchLevel", "Location.LocationType"]),
            latitude: number_at(result, "Location.DisplayPosition.Latitude", "latitude")?,
            longitude: number_at(result, "Location.DisplayPosition.Longitude", "longitude")?,
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
    fn test_maps_nested_views() {
        let raw = json!({
            "Response": {"View": [{"Result": [{
                "Relevance": 1.0,
                "MatchLevel": "houseNumber",
                "Location": {
                    "LocationId": "NT_nL.dzNwdSJgdcF4U8dYEiC_yADM",
                    "DisplayPosition": {"Latitude": 41.88432, "Longitude": -87.63877},
                    "Address": {
                        "Label": "425 W Randolph St, Chicago, IL 60606, United States",
                        "Country": "USA", "State": "IL", "County": "Cook",
                        "City": "Chicago", "District": "West Loop", "Street": "W Randolph St",
                        "HouseNumber": "425", "PostalCode": "60606"
                    }
                }
            }]}]}
        });
        let records = HereMapping.records(&raw).unwrap();
        assert_eq!(records.len(), 1);

        let fields = HereMapping.map_record(records[0]).unwrap();
        assert_eq!(fields.reference.as_deref(), Some("NT_nL.dzNwdSJgdcF4U8dYEiC_yADM"));
        assert_eq!(fields.address_line1.as_deref(), Some("425 W Randolph St"));
        assert_eq!(fields.municipality.as_deref(), Some("West Loop"));
        assert_eq!(fields.region.as_deref(), Some("Cook"));
        assert_eq!(fields.address_type.as_deref(), Some("houseNumber"));
        assert_eq!(fields.latitude, Some(41.88432));
        assert_eq!(fields.importance, Some(0.5));
    }

    #[test]
    fn test_empty_view_list() {
        let raw = json!({"Response": {"View": []}});
        assert!(HereMapping.records(&raw).unwrap().is_empty());
    }
}
