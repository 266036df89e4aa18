//! Nominatim (OpenStreetMap)
//!
//! [`OsmPlaceMapping`] also serves LocationIQ and Maps.co, which expose the
//! same place schema.

use serde_json::Value;

use crate::descriptor::{Capability, ProviderDescriptor};
use crate::error::NormalizationError;
use crate::model::{join_components, AddressFields};
use crate::normalize::mapping::{
    first_text, importance_at, number_at, osm_address_type, street_line, text_at,
};
use crate::normalize::FieldMapping;

pub const NAME: &str = "nominatim";

pub fn descriptor() -> ProviderDescriptor {
    ProviderDescriptor::builder(NAME, "Nominatim")
        .documentation_url("https://nominatim.org/release-docs/develop/api/Overview/")
        .site_url("https://nominatim.org")
        .config_default("NOMINATIM_BASE_URL", "https://nominatim.openstreetmap.org")
        .config_default("NOMINATIM_USER_AGENT", "geoaddress-rs/0.1")
        .required("NOMINATIM_USER_AGENT")
        .capabilities(Capability::ALL)
        .build()
}

/// Nominatim-style place objects (`place_id`, `address.*`, `lat`/`lon` strings)
#[derive(Debug, Clone, Copy, Default)]
pub struct OsmPlaceMapping;

impl FieldMapping for OsmPlaceMapping {
    fn records<'a>(&self, raw: &'a Value) -> Result<Vec<&'a Value>, NormalizationError> {
        match raw {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => Ok(items.iter().collect()),
            // Reverse lookups answer {"error": "Unable to geocode"} for open water
            Value::Object(map) if map.contains_key("error") && !map.contains_key("lat") => {
                Ok(Vec::new())
            }
            Value::Object(_) => Ok(vec![raw]),
            _ => Err(NormalizationError::malformed(
                "expected a place object or a list of places",
            )),
        }
    }

    fn map_record(&self, record: &Value) -> Result<AddressFields, NormalizationError> {
        let address_line1 = street_line(
            text_at(record, "address.house_number"),
            text_at(record, "address.road"),
        );
        let city = first_text(record, &["address.city", "address.town", "address.village"]);
        let postal_code = text_at(record, "address.postcode");
        let state = first_text(record, &["address.state", "address.province"]);
        let country_code = text_at(record, "address.country_code");

        let has_components = join_components(&[
            address_line1.as_deref(),
            city.as_deref(),
            postal_code.as_deref(),
            state.as_deref(),
            country_code.as_deref(),
        ])
        .is_some();

        Ok(AddressFields {
            text: if has_components {
                None
            } else {
                text_at(record, "display_name")
            },
            reference: first_text(record, &["place_id", "osm_id"]),
            address_line1,
            city,
            postal_code,
            state,
            region: text_at(record, "address.region"),
            country: text_at(record, "address.country"),
            country_code,
            municipality: text_at(record, "address.municipality"),
            neighbourhood: first_text(
                record,
                &["address.quarter", "address.neighbourhood", "address.suburb"],
            ),
            address_type: osm_address_type(
                first_text(record, &["class", "category"]),
                text_at(record, "type"),
            ),
            latitude: number_at(record, "lat", "latitude")?,
            longitude: number_at(record, "lon", "longitude")?,
            osm_id: text_at(record, "osm_id"),
            osm_type: text_at(record, "osm_type").map(|t| t.to_uppercase()),
            importance: importance_at(record, "importance"),
            ..Default::default()
        })
    }
}
