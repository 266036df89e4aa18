//! Google Geocoding API

use serde_json::Value;

use crate::descriptor::{Capability, ProviderDescriptor};
use crate::error::NormalizationError;
use crate::model::AddressFields;
use crate::normalize::mapping::{number_at, results_array, street_line, text_at};
use crate::normalize::FieldMapping;

pub const NAME: &str = "google";

pub fn descriptor() -> ProviderDescriptor {
    ProviderDescriptor::builder(NAME, "Google")
        .documentation_url("https://developers.google.com/maps/documentation/geocoding")
        .site_url("https://developers.google.com/maps")
        .required("GOOGLE_API_KEY")
        .capabilities([
            Capability::SearchAddresses,
            Capability::ReverseGeocode,
            Capability::GetAddressByReference,
        ])
        .build()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GoogleMapping;

/// Which part of a typed `address_components` entry to read
#[derive(Clone, Copy)]
enum Part {
    Long,
    Short,
}

/// First component carrying any of `types`, tried in order
fn component(result: &Value, types: &[&str], part: Part) -> Option<String> {
    let components = result.get("address_components")?.as_array()?;
    types.iter().find_map(|wanted| {
        components
            .iter()
            .find(|c| {
                c.get("types")
                    .and_then(Value::as_array)
                    .map_or(false, |ts| ts.iter().any(|t| t.as_str() == Some(*wanted)))
            })
            .and_then(|c| match part {
                Part::Long => text_at(c, "long_name"),
                Part::Short => text_at(c, "short_name"),
            })
    })
}

impl FieldMapping for GoogleMapping {
    fn records<'a>(&self, raw: &'a Value) -> Result<Vec<&'a Value>, NormalizationError> {
        match raw.get("status").and_then(Value::as_str) {
            Some("ZERO_RESULTS") => Ok(Vec::new()),
            Some("OK") | None => results_array(raw, "results"),
            Some(status) => Err(NormalizationError::provider_status(
                match raw.get("error_message").and_then(Value::as_str) {
                    Some(message) => format!("{} ({})", status, message),
                    None => status.to_string(),
                },
            )),
        }
    }

    fn map_record(&self, result: &Value) -> Result<AddressFields, NormalizationError> {
        Ok(AddressFields {
            text: text_at(result, "formatted_address"),
            reference: text_at(result, "place_id"),
            address_line1: street_line(
                component(result, &["street_number"], Part::Long),
                component(result, &["route"], Part::Long),
            ),
            address_line2: component(result, &["subpremise"], Part::Long),
            city: component(result, &["locality", "postal_town"], Part::Long),
            postal_code: component(result, &["postal_code"], Part::Long),
            state: component(result, &["administrative_area_level_1"], Part::Long),
            region: component(result, &["administrative_area_level_2"], Part::Long),
            country: component(result, &["country"], Part::Long),
            country_code: component(result, &["country"], Part::Short),
            municipality: component(result, &["administrative_area_level_3"], Part::Long),
            neighbourhood: component(result, &["neighborhood", "sublocality"], Part::Long),
            address_type: text_at(result, "types.0"),
            latitude: number_at(result, "geometry.location.lat", "latitude")?,
            longitude: number_at(result, "geometry.location.lng", "longitude")?,
            ..Default::default()
        })
    }
}
