//! Geoapify geocoding API

use serde_json::Value;

use super::geojson_coordinates;
use crate::descriptor::{Capability, ProviderDescriptor};
use crate::error::NormalizationError;
use crate::model::AddressFields;
use crate::normalize::mapping::{
    feature_collection, first_text, importance_at, number_at, street_line, text_at,
};
use crate::normalize::FieldMapping;

pub const NAME: &str = "geoapify";

pub fn descriptor() -> ProviderDescriptor {
    ProviderDescriptor::builder(NAME, "Geoapify")
        .documentation_url("https://apidocs.geoapify.com/docs/geocoding/")
        .site_url("https://www.geoapify.com")
        .required("GEOAPIFY_API_KEY")
        .config_default("GEOAPIFY_BASE_URL", "https://api.geoapify.com/v1")
        .capabilities([
            Capability::SearchAddresses,
            Capability::ReverseGeocode,
            Capability::GetAddressByReference,
        ])
        .build()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GeoapifyMapping;

impl FieldMapping for GeoapifyMapping {
    fn records<'a>(&self, raw: &'a Value) -> Result<Vec<&'a Value>, NormalizationError> {
        feature_collection(raw)
    }

    fn map_record(&self, feature: &Value) -> Result<AddressFields, NormalizationError> {
        // Properties carry their own lat/lon; geometry is the fallback
        let (geo_lat, geo_lon) = geojson_coordinates(feature)?;
        let latitude = number_at(feature, "properties.lat", "latitude")?.or(geo_lat);
        let longitude = number_at(feature, "properties.lon", "longitude")?.or(geo_lon);

        let address_line1 = text_at(feature, "properties.address_line1").or_else(|| {
            street_line(
                text_at(feature, "properties.housenumber"),
                text_at(feature, "properties.street"),
            )
        });

        Ok(AddressFields {
            text: text_at(feature, "properties.formatted"),
            reference: first_text(feature, &["properties.place_id", "id"]),
            address_line1,
            city: first_text(
                feature,
                &["properties.city", "properties.town", "properties.village"],
            ),
            postal_code: text_at(feature, "properties.postcode"),
            state: first_text(feature, &["properties.state", "properties.state_code"]),
            region: text_at(feature, "properties.region"),
            country: text_at(feature, "properties.country"),
            country_code: text_at(feature, "properties.country_code"),
            municipality: text_at(feature, "properties.municipality"),
            neighbourhood: first_text(
                feature,
                &[
                    "properties.neighbourhood",
                    "properties.suburb",
                    "properties.district",
                    "properties.quarter",
                ],
            ),
            address_type: first_text(
                feature,
                &["properties.type", "properties.result_type", "properties.category"],
            ),
            latitude,
            longitude,
            importance: importance_at(feature, "properties.rank.confidence"),
            ..Default::default()
        })
    }
}
