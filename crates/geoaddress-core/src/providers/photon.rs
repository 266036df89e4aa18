//! Photon (komoot), OpenStreetMap-backed GeoJSON search

use serde_json::Value;

use super::geojson_coordinates;
use crate::descriptor::{Capability, ProviderDescriptor};
use crate::error::NormalizationError;
use crate::model::AddressFields;
use crate::normalize::mapping::{
    feature_collection, first_text, importance_at, osm_address_type, street_line, text_at,
};
use crate::normalize::FieldMapping;

pub const NAME: &str = "photon";

pub fn descriptor() -> ProviderDescriptor {
    ProviderDescriptor::builder(NAME, "Photon")
        .documentation_url("https://photon.komoot.io/docs")
        .site_url("https://photon.komoot.io")
        .config_default("PHOTON_BASE_URL", "https://photon.komoot.io")
        .config_default("PHOTON_USER_AGENT", "geoaddress-rs/0.1")
        .capabilities([Capability::SearchAddresses, Capability::ReverseGeocode])
        .build()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PhotonMapping;

impl FieldMapping for PhotonMapping {
    fn records<'a>(&self, raw: &'a Value) -> Result<Vec<&'a Value>, NormalizationError> {
        feature_collection(raw)
    }

    fn map_record(&self, feature: &Value) -> Result<AddressFields, NormalizationError> {
        let (latitude, longitude) = geojson_coordinates(feature)?;
        let osm_id = text_at(feature, "properties.osm_id");
        let osm_type = text_at(feature, "properties.osm_type");
        let reference = match (&osm_type, &osm_id) {
            (Some(kind), Some(id)) => Some(format!("{}:{}", kind, id)),
            _ => None,
        };

        Ok(AddressFields {
            reference,
            address_line1: street_line(
                text_at(feature, "properties.housenumber"),
                text_at(feature, "properties.street"),
            ),
            city: first_text(
                feature,
                &["properties.city", "properties.town", "properties.village"],
            ),
            postal_code: text_at(feature, "properties.postcode"),
            state: text_at(feature, "properties.state"),
            region: text_at(feature, "properties.region"),
            country: text_at(feature, "properties.country"),
            country_code: text_at(feature, "properties.countrycode"),
            municipality: text_at(feature, "properties.municipality"),
            neighbourhood: first_text(
                feature,
                &[
                    "properties.district",
                    "properties.suburb",
                    "properties.quarter",
                    "properties.neighbourhood",
                ],
            ),
            address_type: osm_address_type(
                text_at(feature, "properties.osm_key"),
                text_at(feature, "properties.osm_value"),
            ),
            latitude,
            longitude,
            osm_id,
            osm_type,
            importance: importance_at(feature, "properties.importance"),
            ..Default::default()
        })
    }
}
