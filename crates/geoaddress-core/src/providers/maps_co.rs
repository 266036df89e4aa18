//! Maps.co geocoding API
//!
//! Responses use the Nominatim place schema.

use crate::descriptor::{Capability, ProviderDescriptor};

pub const NAME: &str = "maps_co";

pub fn descriptor() -> ProviderDescriptor {
    ProviderDescriptor::builder(NAME, "Maps.co")
        .documentation_url("https://geocode.maps.co/docs/")
        .site_url("https://geocode.maps.co")
        .required("MAPS_CO_API_KEY")
        .config_default("MAPS_CO_BASE_URL", "https://geocode.maps.co")
        .capabilities([
            Capability::SearchAddresses,
            Capability::ReverseGeocode,
            Capability::GetAddressByOsm,
        ])
        .build()
}
