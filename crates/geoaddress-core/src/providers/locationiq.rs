//! LocationIQ, a hosted Nominatim
//!
//! Responses use the Nominatim place schema, see
//! [`OsmPlaceMapping`](super::nominatim::OsmPlaceMapping).

use crate::descriptor::{Capability, ProviderDescriptor};

pub const NAME: &str = "locationiq";

pub fn descriptor() -> ProviderDescriptor {
    ProviderDescriptor::builder(NAME, "LocationIQ")
        .documentation_url("https://locationiq.com/docs")
        .site_url("https://locationiq.com")
        .required("LOCATIONIQ_API_KEY")
        .config_default("LOCATIONIQ_BASE_URL", "https://api.locationiq.com/v1")
        .capabilities([
            Capability::SearchAddresses,
            Capability::ReverseGeocode,
            Capability::GetAddressByOsm,
        ])
        .build()
}
