//! Built-in provider catalogue
//!
//! Each module declares one provider's descriptor and the field mapping for
//! its native response shape. Network clients are not part of this crate;
//! pair a descriptor with any [`ProviderAdapter`](crate::ProviderAdapter)
//! through [`ProviderRegistry`](crate::ProviderRegistry).

pub mod geoapify;
pub mod geocode_earth;
pub mod google;
pub mod here;
pub mod locationiq;
pub mod mapbox;
pub mod maps_co;
pub mod nominatim;
pub mod opencage;
pub mod photon;

use serde_json::Value;
use std::sync::Arc;

use crate::descriptor::ProviderDescriptor;
use crate::error::NormalizationError;
use crate::normalize::mapping::number_at;
use crate::normalize::FieldMapping;

/// A built-in descriptor together with its field mapping
#[derive(Clone)]
pub struct BuiltinProvider {
    pub descriptor: ProviderDescriptor,
    pub mapping: Arc<dyn FieldMapping>,
}

impl std::fmt::Debug for BuiltinProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinProvider")
            .field("name", &self.descriptor.name())
            .finish()
    }
}

/// Every built-in provider, in default priority order
pub fn catalogue() -> Vec<BuiltinProvider> {
    vec![
        BuiltinProvider {
            descriptor: nominatim::descriptor(),
            mapping: Arc::new(nominatim::OsmPlaceMapping),
        },
        BuiltinProvider {
            descriptor: photon::descriptor(),
            mapping: Arc::new(photon::PhotonMapping),
        },
        BuiltinProvider {
            descriptor: locationiq::descriptor(),
            mapping: Arc::new(nominatim::OsmPlaceMapping),
        },
        BuiltinProvider {
            descriptor: opencage::descriptor(),
            mapping: Arc::new(opencage::OpenCageMapping),
        },
        BuiltinProvider {
            descriptor: geocode_earth::descriptor(),
            mapping: Arc::new(geocode_earth::PeliasMapping),
        },
        BuiltinProvider {
            descriptor: geoapify::descriptor(),
            mapping: Arc::new(geoapify::GeoapifyMapping),
        },
        BuiltinProvider {
            descriptor: maps_co::descriptor(),
            mapping: Arc::new(nominatim::OsmPlaceMapping),
        },
        BuiltinProvider {
            descriptor: google::descriptor(),
            mapping: Arc::new(google::GoogleMapping),
        },
        BuiltinProvider {
            descriptor: mapbox::descriptor(),
            mapping: Arc::new(mapbox::MapboxMapping),
        },
        BuiltinProvider {
            descriptor: here::descriptor(),
            mapping: Arc::new(here::HereMapping),
        },
    ]
}

/// Look up a built-in provider by name
pub fn find(name: &str) -> Option<BuiltinProvider> {
    catalogue()
        .into_iter()
        .find(|provider| provider.descriptor.name() == name)
}

/// `[lon, lat]` from a GeoJSON point geometry
pub(crate) fn geojson_coordinates(
    feature: &Value,
) -> Result<(Option<f64>, Option<f64>), NormalizationError> {
    let latitude = number_at(feature, "geometry.coordinates.1", "latitude")?;
    let longitude = number_at(feature, "geometry.coordinates.0", "longitude")?;
    Ok((latitude, longitude))
}
