//! Canonical address schema

use serde::Serialize;
use serde_json::Value;

/// The canonical, provider-agnostic result
///
/// Every field is always serialized; unavailable values are explicit `null`.
/// Records are built by the [`Normalizer`](crate::normalize::Normalizer) only,
/// which is why the struct is `#[non_exhaustive]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub struct AddressRecord {
    pub text: Option<String>,
    pub reference: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub address_line3: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub state: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    /// ISO 3166-1 alpha-2, upper case
    pub country_code: Option<String>,
    pub municipality: Option<String>,
    pub neighbourhood: Option<String>,
    pub address_type: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub osm_id: Option<String>,
    pub osm_type: Option<String>,
    /// 0 to 100
    pub confidence: Option<f64>,
    /// 0 to 100, search results only
    pub relevance: Option<f64>,
    /// Human-readable provider name
    pub backend: String,
    /// Stable provider identifier
    pub backend_name: String,
    /// `{backend_name}-{reference}` when a reference exists
    pub geoaddress_id: Option<String>,
}

impl AddressRecord {
    /// Serialized field names, in schema order
    pub const FIELD_NAMES: [&'static str; 23] = [
        "text",
        "reference",
        "address_line1",
        "address_line2",
        "address_line3",
        "city",
        "postal_code",
        "state",
        "region",
        "country",
        "country_code",
        "municipality",
        "neighbourhood",
        "address_type",
        "latitude",
        "longitude",
        "osm_id",
        "osm_type",
        "confidence",
        "relevance",
        "backend",
        "backend_name",
        "geoaddress_id",
    ];

    /// Components joined into a single display line
    pub fn formatted(&self) -> Option<String> {
        join_components(&[
            self.address_line1.as_deref(),
            self.address_line2.as_deref(),
            self.address_line3.as_deref(),
            self.city.as_deref(),
            self.postal_code.as_deref(),
            self.state.as_deref(),
            self.country_code.as_deref(),
        ])
    }
}

/// Fields a provider mapping can produce for one native record
///
/// This is deliberately narrower than [`AddressRecord`]: provider identity,
/// scores and `geoaddress_id` are always derived by the normalizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressFields {
    pub text: Option<String>,
    pub reference: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub address_line3: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub state: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub municipality: Option<String>,
    pub neighbourhood: Option<String>,
    pub address_type: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub osm_id: Option<String>,
    pub osm_type: Option<String>,
    /// Provider-native quality score, usually 0 to 1
    pub importance: Option<f64>,
}

/// A provider's native response, returned untouched
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawResponse {
    /// Registry name of the provider that answered
    pub provider: String,
    pub response: Value,
}

pub(crate) fn join_components(parts: &[Option<&str>]) -> Option<String> {
    let joined = parts
        .iter()
        .flatten()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_components_skips_blanks() {
        assert_eq!(
            join_components(&[Some("10 Downing Street"), None, Some(" "), Some("London")]),
            Some("10 Downing Street, London".to_string())
        );
        assert_eq!(join_components(&[None, Some("")]), None);
    }

    #[test]
    fn test_field_names_are_unique() {
        let mut names = AddressRecord::FIELD_NAMES.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), AddressRecord::FIELD_NAMES.len());
    }
}
