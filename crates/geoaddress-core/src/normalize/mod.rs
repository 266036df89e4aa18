//! Normalization of provider responses into [`AddressRecord`]s
//!
//! The [`Normalizer`] is a pure transform: the provider's [`FieldMapping`]
//! extracts fields, then the normalizer blanks empty strings, validates
//! coordinates, derives `text`, scores and `geoaddress_id`, and stamps the
//! provider identity.

pub mod mapping;
pub mod scoring;

pub use mapping::FieldMapping;

use serde_json::Value;
use std::sync::Arc;

use crate::error::NormalizationError;
use crate::model::{AddressFields, AddressRecord};
use crate::request::{Point, Request};

/// Search context used for relevance scoring
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringContext {
    pub query: Option<String>,
    pub proximity: Option<Point>,
}

impl ScoringContext {
    /// Relevance is only scored for searches
    pub fn from_request(request: &Request) -> Self {
        match request {
            Request::SearchAddresses { query, proximity } => Self {
                query: Some(query.clone()),
                proximity: *proximity,
            },
            _ => Self::default(),
        }
    }

    pub fn search(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            proximity: None,
        }
    }
}

/// Maps one provider's raw responses onto the canonical schema
#[derive(Clone)]
pub struct Normalizer {
    backend_name: String,
    backend: String,
    mapping: Arc<dyn FieldMapping>,
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer")
            .field("backend_name", &self.backend_name)
            .field("backend", &self.backend)
            .finish()
    }
}

impl Normalizer {
    pub fn new(
        backend_name: impl Into<String>,
        backend: impl Into<String>,
        mapping: Arc<dyn FieldMapping>,
    ) -> Self {
        Self {
            backend_name: backend_name.into(),
            backend: backend.into(),
            mapping,
        }
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    /// Normalize a raw response; "no results" yields an empty list
    pub fn normalize(
        &self,
        raw: &Value,
        context: &ScoringContext,
    ) -> Result<Vec<AddressRecord>, NormalizationError> {
        self.mapping
            .records(raw)?
            .into_iter()
            .map(|record| self.normalize_record(record, context))
            .collect()
    }

    /// Normalize a single native record
    pub fn normalize_record(
        &self,
        record: &Value,
        context: &ScoringContext,
    ) -> Result<AddressRecord, NormalizationError> {
        let fields = clean(self.mapping.map_record(record)?)?;
        Ok(self.build(fields, context))
    }

    fn build(&self, fields: AddressFields, context: &ScoringContext) -> AddressRecord {
        let confidence = scoring::confidence(&fields);
        let relevance = context
            .query
            .as_deref()
            .and_then(|query| scoring::relevance(query, context.proximity, &fields));
        let geoaddress_id = fields
            .reference
            .as_ref()
            .map(|reference| format!("{}-{}", self.backend_name, reference));

        let mut record = AddressRecord {
            text: fields.text,
            reference: fields.reference,
            address_line1: fields.address_line1,
            address_line2: fields.address_line2,
            address_line3: fields.address_line3,
            city: fields.city,
            postal_code: fields.postal_code,
            state: fields.state,
            region: fields.region,
            country: fields.country,
            country_code: fields.country_code,
            municipality: fields.municipality,
            neighbourhood: fields.neighbourhood,
            address_type: fields.address_type,
            latitude: fields.latitude,
            longitude: fields.longitude,
            osm_id: fields.osm_id,
            osm_type: fields.osm_type,
            confidence,
            relevance,
            backend: self.backend.clone(),
            backend_name: self.backend_name.clone(),
            geoaddress_id,
        };
        if record.text.is_none() {
            record.text = record.formatted();
        }
        record
    }
}

fn blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Blank empty strings and enforce coordinate invariants
fn clean(fields: AddressFields) -> Result<AddressFields, NormalizationError> {
    let latitude = check_coordinate("latitude", fields.latitude, 90.0)?;
    let longitude = check_coordinate("longitude", fields.longitude, 180.0)?;
    if latitude.is_some() != longitude.is_some() {
        return Err(NormalizationError::malformed(
            "latitude and longitude must be present together",
        ));
    }

    let country_code = blank(fields.country_code)
        .map(|code| code.to_uppercase())
        .filter(|code| code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()));

    Ok(AddressFields {
        text: blank(fields.text),
        reference: blank(fields.reference),
        address_line1: blank(fields.address_line1),
        address_line2: blank(fields.address_line2),
        address_line3: blank(fields.address_line3),
        city: blank(fields.city),
        postal_code: blank(fields.postal_code),
        state: blank(fields.state),
        region: blank(fields.region),
        country: blank(fields.country),
        country_code,
        municipality: blank(fields.municipality),
        neighbourhood: blank(fields.neighbourhood),
        address_type: blank(fields.address_type),
        latitude,
        longitude,
        osm_id: blank(fields.osm_id),
        osm_type: blank(fields.osm_type),
        importance: fields.importance,
    })
}

fn check_coordinate(
    field: &'static str,
    value: Option<f64>,
    bound: f64,
) -> Result<Option<f64>, NormalizationError> {
    match value {
        Some(v) if !v.is_finite() || v.abs() > bound => {
            Err(NormalizationError::OutOfRange { field, value: v })
        }
        other => Ok(other),
    }
}
