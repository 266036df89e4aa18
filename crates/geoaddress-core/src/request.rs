//! Operation arguments
//!
//! A [`Request`] is the tagged form of one logical operation call. The
//! dispatcher routes on its [`Capability`] and hands it, unchanged, to the
//! adapter of each candidate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::descriptor::Capability;
use crate::error::DispatchError;

/// A WGS84 coordinate pair, validated on construction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

impl Point {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, DispatchError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(DispatchError::invalid_request(format!(
                "latitude must be within [-90, 90], got {}",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(DispatchError::invalid_request(format!(
                "longitude must be within [-180, 180], got {}",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Parses `"lat,lon"`
impl FromStr for Point {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s.split_once(',').ok_or_else(|| {
            DispatchError::invalid_request(format!("expected 'lat,lon', got '{}'", s))
        })?;
        let parse = |part: &str| {
            part.trim().parse::<f64>().map_err(|_| {
                DispatchError::invalid_request(format!("'{}' is not a number", part.trim()))
            })
        };
        Point::new(parse(lat)?, parse(lon)?)
    }
}

/// OpenStreetMap element kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OsmType {
    #[serde(rename = "N")]
    Node,
    #[serde(rename = "W")]
    Way,
    #[serde(rename = "R")]
    Relation,
}

impl OsmType {
    /// Single-letter form used by OSM lookup endpoints (`N123`, `W45`, `R6`)
    pub fn letter(&self) -> char {
        match self {
            OsmType::Node => 'N',
            OsmType::Way => 'W',
            OsmType::Relation => 'R',
        }
    }
}

impl fmt::Display for OsmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for OsmType {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "n" | "node" => Ok(OsmType::Node),
            "w" | "way" => Ok(OsmType::Way),
            "r" | "relation" => Ok(OsmType::Relation),
            other => Err(DispatchError::invalid_request(format!(
                "osm_type must be one of N, W, R (node, way, relation), got '{}'",
                other
            ))),
        }
    }
}

/// How an OSM lookup identifies its target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsmLookup {
    /// A single element by id and kind
    Element { osm_id: u64, osm_type: OsmType },
    /// Places matching every tag (`place=city`, `name=Paris`)
    Tags(BTreeMap<String, String>),
}

impl OsmLookup {
    /// Parse an element reference from loosely typed caller input
    pub fn element(osm_id: &str, osm_type: &str) -> Result<Self, DispatchError> {
        let osm_id = osm_id.trim().parse::<u64>().map_err(|_| {
            DispatchError::invalid_request(format!("osm_id must be a positive integer, got '{}'", osm_id))
        })?;
        if osm_id == 0 {
            return Err(DispatchError::invalid_request("osm_id must be a positive integer, got '0'"));
        }
        Ok(OsmLookup::Element {
            osm_id,
            osm_type: osm_type.parse()?,
        })
    }

    /// Collect tag pairs, dropping entries with an empty key or value
    pub fn tags<I, K, V>(pairs: I) -> Result<Self, DispatchError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let tags: BTreeMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into().trim().to_string(), v.into().trim().to_string()))
            .filter(|(k, v)| !k.is_empty() && !v.is_empty())
            .collect();
        if tags.is_empty() {
            return Err(DispatchError::invalid_request(
                "at least one non-empty OSM tag is required",
            ));
        }
        Ok(OsmLookup::Tags(tags))
    }
}

/// One logical operation together with its arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Request {
    SearchAddresses {
        query: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        proximity: Option<Point>,
    },
    GetAddressByReference {
        reference: String,
    },
    ReverseGeocode {
        latitude: f64,
        longitude: f64,
    },
    GetAddressByOsm {
        lookup: OsmLookup,
    },
}

impl Request {
    pub fn search(query: impl Into<String>) -> Self {
        Request::SearchAddresses {
            query: query.into(),
            proximity: None,
        }
    }

    pub fn search_near(query: impl Into<String>, proximity: Point) -> Self {
        Request::SearchAddresses {
            query: query.into(),
            proximity: Some(proximity),
        }
    }

    pub fn reference(reference: impl Into<String>) -> Self {
        Request::GetAddressByReference {
            reference: reference.into(),
        }
    }

    pub fn reverse(latitude: f64, longitude: f64) -> Self {
        Request::ReverseGeocode {
            latitude,
            longitude,
        }
    }

    pub fn osm(lookup: OsmLookup) -> Self {
        Request::GetAddressByOsm { lookup }
    }

    /// The capability a provider needs to serve this request
    pub fn capability(&self) -> Capability {
        match self {
            Request::SearchAddresses { .. } => Capability::SearchAddresses,
            Request::GetAddressByReference { .. } => Capability::GetAddressByReference,
            Request::ReverseGeocode { .. } => Capability::ReverseGeocode,
            Request::GetAddressByOsm { .. } => Capability::GetAddressByOsm,
        }
    }

    /// Reject arguments no provider could serve
    pub fn validate(&self) -> Result<(), DispatchError> {
        match self {
            Request::SearchAddresses { query, .. } if query.trim().is_empty() => {
                Err(DispatchError::invalid_request("search query must not be empty"))
            }
            Request::GetAddressByReference { reference } if reference.trim().is_empty() => {
                Err(DispatchError::invalid_request("reference must not be empty"))
            }
            Request::ReverseGeocode {
                latitude,
                longitude,
            } => Point::new(*latitude, *longitude).map(|_| ()),
            Request::GetAddressByOsm {
                lookup: OsmLookup::Tags(tags),
            } if tags.is_empty() => Err(DispatchError::invalid_request(
                "at least one non-empty OSM tag is required",
            )),
            _ => Ok(()),
        }
    }
}
