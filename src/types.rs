use geo::MultiPolygon;
use geojson::Feature;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A `null` reads the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub party: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub votes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub mla: String,
    #[serde(default)]
    pub party: Option<String>, // short code, keys into PARTY_COLORS
    #[serde(default, deserialize_with = "null_as_default")]
    pub party_full: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub votes: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub percentage: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_votes: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub all_candidates: Vec<Candidate>,
}

impl ElectionResult {
    /// Party code, treating an empty string the same as an absent one.
    pub fn party(&self) -> Option<&str> {
        self.party.as_deref().filter(|p| !p.is_empty())
    }
}

// Map<JoinKey, Result>
pub type ResultStore = HashMap<String, ElectionResult>;

/// Read-only view over the properties of a district boundary feature.
#[derive(Debug, Clone, Copy)]
pub struct District<'a> {
    feature: &'a Feature,
}

pub const PROP_ID: &str = "DIST_ID";
pub const PROP_NAME: &str = "PED_Names_B";
pub const PROP_LABEL: &str = "LabelField";
pub const PROP_AREA: &str = "Shape_Area";
pub const PROP_LENGTH: &str = "Shape_Length";

impl<'a> District<'a> {
    pub fn new(feature: &'a Feature) -> Self {
        Self { feature }
    }

    fn prop(&self, name: &str) -> Option<&'a Value> {
        self.feature
            .properties
            .as_ref()
            .and_then(|props| props.get(name))
            .filter(|v| !v.is_null())
    }

    /// District number as its decimal string.
    pub fn id(&self) -> Option<String> {
        match self.prop(PROP_ID)? {
            Value::Number(n) => match n.as_u64() {
                Some(i) => Some(i.to_string()),
                None => n.as_f64().map(|f| f.to_string()),
            },
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<&'a str> {
        self.prop(PROP_NAME).and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    pub fn label(&self) -> Option<String> {
        match self.prop(PROP_LABEL)? {
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Raw area, square meters.
    pub fn area(&self) -> Option<f64> {
        self.prop(PROP_AREA).and_then(Value::as_f64)
    }

    /// Raw perimeter, meters.
    pub fn perimeter(&self) -> Option<f64> {
        self.prop(PROP_LENGTH).and_then(Value::as_f64)
    }

    /// Boundary as polygons. Points, lines and unconvertible geometry give None.
    pub fn polygons(&self) -> Option<MultiPolygon<f64>> {
        let geometry = self.feature.geometry.as_ref()?;
        let geo_geometry: geo::Geometry<f64> = geometry.value.clone().try_into().ok()?;
        match geo_geometry {
            geo::Geometry::MultiPolygon(mp) => Some(mp),
            geo::Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p])),
            _ => None,
        }
    }
}
