//! Minimal GeoJSON point collections for candidate and occurrence output.
use serde::{Deserialize, Serialize};

use crate::geo::Coord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    #[serde(rename = "type")]
    pub kind: String,
    /// `[lon, lat]`
    pub coordinates: [f64; 2],
}

impl From<Coord> for Point {
    fn from(c: Coord) -> Self {
        Point {
            kind: "Point".to_string(),
            coordinates: [c.lon, c.lat],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature<P> {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: P,
    pub geometry: Point,
}

impl<P> Feature<P> {
    pub fn point(coord: Coord, properties: P) -> Self {
        Feature {
            kind: "Feature".to_string(),
            properties,
            geometry: coord.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection<P, M = NoMetadata> {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Feature<P>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub metadata: Option<M>,
}

impl<P, M> FeatureCollection<P, M> {
    pub fn new(features: Vec<Feature<P>>, metadata: Option<M>) -> Self {
        FeatureCollection {
            kind: "FeatureCollection".to_string(),
            features,
            metadata,
        }
    }
}

/// Serializes as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NoProperties {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NoMetadata {}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateProperties {
    pub probability: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMetadata {
    pub species: String,
    pub taxon_key: u64,
    pub method: String,
    pub n_occurrences: usize,
    pub n_candidates: usize,
    pub threshold: f32,
    pub bbox: [f64; 4],
}

pub type CandidateCollection = FeatureCollection<CandidateProperties, CandidateMetadata>;
pub type OccurrenceCollection = FeatureCollection<NoProperties>;

/// Occurrence coordinates as a property-less point collection.
pub fn occurrences_geojson(coords: &[Coord]) -> OccurrenceCollection {
    FeatureCollection::new(
        coords
            .iter()
            .map(|&c| Feature::point(c, NoProperties {}))
            .collect(),
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occurrence_collection_serializes_as_geojson() {
        let fc = occurrences_geojson(&[Coord::new(0.1, 52.2)]);
        let v = serde_json::to_value(&fc).unwrap();
        assert_eq!(v["type"], "FeatureCollection");
        assert_eq!(v["features"][0]["type"], "Feature");
        assert_eq!(v["features"][0]["geometry"]["type"], "Point");
        assert_eq!(v["features"][0]["geometry"]["coordinates"][1], 52.2);
        assert!(v["features"][0]["properties"].as_object().unwrap().is_empty());
        assert!(v.get("metadata").is_none());
    }
}
