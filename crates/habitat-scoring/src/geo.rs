//! Geographic primitives: coordinates, bounding boxes, the raster affine
//! transform and the table of predefined regions.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FinderError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lon: f64,
    pub lat: f64,
}

impl Coord {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Planar distance in coordinate units (degrees).
    pub fn distance(&self, other: &Coord) -> f64 {
        let dx = self.lon - other.lon;
        let dy = self.lat - other.lat;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<(f64, f64)> for Coord {
    fn from((lon, lat): (f64, f64)) -> Self {
        Coord { lon, lat }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Inclusive on all edges.
    pub fn contains(&self, c: &Coord) -> bool {
        c.lon >= self.min_lon && c.lon <= self.max_lon && c.lat >= self.min_lat && c.lat <= self.max_lat
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
    }
}

impl FromStr for BoundingBox {
    type Err = String;

    /// Parses `min_lon,min_lat,max_lon,max_lat`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| format!("Invalid bounding box '{}': {}", s, e))?;
        match parts.as_slice() {
            [a, b, c, d] if a < c && b < d => Ok(BoundingBox::new(*a, *b, *c, *d)),
            [_, _, _, _] => Err(format!(
                "Invalid bounding box '{}': min must be below max",
                s
            )),
            _ => Err(format!(
                "Invalid bounding box '{}': expected min_lon,min_lat,max_lon,max_lat",
                s
            )),
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

/// Affine pixel-to-world transform in GDAL/rasterio coefficient order:
/// `x = a*col + b*row + c`, `y = d*col + e*row + f`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl GeoTransform {
    /// North-up grid whose top-left corner sits at (`west`, `north`).
    pub fn from_origin(west: f64, north: f64, pixel_width: f64, pixel_height: f64) -> Self {
        GeoTransform {
            a: pixel_width,
            b: 0.0,
            c: west,
            d: 0.0,
            e: -pixel_height,
            f: north,
        }
    }

    /// North-up transform covering `bbox` with `height` x `width` pixels.
    pub fn from_bounds(bbox: &BoundingBox, height: usize, width: usize) -> Self {
        let pw = (bbox.max_lon - bbox.min_lon) / width.max(1) as f64;
        let ph = (bbox.max_lat - bbox.min_lat) / height.max(1) as f64;
        Self::from_origin(bbox.min_lon, bbox.max_lat, pw, ph)
    }

    /// Centre of pixel (`row`, `col`).
    pub fn pixel_to_coords(&self, row: usize, col: usize) -> Coord {
        let x = col as f64 + 0.5;
        let y = row as f64 + 0.5;
        Coord {
            lon: self.a * x + self.b * y + self.c,
            lat: self.d * x + self.e * y + self.f,
        }
    }

    /// Fractional (row, col) for a coordinate; `None` if the transform is singular.
    pub fn coords_to_fractional_pixel(&self, c: &Coord) -> Option<(f64, f64)> {
        let det = self.a * self.e - self.b * self.d;
        if det.abs() < f64::EPSILON * f64::EPSILON {
            return None;
        }
        let dx = c.lon - self.c;
        let dy = c.lat - self.f;
        let col = (self.e * dx - self.b * dy) / det;
        let row = (-self.d * dx + self.a * dy) / det;
        Some((row, col))
    }
}

/// A named bounding box shipped with the tool.
#[derive(Debug, Clone, Copy)]
pub struct Region {
    pub name: &'static str,
    pub bbox: BoundingBox,
    pub description: &'static str,
}

pub const REGIONS: &[Region] = &[Region {
    name: "cambridge",
    bbox: BoundingBox {
        min_lon: 0.03,
        min_lat: 52.13,
        max_lon: 0.22,
        max_lat: 52.29,
    },
    description: "Cambridge, UK test region",
}];

pub fn region(name: &str) -> Result<&'static Region> {
    REGIONS
        .iter()
        .find(|r| r.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| FinderError::UnknownRegion(name.to_string()))
}

/// Pick the bounding box from a region name or an explicit box; the region wins when both are given.
pub fn resolve_bbox(region_name: Option<&str>, bbox: Option<BoundingBox>) -> Result<BoundingBox> {
    match (region_name, bbox) {
        (Some(name), _) => Ok(region(name)?.bbox),
        (None, Some(b)) => Ok(b),
        (None, None) => Err(FinderError::MissingRegion),
    }
}
