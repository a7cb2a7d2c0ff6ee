//! Pseudo-negative generation by bounded rejection sampling.
//!
//! Both samplers draw from an explicitly passed generator and give up after a
//! fixed number of attempts, so a crowded region yields fewer negatives than
//! requested instead of looping forever. Callers must tolerate a short result.
use std::collections::HashSet;

use rand::Rng;

use crate::embedding::EmbeddingSource;
use crate::geo::{BoundingBox, Coord};
use crate::math::Array2;

/// Attempts allowed per requested sample for the spatial sampler.
pub const SPATIAL_ATTEMPTS_PER_SAMPLE: usize = 100;

/// Attempts allowed per requested sample for the grid sampler.
pub const GRID_ATTEMPTS_PER_SAMPLE: usize = 10;

fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    lo + rng.gen::<f64>() * (hi - lo)
}

/// Draw up to `n_samples` coordinates uniformly inside `bbox`, each farther
/// than `min_distance` from every coordinate in `positives`.
pub fn sample_spatial_negatives<R: Rng + ?Sized>(
    positives: &[Coord],
    bbox: &BoundingBox,
    n_samples: usize,
    min_distance: f64,
    rng: &mut R,
) -> Vec<Coord> {
    let mut negatives = Vec::with_capacity(n_samples);
    let mut taken: HashSet<(u64, u64)> = HashSet::with_capacity(n_samples);
    let max_attempts = n_samples * SPATIAL_ATTEMPTS_PER_SAMPLE;

    for _ in 0..max_attempts {
        if negatives.len() >= n_samples {
            break;
        }
        let candidate = Coord::new(
            uniform(rng, bbox.min_lon, bbox.max_lon),
            uniform(rng, bbox.min_lat, bbox.max_lat),
        );
        let clear = positives
            .iter()
            .all(|p| p.distance(&candidate) > min_distance);
        if clear && taken.insert((candidate.lon.to_bits(), candidate.lat.to_bits())) {
            negatives.push(candidate);
        }
    }

    if negatives.len() < n_samples {
        log::debug!(
            "Spatial sampler collected {} of {} negatives after {} attempts",
            negatives.len(),
            n_samples,
            max_attempts
        );
    }
    negatives
}

/// Draw up to `n_points` distinct grid pixels that are neither excluded nor
/// no-data. Returns the pixel vectors and their centre coordinates.
pub fn sample_grid_negatives<S, R>(
    source: &S,
    n_points: usize,
    exclude: &[Coord],
    rng: &mut R,
) -> (Array2<f32>, Vec<Coord>)
where
    S: EmbeddingSource + ?Sized,
    R: Rng + ?Sized,
{
    let (h, w, dim) = source.shape();
    if h == 0 || w == 0 {
        return (Array2::empty(dim), Vec::new());
    }

    let mut excluded: HashSet<(usize, usize)> =
        exclude.iter().filter_map(|c| source.coords_to_pixel(c)).collect();

    let mut coords = Vec::with_capacity(n_points);
    let mut data = Vec::with_capacity(n_points * dim);
    let max_attempts = n_points * GRID_ATTEMPTS_PER_SAMPLE;
    let mut attempts = 0;

    while coords.len() < n_points && attempts < max_attempts {
        attempts += 1;
        let row = rng.gen_range(0..h);
        let col = rng.gen_range(0..w);
        if excluded.contains(&(row, col)) || !source.is_valid_pixel(row, col) {
            continue;
        }
        coords.push(source.pixel_to_coords(row, col));
        data.extend_from_slice(source.embedding_at(row, col));
        excluded.insert((row, col));
    }

    if coords.len() < n_points {
        log::debug!(
            "Grid sampler collected {} of {} background points after {} attempts",
            coords.len(),
            n_points,
            attempts
        );
    }

    let n = coords.len();
    let vectors = Array2::from_shape_vec((n, dim), data).unwrap_or_else(|_| Array2::empty(dim));
    (vectors, coords)
}
