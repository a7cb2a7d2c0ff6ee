//! Embedding grid TSV reader.
//!
//! One line per pixel: `row`, `col`, then one column per feature dimension.
//! Pixels that are not listed stay no-data. The grid spans the given bounding
//! box exactly. Pass the raster shape when trailing rows or columns may be
//! no-data; otherwise it is inferred from the largest listed indices.
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::StringRecord;

use crate::embedding::EmbeddingGrid;
use crate::geo::{BoundingBox, GeoTransform};

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(name))
}

/// Parse a raster shape written as `ROWSxCOLS`, e.g. `512x384`.
pub fn parse_grid_shape(s: &str) -> std::result::Result<(usize, usize), String> {
    let (rows, cols) = s
        .trim()
        .split_once(|c| c == 'x' || c == 'X')
        .ok_or_else(|| format!("expected ROWSxCOLS, got '{}'", s))?;
    let parse = |v: &str| -> std::result::Result<usize, String> {
        match v.trim().parse::<usize>() {
            Ok(0) => Err(format!("grid dimensions must be positive in '{}'", s)),
            Ok(n) => Ok(n),
            Err(e) => Err(format!("invalid grid dimension '{}': {}", v, e)),
        }
    };
    Ok((parse(rows)?, parse(cols)?))
}

pub fn read_embedding_tsv<P: AsRef<Path>>(
    path: P,
    bbox: &BoundingBox,
    shape: Option<(usize, usize)>,
) -> Result<EmbeddingGrid> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_path(&path)
        .with_context(|| format!("Failed to open embedding file: {}", path.as_ref().display()))?;

    let headers = reader
        .headers()
        .context("Failed to read embedding header row")?
        .clone();
    let row_idx = find_column(&headers, "row").ok_or_else(|| anyhow!("Missing 'row' column"))?;
    let col_idx = find_column(&headers, "col").ok_or_else(|| anyhow!("Missing 'col' column"))?;
    let feature_indices: Vec<usize> = (0..headers.len())
        .filter(|&i| i != row_idx && i != col_idx)
        .collect();
    if feature_indices.is_empty() {
        return Err(anyhow!("No feature columns detected in embedding header"));
    }

    let mut pixels: Vec<(usize, usize, Vec<f32>)> = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", line + 1))?;
        let parse_index = |idx: usize, name: &str| -> Result<usize> {
            record
                .get(idx)
                .ok_or_else(|| anyhow!("Missing {} at row {}", name, line + 1))?
                .trim()
                .parse::<usize>()
                .with_context(|| format!("Invalid {} at row {}", name, line + 1))
        };
        let row = parse_index(row_idx, "row")?;
        let col = parse_index(col_idx, "col")?;

        let mut values = Vec::with_capacity(feature_indices.len());
        for &idx in &feature_indices {
            let value = record
                .get(idx)
                .ok_or_else(|| anyhow!("Missing feature value at row {}", line + 1))?;
            let parsed = value.trim().parse::<f32>().with_context(|| {
                format!(
                    "Invalid feature '{}' at row {}",
                    headers.get(idx).unwrap_or(""),
                    line + 1
                )
            })?;
            values.push(parsed);
        }
        pixels.push((row, col, values));
    }

    let listed_height = pixels.iter().map(|(r, _, _)| r + 1).max().unwrap_or(0);
    let listed_width = pixels.iter().map(|(_, c, _)| c + 1).max().unwrap_or(0);
    let (height, width) = match shape {
        Some((h, w)) => {
            if listed_height > h || listed_width > w {
                return Err(anyhow!(
                    "Embedding file {} lists pixel indices up to ({}, {}) outside the {}x{} grid",
                    path.as_ref().display(),
                    listed_height.saturating_sub(1),
                    listed_width.saturating_sub(1),
                    h,
                    w
                ));
            }
            (h, w)
        }
        None => (listed_height, listed_width),
    };
    if height == 0 || width == 0 {
        return Err(anyhow!(
            "Embedding file {} has no pixels",
            path.as_ref().display()
        ));
    }

    let transform = GeoTransform::from_bounds(bbox, height, width);
    let mut grid = EmbeddingGrid::empty(height, width, feature_indices.len(), transform);
    for (row, col, values) in &pixels {
        grid.set_pixel(*row, *col, values)?;
    }

    log::debug!(
        "Loaded {} x {} x {} embedding grid ({} valid pixels) from {}",
        height,
        width,
        feature_indices.len(),
        grid.n_valid_pixels(),
        path.as_ref().display()
    );
    Ok(grid)
}
