//! Row-level kernels shared by the similarity and neighbour searches.

pub fn dot(lhs: &[f32], rhs: &[f32]) -> f32 {
    debug_assert_eq!(lhs.len(), rhs.len(), "dot product requires equal length vectors");
    lhs.iter().zip(rhs.iter()).map(|(a, b)| a * b).sum()
}

pub fn l2_norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

pub fn squared_euclidean(lhs: &[f32], rhs: &[f32]) -> f32 {
    debug_assert_eq!(lhs.len(), rhs.len(), "distance requires equal length vectors");
    lhs.iter()
        .zip(rhs.iter())
        .map(|(a, b)| {
            let d = a - b;
            d * d
        })
        .sum()
}

pub fn euclidean(lhs: &[f32], rhs: &[f32]) -> f32 {
    squared_euclidean(lhs, rhs).sqrt()
}

/// Column means of a set of equal-length rows. Returns `None` when `rows` is empty.
pub fn mean_row<'a, I>(rows: I, dim: usize) -> Option<Vec<f32>>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut acc = vec![0.0f64; dim];
    let mut n = 0usize;
    for row in rows {
        for (a, &v) in acc.iter_mut().zip(row.iter()) {
            *a += v as f64;
        }
        n += 1;
    }
    if n == 0 {
        return None;
    }
    Some(acc.into_iter().map(|a| (a / n as f64) as f32).collect())
}

pub fn is_all_zero(v: &[f32]) -> bool {
    v.iter().all(|&x| x.abs() <= f32::EPSILON)
}
