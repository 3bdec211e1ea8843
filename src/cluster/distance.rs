// Distance metrics and centroids over dense vectors.
//
// Cosine distance drives clustering: it compares the direction of two
// weight vectors and ignores their length. Euclidean distance ranks members
// against their cluster centroid. The two serve different purposes and are
// kept separate on purpose.
//
// Mixing vectors of different lengths is a programming error and panics.

/// Cosine distance `1 - cos(a, b)`, clamped to [0, 2].
///
/// A zero vector has no direction: its distance to any other vector is 1.0
/// (same as an orthogonal vector). Identical vectors are at distance 0.
pub fn cosine_distance(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "cosine_distance: dimension mismatch");

    if a == b && a.iter().any(|x| *x != 0.0) {
        return 0.0;
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    (1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 2.0)
}

/// Euclidean norm of `a - b`.
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "euclidean_distance: dimension mismatch");
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Componentwise arithmetic mean of the given vectors.
///
/// Returns `None` for an empty set.
pub fn centroid<'a, I>(vectors: I) -> Option<Vec<f64>>
where
    I: IntoIterator<Item = &'a [f64]>,
{
    let mut iter = vectors.into_iter();
    let first = iter.next()?;
    let mut sum = first.to_vec();
    let mut count = 1usize;
    for v in iter {
        assert_eq!(v.len(), sum.len(), "centroid: dimension mismatch");
        for (s, x) in sum.iter_mut().zip(v) {
            *s += x;
        }
        count += 1;
    }
    let n = count as f64;
    for s in &mut sum {
        *s /= n;
    }
    Some(sum)
}
