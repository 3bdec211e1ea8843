// Clustering: distance metrics and density-based grouping of vectors.

pub mod distance;
pub mod optics;
pub mod traits;
