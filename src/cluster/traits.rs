// DensityClusterer trait: the seam between vectorization and the
// clustering algorithm.
//
// OPTICS is the implementation the pipeline uses; anything that groups
// vectors by density and leaves outliers unassigned can stand in.

use std::collections::BTreeMap;

use anyhow::Result;

use crate::corpus::Vector;

/// Cluster id -> member indices (ascending, into the input slice).
/// Noise points appear in no cluster.
pub type RawClusters = BTreeMap<usize, Vec<usize>>;

pub trait DensityClusterer: Send + Sync {
    /// Group `vectors` by density. Fewer vectors than the clusterer's
    /// minimum sample count yields no clusters, not an error.
    fn cluster(&self, vectors: &[Vector]) -> Result<RawClusters>;
}

/// Group per-point labels (`None` = noise) into clusters.
pub fn group_labels(labels: &[Option<usize>]) -> RawClusters {
    let mut clusters = RawClusters::new();
    for (index, label) in labels.iter().enumerate() {
        if let Some(label) = label {
            clusters.entry(*label).or_default().push(index);
        }
    }
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_labels_skips_noise() {
        let clusters = group_labels(&[Some(1), None, Some(0), Some(1), None]);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[&0], vec![2]);
        assert_eq!(clusters[&1], vec![0, 3]);
    }

    #[test]
    fn test_group_labels_all_noise() {
        assert!(group_labels(&[None, None]).is_empty());
    }
}
