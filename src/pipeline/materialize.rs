// Cluster materialization: rank each raw cluster's members by their
// Euclidean distance to the cluster centroid.
//
// Clustering itself uses cosine distance; ranking deliberately does not.

use crate::cluster::distance::{centroid, euclidean_distance};
use crate::cluster::traits::RawClusters;
use crate::corpus::Vector;
use crate::db::models::{Document, NewCluster, NewMatch};

/// Turn raw clusters (member indices into `documents`/`vectors`) into
/// persistable clusters whose matches are sorted nearest first.
///
/// The sort is stable: members at equal distance keep the order the
/// clustering engine listed them in. Empty raw clusters are skipped.
pub fn materialize(
    raw: &RawClusters,
    documents: &[&Document],
    vectors: &[Vector],
) -> Vec<NewCluster> {
    assert_eq!(
        documents.len(),
        vectors.len(),
        "one vector per document expected"
    );

    raw.values()
        .filter_map(|members| {
            let center = centroid(members.iter().map(|&i| vectors[i].as_slice()))?;
            let mut matches: Vec<NewMatch> = members
                .iter()
                .map(|&i| NewMatch {
                    document_guid: documents[i].guid.clone(),
                    distance: euclidean_distance(&center, &vectors[i]),
                })
                .collect();
            matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
            Some(NewCluster { matches })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn docs(n: usize) -> Vec<Document> {
        (0..n)
            .map(|i| Document::new(format!("d{i}"), format!("Title {i}"), "", Utc::now()))
            .collect()
    }

    #[test]
    fn test_matches_sorted_by_centroid_distance() {
        let documents = docs(3);
        let refs: Vec<&Document> = documents.iter().collect();
        let vectors = vec![vec![0.0, 0.0], vec![4.0, 0.0], vec![2.0, 0.0]];
        let raw = RawClusters::from([(0, vec![0, 1, 2])]);

        let clusters = materialize(&raw, &refs, &vectors);
        assert_eq!(clusters.len(), 1);
        let guids: Vec<&str> = clusters[0]
            .matches
            .iter()
            .map(|m| m.document_guid.as_str())
            .collect();
        // centroid (2, 0): d2 sits on it, d0 and d1 tie at 2.0 in engine order
        assert_eq!(guids, vec!["d2", "d0", "d1"]);
        assert_eq!(clusters[0].matches[0].distance, 0.0);
        assert!((clusters[0].matches[1].distance - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_noise_indices_are_never_materialized() {
        let documents = docs(4);
        let refs: Vec<&Document> = documents.iter().collect();
        let vectors = vec![vec![1.0], vec![1.0], vec![9.0], vec![1.0]];
        let raw = RawClusters::from([(0, vec![0, 1, 3]), (1, vec![])]);

        let clusters = materialize(&raw, &refs, &vectors);
        assert_eq!(clusters.len(), 1);
        assert!(clusters[0].matches.iter().all(|m| m.document_guid != "d2"));
    }

    #[test]
    fn test_materialize_is_repeatable() {
        let documents = docs(5);
        let refs: Vec<&Document> = documents.iter().collect();
        let vectors = vec![
            vec![0.3, 0.1, 0.0],
            vec![0.2, 0.2, 0.1],
            vec![0.0, 0.5, 0.5],
            vec![0.1, 0.4, 0.6],
            vec![0.0, 0.6, 0.4],
        ];
        let raw = RawClusters::from([(0, vec![0, 1]), (1, vec![2, 3, 4])]);
        assert_eq!(
            materialize(&raw, &refs, &vectors),
            materialize(&raw, &refs, &vectors)
        );
    }
}
