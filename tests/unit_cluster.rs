// Unit tests for distances, OPTICS, and cluster materialization.
//
// The OPTICS tests use small hand-built vectors whose neighbourhoods are easy
// to reason about; the materialization tests check the ranking contract.

use chrono::Utc;

use newscluster::cluster::distance::{centroid, cosine_distance, euclidean_distance};
use newscluster::cluster::optics::Optics;
use newscluster::cluster::traits::{DensityClusterer, RawClusters};
use newscluster::corpus::Vector;
use newscluster::db::models::Document;
use newscluster::pipeline::materialize::materialize;

// ============================================================
// Distances
// ============================================================

#[test]
fn cosine_distance_ignores_magnitude() {
    let a = [1.0, 2.0, 0.0];
    let b = [2.0, 4.0, 0.0];
    assert!(cosine_distance(&a, &b).abs() < 1e-12);
}

#[test]
fn cosine_distance_of_disjoint_vectors_is_one() {
    assert_eq!(cosine_distance(&[1.0, 0.0], &[0.0, 3.0]), 1.0);
    assert_eq!(cosine_distance(&[0.0, 0.0], &[0.0, 3.0]), 1.0);
}

#[test]
fn euclidean_distance_is_symmetric() {
    let a = [0.1, 0.5, 0.2];
    let b = [0.4, 0.1, 0.0];
    assert_eq!(euclidean_distance(&a, &b), euclidean_distance(&b, &a));
    assert_eq!(euclidean_distance(&a, &a), 0.0);
}

#[test]
fn centroid_of_empty_set_is_none() {
    let empty: Vec<&[f64]> = vec![];
    assert!(centroid(empty).is_none());
}

// ============================================================
// OPTICS
// ============================================================

/// Three tight groups of three, each in its own pair of dimensions, plus
/// two points sharing nothing with anyone.
fn three_groups() -> Vec<Vector> {
    let mut vectors = Vec::new();
    for group in 0..3 {
        for step in 0..3 {
            let mut v = vec![0.0; 8];
            v[group * 2] = 1.0;
            v[group * 2 + 1] = 0.1 * step as f64;
            vectors.push(v);
        }
    }
    let mut lone = vec![0.0; 8];
    lone[6] = 1.0;
    vectors.push(lone);
    let mut lone = vec![0.0; 8];
    lone[7] = 1.0;
    vectors.push(lone);
    vectors
}

#[test]
fn optics_finds_each_group_and_leaves_loners_as_noise() {
    let clusters = Optics::new(3).cluster(&three_groups()).unwrap();
    let mut members: Vec<Vec<usize>> = clusters.into_values().collect();
    members.sort();
    assert_eq!(members, vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8]]);
}

#[test]
fn optics_cluster_ids_are_contiguous() {
    let clusters = Optics::new(3).cluster(&three_groups()).unwrap();
    let ids: Vec<usize> = clusters.keys().copied().collect();
    assert_eq!(ids, (0..clusters.len()).collect::<Vec<_>>());
}

#[test]
fn optics_is_deterministic() {
    let vectors = three_groups();
    let optics = Optics::new(3);
    let first = optics.cluster(&vectors).unwrap();
    for _ in 0..5 {
        assert_eq!(optics.cluster(&vectors).unwrap(), first);
    }
}

#[test]
fn optics_group_smaller_than_min_samples_is_noise() {
    let vectors = vec![
        vec![1.0, 0.0, 0.0],
        vec![1.0, 0.1, 0.0],
        vec![0.0, 0.0, 1.0],
        vec![0.0, 0.1, 1.0],
    ];
    assert!(Optics::new(3).cluster(&vectors).unwrap().is_empty());
}

#[test]
fn optics_all_zero_vectors_are_noise() {
    let vectors = vec![vec![0.0; 4]; 5];
    assert!(Optics::new(3).cluster(&vectors).unwrap().is_empty());
}

#[test]
fn optics_ordering_visits_every_point_once() {
    let ordering = Optics::new(3).compute_ordering(&three_groups());
    let mut visited = ordering.ordering.clone();
    visited.sort_unstable();
    assert_eq!(visited, (0..11).collect::<Vec<_>>());
}

// ============================================================
// Materialization
// ============================================================

fn documents(n: usize) -> Vec<Document> {
    (0..n)
        .map(|i| Document::new(format!("d{i}"), format!("Title {i}"), "", Utc::now()))
        .collect()
}

#[test]
fn matches_are_sorted_ascending_by_distance() {
    let vectors = three_groups();
    let docs = documents(vectors.len());
    let refs: Vec<&Document> = docs.iter().collect();
    let raw = Optics::new(3).cluster(&vectors).unwrap();

    let clusters = materialize(&raw, &refs, &vectors);
    assert_eq!(clusters.len(), 3);
    for cluster in &clusters {
        assert!(cluster
            .matches
            .windows(2)
            .all(|w| w[0].distance <= w[1].distance));
        assert!(cluster.matches.iter().all(|m| m.distance >= 0.0));
    }
}

#[test]
fn middle_member_is_nearest_to_centroid() {
    let vectors = three_groups();
    let docs = documents(vectors.len());
    let refs: Vec<&Document> = docs.iter().collect();
    let raw = RawClusters::from([(0, vec![0, 1, 2])]);

    let clusters = materialize(&raw, &refs, &vectors);
    assert_eq!(clusters[0].matches[0].document_guid, "d1");
    assert!(clusters[0].matches[0].distance < 1e-12);
}

#[test]
fn materializing_twice_gives_identical_clusters() {
    let vectors = three_groups();
    let docs = documents(vectors.len());
    let refs: Vec<&Document> = docs.iter().collect();
    let raw = Optics::new(3).cluster(&vectors).unwrap();
    assert_eq!(
        materialize(&raw, &refs, &vectors),
        materialize(&raw, &refs, &vectors)
    );
}
