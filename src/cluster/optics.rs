// OPTICS density clustering with ξ-steep cluster extraction.
//
// Two phases:
//
// 1. Ordering. Every point gets a core distance (distance to its
//    `min_samples`-th nearest point, itself included). Points are then
//    expanded one at a time, always picking the unprocessed point with the
//    smallest reachability; expanding a core point lowers its neighbours'
//    reachability to max(core distance, distance).
//
// 2. Extraction. The reachability plot (reachabilities in processing order)
//    is scanned for steep down areas followed by steep up areas; each
//    matching pair bounds a dense valley, which becomes a cluster. Points in
//    no valley are noise.
//
// Determinism: ties on reachability are broken by the lowest input index,
// and reachability is only replaced on strict improvement. Neighbours are
// points at cosine distance strictly below `max_eps`.

use anyhow::{ensure, Result};
use tracing::debug;

use super::distance::cosine_distance;
use super::traits::{group_labels, DensityClusterer, RawClusters};
use crate::corpus::Vector;

/// OPTICS parameters.
#[derive(Debug, Clone)]
pub struct Optics {
    /// Points needed (self included) for a neighbourhood to be dense
    pub min_samples: usize,
    /// Exclusive neighbourhood radius in cosine distance
    pub max_eps: f64,
    /// Minimum relative drop/rise for a steep area in the reachability plot
    pub xi: f64,
    /// Smallest cluster kept; defaults to `min_samples`
    pub min_cluster_size: Option<usize>,
    /// Trim cluster ends whose predecessor lies outside the cluster
    pub predecessor_correction: bool,
}

impl Default for Optics {
    fn default() -> Self {
        Self {
            min_samples: 3,
            max_eps: 1.0,
            xi: 0.05,
            min_cluster_size: None,
            predecessor_correction: true,
        }
    }
}

/// Result of the ordering phase. Per-point arrays are indexed by input index.
#[derive(Debug, Clone, PartialEq)]
pub struct OpticsOrdering {
    /// Input indices in processing order
    pub ordering: Vec<usize>,
    pub reachability: Vec<f64>,
    pub core_distances: Vec<f64>,
    /// Point whose expansion set the reachability, if any
    pub predecessor: Vec<Option<usize>>,
}

struct SteepDownArea {
    start: usize,
    end: usize,
    mib: f64,
}

impl Optics {
    pub fn new(min_samples: usize) -> Self {
        Self {
            min_samples,
            ..Self::default()
        }
    }

    pub fn with_max_eps(mut self, max_eps: f64) -> Self {
        self.max_eps = max_eps;
        self
    }

    pub fn with_xi(mut self, xi: f64) -> Self {
        self.xi = xi;
        self
    }

    fn min_cluster_size(&self) -> usize {
        self.min_cluster_size.unwrap_or(self.min_samples)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.min_samples >= 2,
            "min_samples must be at least 2 (got {})",
            self.min_samples
        );
        ensure!(
            self.min_cluster_size() >= 2,
            "min_cluster_size must be at least 2 (got {})",
            self.min_cluster_size()
        );
        ensure!(
            self.xi > 0.0 && self.xi < 1.0,
            "xi must be between 0 and 1 (got {})",
            self.xi
        );
        ensure!(self.max_eps > 0.0, "max_eps must be positive (got {})", self.max_eps);
        Ok(())
    }

    /// Compute core distances, the processing order, and reachabilities.
    pub fn compute_ordering(&self, vectors: &[Vector]) -> OpticsOrdering {
        let n = vectors.len();

        let mut dist = vec![vec![0.0f64; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = cosine_distance(&vectors[i], &vectors[j]);
                dist[i][j] = d;
                dist[j][i] = d;
            }
        }

        let core_distances: Vec<f64> = dist
            .iter()
            .map(|row| {
                if self.min_samples > n {
                    return f64::INFINITY;
                }
                let mut sorted = row.clone();
                sorted.sort_by(f64::total_cmp);
                let core = sorted[self.min_samples - 1];
                if core >= self.max_eps {
                    f64::INFINITY
                } else {
                    core
                }
            })
            .collect();

        let mut reachability = vec![f64::INFINITY; n];
        let mut predecessor = vec![None; n];
        let mut processed = vec![false; n];
        let mut ordering = Vec::with_capacity(n);

        for _ in 0..n {
            // min_by keeps the first of equal elements: lowest index wins ties
            let Some(point) = (0..n)
                .filter(|&i| !processed[i])
                .min_by(|&a, &b| reachability[a].total_cmp(&reachability[b]))
            else {
                break;
            };
            processed[point] = true;
            ordering.push(point);

            let core = core_distances[point];
            if !core.is_finite() {
                continue;
            }
            for other in 0..n {
                if processed[other] || dist[point][other] >= self.max_eps {
                    continue;
                }
                let reach = dist[point][other].max(core);
                if reach < reachability[other] {
                    reachability[other] = reach;
                    predecessor[other] = Some(point);
                }
            }
        }

        OpticsOrdering {
            ordering,
            reachability,
            core_distances,
            predecessor,
        }
    }

    /// Extract cluster labels (`None` = noise) from an ordering.
    pub fn extract_xi(&self, ordering: &OpticsOrdering) -> Vec<Option<usize>> {
        let order = &ordering.ordering;
        let n = order.len();

        let mut plot: Vec<f64> = order.iter().map(|&i| ordering.reachability[i]).collect();
        plot.push(f64::INFINITY);
        let preds: Vec<Option<usize>> = order.iter().map(|&i| ordering.predecessor[i]).collect();

        let xi_complement = 1.0 - self.xi;
        let ratio: Vec<f64> = (0..n).map(|i| plot[i] / plot[i + 1]).collect();
        // NaN ratios (inf/inf, 0/0) are neither steep nor sloped
        let steep_up: Vec<bool> = ratio.iter().map(|r| *r <= xi_complement).collect();
        let steep_down: Vec<bool> = ratio.iter().map(|r| *r >= 1.0 / xi_complement).collect();
        let downward: Vec<bool> = ratio.iter().map(|r| *r > 1.0).collect();
        let upward: Vec<bool> = ratio.iter().map(|r| *r < 1.0).collect();

        let mut sdas: Vec<SteepDownArea> = Vec::new();
        let mut clusters: Vec<(usize, usize)> = Vec::new();
        let mut index = 0usize;
        let mut mib = 0.0f64;

        for steep_index in (0..n).filter(|&i| steep_up[i] || steep_down[i]) {
            if steep_index < index {
                continue;
            }
            let local_max = plot[index..=steep_index]
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);
            mib = mib.max(local_max);
            filter_steep_down_areas(&mut sdas, mib, xi_complement, &plot);

            if steep_down[steep_index] {
                let end = extend_region(&steep_down, &upward, steep_index, self.min_samples);
                sdas.push(SteepDownArea {
                    start: steep_index,
                    end,
                    mib: 0.0,
                });
                index = end + 1;
                mib = plot[index];
                continue;
            }

            let u_start = steep_index;
            let u_end = extend_region(&steep_up, &downward, u_start, self.min_samples);
            index = u_end + 1;
            mib = plot[index];

            let mut found = Vec::new();
            for sda in &sdas {
                let mut c_start = sda.start;
                let mut c_end = u_end;

                if plot[c_end + 1] * xi_complement < sda.mib {
                    continue;
                }

                // Align the end with the start level, whichever side is higher
                let d_max = plot[sda.start];
                if d_max * xi_complement >= plot[c_end + 1] {
                    while c_start < sda.end && plot[c_start + 1] > plot[c_end + 1] {
                        c_start += 1;
                    }
                } else if plot[c_end + 1] * xi_complement >= d_max {
                    while c_end > u_start && plot[c_end - 1] > d_max {
                        c_end -= 1;
                    }
                }

                if self.predecessor_correction {
                    match correct_predecessor(&plot, &preds, order, c_start, c_end) {
                        Some((s, e)) => {
                            c_start = s;
                            c_end = e;
                        }
                        None => continue,
                    }
                }

                if c_end + 1 < c_start + self.min_cluster_size() {
                    continue;
                }
                if c_start > sda.end || c_end < u_start {
                    continue;
                }
                found.push((c_start, c_end));
            }

            // Nested (smaller) clusters first, so they win label assignment
            found.reverse();
            clusters.extend(found);
        }

        let mut ordered_labels: Vec<Option<usize>> = vec![None; n];
        let mut next_label = 0;
        for (start, end) in clusters {
            if ordered_labels[start..=end].iter().all(Option::is_none) {
                for slot in &mut ordered_labels[start..=end] {
                    *slot = Some(next_label);
                }
                next_label += 1;
            }
        }

        let mut labels = vec![None; n];
        for (position, &point) in order.iter().enumerate() {
            labels[point] = ordered_labels[position];
        }
        labels
    }

    /// Label every vector with its cluster, or `None` for noise.
    pub fn fit(&self, vectors: &[Vector]) -> Result<Vec<Option<usize>>> {
        self.validate()?;
        if vectors.len() < self.min_samples {
            debug!(
                vectors = vectors.len(),
                min_samples = self.min_samples,
                "Too few vectors to cluster"
            );
            return Ok(vec![None; vectors.len()]);
        }

        let ordering = self.compute_ordering(vectors);
        let labels = self.extract_xi(&ordering);
        debug!(
            vectors = vectors.len(),
            clusters = labels.iter().flatten().max().map_or(0, |m| m + 1),
            noise = labels.iter().filter(|l| l.is_none()).count(),
            "OPTICS finished"
        );
        Ok(labels)
    }
}

impl DensityClusterer for Optics {
    fn cluster(&self, vectors: &[Vector]) -> Result<RawClusters> {
        Ok(group_labels(&self.fit(vectors)?))
    }
}

/// Drop steep down areas whose start is not sufficiently above `mib`, and
/// raise the maximum-in-between of the survivors.
fn filter_steep_down_areas(
    sdas: &mut Vec<SteepDownArea>,
    mib: f64,
    xi_complement: f64,
    plot: &[f64],
) {
    if mib.is_infinite() {
        sdas.clear();
        return;
    }
    sdas.retain(|sda| mib <= plot[sda.start] * xi_complement);
    for sda in sdas.iter_mut() {
        sda.mib = sda.mib.max(mib);
    }
}

/// Extend a steep area from `start` while points stay steep, tolerating at
/// most `min_samples` consecutive non-steep points that keep the direction.
fn extend_region(steep: &[bool], xward: &[bool], start: usize, min_samples: usize) -> usize {
    let mut non_xward = 0;
    let mut end = start;
    for index in start..steep.len() {
        if steep[index] {
            non_xward = 0;
            end = index;
        } else if !xward[index] {
            non_xward += 1;
            if non_xward > min_samples {
                break;
            }
        } else {
            return end;
        }
    }
    end
}

/// Shrink the cluster end until its predecessor lies inside the cluster or
/// the start is higher than the end. `None` if nothing remains.
fn correct_predecessor(
    plot: &[f64],
    preds: &[Option<usize>],
    order: &[usize],
    start: usize,
    mut end: usize,
) -> Option<(usize, usize)> {
    while start < end {
        if plot[start] > plot[end] {
            return Some((start, end));
        }
        let pred = preds[end];
        if order[start..end].iter().any(|&p| Some(p) == pred) {
            return Some((start, end));
        }
        end -= 1;
    }
    None
}
