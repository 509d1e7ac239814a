// Seeded k-means clustering over sparse TF-IDF vectors.
//
// Initialization is k-means++ driven by a fixed-seed RNG, so identical input
// always yields identical topics. The assignment step fans out across cores
// with rayon; each row's nearest centroid is computed independently and
// collected in row order, so the thread count never changes the result.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use super::tfidf::{FeatureMatrix, SparseVector};
use super::traits::{Clusterer, Clustering};

pub struct KMeans {
    /// Seed for centroid initialization
    pub seed: u64,
    /// Upper bound on assignment passes
    pub max_iter: usize,
}

impl Default for KMeans {
    fn default() -> Self {
        Self {
            seed: 42,
            max_iter: 300,
        }
    }
}

/// Effective cluster count for `n_docs` documents: never fewer than 2
/// clusters, never more than one per ten documents beyond that.
pub fn clamp_topic_count(requested: usize, n_docs: usize) -> usize {
    requested.min((n_docs / 10).max(2))
}

impl Clusterer for KMeans {
    fn fit(&self, matrix: &FeatureMatrix, k: usize) -> Clustering {
        let rows = &matrix.rows;
        let dims = matrix.dims();

        if rows.is_empty() || k == 0 {
            return Clustering {
                assignments: vec![0; rows.len()],
                centroids: vec![vec![0.0; dims]; k],
                iterations: 0,
            };
        }

        let mut centroids = self.init_centroids(rows, dims, k);
        let mut assignments: Vec<usize> = Vec::new();
        let mut iterations = 0;

        while iterations < self.max_iter {
            iterations += 1;

            let next: Vec<usize> = rows
                .par_iter()
                .map(|row| nearest_centroid(row, &centroids))
                .collect();
            let changed = next != assignments;
            assignments = next;

            update_centroids(rows, &assignments, &mut centroids);

            if !changed {
                break;
            }
        }

        debug!(k, iterations, documents = rows.len(), "k-means finished");

        Clustering {
            assignments,
            centroids,
            iterations,
        }
    }
}

impl KMeans {
    /// k-means++: first centroid uniformly at random, each next one sampled
    /// with probability proportional to squared distance from the nearest
    /// centroid chosen so far.
    fn init_centroids(&self, rows: &[SparseVector], dims: usize, k: usize) -> Vec<Vec<f64>> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut chosen: Vec<usize> = Vec::with_capacity(k);
        chosen.push(rng.random_range(0..rows.len()));

        let mut centroids = vec![densify(&rows[chosen[0]], dims)];
        let mut closest: Vec<f64> = rows
            .iter()
            .map(|row| squared_distance(row, &centroids[0], norm_sq(&centroids[0])))
            .collect();

        while centroids.len() < k {
            let total: f64 = closest.iter().sum();
            let pick = if total > 0.0 {
                let target = rng.random::<f64>() * total;
                let mut acc = 0.0;
                let mut pick = None;
                for (i, d) in closest.iter().enumerate() {
                    acc += d;
                    if *d > 0.0 && acc >= target {
                        pick = Some(i);
                        break;
                    }
                }
                // Rounding can leave `acc` just short of `target`
                pick.or_else(|| closest.iter().rposition(|d| *d > 0.0))
                    .unwrap_or(0)
            } else {
                // Every row sits on a centroid already; take the lowest unused row
                (0..rows.len()).find(|i| !chosen.contains(i)).unwrap_or(0)
            };

            chosen.push(pick);
            let centroid = densify(&rows[pick], dims);
            let centroid_norm = norm_sq(&centroid);
            for (row, best) in rows.iter().zip(closest.iter_mut()) {
                let d = squared_distance(row, &centroid, centroid_norm);
                if d < *best {
                    *best = d;
                }
            }
            centroids.push(centroid);
        }

        centroids
    }
}

/// Index of the closest centroid; ties go to the lowest id.
fn nearest_centroid(row: &SparseVector, centroids: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (id, centroid) in centroids.iter().enumerate() {
        let d = squared_distance(row, centroid, norm_sq(centroid));
        if d < best_dist {
            best_dist = d;
            best = id;
        }
    }
    best
}

/// Recompute each centroid as the mean of its members. Clusters with no
/// members keep their previous centroid.
fn update_centroids(rows: &[SparseVector], assignments: &[usize], centroids: &mut [Vec<f64>]) {
    let dims = centroids.first().map(Vec::len).unwrap_or(0);
    let mut sums = vec![vec![0.0; dims]; centroids.len()];
    let mut counts = vec![0usize; centroids.len()];

    for (row, &cluster) in rows.iter().zip(assignments) {
        counts[cluster] += 1;
        for &(id, w) in &row.entries {
            sums[cluster][id] += w;
        }
    }

    for ((centroid, sum), &count) in centroids.iter_mut().zip(sums).zip(&counts) {
        if count > 0 {
            *centroid = sum.into_iter().map(|s| s / count as f64).collect();
        }
    }
}

/// ||row - centroid||², expanded so only the row's nonzero entries are visited.
fn squared_distance(row: &SparseVector, centroid: &[f64], centroid_norm_sq: f64) -> f64 {
    let mut d = centroid_norm_sq;
    for &(id, w) in &row.entries {
        d += w * w - 2.0 * w * centroid[id];
    }
    d.max(0.0)
}

fn norm_sq(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum()
}

fn densify(row: &SparseVector, dims: usize) -> Vec<f64> {
    let mut dense = vec![0.0; dims];
    for &(id, w) in &row.entries {
        dense[id] = w;
    }
    dense
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topics::tfidf::Vocabulary;

    fn matrix(rows: Vec<Vec<(usize, f64)>>, dims: usize) -> FeatureMatrix {
        FeatureMatrix {
            vocabulary: Vocabulary::from_terms((0..dims).map(|i| format!("t{i}"))),
            rows: rows
                .into_iter()
                .map(|entries| SparseVector { entries })
                .collect(),
        }
    }

    fn two_groups() -> FeatureMatrix {
        let mut rows = Vec::new();
        for i in 0..10 {
            rows.push(vec![(0, 1.0), (1, 0.01 * i as f64)]);
        }
        for i in 0..10 {
            rows.push(vec![(2, 1.0), (3, 0.01 * i as f64)]);
        }
        matrix(rows, 4)
    }

    #[test]
    fn test_clamp_topic_count() {
        assert_eq!(clamp_topic_count(20, 25), 2);
        assert_eq!(clamp_topic_count(5, 1000), 5);
        assert_eq!(clamp_topic_count(8, 3), 2);
        assert_eq!(clamp_topic_count(1, 100), 1);
    }

    #[test]
    fn test_separates_distinct_groups() {
        let result = KMeans::default().fit(&two_groups(), 2);
        let first = result.assignments[0];
        assert!(result.assignments[..10].iter().all(|&c| c == first));
        assert!(result.assignments[10..].iter().all(|&c| c != first));
    }

    #[test]
    fn test_deterministic_for_same_seed() {
        let m = two_groups();
        let a = KMeans::default().fit(&m, 3);
        let b = KMeans::default().fit(&m, 3);
        assert_eq!(a, b);
    }

    #[test]
    fn test_centroid_is_member_mean() {
        let result = KMeans::default().fit(&two_groups(), 2);
        let cluster = result.assignments[0];
        let expected: f64 = (0..10).map(|i| 0.01 * i as f64).sum::<f64>() / 10.0;
        assert!((result.centroids[cluster][0] - 1.0).abs() < 1e-12);
        assert!((result.centroids[cluster][1] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_all_zero_rows_go_to_cluster_zero() {
        let m = matrix(vec![vec![]; 5], 0);
        let result = KMeans::default().fit(&m, 2);
        assert_eq!(result.assignments, vec![0; 5]);
        assert_eq!(result.k(), 2);
    }

    #[test]
    fn test_more_clusters_than_rows_leaves_empty_cluster() {
        let m = matrix(vec![vec![(0, 1.0)]], 1);
        let result = KMeans::default().fit(&m, 2);
        assert_eq!(result.assignments, vec![0]);
        assert!(result.members(1).is_empty());
        assert_eq!(result.centroids.len(), 2);
    }

    #[test]
    fn test_nearest_centroid_tie_goes_to_lowest_id() {
        let row = SparseVector {
            entries: vec![(0, 1.0)],
        };
        let centroids = vec![vec![0.0, 1.0], vec![0.0, 1.0]];
        assert_eq!(nearest_centroid(&row, &centroids), 0);
    }
}
