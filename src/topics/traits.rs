// Clusterer trait — swap-ready abstraction.
//
// The pipeline only needs "partition these vectors into k groups and give me
// the centroids". The default implementation is seeded k-means; anything else
// that honors the partition contract can be dropped in.

use super::tfidf::FeatureMatrix;

/// The result of clustering a feature matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// Cluster id for each input row, in row order
    pub assignments: Vec<usize>,
    /// One dense centroid per cluster, dimensioned by the vocabulary
    pub centroids: Vec<Vec<f64>>,
    /// Number of assignment passes performed
    pub iterations: usize,
}

impl Clustering {
    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    /// Row indices assigned to `cluster`, in input order.
    pub fn members(&self, cluster: usize) -> Vec<usize> {
        self.assignments
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == cluster)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Trait for partitioning feature vectors into a fixed number of clusters.
pub trait Clusterer {
    /// Assign every row of `matrix` to one of `k` clusters (`0..k`).
    fn fit(&self, matrix: &FeatureMatrix, k: usize) -> Clustering;
}
