// Topic discovery — TF-IDF vectorizing, k-means clustering, labeling and
// per-topic statistics.

pub mod traits;
pub mod tfidf;
pub mod kmeans;
pub mod label;
pub mod stats;
